//! Protocol codec
//!
//! Encoding and decoding functions for the line protocol.
//!
//! Lines end in `\n`; a preceding `\r` is tolerated and stripped. Only the
//! terminator is stripped from a SET value, so embedded and trailing spaces
//! survive. A GET key is trimmed of surrounding ASCII whitespace.
//!
//! SET values are not whitespace-trimmed, unlike the GET key: a value is
//! stored byte for byte as sent.

use std::io::{self, BufRead, Read};

use crate::error::{KvError, Result};
use crate::log::{MAX_KEY_LEN, MAX_VALUE_LEN};

use super::{Command, CommandType, Response, Status};

/// Longest line accepted, terminator included: a SET with a maximal key
/// and value
pub const MAX_LINE_LEN: usize = 4 + MAX_KEY_LEN + 1 + MAX_VALUE_LEN + 2;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as a request line
///
/// Fails instead of producing a line the server would split differently:
/// keys may not be empty or contain spaces or line breaks, values may not
/// contain line breaks.
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let key = command.key();
    if key.is_empty() {
        return Err(KvError::Protocol("empty key".to_string()));
    }
    if key.iter().any(|&b| b == b' ' || is_line_break(b)) {
        return Err(KvError::Protocol(
            "key must not contain spaces or line breaks".to_string(),
        ));
    }

    let op = command.command_type().as_str().as_bytes();

    let line = match command {
        Command::Get { key } => {
            let mut line = Vec::with_capacity(op.len() + 1 + key.len() + 1);
            line.extend_from_slice(op);
            line.push(b' ');
            line.extend_from_slice(key);
            line.push(b'\n');
            line
        }
        Command::Set { key, value } => {
            if value.iter().copied().any(is_line_break) {
                return Err(KvError::Protocol(
                    "value must not contain line breaks".to_string(),
                ));
            }
            let mut line = Vec::with_capacity(op.len() + key.len() + value.len() + 3);
            line.extend_from_slice(op);
            line.push(b' ');
            line.extend_from_slice(key);
            line.push(b' ');
            line.extend_from_slice(value);
            line.push(b'\n');
            line
        }
    };

    Ok(line)
}

/// Decode a request line
pub fn decode_command(line: &[u8]) -> Result<Command> {
    let line = strip_terminator(line);

    let (op, rest) = split_once(line, b' ').ok_or_else(invalid_format)?;

    if op == CommandType::Get.as_str().as_bytes() {
        let key = trim_ascii_whitespace(rest);
        if key.is_empty() {
            return Err(invalid_format());
        }
        Ok(Command::Get { key: key.to_vec() })
    } else if op == CommandType::Set.as_str().as_bytes() {
        let (key, value) = split_once(rest, b' ').ok_or_else(invalid_format)?;
        if key.is_empty() {
            return Err(invalid_format());
        }
        Ok(Command::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    } else {
        Err(KvError::Protocol("unknown operation".to_string()))
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as a line
///
/// Line breaks inside an error message are replaced by spaces.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref();

    match response.status {
        Status::Ok => {
            let mut line = Vec::with_capacity(4 + payload.map_or(0, <[u8]>::len));
            line.extend_from_slice(b"OK");
            if let Some(payload) = payload {
                line.push(b' ');
                line.extend_from_slice(payload);
            }
            line.push(b'\n');
            line
        }
        Status::Error => {
            let message = payload.unwrap_or_default();
            let mut line = Vec::with_capacity(7 + message.len());
            line.extend_from_slice(b"ERROR ");
            line.extend(
                message
                    .iter()
                    .map(|&b| if is_line_break(b) { b' ' } else { b }),
            );
            line.push(b'\n');
            line
        }
    }
}

/// Decode a response line
pub fn decode_response(line: &[u8]) -> Result<Response> {
    let line = strip_terminator(line);

    let (status, payload) = match split_once(line, b' ') {
        Some((status, payload)) => (status, Some(payload)),
        None => (line, None),
    };

    match status {
        b"OK" => Ok(Response::ok(payload.map(<[u8]>::to_vec))),
        b"ERROR" => Ok(Response {
            status: Status::Error,
            payload: Some(payload.unwrap_or_default().to_vec()),
        }),
        _ => Err(KvError::Protocol("unknown response format".to_string())),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one `\n`-terminated line from a stream
///
/// Returns `Ok(None)` when the stream ends before any byte is read. A
/// stream that ends mid-line is an `UnexpectedEof` error.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', &mut line)?;

    if read == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        return Ok(Some(line));
    }
    if line.len() > MAX_LINE_LEN {
        return Err(KvError::Protocol("line too long".to_string()));
    }

    Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended mid-line").into())
}

// =============================================================================
// Helpers
// =============================================================================

fn invalid_format() -> KvError {
    KvError::Protocol("invalid format".to_string())
}

fn is_line_break(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn split_once(bytes: &[u8], separator: u8) -> Option<(&[u8], &[u8])> {
    let at = bytes.iter().position(|&b| b == separator)?;
    Some((&bytes[..at], &bytes[at + 1..]))
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
