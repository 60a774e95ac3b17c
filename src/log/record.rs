//! Record codec
//!
//! Encoding and decoding of a single `(key, value)` record.
//!
//! ```text
//! ┌──────────┬───────────┬────────────┬─────────────┐
//! │ K (1)    │ Key (K)   │ V (2, BE)  │ Value (V)   │
//! └──────────┴───────────┴────────────┴─────────────┘
//! ```

use std::io::{self, Read, Seek, SeekFrom};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};

/// Size of the key length field
pub const KEY_LEN_SIZE: usize = 1;

/// Size of the value length field
pub const VALUE_LEN_SIZE: usize = 2;

/// Largest key the one-byte length field can describe
pub const MAX_KEY_LEN: usize = u8::MAX as usize;

/// Largest value the two-byte length field can describe
pub const MAX_VALUE_LEN: usize = u16::MAX as usize;

/// A record read back from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Offset immediately following this record
    pub next_offset: u64,
}

/// Total encoded size of a record with the given key and value lengths
pub fn encoded_len(key_len: usize, value_len: usize) -> usize {
    KEY_LEN_SIZE + key_len + VALUE_LEN_SIZE + value_len
}

/// Encode a record
///
/// Lengths are checked before anything is built; an oversized key or value
/// is rejected, never truncated.
pub fn encode(key: &[u8], value: &[u8]) -> Result<Bytes> {
    if key.len() > MAX_KEY_LEN {
        return Err(KvError::KeyTooLong { len: key.len() });
    }
    if value.len() > MAX_VALUE_LEN {
        return Err(KvError::ValueTooLong { len: value.len() });
    }

    let mut buf = BytesMut::with_capacity(encoded_len(key.len(), value.len()));
    buf.put_u8(key.len() as u8);
    buf.put_slice(key);
    buf.put_u16(value.len() as u16);
    buf.put_slice(value);

    Ok(buf.freeze())
}

/// Decode the record starting at `offset`
///
/// Returns:
/// - `Ok(Some(record))` — a complete record
/// - `Ok(None)` — `offset` is exactly the end of the data (end of log)
/// - `Err(CorruptLog)` — the data ends part-way through the record
pub fn decode_from<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Option<DecodedRecord>> {
    reader.seek(SeekFrom::Start(offset))?;

    let key_len = match read_len_byte(reader)? {
        Some(len) => len as usize,
        None => return Ok(None),
    };

    let mut key = vec![0u8; key_len];
    read_record_part(reader, &mut key, offset, "key")?;

    let mut value_len = [0u8; VALUE_LEN_SIZE];
    read_record_part(reader, &mut value_len, offset, "value length")?;
    let value_len = u16::from_be_bytes(value_len) as usize;

    let mut value = vec![0u8; value_len];
    read_record_part(reader, &mut value, offset, "value")?;

    Ok(Some(DecodedRecord {
        key,
        value,
        next_offset: offset + encoded_len(key_len, value_len) as u64,
    }))
}

/// Read the leading length byte; `None` on a clean end of data
fn read_len_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; KEY_LEN_SIZE];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_record_part<R: Read>(reader: &mut R, buf: &mut [u8], offset: u64, part: &str) -> Result<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(KvError::CorruptLog {
            offset,
            reason: format!("truncated record: incomplete {}", part),
        }),
        Err(e) => Err(e.into()),
    }
}
