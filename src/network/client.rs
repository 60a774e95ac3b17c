//! Blocking client
//!
//! Speaks the line protocol to a logkv server.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{KvError, Result};
use crate::protocol::{decode_response, encode_command, read_line, Command, Response, Status};

/// A connection to a logkv server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Bound how long a request may wait for its response
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    /// Get the value stored under `key`
    ///
    /// A missing key comes back as `KvError::NotFound`.
    pub fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        let response = self.request(&Command::Get { key: key.to_vec() })?;
        Ok(into_result(response)?.unwrap_or_default())
    }

    /// Store `value` under `key`
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let response = self.request(&Command::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        into_result(response)?;
        Ok(())
    }

    /// Send one command and wait for its response
    fn request(&mut self, command: &Command) -> Result<Response> {
        let line = encode_command(command)?;
        self.writer.write_all(&line)?;
        self.writer.flush()?;

        let line = read_line(&mut self.reader)?.ok_or_else(|| {
            KvError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ))
        })?;

        decode_response(&line)
    }
}

fn into_result(response: Response) -> Result<Option<Vec<u8>>> {
    match response.status {
        Status::Ok => Ok(response.payload),
        Status::Error => {
            let message = response.message().unwrap_or_default();
            if message == KvError::NotFound.to_string() {
                Err(KvError::NotFound)
            } else {
                Err(KvError::Server(message))
            }
        }
    }
}
