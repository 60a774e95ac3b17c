//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::KvStore;
use crate::error::{KvError, Result};
use crate::protocol::{decode_command, encode_response, Command, Response, MAX_LINE_LEN};

/// How often a blocked read wakes up to check for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handles a single client connection
pub struct Connection<S: KvStore> {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Store the commands run against
    store: Arc<S>,

    /// Set by the server when it stops
    shutdown: Arc<AtomicBool>,

    /// Close after this long without input
    idle_timeout: Option<Duration>,

    /// Bytes of a request line read so far
    pending: Vec<u8>,

    /// Peer address for logging
    peer_addr: String,
}

impl<S: KvStore> Connection<S> {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and the shutdown poll interval
    pub fn new(stream: TcpStream, store: Arc<S>, shutdown: Arc<AtomicBool>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            shutdown,
            idle_timeout: None,
            pending: Vec::new(),
            peer_addr,
        })
    }

    /// Configure the idle timeout and the socket write timeout (0 disables)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.idle_timeout = (read_ms > 0).then(|| Duration::from_millis(read_ms));

        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads request lines in a loop and sends responses. A malformed line
    /// gets an `ERROR` response and the loop carries on. Returns when the
    /// client disconnects, the server shuts down, or the socket fails.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::debug!("Connection closed for {}", self.peer_addr);
                    return Ok(());
                }
                Err(KvError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    let _ = self.send_response(Response::from(&e));
                    return Err(e);
                }
            };

            let response = match decode_command(&line) {
                Ok(command) => {
                    tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);
                    self.execute_command(command)
                }
                Err(e) => {
                    tracing::debug!("Bad request from {}: {}", self.peer_addr, e);
                    Response::from(&e)
                }
            };

            if let Err(e) = self.send_response(response) {
                if let KvError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&self, command: Command) -> Response {
        let result = match command {
            Command::Get { key } => self.store.get(&key).map(Some),
            Command::Set { key, value } => self.store.set(&key, &value).map(|()| None),
        };

        match result {
            Ok(payload) => Response::ok(payload),
            Err(e) => {
                if !e.is_not_found() {
                    tracing::error!("Command from {} failed: {}", self.peer_addr, e);
                }
                Response::from(&e)
            }
        }
    }

    /// Read the next request line
    ///
    /// Returns `Ok(None)` on end of stream, server shutdown, or idle
    /// timeout. A partial line at end of stream is discarded.
    fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut last_activity = Instant::now();

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Ok(None);
            }

            let limit = (MAX_LINE_LEN + 1 - self.pending.len()) as u64;
            match (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.pending)
            {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    if self.pending.last() == Some(&b'\n') {
                        return Ok(Some(std::mem::take(&mut self.pending)));
                    }
                    if self.pending.len() > MAX_LINE_LEN {
                        return Err(KvError::Protocol("line too long".to_string()));
                    }
                    last_activity = Instant::now();
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if let Some(idle) = self.idle_timeout {
                        if last_activity.elapsed() >= idle {
                            tracing::debug!("Idle timeout for client {}", self.peer_addr);
                            return Ok(None);
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        self.writer.write_all(&encode_response(&response))?;
        self.writer.flush()?;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
    )
}
