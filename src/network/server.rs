//! TCP Server
//!
//! Accepts connections and gives each one its own thread.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;

use crate::config::Config;
use crate::engine::KvStore;
use crate::error::{KvError, Result};
use crate::protocol::{encode_response, Response};

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TCP server for logkv
///
/// The store is injected at construction; every connection thread shares it
/// through an `Arc`.
pub struct Server<S: KvStore> {
    config: Config,
    store: Arc<S>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    active_connections: Arc<AtomicUsize>,
}

/// Cloneable handle that stops a running server
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl<S: KvStore + 'static> Server<S> {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, store: Arc<S>) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(KvError::Config("max_connections must be at least 1".to_string()));
        }

        let listener = TcpListener::bind(&config.listen_addr)?;

        Ok(Self {
            config,
            store,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Start the server (blocking)
    ///
    /// Returns once shutdown has been signalled and every connection thread
    /// has finished.
    pub fn run(&self) -> Result<()> {
        self.listener.set_nonblocking(true)?;
        let wait_group = WaitGroup::new();

        tracing::info!("Listening on {}", self.local_addr()?);

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer, wait_group.clone()),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!(
            "Shutting down, draining {} connections",
            self.active_connections()
        );
        wait_group.wait();

        Ok(())
    }

    /// Hand an accepted stream to its own thread
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr, wait_group: WaitGroup) {
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping connection from {}: {}", peer, e);
            return;
        }

        // Only this thread increments, so the check cannot be overtaken
        if self.active_connections() >= self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: connection limit {} reached",
                peer,
                self.config.max_connections
            );
            let _ = (&stream).write_all(&encode_response(&Response::error("too many connections")));
            return;
        }

        self.active_connections.fetch_add(1, Ordering::SeqCst);

        let store = Arc::clone(&self.store);
        let shutdown = Arc::clone(&self.shutdown);
        let active = Arc::clone(&self.active_connections);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer))
            .spawn(move || {
                let _wait_group = wait_group;

                let result = Connection::new(stream, store, shutdown).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::warn!("Connection {} ended with error: {}", peer, e);
                }

                active.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn thread for {}: {}", peer, e);
            self.active_connections.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
