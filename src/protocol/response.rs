//! Response definitions
//!
//! Represents responses to clients.

use crate::error::KvError;

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status
    pub status: Status,

    /// Optional payload (value for GET, message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error message of an ERROR response, lossily decoded
    pub fn message(&self) -> Option<String> {
        match (self.status, &self.payload) {
            (Status::Error, Some(payload)) => Some(String::from_utf8_lossy(payload).into_owned()),
            (Status::Error, None) => Some(String::new()),
            (Status::Ok, _) => None,
        }
    }
}

impl From<&KvError> for Response {
    /// Protocol errors go on the wire as their bare message
    fn from(err: &KvError) -> Self {
        match err {
            KvError::Protocol(message) => Response::error(message),
            other => Response::error(&other.to_string()),
        }
    }
}
