//! Protocol Module
//!
//! Defines the line-based wire protocol for client-server communication.
//!
//! ### Requests
//! ```text
//! GET <key>\n
//! SET <key> <value>\n
//! ```
//! The first space ends the operation. For SET the first space after the key
//! ends the key; the value runs to the end of the line and may contain
//! spaces but not newlines.
//!
//! ### Responses
//! ```text
//! OK\n
//! OK <payload>\n
//! ERROR <message>\n
//! ```

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_line, MAX_LINE_LEN,
};
