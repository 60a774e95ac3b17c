//! Append Log Module
//!
//! The durable half of the store: a single append-only file of records.
//!
//! ## Responsibilities
//! - Bit-exact framing of each record
//! - Sequential appends at the end of the file
//! - Random-offset reads for point lookups and replay
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Record 1                                     │
//! │ ┌────────┬───────┬──────────┬─────────────┐  │
//! │ │ K (1)  │ Key   │ V (2,BE) │ Value       │  │
//! │ └────────┴───────┴──────────┴─────────────┘  │
//! ├──────────────────────────────────────────────┤
//! │ Record 2                                     │
//! │ ┌────────┬───────┬──────────┬─────────────┐  │
//! │ │ K (1)  │ Key   │ V (2,BE) │ Value       │  │
//! │ └────────┴───────┴──────────┴─────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Records are packed back to back. There is no file header, footer or
//! version marker, so the format is not self-describing.

mod record;
mod append_log;

pub use record::{
    decode_from, encode, encoded_len, DecodedRecord, KEY_LEN_SIZE, MAX_KEY_LEN, MAX_VALUE_LEN,
    VALUE_LEN_SIZE,
};
pub use append_log::AppendLog;
