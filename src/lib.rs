// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # RouterOS API
//!
//! Blocking client for the `MikroTik` `RouterOS` API.
//!
//! The API speaks length-prefixed words grouped into sentences over TCP. This
//! crate encodes and decodes that framing, assembles replies, runs one query
//! at a time over a [`Connection`] and performs the login handshake when the
//! connection is established.
//!
//! ```rust,no_run
//! use routeros_api::{Connection, Result};
//!
//! fn main() -> Result<()> {
//!     let mut conn = Connection::connect("192.168.88.1", None, "admin", "secret")?;
//!     let names = conn.query("/interface/print", &[], |_, reply| -> Result<Vec<String>> {
//!         Ok(reply
//!             .data()
//!             .filter_map(|r| r.get("name"))
//!             .map(str::to_string)
//!             .collect())
//!     })?;
//!     println!("{names:?}");
//!     conn.disconnect()
//! }
//! ```
//!
//! ## Main modules
//! - `config`: configuration management
//! - `error`: error types
//! - `mikrotik`: wire protocol, connection and login
//! - `prelude`: commonly used types and traits

mod config;
mod error;
mod mikrotik;
pub mod prelude;

// Re-export commonly used types
/// Router configuration
pub use config::{Config, RouterConfig};

/// Error and result type
pub use error::{Error, ErrorKind, Result};

/// Connection, query and login
pub use mikrotik::{
    ConnectOptions, Connection, DEFAULT_SERVICE, LoginMethod, LoginState, Transport,
    login_response, open_address, open_stream,
};

/// Reply chain
pub use mikrotik::{Record, Reply, status};

/// Wire protocol framing (public for tests and custom transports)
pub use mikrotik::{
    MAX_ENCODABLE_LEN, MAX_SENTENCE_LEN, MAX_WORD_LEN, ReplyAssembler, SentenceBuffer,
    decode_length, encode_length, encode_sentence, encoded_len, prefix_width, read_sentence,
    read_word, receive_reply,
};
