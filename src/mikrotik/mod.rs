//! `MikroTik` `RouterOS` API client module
//!
//! This module implements the `RouterOS` API wire protocol: word framing,
//! reply assembly, query orchestration and the login handshake.

mod connection;
mod types;

// Re-export public types and functions
pub use connection::{
    ConnectOptions, Connection, DEFAULT_SERVICE, LoginMethod, LoginState, MAX_ENCODABLE_LEN,
    MAX_SENTENCE_LEN, MAX_WORD_LEN, ReplyAssembler, SentenceBuffer, Transport, decode_length,
    encode_length, encode_sentence, encoded_len, login_response, open_address, open_stream,
    prefix_width, read_sentence, read_word, receive_reply,
};
pub use types::{Record, Reply, status};
