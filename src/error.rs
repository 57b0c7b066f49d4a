// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for the RouterOS API client

use thiserror::Error;

/// Main error type for RouterOS API operations
#[derive(Debug, Error)]
pub enum Error {
    /// Stream connect, read or write failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed data on the wire
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Length prefix starting with `0xF1..=0xFF`
    #[error("Protocol error: invalid length prefix byte {0:#04X}")]
    InvalidLengthPrefix(u8),

    /// Login handshake failure
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Received word exceeds the configured limit
    #[error("Word of {len} bytes exceeds limit of {max} bytes")]
    WordTooLarge { len: usize, max: usize },

    /// Outgoing sentence does not fit the encode buffer
    #[error("Sentence needs {required} bytes but only {available} are available")]
    Capacity { required: usize, available: usize },

    /// Caller passed something that cannot be sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Router answered with `!trap` or `!fatal`
    #[error("RouterOS {category}: {message}")]
    Trap { category: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Authentication,
    Resource,
    Usage,
    Router,
}

impl Error {
    /// Returns the error category
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Transport,
            Self::Protocol(_) | Self::InvalidLengthPrefix(_) => ErrorKind::Protocol,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::WordTooLarge { .. } | Self::Capacity { .. } => ErrorKind::Resource,
            Self::InvalidArgument(_) | Self::Config(_) => ErrorKind::Usage,
            Self::Trap { .. } => ErrorKind::Router,
        }
    }
}

/// Convenient alias for Result with the crate error
pub type Result<T, E = Error> = std::result::Result<T, E>;
