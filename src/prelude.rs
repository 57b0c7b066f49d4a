// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! ```rust
//! use routeros_api::prelude::*;
//! ```

pub use crate::config::{Config, RouterConfig};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::mikrotik::{
    ConnectOptions, Connection, LoginMethod, LoginState, Record, Reply, Transport,
};
