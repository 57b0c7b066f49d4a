// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Low-level RouterOS API connection handling

mod auth;
pub(crate) mod frame;
mod parse;
mod protocol;
mod transport;

#[cfg(test)]
mod tests;

use std::net::TcpStream;
use std::time::Duration;

use tracing::Dispatch;

use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::mikrotik::types::Reply;

pub use auth::{LoginMethod, LoginState, login_response};
pub use frame::{
    MAX_SENTENCE_LEN, MAX_WORD_LEN, SentenceBuffer, encode_sentence, read_sentence, read_word,
};
pub use parse::{ReplyAssembler, receive_reply};
pub use protocol::{MAX_ENCODABLE_LEN, decode_length, encode_length, encoded_len, prefix_width};
pub use transport::{DEFAULT_SERVICE, Transport, open_address, open_stream};

/// Connection establishment options
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// TCP connect deadline
    pub connect_timeout: Option<Duration>,
    /// Socket read/write deadline, also the longest a query may go without
    /// moving a byte
    pub io_timeout: Option<Duration>,
    /// Login handshake to run after connecting
    pub login: LoginMethod,
    /// Largest word accepted from the router
    pub max_word_len: usize,
    /// Largest encoded sentence we send
    pub max_sentence_len: usize,
    /// Logging collaborator used for this connection only
    pub dispatch: Option<Dispatch>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            io_timeout: None,
            login: LoginMethod::default(),
            max_word_len: MAX_WORD_LEN,
            max_sentence_len: MAX_SENTENCE_LEN,
            dispatch: None,
        }
    }
}

impl ConnectOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_login(mut self, login: LoginMethod) -> Self {
        self.login = login;
        self
    }

    #[must_use]
    pub fn with_max_word_len(mut self, len: usize) -> Self {
        self.max_word_len = len;
        self
    }

    #[must_use]
    pub fn with_max_sentence_len(mut self, len: usize) -> Self {
        self.max_sentence_len = len;
        self
    }

    /// Routes this connection's diagnostics to `dispatch`
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = Some(dispatch.into());
        self
    }
}

/// RouterOS API connection over a blocking stream
///
/// One query at a time: [`query`](Self::query) takes `&mut self`, so sharing a
/// connection between threads needs external locking.
pub struct Connection<S: Transport = TcpStream> {
    stream: S,
    max_word_len: usize,
    max_sentence_len: usize,
    io_timeout: Option<Duration>,
    dispatch: Option<Dispatch>,
    state: LoginState,
}

impl Connection<TcpStream> {
    /// Connects to `node` on `service` (default `8728`) and logs in
    ///
    /// # Errors
    ///
    /// Fails on resolution, connect or login errors. A failed login closes the
    /// stream; no unauthenticated connection is returned.
    pub fn connect(
        node: &str,
        service: Option<&str>,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        Self::connect_with(node, service, username, password, ConnectOptions::default())
    }

    /// Like [`connect`](Self::connect) with explicit options
    ///
    /// # Errors
    ///
    /// See [`connect`](Self::connect).
    pub fn connect_with(
        node: &str,
        service: Option<&str>,
        username: &str,
        password: &str,
        options: ConnectOptions,
    ) -> Result<Self> {
        let stream = in_scope(options.dispatch.as_ref(), || {
            open_stream(node, service, options.connect_timeout, options.io_timeout)
        })?;
        Self::establish(stream, username, password, options)
    }

    /// Connects and logs in using a router configuration entry
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, connect or login errors.
    pub fn open(config: &RouterConfig) -> Result<Self> {
        config.validate()?;
        let options = config.connect_options();
        tracing::debug!("Connecting to router '{}' at {}", config.name, config.address);
        let stream = in_scope(options.dispatch.as_ref(), || {
            open_address(&config.address, options.connect_timeout, options.io_timeout)
        })?;
        Self::establish(stream, &config.username, &config.password, options)
    }
}

impl<S: Transport> Connection<S> {
    /// Wraps an already connected stream without logging in
    #[must_use]
    pub fn from_stream(stream: S, options: ConnectOptions) -> Self {
        Self {
            stream,
            max_word_len: options.max_word_len,
            max_sentence_len: options.max_sentence_len,
            io_timeout: options.io_timeout,
            dispatch: options.dispatch,
            state: LoginState::Init,
        }
    }

    /// Wraps `stream` and runs the configured login handshake
    ///
    /// # Errors
    ///
    /// Returns the login error after closing the stream.
    pub fn establish(
        stream: S,
        username: &str,
        password: &str,
        options: ConnectOptions,
    ) -> Result<Self> {
        let method = options.login;
        let mut conn = Self::from_stream(stream, options);
        match conn.login(username, password, method) {
            Ok(()) => Ok(conn),
            Err(e) => {
                conn.scoped(|| tracing::debug!("Closing stream after failed login: {}", e));
                if let Err(close_err) = conn.stream.close() {
                    tracing::trace!("Close after failed login reported: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Current login state
    #[must_use]
    pub fn login_state(&self) -> LoginState {
        self.state
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == LoginState::Ready
    }

    /// Sends one sentence, reads the complete reply and hands it to `handler`
    ///
    /// The handler is invoked exactly once when send and receive succeed, also
    /// for `trap` replies. Its result, error included, is returned unchanged.
    /// Send or receive failures are returned without calling the handler.
    ///
    /// The reply ends with the first sentence holding a `done`, `trap` or
    /// `fatal` record. A router that follows `!trap` with a separate `!done`
    /// sentence leaves that `!done` unread, and the next query on this
    /// connection receives it as its own reply.
    ///
    /// With an `io_timeout` configured, a peer that stops sending or receiving
    /// for that long fails the query with `TimedOut`.
    ///
    /// # Errors
    ///
    /// Transport, framing and validation errors, or the handler's error.
    pub fn query<T, E, F>(&mut self, command: &str, args: &[&str], handler: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self, &Reply) -> Result<T, E>,
        E: From<Error>,
    {
        let reply = self.exchange(command, args)?;
        let result = handler(self, &reply);
        drop(reply);
        result
    }

    /// Runs `command` and returns the reply, mapping `trap`/`fatal` to an error
    ///
    /// # Errors
    ///
    /// [`Error::Trap`] for router-reported failures, otherwise as
    /// [`query`](Self::query).
    pub fn command(&mut self, command: &str, args: &[&str]) -> Result<Reply> {
        self.query(command, args, |_, reply| match reply.error_record() {
            Some(rec) => Err(Error::Trap {
                category: rec.status().to_string(),
                message: rec.trap_message().unwrap_or_default().to_string(),
            }),
            None => Ok(reply.clone()),
        })
    }

    /// Closes the stream and releases the connection
    ///
    /// # Errors
    ///
    /// Returns the error reported while closing the stream.
    pub fn disconnect(mut self) -> Result<()> {
        self.scoped(|| tracing::debug!("Disconnecting"));
        self.stream.close()?;
        Ok(())
    }

    fn exchange(&mut self, command: &str, args: &[&str]) -> Result<Reply> {
        let dispatch = self.dispatch.clone();
        in_scope(dispatch.as_ref(), || -> Result<Reply> {
            tracing::debug!("Query '{}' with {} argument(s)", command, args.len());
            frame::send_sentence(
                &mut self.stream,
                command,
                args,
                self.max_sentence_len,
                self.io_timeout,
            )?;
            let reply = receive_reply(&mut self.stream, self.max_word_len, self.io_timeout)?;
            tracing::debug!("Query '{}' answered with {} record(s)", command, reply.len());
            Ok(reply)
        })
    }

    fn scoped<R>(&self, f: impl FnOnce() -> R) -> R {
        in_scope(self.dispatch.as_ref(), f)
    }
}

fn in_scope<R>(dispatch: Option<&Dispatch>, f: impl FnOnce() -> R) -> R {
    match dispatch {
        Some(d) => tracing::dispatcher::with_default(d, f),
        None => f(),
    }
}
