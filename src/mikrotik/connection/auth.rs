// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS authentication
//!
//! The challenge handshake runs `INIT -> RESPONDING -> READY`; any failure
//! leaves the connection in `FAILED`.

use md5::compute as md5_compute;
use serde::Deserialize;

use super::{Connection, Transport};
use crate::error::{Error, Result};
use crate::mikrotik::types::Reply;

/// Length of the hex encoded challenge sent by the router
const CHALLENGE_HEX_LEN: usize = 32;

/// Login handshake flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    /// MD5 challenge-response (pre-6.43)
    #[default]
    Challenge,
    /// Plain `=name=`/`=password=` login (6.43+)
    Plain,
    /// Plain login, answering a challenge if the router sends one
    Auto,
}

/// Progress of the login handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Init,
    Responding,
    Ready,
    Failed,
}

/// Computes the `response` value for a login challenge
///
/// The result is `"00"` followed by the lowercase hex MD5 of a zero byte, the
/// password and the 16 raw challenge bytes.
///
/// # Errors
///
/// Returns [`Error::Authentication`] if the challenge is not 32 hex characters.
pub fn login_response(password: &str, challenge_hex: &str) -> Result<String> {
    if challenge_hex.len() != CHALLENGE_HEX_LEN {
        return Err(Error::Authentication(format!(
            "Challenge has {} characters, expected {CHALLENGE_HEX_LEN}",
            challenge_hex.len()
        )));
    }
    let challenge = hex::decode(challenge_hex)
        .map_err(|e| Error::Authentication(format!("Challenge is not hex: {e}")))?;

    // Build MD5 hash of 0 + password + challenge
    let mut data = Vec::with_capacity(1 + password.len() + challenge.len());
    data.push(0u8);
    data.extend_from_slice(password.as_bytes());
    data.extend_from_slice(&challenge);
    let digest = md5_compute(&data);
    let mut response = String::from("00");
    response.push_str(&hex::encode(digest.0));
    Ok(response)
}

fn challenge_from(reply: &Reply) -> Result<&str> {
    let first = reply
        .first()
        .ok_or_else(|| Error::Authentication("Empty reply to login request".to_string()))?;
    if let Some(msg) = first.trap_message() {
        return Err(Error::Authentication(format!(
            "Login request rejected: {msg}"
        )));
    }
    first
        .get("ret")
        .ok_or_else(|| Error::Authentication("No challenge 'ret' received".to_string()))
}

fn check_accepted(reply: &Reply) -> Result<()> {
    if let Some(rec) = reply.error_record() {
        let msg = rec.trap_message().unwrap_or_default();
        tracing::trace!("Login failed with message: {}", msg);
        return Err(Error::Authentication(format!("Login failed: {msg}")));
    }
    for rec in reply {
        if let Some(msg) = rec.get("message") {
            tracing::debug!("Login message: {}", msg);
        }
    }
    Ok(())
}

impl<S: Transport> Connection<S> {
    /// Runs the login handshake
    ///
    /// # Errors
    ///
    /// Any transport, protocol or authentication failure; the login state is
    /// then [`LoginState::Failed`].
    pub fn login(&mut self, username: &str, password: &str, method: LoginMethod) -> Result<()> {
        let dispatch = self.dispatch.clone();
        super::in_scope(dispatch.as_ref(), || {
            tracing::trace!("Attempting {:?} login for user: {}", method, username);
            self.state = LoginState::Init;
            let result = match method {
                LoginMethod::Challenge => self.login_challenge(username, password),
                LoginMethod::Plain => self.login_plain(username, password, false),
                LoginMethod::Auto => self.login_plain(username, password, true),
            };
            match result {
                Ok(()) => {
                    self.state = LoginState::Ready;
                    tracing::debug!("Login successful for user: {}", username);
                    Ok(())
                }
                Err(e) => {
                    self.state = LoginState::Failed;
                    tracing::debug!("Login failed for user {}: {}", username, e);
                    Err(e)
                }
            }
        })
    }

    fn login_challenge(&mut self, username: &str, password: &str) -> Result<()> {
        self.query("/login", &[], |conn, reply| -> Result<()> {
            let challenge = challenge_from(reply)?;
            tracing::trace!("Challenge received, length: {}", challenge.len());
            conn.respond(username, password, challenge)
        })
    }

    fn login_plain(&mut self, username: &str, password: &str, allow_challenge: bool) -> Result<()> {
        let name = format!("=name={username}");
        let pass = format!("=password={password}");
        self.query("/login", &[name.as_str(), pass.as_str()], |conn, reply| -> Result<()> {
            check_accepted(reply)?;
            let challenge = reply.first().and_then(|r| r.get("ret"));
            match challenge {
                Some(ret) if allow_challenge => {
                    tracing::debug!("Router requested legacy challenge login");
                    conn.respond(username, password, ret)
                }
                _ => Ok(()),
            }
        })
    }

    fn respond(&mut self, username: &str, password: &str, challenge: &str) -> Result<()> {
        let response = login_response(password, challenge)?;
        self.state = LoginState::Responding;
        let name = format!("=name={username}");
        let response = format!("=response={response}");
        self.query("/login", &[name.as_str(), response.as_str()], |_, reply| check_accepted(reply))
    }
}
