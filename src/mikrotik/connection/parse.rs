// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS reply assembly
//!
//! Words are classified by their first byte: `!` opens a new record, `=` adds a
//! `key=value` parameter to the open record, anything else is skipped. A reply
//! is complete after the sentence that carries a `done`, `trap` or `fatal`
//! record.

use std::borrow::Cow;
use std::io::Read;
use std::time::Duration;

use super::frame::read_sentence;
use crate::error::Result;
use crate::mikrotik::types::{Record, Reply};

/// Incremental builder of a [`Reply`]
#[derive(Debug, Default)]
pub struct ReplyAssembler {
    records: Vec<Record>,
    current: Option<usize>,
    terminal_seen: bool,
    complete: bool,
}

impl ReplyAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one non-empty word of the current sentence
    pub fn push_word(&mut self, word: &[u8]) {
        let text = String::from_utf8_lossy(word);
        if let Cow::Owned(_) = text {
            tracing::warn!("Replacing invalid UTF-8 in word: {}", text);
        } else {
            tracing::trace!("Received word: {}", text);
        }

        if let Some(tag) = text.strip_prefix('!') {
            let record = Record::new(tag);
            self.terminal_seen |= record.is_terminal();
            self.records.push(record);
            self.current = Some(self.records.len() - 1);
        } else if let Some(param) = text.strip_prefix('=') {
            let Some((key, value)) = param.split_once('=') else {
                tracing::warn!("Ignoring malformed word: {}", text);
                return;
            };
            match self.current {
                Some(idx) => self.records[idx].push_param(key, value),
                None => tracing::warn!("Ignoring parameter outside of a reply record: {}", text),
            }
        } else {
            tracing::debug!("Ignoring unknown word: {}", text);
        }
    }

    /// Closes the current sentence
    ///
    /// Returns `true` once the reply is complete.
    pub fn end_sentence(&mut self) -> bool {
        self.current = None;
        if self.terminal_seen {
            self.complete = true;
        }
        self.complete
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn finish(self) -> Reply {
        Reply::new(self.records)
    }
}

/// Reads sentences until a terminal record has been assembled
///
/// Empty sentences are skipped. The stream ending before a terminal record
/// arrives is an error and no partial reply is returned. `stall_timeout`
/// bounds each read as in [`read_full`](super::frame::read_full).
///
/// # Errors
///
/// Propagates any framing or transport error.
pub fn receive_reply<R: Read + ?Sized>(
    reader: &mut R,
    max_word_len: usize,
    stall_timeout: Option<Duration>,
) -> Result<Reply> {
    let mut assembler = ReplyAssembler::new();
    loop {
        let sentence = read_sentence(reader, max_word_len, stall_timeout)?;
        if sentence.is_empty() {
            tracing::trace!("Skipping empty sentence");
            continue;
        }
        tracing::trace!("Received sentence of {} word(s)", sentence.len());
        for word in &sentence {
            assembler.push_word(word);
        }
        if assembler.end_sentence() {
            let reply = assembler.finish();
            tracing::trace!("Reply complete, {} record(s) received", reply.len());
            return Ok(reply);
        }
    }
}
