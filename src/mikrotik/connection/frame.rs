// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Sentence framing on top of the word codec
//!
//! A sentence is a run of length-prefixed words closed by a zero-length word.
//! All stream I/O here is blocking: partial transfers are continued and
//! `WouldBlock`/`Interrupted` are retried until the transfer completes or a
//! real error occurs.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use super::protocol::{MAX_PREFIX_LEN, decode_length, encode_length, encoded_len, prefix_width};
use crate::error::{Error, Result};

/// Upper bound for a single received word (16 MiB)
pub const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Upper bound for one encoded outgoing sentence (16 MiB)
pub const MAX_SENTENCE_LEN: usize = 16 * 1024 * 1024;

/// Bounded output buffer for one outgoing sentence
#[derive(Debug)]
pub struct SentenceBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl SentenceBuffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            capacity,
        }
    }

    fn reserve(&mut self, required: usize) -> Result<()> {
        let available = self.capacity.saturating_sub(self.buf.len());
        if required > available {
            return Err(Error::Capacity {
                required,
                available,
            });
        }
        self.buf.reserve(required);
        Ok(())
    }

    /// Appends one length-prefixed word
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Capacity`] if prefix and content do not fit.
    pub fn push_word(&mut self, word: &[u8]) -> Result<()> {
        let required = encoded_len(word.len()).saturating_add(word.len());
        self.reserve(required)?;
        let prefix = encode_length(word.len())?;
        self.buf.extend_from_slice(&prefix);
        self.buf.extend_from_slice(word);
        Ok(())
    }

    /// Appends the empty terminator word and returns the encoded sentence
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Capacity`] if there is no room for the terminator.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.reserve(1)?;
        self.buf.push(0);
        Ok(self.buf)
    }
}

/// Serializes `command` and `args` into one sentence
///
/// Validation happens before anything is encoded, so a rejected request never
/// produces a partial sentence.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an empty command or argument and
/// [`Error::Capacity`] if the sentence exceeds `capacity` bytes.
pub fn encode_sentence(command: &str, args: &[&str], capacity: usize) -> Result<Vec<u8>> {
    if command.is_empty() {
        return Err(Error::InvalidArgument("command must not be empty".to_string()));
    }
    if let Some(pos) = args.iter().position(|a| a.is_empty()) {
        return Err(Error::InvalidArgument(format!(
            "argument {pos} of '{command}' must not be empty"
        )));
    }

    let mut sentence = SentenceBuffer::with_capacity(capacity);
    sentence.push_word(command.as_bytes())?;
    for arg in args {
        sentence.push_word(arg.as_bytes())?;
    }
    sentence.finish()
}

/// Writes all of `buf`, continuing after short writes
///
/// `stall_timeout` bounds how long the writer may keep reporting `WouldBlock`
/// without accepting a byte; `None` retries indefinitely.
///
/// # Errors
///
/// Any write error other than `WouldBlock`/`Interrupted` aborts immediately.
/// A stall longer than `stall_timeout` yields `TimedOut`.
pub fn write_all_blocking<W: Write + ?Sized>(
    writer: &mut W,
    mut buf: &[u8],
    stall_timeout: Option<Duration>,
) -> Result<()> {
    let mut stall = Stall::new(stall_timeout);
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "stream accepted no bytes",
                )
                .into());
            }
            Ok(n) => {
                buf = &buf[n..];
                stall.progress();
            }
            Err(e) => stall.retry(e)?,
        }
    }
    loop {
        match writer.flush() {
            Ok(()) => return Ok(()),
            Err(e) => stall.retry(e)?,
        }
    }
}

/// Encodes and writes one sentence
///
/// # Errors
///
/// See [`encode_sentence`] and [`write_all_blocking`].
pub fn send_sentence<W: Write + ?Sized>(
    writer: &mut W,
    command: &str,
    args: &[&str],
    capacity: usize,
    stall_timeout: Option<Duration>,
) -> Result<()> {
    let bytes = encode_sentence(command, args, capacity)?;
    tracing::trace!(
        "Sending sentence '{}' with {} argument(s), {} bytes",
        command,
        args.len(),
        bytes.len()
    );
    write_all_blocking(writer, &bytes, stall_timeout)
}

/// Fills `buf` completely
///
/// # Errors
///
/// End of stream before `buf` is full yields `UnexpectedEof`; no data for
/// longer than `stall_timeout` yields `TimedOut`.
pub fn read_full<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    stall_timeout: Option<Duration>,
) -> io::Result<()> {
    let mut stall = Stall::new(stall_timeout);
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("stream closed after {filled} of {} bytes", buf.len()),
                ));
            }
            Ok(n) => {
                filled += n;
                stall.progress();
            }
            Err(e) => stall.retry(e)?,
        }
    }
    Ok(())
}

/// Reads one word
///
/// A zero-length word is returned as an empty vector.
///
/// # Errors
///
/// Fails on stream errors, an invalid prefix, or a word longer than
/// `max_word_len`.
pub fn read_word<R: Read + ?Sized>(
    reader: &mut R,
    max_word_len: usize,
    stall_timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let mut prefix = [0u8; MAX_PREFIX_LEN];
    read_full(reader, &mut prefix[..1], stall_timeout)?;
    let width = prefix_width(prefix[0])?;
    read_full(reader, &mut prefix[1..width], stall_timeout)?;
    let (len, _) = decode_length(&prefix[..width])?;

    if len == 0 {
        return Ok(Vec::new());
    }
    if len > max_word_len {
        return Err(Error::WordTooLarge {
            len,
            max: max_word_len,
        });
    }

    let mut word = vec![0u8; len];
    read_full(reader, &mut word, stall_timeout)?;
    Ok(word)
}

/// Reads words up to and excluding the terminating empty word
///
/// # Errors
///
/// See [`read_word`].
pub fn read_sentence<R: Read + ?Sized>(
    reader: &mut R,
    max_word_len: usize,
    stall_timeout: Option<Duration>,
) -> Result<Vec<Vec<u8>>> {
    let mut words = Vec::new();
    loop {
        let word = read_word(reader, max_word_len, stall_timeout)?;
        if word.is_empty() {
            return Ok(words);
        }
        words.push(word);
    }
}

/// Time a transfer has spent without progress
///
/// Sockets with a read or write timeout report an expired deadline as
/// `WouldBlock`, so a stall is measured from the last byte moved rather than
/// from the last error.
struct Stall {
    limit: Option<Duration>,
    since: Instant,
}

impl Stall {
    fn new(limit: Option<Duration>) -> Self {
        Self {
            limit,
            since: Instant::now(),
        }
    }

    fn progress(&mut self) {
        self.since = Instant::now();
    }

    /// Returns `Ok` when the failed call should be retried
    fn retry(&self, e: io::Error) -> io::Result<()> {
        match e.kind() {
            io::ErrorKind::Interrupted => Ok(()),
            io::ErrorKind::WouldBlock => match self.limit {
                Some(limit) if self.since.elapsed() >= limit => {
                    tracing::debug!("No progress for {:?}, giving up", limit);
                    Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no data moved within {limit:?}"),
                    ))
                }
                _ => {
                    std::thread::yield_now();
                    Ok(())
                }
            },
            _ => Err(e),
        }
    }
}
