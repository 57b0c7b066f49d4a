// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Reply records returned by the RouterOS API

use std::fmt;

/// Status tags used by `RouterOS` replies
pub mod status {
    pub const DONE: &str = "done";
    pub const RE: &str = "re";
    pub const TRAP: &str = "trap";
    pub const FATAL: &str = "fatal";

    /// Tags that end a reply
    pub const TERMINAL: [&str; 3] = [DONE, TRAP, FATAL];
}

/// One status-tagged sentence of a reply
///
/// Parameters keep their arrival order and duplicate keys are preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    status: String,
    params: Vec<(String, String)>,
}

impl Record {
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            params: Vec::new(),
        }
    }

    pub(crate) fn push_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    /// Status tag without the leading `!`
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Key of the parameter at `index`
    #[must_use]
    pub fn param_key(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|(k, _)| k.as_str())
    }

    /// Value of the parameter at `index`
    #[must_use]
    pub fn param_value(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|(_, v)| v.as_str())
    }

    /// Value of the first parameter named `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(key, value)` pairs in arrival order
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True for `done`, `trap` and `fatal`
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        status::TERMINAL.contains(&self.status.as_str())
    }

    /// True for `trap` and `fatal`
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == status::TRAP || self.status == status::FATAL
    }

    /// Router supplied error text of a `trap`/`fatal` record
    #[must_use]
    pub fn trap_message(&self) -> Option<&str> {
        if self.is_error() {
            Some(self.get("message").unwrap_or(self.status.as_str()))
        } else {
            None
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            writeln!(f, " {i:3}: {k} = {v}")?;
        }
        Ok(())
    }
}

/// Ordered chain of records produced by one query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    records: Vec<Record>,
}

impl Reply {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Number of records in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Record following the one at `index`
    #[must_use]
    pub fn next(&self, index: usize) -> Option<&Record> {
        self.records.get(index.checked_add(1)?)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// First `trap`/`fatal` record, if any
    #[must_use]
    pub fn error_record(&self) -> Option<&Record> {
        self.records.iter().find(|r| r.is_error())
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error_record().is_some()
    }

    /// Records carrying data (`re`)
    pub fn data(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.status == status::RE)
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Reply {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== BEGIN REPLY ({} records) ===", self.records.len())?;
        for record in &self.records {
            write!(f, "{record}")?;
        }
        writeln!(f, "=== END REPLY ===")
    }
}
