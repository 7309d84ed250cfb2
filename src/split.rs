//! Splitting scripts into batches on separator lines.
//!
//! A separator line holds nothing but the separator keyword (`GO` by default), compared
//! without regard to ASCII case, optionally surrounded by whitespace. Everything between
//! two separator lines is one batch. Batches are trimmed and blank batches are dropped, so
//! a trailing `GO` or a run of consecutive separators never yields an empty batch.
use crate::errors::ConfigError;
use std::borrow::Cow;

/// The keyword used by SQL Server tooling to mark the end of a batch.
pub const DEFAULT_SEPARATOR: &str = "GO";

/// A single executable chunk of a script.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Batch<'a> {
    /// Zero-based position of the batch in the script.
    pub index: usize,
    /// One-based line of the script on which `text` begins.
    pub start_line: usize,
    /// The trimmed, non-empty batch text, borrowed from the script.
    pub text: &'a str,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BatchSplitter {
    separator: Cow<'static, str>,
}

impl Default for BatchSplitter {
    fn default() -> Self {
        Self {
            separator: Cow::Borrowed(DEFAULT_SEPARATOR),
        }
    }
}

impl BatchSplitter {
    /// Create a splitter for a custom separator keyword. The keyword is trimmed; a blank
    /// keyword, or one spanning several lines, is rejected.
    pub fn new(separator: impl Into<Cow<'static, str>>) -> Result<Self, ConfigError> {
        let separator = match separator.into() {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
            Cow::Owned(s) => Cow::Owned(s.trim().to_owned()),
        };
        if separator.is_empty() || separator.contains('\n') {
            return Err(ConfigError::InvalidSeparator {
                separator: separator.into_owned(),
            });
        }
        Ok(Self { separator })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Whether `line` (with or without its line terminator) is a separator line.
    pub fn is_separator_line(&self, line: &str) -> bool {
        line.trim().eq_ignore_ascii_case(&self.separator)
    }

    /// Split `script` into its batch texts, in script order.
    pub fn split<'a>(&self, script: &'a str) -> Vec<&'a str> {
        self.batches(script)
            .into_iter()
            .map(|batch| batch.text)
            .collect()
    }

    /// Split `script` into [`Batch`]es, keeping the position of each one in the script.
    pub fn batches<'a>(&self, script: &'a str) -> Vec<Batch<'a>> {
        let mut batches = Vec::new();
        let mut fragment_start = 0;
        let mut fragment_line = 1;
        let mut offset = 0;

        for (line_number, line) in (1..).zip(script.split_inclusive('\n')) {
            if self.is_separator_line(line) {
                push_fragment(&mut batches, &script[fragment_start..offset], fragment_line);
                fragment_start = offset + line.len();
                fragment_line = line_number + 1;
            }
            offset += line.len();
        }
        push_fragment(&mut batches, &script[fragment_start..], fragment_line);

        batches
    }
}

fn push_fragment<'a>(batches: &mut Vec<Batch<'a>>, fragment: &'a str, first_line: usize) {
    let text = fragment.trim();
    if text.is_empty() {
        return;
    }
    let leading = &fragment[..fragment.len() - fragment.trim_start().len()];
    batches.push(Batch {
        index: batches.len(),
        start_line: first_line + leading.matches('\n').count(),
        text,
    });
}

/// Split `script` on `GO` lines. See [`BatchSplitter::split`].
pub fn split_batches(script: &str) -> Vec<&str> {
    BatchSplitter::default().split(script)
}
