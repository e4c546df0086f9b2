// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical form of a context-tagged log.
//!
//! Lines from different contexts may interleave arbitrarily between runs, but
//! lines of one context keep the subject's execution order. Sorting by
//! `(context, original index)` removes the first kind of nondeterminism while
//! keeping the second kind of signal, so two correct runs produce equal
//! canonical logs.
//!
//! Contextless lines form a final group after every context, in file order.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::LogReadError;
use crate::line::{Group, LogLine};

/// A log sorted into canonical order.
///
/// Equality compares line text only: two logs are equal when they have the
/// same length and the same text at every position. Source indices are kept
/// for diagnostics but never take part in equality.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CanonicalLog {
    lines: Vec<LogLine>,
}

impl CanonicalLog {
    /// Canonicalizes in-memory text.
    ///
    /// Lines keep their terminators; a final line without `\n` is still a line.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split_inclusive('\n')
            .enumerate()
            .map(|(index, raw)| LogLine::new(index, raw))
            .collect();
        Self::from_lines(lines)
    }

    /// Sorts already-indexed lines into canonical order.
    ///
    /// The index is part of the key, so the result does not depend on sort
    /// stability.
    pub fn from_lines(mut lines: Vec<LogLine>) -> Self {
        lines.sort_unstable_by(LogLine::canonical_cmp);
        Self { lines }
    }

    /// Reads and canonicalizes everything from `reader`.
    ///
    /// `origin` only labels errors.
    pub fn from_reader<R: Read>(mut reader: R, origin: &Path) -> Result<Self, LogReadError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| LogReadError::Read {
                path: origin.to_path_buf(),
                source,
            })?;
        let text = String::from_utf8(bytes).map_err(|err| LogReadError::Decode {
            path: origin.to_path_buf(),
            offset: err.utf8_error().valid_up_to(),
        })?;
        Ok(Self::from_text(&text))
    }

    /// All lines in canonical order.
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True for an empty log.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct groups in canonical order (contexts ascending, then the
    /// contextless group if present).
    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.lines.iter().map(LogLine::group).collect();
        groups.dedup();
        groups
    }

    /// Lines of one group, in their original relative order.
    pub fn group_lines(&self, group: &Group) -> &[LogLine] {
        let start = self.lines.partition_point(|l| l.cmp_group(group).is_lt());
        let end = self.lines.partition_point(|l| l.cmp_group(group).is_le());
        &self.lines[start..end]
    }

    /// Renders the canonical form as text.
    ///
    /// Every record is written byte-for-byte, so logs that compare unequal
    /// render differently. Only the unterminated final line of a source can
    /// land mid-log; it gets a `\n` separator so records never run together.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.text.len() + 1).sum());
        let mut records = self.lines.iter().peekable();
        while let Some(line) = records.next() {
            out.push_str(&line.text);
            if records.peek().is_some() && !line.text.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

impl PartialEq for CanonicalLog {
    fn eq(&self, other: &Self) -> bool {
        self.lines.len() == other.lines.len()
            && self
                .lines
                .iter()
                .zip(&other.lines)
                .all(|(a, b)| a.text == b.text)
    }
}

impl Eq for CanonicalLog {}

/// Reads the log at `path` and returns its canonical form.
pub fn canonicalize(path: impl AsRef<Path>) -> Result<CanonicalLog, LogReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LogReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let log = CanonicalLog::from_reader(file, path)?;
    debug!(
        path = %path.display(),
        lines = log.len(),
        groups = log.groups().len(),
        "canonicalized log"
    );
    Ok(log)
}
