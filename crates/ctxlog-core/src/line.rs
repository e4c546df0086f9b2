// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single log records and the `ctx <n>:` tag that assigns them to a context.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Anchored tag pattern: literal `ctx`, one space, ASCII digits, colon.
#[allow(clippy::expect_used)]
static CONTEXT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ctx ([0-9]+):").expect("context tag pattern is valid"));

/// Identifier of one concurrent execution context in the subject server.
///
/// Holds the decimal digits with leading zeros stripped, so ids of any size
/// are kept and compare numerically: shorter digit strings are smaller, equal
/// lengths compare digit by digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ContextId {
    digits: String,
}

impl ContextId {
    /// Parses a run of ASCII decimal digits. `None` for empty or non-digit input.
    pub fn new(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        let digits = if trimmed.is_empty() { "0" } else { trimmed };
        Some(Self {
            digits: digits.to_owned(),
        })
    }

    /// Normalized decimal digits.
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Numeric value, when it fits in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        self.digits.parse().ok()
    }
}

impl From<u64> for ContextId {
    fn from(id: u64) -> Self {
        Self {
            digits: id.to_string(),
        }
    }
}

impl Ord for ContextId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digits
            .len()
            .cmp(&other.digits.len())
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

impl PartialOrd for ContextId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx {}", self.digits)
    }
}

/// Extracts the context id from the start of `line`.
///
/// Returns `None` when the line does not begin with `ctx <digits>:`. Leading
/// zeros are accepted, so `ctx 007:` and `ctx 7:` name the same context.
pub fn extract_context(line: &str) -> Option<ContextId> {
    let captures = CONTEXT_TAG.captures(line)?;
    ContextId::new(captures.get(1)?.as_str())
}

/// Canonical order of two optional contexts: ids ascending, `None` last.
fn order_contexts(a: Option<&ContextId>, b: Option<&ContextId>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ordering group of a line: a context, or the contextless tail.
///
/// Variant order is the canonical order: every context sorts before
/// contextless lines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Group {
    /// Line tagged with a context id.
    Context(ContextId),
    /// Line without a recognizable tag.
    Contextless,
}

impl Group {
    /// The context id, `None` for the contextless group.
    pub fn context(&self) -> Option<&ContextId> {
        match self {
            Self::Context(id) => Some(id),
            Self::Contextless => None,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(id) => id.fmt(f),
            Self::Contextless => f.write_str("contextless"),
        }
    }
}

impl From<Option<ContextId>> for Group {
    fn from(context: Option<ContextId>) -> Self {
        context.map_or(Self::Contextless, Self::Context)
    }
}

/// One record of a log file.
///
/// `text` is kept byte-for-byte, line terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LogLine {
    /// Exact source text including any trailing `\n` / `\r\n`.
    pub text: String,
    /// Context parsed from the tag, if any.
    pub context: Option<ContextId>,
    /// Zero-based position in the source file.
    pub index: usize,
}

impl LogLine {
    /// Builds a record, deriving its context from `text`.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let context = extract_context(&text);
        Self {
            text,
            context,
            index,
        }
    }

    /// Group this line belongs to.
    pub fn group(&self) -> Group {
        Group::from(self.context.clone())
    }

    /// Canonical order: `(group, original index)`.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        order_contexts(self.context.as_ref(), other.context.as_ref())
            .then(self.index.cmp(&other.index))
    }

    /// Where this line's group sits relative to `group`.
    pub fn cmp_group(&self, group: &Group) -> Ordering {
        order_contexts(self.context.as_ref(), group.context())
    }

    /// Text without its line terminator, for display.
    pub fn trimmed(&self) -> &str {
        self.text.trim_end_matches(['\r', '\n'])
    }
}
