// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Verdicts: canonical equality of an actual log against a golden log.

use std::path::Path;

use tracing::debug;

use crate::canonical::{canonicalize, CanonicalLog};
use crate::error::CompareError;
use crate::line::{Group, LogLine};

/// Outcome of one comparison.
///
/// A mismatch is a normal result, not an error. Both canonical sides are kept
/// so callers can render whatever diff they like.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Verdict {
    matched: bool,
    actual: CanonicalLog,
    expected: CanonicalLog,
}

/// First canonical position where the two sides differ.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Divergence {
    /// Zero-based position in canonical order.
    pub position: usize,
    /// Actual line at `position`, `None` if the actual log ended first.
    pub actual: Option<LogLine>,
    /// Expected line at `position`, `None` if the expected log ended first.
    pub expected: Option<LogLine>,
}

impl Divergence {
    /// Group the divergence falls in (expected side wins when both exist).
    pub fn group(&self) -> Group {
        self.expected
            .as_ref()
            .or(self.actual.as_ref())
            .map_or(Group::Contextless, LogLine::group)
    }
}

impl Verdict {
    /// True when both canonical logs are equal.
    pub fn is_match(&self) -> bool {
        self.matched
    }

    /// Canonical form of the actual log.
    pub fn actual(&self) -> &CanonicalLog {
        &self.actual
    }

    /// Canonical form of the expected log.
    pub fn expected(&self) -> &CanonicalLog {
        &self.expected
    }

    /// First differing position, or `None` on a match.
    pub fn first_divergence(&self) -> Option<Divergence> {
        if self.matched {
            return None;
        }
        let actual = self.actual.lines();
        let expected = self.expected.lines();
        let position = actual
            .iter()
            .zip(expected)
            .position(|(a, e)| a.text != e.text)
            .unwrap_or_else(|| actual.len().min(expected.len()));
        Some(Divergence {
            position,
            actual: actual.get(position).cloned(),
            expected: expected.get(position).cloned(),
        })
    }

    /// Groups whose line sequences differ between the two sides, ascending.
    pub fn mismatched_groups(&self) -> Vec<Group> {
        let mut groups = self.actual.groups();
        groups.extend(self.expected.groups());
        groups.sort_unstable();
        groups.dedup();
        groups.retain(|g| {
            let a = self.actual.group_lines(g);
            let e = self.expected.group_lines(g);
            a.len() != e.len() || a.iter().zip(e).any(|(x, y)| x.text != y.text)
        });
        groups
    }
}

/// Compares two already-canonical logs.
pub fn compare_logs(actual: CanonicalLog, expected: CanonicalLog) -> Verdict {
    let matched = actual == expected;
    Verdict {
        matched,
        actual,
        expected,
    }
}

/// Canonicalizes both files and compares them.
///
/// The actual log is read first; if it fails the expected log is not touched.
/// Neither file is modified.
pub fn compare_files(
    actual: impl AsRef<Path>,
    expected: impl AsRef<Path>,
) -> Result<Verdict, CompareError> {
    let actual = canonicalize(actual).map_err(CompareError::Actual)?;
    let expected = canonicalize(expected).map_err(CompareError::Expected)?;
    let verdict = compare_logs(actual, expected);
    match verdict.first_divergence() {
        None => debug!(lines = verdict.actual.len(), "logs match"),
        Some(d) => debug!(position = d.position, "logs diverge"),
    }
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::ContextId;

    fn verdict(actual: &str, expected: &str) -> Verdict {
        compare_logs(
            CanonicalLog::from_text(actual),
            CanonicalLog::from_text(expected),
        )
    }

    #[test]
    fn cross_context_reordering_matches() {
        let v = verdict(
            "ctx 1: a\nctx 2: x\nctx 1: b\n",
            "ctx 2: x\nctx 1: a\nctx 1: b\n",
        );
        assert!(v.is_match());
        assert_eq!(v.first_divergence(), None);
        assert!(v.mismatched_groups().is_empty());
    }

    #[test]
    fn within_context_swap_mismatches() {
        let v = verdict("ctx 1: a\nctx 1: b\n", "ctx 1: b\nctx 1: a\n");
        assert!(!v.is_match());
        let d = v.first_divergence().unwrap();
        assert_eq!(d.position, 0);
        assert_eq!(d.actual.unwrap().trimmed(), "ctx 1: a");
        assert_eq!(d.expected.unwrap().trimmed(), "ctx 1: b");
        assert_eq!(v.mismatched_groups(), [Group::Context(ContextId::from(1))]);
    }

    #[test]
    fn shorter_actual_diverges_at_its_end() {
        let v = verdict("ctx 1: a\n", "ctx 1: a\nctx 2: x\n");
        let d = v.first_divergence().unwrap();
        assert_eq!(d.position, 1);
        assert_eq!(d.actual, None);
        assert_eq!(d.group(), Group::Context(ContextId::from(2)));
        assert_eq!(v.mismatched_groups(), [Group::Context(ContextId::from(2))]);
    }

    #[test]
    fn missing_trailing_newline_is_a_difference() {
        let v = verdict("ctx 1: a", "ctx 1: a\n");
        assert!(!v.is_match());
    }

    #[test]
    fn contextless_difference_is_reported_in_its_group() {
        let v = verdict("ctx 1: a\ndone\n", "ctx 1: a\nfinished\n");
        assert_eq!(v.mismatched_groups(), [Group::Contextless]);
        assert_eq!(v.first_divergence().unwrap().group(), Group::Contextless);
    }
}
