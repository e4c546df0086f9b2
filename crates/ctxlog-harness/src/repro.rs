// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mismatch descriptions and on-disk reproduction bundles.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use ctxlog_core::{Divergence, Group, LogLine, Verdict};
use serde::Serialize;

/// Machine-readable summary written as `verdict.json`.
#[derive(Debug, Serialize)]
pub struct VerdictSummary {
    /// Whether the canonical logs were equal.
    pub matched: bool,
    /// Canonical line count of the actual log.
    pub actual_lines: usize,
    /// Canonical line count of the expected log.
    pub expected_lines: usize,
    /// First differing canonical position, if any.
    pub first_divergence: Option<Divergence>,
    /// Groups whose line sequences differ.
    pub mismatched_groups: Vec<Group>,
}

impl From<&Verdict> for VerdictSummary {
    fn from(verdict: &Verdict) -> Self {
        Self {
            matched: verdict.is_match(),
            actual_lines: verdict.actual().len(),
            expected_lines: verdict.expected().len(),
            first_divergence: verdict.first_divergence(),
            mismatched_groups: verdict.mismatched_groups(),
        }
    }
}

/// Human-readable explanation of a mismatch. Empty for a match.
pub fn describe_mismatch(verdict: &Verdict) -> String {
    let Some(d) = verdict.first_divergence() else {
        return String::new();
    };
    let show = |line: Option<&LogLine>| match line {
        Some(l) => format!("{:?} (source line {})", l.trimmed(), l.index + 1),
        None => "<end of log>".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "first divergence at canonical line {} ({})",
        d.position + 1,
        d.group()
    );
    let _ = writeln!(out, "  actual:   {}", show(d.actual.as_ref()));
    let _ = writeln!(out, "  expected: {}", show(d.expected.as_ref()));
    if let (Some(a), Some(e)) = (&d.actual, &d.expected) {
        if a.trimmed() == e.trimmed() {
            let _ = writeln!(
                out,
                "  lines differ only in their terminator: actual {:?}, expected {:?}",
                terminator(a),
                terminator(e)
            );
        }
    }
    let groups: Vec<String> = verdict
        .mismatched_groups()
        .iter()
        .map(ToString::to_string)
        .collect();
    let _ = writeln!(out, "mismatched groups: {}", groups.join(", "));
    let _ = writeln!(
        out,
        "line counts: actual {}, expected {}",
        verdict.actual().len(),
        verdict.expected().len()
    );
    out
}

fn terminator(line: &LogLine) -> &str {
    &line.text[line.trimmed().len()..]
}

/// Writes a reproduction bundle for `verdict` into `out_dir`.
///
/// Contents: both canonical forms, `verdict.json`, `diff.txt`, and a copy of
/// the instruction file when one is given.
pub fn emit_repro_bundle(out_dir: &Path, verdict: &Verdict, input: Option<&Path>) -> Result<()> {
    fs::create_dir_all(out_dir).context("failed to create repro dir")?;

    if let Some(input) = input {
        fs::copy(input, out_dir.join("input.in")).context("failed to copy instruction file")?;
    }

    fs::write(
        out_dir.join("actual.canonical.log"),
        verdict.actual().render(),
    )
    .context("failed to write actual.canonical.log")?;
    fs::write(
        out_dir.join("expected.canonical.log"),
        verdict.expected().render(),
    )
    .context("failed to write expected.canonical.log")?;

    let f = File::create(out_dir.join("verdict.json")).context("failed to create verdict.json")?;
    serde_json::to_writer_pretty(f, &VerdictSummary::from(verdict))?;

    fs::write(out_dir.join("diff.txt"), describe_mismatch(verdict))
        .context("failed to write diff.txt")?;
    Ok(())
}
