// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Running the subject on one case or a listed suite of cases.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ctxlog_core::{compare_files, Divergence, Verdict};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::repro::emit_repro_bundle;
use crate::subject::Subject;

/// One listed case: an instruction file and its golden log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    /// Display name, e.g. `Parallel/Test 2.1: set all contexts`.
    pub name: String,
    /// Instruction file handed to the subject.
    pub input: PathBuf,
    /// Golden log.
    pub expected: PathBuf,
}

/// A suite manifest (`suite.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteManifest {
    /// Suite name.
    pub name: String,
    /// Cases in execution order.
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
}

impl SuiteManifest {
    /// Loads a manifest; relative case paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path)
            .with_context(|| format!("failed to open manifest {}", path.display()))?;
        let mut manifest: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for case in &mut manifest.cases {
            case.input = base.join(&case.input);
            case.expected = base.join(&case.expected);
        }
        Ok(manifest)
    }
}

/// Runs `subject` on `input` into a scratch file and compares against
/// `expected`.
///
/// The scratch directory is removed on return, pass or fail.
pub fn run_case(subject: &dyn Subject, input: &Path, expected: &Path) -> Result<Verdict> {
    let scratch = tempfile::Builder::new()
        .prefix("ctxlog-")
        .tempdir()
        .context("failed to create scratch dir")?;
    let output = scratch.path().join("actual.log");
    subject
        .run(input, &output)
        .with_context(|| format!("subject failed on {}", input.display()))?;
    let verdict = compare_files(&output, expected)?;
    Ok(verdict)
}

/// Result of one case.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    /// Canonical logs matched.
    Passed,
    /// Canonical logs differed.
    Failed {
        /// Where they first differed.
        divergence: Option<Divergence>,
        /// Repro bundle location, when one was written.
        repro: Option<PathBuf>,
    },
    /// No verdict: the subject failed or a log was unreadable.
    Errored {
        /// Full error chain.
        message: String,
    },
}

/// Named outcome of one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    /// Case name from the manifest.
    pub name: String,
    /// What happened.
    #[serde(flatten)]
    pub status: CaseStatus,
}

impl CaseOutcome {
    /// True only for [`CaseStatus::Passed`].
    pub fn passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed)
    }
}

/// Knobs for [`run_suite`].
#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Keep running after the first failing case.
    pub keep_going: bool,
    /// Root directory for per-case repro bundles.
    pub emit_repro: Option<PathBuf>,
}

/// Outcome of a whole suite.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Suite name.
    pub name: String,
    /// Outcomes of the cases that ran, in order.
    pub outcomes: Vec<CaseOutcome>,
    /// Cases not run because an earlier one failed.
    pub skipped: usize,
}

impl SuiteReport {
    /// Number of passing cases.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// True when every case ran and passed.
    pub fn is_success(&self) -> bool {
        self.skipped == 0 && self.outcomes.iter().all(CaseOutcome::passed)
    }
}

/// Runs every case of `manifest` in order.
///
/// `observe` sees each outcome as soon as it is known. Without `keep_going`
/// the suite stops at the first case that does not pass. Faults, including a
/// repro bundle that cannot be written, become [`CaseStatus::Errored`].
pub fn run_suite(
    subject: &dyn Subject,
    manifest: &SuiteManifest,
    options: &SuiteOptions,
    mut observe: impl FnMut(&CaseOutcome),
) -> SuiteReport {
    let mut outcomes = Vec::with_capacity(manifest.cases.len());
    for (i, case) in manifest.cases.iter().enumerate() {
        info!(case = %case.name, "running case");
        let status = match run_case(subject, &case.input, &case.expected) {
            Ok(verdict) if verdict.is_match() => CaseStatus::Passed,
            Ok(verdict) => match &options.emit_repro {
                Some(root) => {
                    let dir = root.join(bundle_dir_name(i, &case.name));
                    match emit_repro_bundle(&dir, &verdict, Some(&case.input)) {
                        Ok(()) => CaseStatus::Failed {
                            divergence: verdict.first_divergence(),
                            repro: Some(dir),
                        },
                        Err(err) => {
                            warn!(case = %case.name, "repro bundle failed: {err:#}");
                            CaseStatus::Errored {
                                message: format!("failed to write repro bundle: {err:#}"),
                            }
                        }
                    }
                }
                None => CaseStatus::Failed {
                    divergence: verdict.first_divergence(),
                    repro: None,
                },
            },
            Err(err) => {
                warn!(case = %case.name, "case errored: {err:#}");
                CaseStatus::Errored {
                    message: format!("{err:#}"),
                }
            }
        };
        let outcome = CaseOutcome {
            name: case.name.clone(),
            status,
        };
        observe(&outcome);
        let stop = !outcome.passed() && !options.keep_going;
        outcomes.push(outcome);
        if stop {
            break;
        }
    }
    let skipped = manifest.cases.len() - outcomes.len();
    SuiteReport {
        name: manifest.name.clone(),
        outcomes,
        skipped,
    }
}

/// `03-parallel_test_2_1` style directory name for case `index`.
fn bundle_dir_name(index: usize, name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{:02}-{}", index + 1, slug.trim_matches('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_names_are_filesystem_safe() {
        assert_eq!(
            bundle_dir_name(0, "Parallel/Test 2.1: set all contexts"),
            "01-parallel_test_2_1__set_all_contexts"
        );
    }

    #[test]
    fn manifest_paths_resolve_against_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.json");
        std::fs::write(
            &path,
            r#"{"name":"basic","cases":[{"name":"t1","input":"t1.in","expected":"/abs/t1.out"}]}"#,
        )
        .unwrap();
        let manifest = SuiteManifest::load(&path).unwrap();
        assert_eq!(manifest.cases[0].input, dir.path().join("t1.in"));
        assert_eq!(manifest.cases[0].expected, PathBuf::from("/abs/t1.out"));
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = SuiteManifest::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse manifest"));
    }
}
