// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `ctxlog` command line.
#![allow(clippy::print_stdout)]

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ctxlog_core::{canonicalize, compare_files, Verdict};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::repro::{describe_mismatch, emit_repro_bundle};
use crate::subject::ProcessSubject;
use crate::suite::{run_case, run_suite, CaseStatus, SuiteManifest, SuiteOptions};

/// Exit status for a completed comparison that did not match.
pub const EXIT_MISMATCH: u8 = 1;

/// Order-insensitive golden-log oracle for context-tagged server logs
#[derive(Parser)]
#[command(name = "ctxlog")]
#[command(version)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// `ctxlog` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Print the canonical form of a log
    Canon {
        /// Log file to canonicalize
        log: PathBuf,
    },
    /// Compare two existing logs
    Compare {
        /// Log produced by the subject
        actual: PathBuf,
        /// Golden log
        expected: PathBuf,
        /// Directory for a repro bundle on mismatch
        #[arg(long)]
        emit_repro: Option<PathBuf>,
    },
    /// Run the subject on one instruction file and check its log
    Run {
        /// Instruction file
        input: PathBuf,
        /// Golden log
        #[arg(long)]
        golden: PathBuf,
        /// Subject to launch
        #[command(flatten)]
        subject: SubjectArgs,
        /// Directory for a repro bundle on mismatch
        #[arg(long)]
        emit_repro: Option<PathBuf>,
    },
    /// Run every case listed in a suite manifest
    Suite {
        /// Path to suite.json
        manifest: PathBuf,
        /// Subject to launch
        #[command(flatten)]
        subject: SubjectArgs,
        /// Keep going after the first failing case
        #[arg(long)]
        keep_going: bool,
        /// Root directory for per-case repro bundles
        #[arg(long)]
        emit_repro: Option<PathBuf>,
        /// Write a JSON suite report here
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

/// How to launch the server under test.
#[derive(clap::Args)]
pub struct SubjectArgs {
    /// Subject binary, invoked as `<subject> <input> <output>`
    #[arg(long, env = "CTXLOG_SUBJECT")]
    pub subject: PathBuf,
    /// Kill the subject after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl SubjectArgs {
    fn build(&self) -> ProcessSubject {
        let subject = ProcessSubject::new(&self.subject);
        match self.timeout_secs {
            Some(secs) => subject.with_timeout(Duration::from_secs(secs)),
            None => subject,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Parses arguments, runs the command and maps the outcome to an exit code.
///
/// Mismatches return `Ok` with [`EXIT_MISMATCH`]; only faults return `Err`.
pub fn entrypoint() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Canon { log } => {
            let canonical = canonicalize(&log)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(canonical.render().as_bytes())?;
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compare {
            actual,
            expected,
            emit_repro,
        } => {
            let verdict = compare_files(&actual, &expected)?;
            report_verdict(&verdict, emit_repro.as_deref(), None)
        }
        Commands::Run {
            input,
            golden,
            subject,
            emit_repro,
        } => {
            let subject = subject.build();
            let verdict = run_case(&subject, &input, &golden)?;
            report_verdict(&verdict, emit_repro.as_deref(), Some(&input))
        }
        Commands::Suite {
            manifest,
            subject,
            keep_going,
            emit_repro,
            report,
        } => {
            let manifest = SuiteManifest::load(&manifest)?;
            if manifest.cases.is_empty() {
                bail!("suite {:?} lists no cases", manifest.name);
            }
            let subject = subject.build();
            let options = SuiteOptions {
                keep_going,
                emit_repro,
            };
            let summary = run_suite(&subject, &manifest, &options, |outcome| {
                match &outcome.status {
                    CaseStatus::Passed => println!("Running test {}... PASSED", outcome.name),
                    CaseStatus::Failed { divergence, repro } => {
                        println!("Running test {}... FAILED", outcome.name);
                        if let Some(d) = divergence {
                            println!("  first divergence at canonical line {} ({})", d.position + 1, d.group());
                        }
                        if let Some(dir) = repro {
                            println!("  repro bundle: {}", dir.display());
                        }
                    }
                    CaseStatus::Errored { message } => {
                        println!("Running test {}... ERROR: {message}", outcome.name);
                    }
                }
            });
            if let Some(path) = report {
                let f = File::create(&path)
                    .with_context(|| format!("failed to create report {}", path.display()))?;
                serde_json::to_writer_pretty(f, &summary)?;
            }
            println!(
                "{}: {}/{} passed{}",
                summary.name,
                summary.passed(),
                manifest.cases.len(),
                if summary.skipped > 0 {
                    format!(", {} skipped", summary.skipped)
                } else {
                    String::new()
                }
            );
            if summary.is_success() {
                Ok(ExitCode::SUCCESS)
            } else if summary
                .outcomes
                .iter()
                .any(|o| matches!(o.status, CaseStatus::Errored { .. }))
            {
                bail!("suite {:?} could not complete", summary.name)
            } else {
                Ok(ExitCode::from(EXIT_MISMATCH))
            }
        }
    }
}

fn report_verdict(verdict: &Verdict, emit_repro: Option<&Path>, input: Option<&Path>) -> Result<ExitCode> {
    if verdict.is_match() {
        println!("PASSED: {} canonical lines identical", verdict.actual().len());
        return Ok(ExitCode::SUCCESS);
    }
    println!("FAILED");
    print!("{}", describe_mismatch(verdict));
    if let Some(dir) = emit_repro {
        emit_repro_bundle(dir, verdict, input)?;
        info!("repro bundle emitted to {}", dir.display());
        println!("repro bundle: {}", dir.display());
    }
    Ok(ExitCode::from(EXIT_MISMATCH))
}
