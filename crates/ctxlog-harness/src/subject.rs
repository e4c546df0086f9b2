// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The server under test, seen as "instruction file in, log file out".

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Anything that turns an instruction file into a log file.
///
/// The oracle only ever sees the resulting log, so tests can stand in a
/// synthetic implementation for the real server.
pub trait Subject {
    /// Executes `input` and writes the resulting log to `output`.
    fn run(&self, input: &Path, output: &Path) -> Result<()>;
}

impl<S: Subject + ?Sized> Subject for &S {
    fn run(&self, input: &Path, output: &Path) -> Result<()> {
        (**self).run(input, output)
    }
}

/// Runs an external binary as `<program> <input> <output>`.
#[derive(Debug, Clone)]
pub struct ProcessSubject {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessSubject {
    /// Subject backed by `program`, with no time limit.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill the child and fail if it runs longer than `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Path of the wrapped binary.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Subject for ProcessSubject {
    fn run(&self, input: &Path, output: &Path) -> Result<()> {
        debug!(program = %self.program.display(), input = %input.display(), "spawning subject");
        let mut child = Command::new(&self.program)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn subject {}", self.program.display()))?;

        let status = match self.timeout {
            None => child.wait().context("failed to wait for subject")?,
            Some(limit) => wait_with_deadline(&mut child, limit)?,
        };
        if !status.success() {
            bail!("subject {} exited with {}", self.program.display(), status);
        }
        Ok(())
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<ExitStatus> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().context("failed to poll subject")? {
            return Ok(status);
        }
        if started.elapsed() >= limit {
            warn!(?limit, "subject timed out; killing");
            // Reap even if kill races with a natural exit.
            let _ = child.kill();
            let _ = child.wait();
            bail!("subject timed out after {:?}", limit);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
