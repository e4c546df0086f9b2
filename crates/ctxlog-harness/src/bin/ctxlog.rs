// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CLI entry point for the golden-log harness.

use std::process::ExitCode;

use ctxlog_harness::cli::entrypoint;

/// Exit status when no verdict could be produced.
const EXIT_FAULT: u8 = 2;

#[allow(clippy::print_stderr)]
fn main() -> ExitCode {
    match entrypoint() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FAULT)
        }
    }
}
