// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Golden-log harness around `ctxlog-core`.
//!
//! Launches the server under test, captures its log in a scratch directory,
//! and checks it against a golden log with the canonical comparison. Suites of
//! listed cases, repro bundles and the `ctxlog` CLI live here; the comparison
//! itself does not.

pub mod cli;
pub mod repro;
pub mod subject;
pub mod suite;
