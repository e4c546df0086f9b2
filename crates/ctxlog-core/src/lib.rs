// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Correctness oracle for logs written by a concurrent server.
//!
//! The server tags each line with `ctx <n>:`. Lines from different contexts
//! interleave differently on every run, so golden files cannot be diffed
//! byte-for-byte. This crate reduces a log to its canonical form (grouped by
//! context, file order kept within each context) and compares canonical forms.
//!
//! Everything here is pure and synchronous: each call reads its own files and
//! returns fresh values, so comparisons may run on any number of threads.

pub mod canonical;
pub mod compare;
pub mod error;
pub mod line;

pub use canonical::{canonicalize, CanonicalLog};
pub use compare::{compare_files, compare_logs, Divergence, Verdict};
pub use error::{CompareError, LogReadError};
pub use line::{extract_context, ContextId, Group, LogLine};
