// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for reading and comparing logs.

use std::path::PathBuf;

use thiserror::Error;

/// A log could not be turned into text.
///
/// Fatal to the comparison that needed it; never retried.
#[derive(Debug, Error)]
pub enum LogReadError {
    /// The file could not be opened (missing, permissions, ...).
    #[error("cannot open log {path}: {source}")]
    Open {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file opened but reading its bytes failed.
    #[error("cannot read log {path}: {source}")]
    Read {
        /// File that failed mid-read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bytes are not valid UTF-8.
    #[error("log {path} is not valid UTF-8 (first bad byte at offset {offset})")]
    Decode {
        /// File holding the bad bytes.
        path: PathBuf,
        /// Byte offset of the first invalid sequence.
        offset: usize,
    },
}

impl LogReadError {
    /// Path of the log that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. } | Self::Read { path, .. } | Self::Decode { path, .. } => path,
        }
    }
}

/// Failure of a comparison, tagged with the side that could not be read.
#[derive(Debug, Error)]
pub enum CompareError {
    /// The actual (subject-produced) log failed to load.
    #[error("actual log: {0}")]
    Actual(#[source] LogReadError),
    /// The expected (golden) log failed to load.
    #[error("expected log: {0}")]
    Expected(#[source] LogReadError),
}

impl CompareError {
    /// The underlying read error, whichever side it came from.
    pub fn read_error(&self) -> &LogReadError {
        match self {
            Self::Actual(err) | Self::Expected(err) => err,
        }
    }

    /// Unwraps into the underlying read error.
    pub fn into_read_error(self) -> LogReadError {
        match self {
            Self::Actual(err) | Self::Expected(err) => err,
        }
    }
}
