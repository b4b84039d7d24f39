//! Error types for netsniff.
//!
//! Uses `thiserror` for ergonomic error definitions. Input errors
//! ([`TargetError`](crate::types::TargetError), [`PortError`](crate::types::PortError),
//! [`ConfigError`]) abort a run before any probing starts. [`ProbeError`] never does:
//! it always ends up as a field of one target's outcome.

use crate::types::{PortError, TargetError};
use serde::{Serialize, Serializer};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Per-target probe failure.
///
/// Attached to an outcome rather than propagated; a batch completes even when
/// every probe in it fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("connection refused")]
    ConnectionRefused,

    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("failed to resolve '{host}': {reason}")]
    Resolve { host: String, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("failed to release connection: {0}")]
    Release(String),

    #[error("no echo reply received")]
    NoReply,

    #[error("echo probe failed: {0}")]
    Echo(String),

    #[error("target has no port")]
    MissingPort,

    #[error("probe faulted: {0}")]
    Faulted(String),

    #[error("connection failed: {0}")]
    Connect(String),
}

impl ProbeError {
    /// Map a socket error from connect/send/receive onto a probe error.
    pub fn from_io(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::ConnectionRefused {
            return Self::ConnectionRefused;
        }
        let text = err.to_string();
        if text.to_lowercase().contains("unreachable") {
            Self::Unreachable(text)
        } else {
            Self::Connect(text)
        }
    }

    /// Whether this failure looks like a missing-privilege condition.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Echo(reason) => {
                let reason = reason.to_lowercase();
                reason.contains("permission denied") || reason.contains("operation not permitted")
            }
            _ => false,
        }
    }
}

impl Serialize for ProbeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors raised while loading application settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    InvalidValue(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the command layer.
///
/// Everything here aborts the invocation with a non-zero exit code.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("failed to create output file {path}: {source}")]
    OutputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for command handlers.
pub type CliResult<T> = Result<T, CliError>;
