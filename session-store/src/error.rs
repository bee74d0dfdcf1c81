//! Typed error for the session-store crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Session ids are ASCII alphanumerics, `-` or `_`, 1..=64 chars.
    #[error("invalid session id: {0:?}")]
    InvalidId(String),

    /// The cache directory cannot be created.
    #[error("cannot create cache dir {}: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache file exists but cannot be read or decoded.
    #[error("cannot read session cache {}: {reason}", path.display())]
    CacheRead { path: PathBuf, reason: String },

    /// The session could not be persisted (or its cache file removed).
    #[error("cannot write session cache {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
