// Error types for the gallery fetcher and the publish helpers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The gallery directory could not be created. Fatal for a run.
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A listing page could not be fetched or decoded.
    #[error("failed to fetch page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The image request itself failed (connect, status, body read).
    #[error("failed to download {name}: {source}")]
    Download {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    /// The image response broke off while its body was being read.
    #[error("failed reading body of {name}: {source}")]
    Stream {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing a local file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// An external program could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external program exited unsuccessfully.
    #[error("`{command}` exited with code {code:?}")]
    CommandFailed { command: String, code: Option<i32> },
}
