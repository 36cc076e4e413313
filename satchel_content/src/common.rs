use std::{
    io,
    path::{Path, PathBuf},
    result,
};

use satchel_shared::{thiserror, ResourceKind};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not open manifest '{path}': {source}")]
    ManifestOpen { path: PathBuf, source: io::Error },
    #[error("Could not parse manifest '{path}' in line {line}: {reason}")]
    ManifestLine { path: PathBuf, line: usize, reason: String },
    #[error("Load request cannot be enqueued because it is not complete: path '{path}', name '{name}'")]
    InvalidRequest { path: String, name: String },
    #[error("Unsupported file format '{extension}' in path {path}")]
    UnsupportedKind { extension: String, path: PathBuf },
    #[error("Failed to decode '{path}' as {kind}: {reason}")]
    Decode { path: PathBuf, kind: ResourceKind, reason: String },
    #[error("No {kind} with the name '{name}' is loaded")]
    NotFound { kind: ResourceKind, name: String },
    #[error("Failed to start the load worker thread")]
    FailedToStartThread,
    #[error("Invalid configuration '{path}': {reason}")]
    Config { path: PathBuf, reason: String },
    #[error("IoError: {0}")]
    IoError(#[from] io::Error),
}

/// Returns the lowercase extension of the path or an empty string when there is none.
pub(crate) fn extract_extension_from_path(path: &Path) -> String {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_lowercase())
        .unwrap_or_default()
}
