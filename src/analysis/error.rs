use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal analysis failures. These are the only errors an analysis run returns;
/// everything else is recorded as an [`Advisory`] on the result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid project root {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("analysis cancelled")]
    Cancelled,
}

/// A dependency manifest exists but could not be understood.
#[derive(Debug, Clone, Error)]
#[error("failed to parse {manifest}: {message}")]
pub struct ManifestParseError {
    pub manifest: String,
    pub message: String,
}

impl ManifestParseError {
    pub fn new(manifest: impl Into<String>, message: impl fmt::Display) -> Self {
        ManifestParseError {
            manifest: manifest.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    PartialReadFailure,
    ManifestParseFailure,
    TreeIntegrityFailure,
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdvisoryKind::PartialReadFailure => "partial read failure",
            AdvisoryKind::ManifestParseFailure => "manifest parse failure",
            AdvisoryKind::TreeIntegrityFailure => "tree integrity failure",
        };
        f.write_str(label)
    }
}

/// Non-fatal diagnostic attached to an otherwise successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    /// Relative path the note is about, empty for the project root.
    pub path: String,
    pub message: String,
}

impl Advisory {
    pub fn new(kind: AdvisoryKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Advisory {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<ManifestParseError> for Advisory {
    fn from(err: ManifestParseError) -> Self {
        Advisory::new(AdvisoryKind::ManifestParseFailure, err.manifest, err.message)
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{} ({}): {}", self.kind, self.path, self.message)
        }
    }
}
