use std::path::PathBuf;

use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("credential rejected by every service tier")]
    InvalidCredential,
    #[error("unsupported {role} language '{code}'")]
    UnsupportedLanguage { code: String, role: LanguageRole },
    #[error("usage: {0}")]
    Usage(String),
    #[error("'{0}' does not resolve to a leaf in the source tree")]
    UnresolvedPath(String),
    #[error("translation failed: {0}")]
    Translation(String),
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("provider '{0}' is not supported")]
    UnsupportedProvider(String),
    #[error("file format '{0}' is not supported")]
    UnsupportedFormat(String),
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageRole {
    Source,
    Target,
}

impl std::fmt::Display for LanguageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageRole::Source => f.write_str("source"),
            LanguageRole::Target => f.write_str("target"),
        }
    }
}

impl SyncError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
