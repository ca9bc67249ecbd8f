use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CssInjectError {
    #[error("Malformed artifact `{name}`: {reason}")]
    MalformedArtifact { name: String, reason: String },

    #[error("Failed to encode {what} as a JavaScript string literal: {source}")]
    Encoding {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid chunk pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid artifact manifest: {0}")]
    Manifest(#[source] serde_json::Error),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CssInjectError {
    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedArtifact {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = CssInjectError> = std::result::Result<T, E>;
