use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures of an import run. Reachability misses are not errors; they
/// only drop the affected record.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file format: {}", display_extension(.0))]
    UnsupportedFormat(String),
    #[error("malformed {format} input: {message}")]
    MalformedInput {
        format: &'static str,
        message: String,
    },
    #[error("unexpected document shape: {0}")]
    SchemaMismatch(String),
    #[error("failed to access {}: {source}", .path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize export: {0}")]
    ExportFailure(#[source] serde_json::Error),
}

impl ImportError {
    pub fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            format,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }
}

fn display_extension(extension: &str) -> String {
    if extension.is_empty() {
        "<none>".to_string()
    } else {
        format!(".{extension}")
    }
}
