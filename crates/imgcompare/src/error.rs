use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::decode::Format;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("unsupported image format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {format} image {}", path.display())]
    Decode {
        format: Format,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode highlight image {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to render SVG {}: {reason}", path.display())]
    Render { path: PathBuf, reason: String },

    #[error("timed out after {}s rendering SVG {}", timeout.as_secs(), path.display())]
    Timeout { path: PathBuf, timeout: Duration },
}

impl CompareError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Rejected `--tolerance` / config tolerance value.
#[derive(Debug, Error, PartialEq)]
pub enum ToleranceError {
    #[error("invalid tolerance: {0}")]
    Parse(#[from] std::num::ParseFloatError),

    #[error("tolerance must be a non-negative percentage, got {0}")]
    OutOfRange(f64),
}
