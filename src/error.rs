use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DetectError>;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("model artifact is incompatible: {0}")]
    IncompatibleArtifact(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("band [{y_start}, {y_stop}) has no rows inside an image of height {height}")]
    InvalidBand {
        y_start: u32,
        y_stop: u32,
        height: u32,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
