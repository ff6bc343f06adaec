use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while loading the scene's assets or settings.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    ObjParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("could not decode texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("mesh {0} contains no faces")]
    EmptyMesh(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
