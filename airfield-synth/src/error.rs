/// Error types for catalog loading, scene rendering and persistence.
use crate::spawn_point::SizeClass;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    /// Missing or malformed label, metadata or image layout; fatal at load.
    #[error("dataset read error at {}: {reason}", path.display())]
    DatasetRead { path: PathBuf, reason: String },

    #[error("invalid size class tag '{0}' (expected 's' or 'b')")]
    InvalidSizeClass(String),

    #[error("no sprites available for size class {0:?}")]
    EmptyPool(SizeClass),

    #[error("aircraft type '{name}' is missing from the class map")]
    UnknownClass { name: String },

    #[error("sample indices overflow: {count} samples from index {start}")]
    IndexOverflow { start: u64, count: u64 },

    #[error("preview overlay error: {0}")]
    Overlay(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SynthError {
    pub fn dataset(path: &Path, reason: impl Into<String>) -> Self {
        SynthError::DatasetRead {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;
