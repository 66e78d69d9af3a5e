use thiserror::Error;

/// Problems confined to a single frame. The run skips the frame and keeps going.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("{field} has {actual} bytes, expected {expected} for shape {shape:?}")]
    ShapeMismatch {
        field: &'static str,
        shape: Vec<i64>,
        expected: usize,
        actual: usize,
    },

    #[error("{field} shape {shape:?} is not a valid {rank}-d shape")]
    BadShape {
        field: &'static str,
        shape: Vec<i64>,
        rank: usize,
    },

    #[error("{field} shape {shape:?} does not match the {height}x{width} pixel grid")]
    GridMismatch {
        field: &'static str,
        shape: Vec<i64>,
        height: usize,
        width: usize,
    },

    #[error("image has {0} channels, expected 3 or 4")]
    UnsupportedChannels(i64),

    #[error("{field} describes {actual} classes, expected {expected}")]
    ClassCountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid camera parameters: {0}")]
    InvalidIntrinsics(String),

    #[error("failed to decode frame record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("segment centroid requested for an empty mask")]
    DegenerateCentroid,
}

/// Problems that abort the whole run.
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("record truncated: expected {expected} bytes, got {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad source pattern: {0}")]
    Glob(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
