use std::path::PathBuf;

/// Errors produced while turning a frame into a decision.
///
/// The decision node treats every one of these as an implicit deny for the
/// frame at hand and keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The detection helper could not be started or talked to.
    #[error("detector {program}: {source}")]
    DetectorSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The detection helper exited unsuccessfully.
    #[error("detector {program} exited with {status}: {stderr}")]
    DetectorFailed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// The detection helper produced output that does not parse.
    #[error("detector output is malformed: {0}")]
    DetectorOutput(#[from] serde_json::Error),

    /// A detected embedding is empty or not finite.
    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// The human fallback could not produce an answer.
    #[error("fallback failed: {0}")]
    Fallback(String),

    /// Writing the fallback preview image failed.
    #[error("preview {path}: {source}")]
    Preview {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reading or writing a persisted embedding list.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode embeddings: {0}")]
    Encode(#[source] serde_json::Error),

    /// Members of one list must share a dimension.
    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, DecisionError>;
