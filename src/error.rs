//! Error type shared by every stage of the pipeline.
//!
//! All errors are fatal to the current run: inputs are static, so nothing
//! here is retried.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MusicXML error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed score: {0}")]
    MalformedScore(String),

    #[error("Unsupported voicing in part '{part}', measure {measure}: {reason}")]
    UnsupportedVoicing {
        part: String,
        measure: i32,
        reason: String,
    },

    #[error("Pitch '{0}' is not one of the instrument's pitch lines")]
    UnknownPitch(String),

    #[error(
        "There is not enough space to print one stave in a page \
        (stave height {stave_height}mm, usable page height {usable_height}mm). \
        Increase the page height or decrease the margin or line spacing."
    )]
    InsufficientPageSpace {
        stave_height: f64,
        usable_height: f64,
    },

    #[error("The score contains no notes to lay out")]
    EmptyScore,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
