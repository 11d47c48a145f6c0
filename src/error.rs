// THEORY:
// Every fallible operation in the library reports through this one error type.
// The capability providers (camera, classifier, tracker) live in other crates, so
// their failures arrive boxed inside `Vision` with a short context string. Which
// errors are fatal is decided by the caller: the session swallows detector and
// tracker failures, the pipeline turns read failures into a graceful stop, and
// spreadsheet failures propagate to the binary.

use std::path::PathBuf;
use thiserror::Error;

/// A boxed error coming out of a capability provider.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while counting and logging.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open camera {index}")]
    DeviceOpen { index: i32 },

    #[error("{context}: {source}")]
    Vision {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read workbook: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    #[error("failed to write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("malformed row {row} in {}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wraps a capability provider's error with the operation that failed.
    pub fn vision(context: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Vision {
            context,
            source: source.into(),
        }
    }
}

/// Result type for headcount operations.
pub type Result<T> = std::result::Result<T, Error>;
