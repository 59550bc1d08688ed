//! The [`RankDbError`] `enum` definition and error messages.
//!
use std::path::PathBuf;
use thiserror::Error;

/// The [`RankDbError`] defines the standard set of errors that should
/// be passed to the user.
#[derive(Debug, Error)]
pub enum RankDbError {
    // Construction and argument errors
    #[error("Database '{0}' doesn't exist or can't be read.")]
    NotFound(PathBuf),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Store related errors
    #[error("Ranking database query failed: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("Ranking database reports an invalid gene count ({0})")]
    InvalidGeneCount(i64),

    // Decode errors
    #[error("Ranking blob for gene '{gene}' has {len} bytes, which is not a multiple of the {width}-byte rank width")]
    BlobLength {
        gene: String,
        len: usize,
        width: usize,
    },
    #[error("Ranking blob for gene '{gene}' decodes to {found} ranks, but the database has {expected} features")]
    RowLength {
        gene: String,
        expected: usize,
        found: usize,
    },
    #[error("Ranking for gene '{0}' is not stored as a blob")]
    NotABlob(String),
    #[error("Ranking scan returned {found} genes, but the database reports {expected}")]
    GeneCountMismatch { expected: usize, found: usize },
    #[error("Ranking matrix shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Gene signature file parsing error: {0}")]
    CsvError(#[from] csv::Error),
    #[cfg(feature = "npy")]
    #[error("Could not write .npy file: {0}")]
    NpyWriteError(#[from] ndarray_npy::WriteNpyError),
}

impl RankDbError {
    /// Whether this error was raised while decoding ranking blobs, as opposed
    /// to failing to reach or query the store.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            RankDbError::BlobLength { .. }
                | RankDbError::RowLength { .. }
                | RankDbError::NotABlob(_)
                | RankDbError::GeneCountMismatch { .. }
                | RankDbError::ShapeError(_)
        )
    }
}
