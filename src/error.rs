use crate::models::EntityId;
use thiserror::Error;

/// Why a record buffer could not be turned into a [`ParsedRecord`](crate::models::ParsedRecord).
///
/// These are recoverable: the record is skipped and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("record has no identifier")]
    MissingIdentifier,
    #[error("record {id} has no title")]
    MissingTitle { id: String },
    #[error("record {id} has no year of publication")]
    MissingYear { id: String },
    #[error("record {id} has an unparsable year {value:?}")]
    InvalidYear { id: String, value: String },
}

/// A store was asked for an id no registry issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no entry stored for id {id}")]
    NotFound { id: EntityId },
}

/// A relation log position past the end of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("relation index {index} out of range for log of length {len}")]
    OutOfRange { index: usize, len: usize },
}
