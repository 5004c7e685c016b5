use thiserror::Error;

use super::models::PlaceId;

#[derive(Debug, Error, PartialEq)]
pub enum PlaceError {
    #[error("place {id} not found")]
    UnknownPlace { id: PlaceId },
    #[error("anchor references unknown place {id}")]
    InvalidReference { id: PlaceId },
    #[error("reorder sequence is not a permutation of the current places")]
    OrderMismatch,
    #[error("invalid clock value: {value}")]
    InvalidClock { value: String },
}

pub type PlaceResult<T> = std::result::Result<T, PlaceError>;
