//! Typed results for core operations.
//!
//! Validation and authorization failures are ordinary values returned to the
//! caller; only `Storage` represents a fault the transport layer should
//! surface as a server error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The named entity does not exist. Kept distinct from `Forbidden` so the
    /// transport layer can decide whether to reveal existence to callers with
    /// no relationship to the resource.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller holds no valid grant for the resource.
    #[error("access denied")]
    Forbidden,

    /// The operation requires ownership and the caller is not the owner.
    #[error("caller is not the device owner")]
    NotOwner,

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    InvalidInput(&'static str),

    /// Underlying transactional failure. Multi-step mutations are
    /// all-or-nothing, so this never means a partial apply.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
