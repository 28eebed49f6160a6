//! Error types for the twin relay.

use crate::push::PushError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwinError {
    #[error("Twin not found: {0}")]
    NotFound(String),

    #[error("Twin id must not be empty")]
    EmptyId,

    #[error("Invalid content slot '{0}', expected N or H")]
    InvalidSlot(String),

    #[error("Twin already exists: {0}")]
    DuplicateId(String),

    #[error("Twin {0} has no push token")]
    TokenMissing(String),

    #[error("Twin {0} has no relay connection")]
    NotConnected(String),

    #[error("Nothing received from twin {0} yet")]
    NothingToRelay(String),

    #[error("Relay write failed: {0}")]
    WriteError(String),

    #[error("Push dispatch failed: {0}")]
    DispatchError(#[from] PushError),
}

impl From<twinrelay_types::InvalidSlotTag> for TwinError {
    fn from(err: twinrelay_types::InvalidSlotTag) -> Self {
        TwinError::InvalidSlot(err.0)
    }
}
