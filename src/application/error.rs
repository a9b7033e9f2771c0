use thiserror::Error;

use crate::domain::{DoctorId, ParseAmountError};

/// Errors surfaced to presentation layers.
///
/// The store itself only ever returns `Database`; the other variants are produced
/// by callers when they turn an absent result or rejected input into a message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(DoctorId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] ParseAmountError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
