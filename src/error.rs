use thiserror::Error;

/// Errors surfaced by the geometry kernel, boolean adapter and NFP engine.
///
/// Most of these are recoverable at the call site (see spec §7): a
/// [`NestError::DegenerateInput`] excludes one part from the run, a
/// [`NestError::BooleanOpFailed`] or [`NestError::NfpSanity`] skips one
/// candidate placement. Only [`NestError::NoBin`] aborts the run.
#[derive(Debug, Error)]
pub enum NestError {
    #[error("polygon has fewer than 3 vertices or zero area")]
    DegenerateInput,

    #[error("boolean engine rejected the operation: {0}")]
    BooleanOpFailed(String),

    #[error("computed NFP failed area or closure sanity checks")]
    NfpSanity,

    #[error("no bin polygon configured")]
    NoBin,
}

pub type Result<T> = std::result::Result<T, NestError>;
