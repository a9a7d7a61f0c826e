use thiserror::Error;

/// Every way a decode can fail.
///
/// All variants are fatal for the entry being decoded. `ImplausibleResult`
/// only escapes a [`probe`](crate::probe::probe) call as
/// [`NoPlausibleVariant`](DecodeError::NoPlausibleVariant) once every
/// candidate has been tried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Access of {length} bytes at offset {offset} exceeds buffer of {limit} bytes")]
    BoundsViolation {
        offset: usize,
        length: usize,
        limit: usize,
    },

    #[error("Unrecognized control code {code:#04x} at input position {position}")]
    UnrecognizedControlCode { code: u32, position: usize },

    #[error("Unexpected end of input")]
    TruncatedInput,

    #[error("Decoded result failed the plausibility check")]
    ImplausibleResult,

    #[error("None of the {tried} decode variants produced a plausible result")]
    NoPlausibleVariant { tried: usize },

    #[error("Invalid decoder parameters: {0}")]
    InvalidParameters(&'static str),
}

impl DecodeError {
    /// Shorthand for a bounds failure.
    #[inline]
    pub(crate) const fn bounds(offset: usize, length: usize, limit: usize) -> Self {
        Self::BoundsViolation {
            offset,
            length,
            limit,
        }
    }
}

pub type Result<T> = core::result::Result<T, DecodeError>;
