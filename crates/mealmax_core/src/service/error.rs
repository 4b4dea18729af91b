//! Error classification shared by every service error type.

use std::fmt::{Display, Formatter};

/// Coarse error category used at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Unknown or deleted meal.
    NotFound,
    /// Operation not allowed in the current arena state.
    InvalidState,
    /// Storage, lock or random-source failure. Not caused by the caller.
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::Infrastructure => "infrastructure",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
