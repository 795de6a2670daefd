//! Failure taxonomy for kernel operations.
//!
//! Every variant maps to exactly one user notification. Store failures carry
//! the underlying `anyhow` chain for logging and are shown generically.

use thiserror::Error;

use crate::notify::Severity;

pub type Result<T, E = WildshapeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WildshapeError {
    /// Nothing selected when the action needs a target
    #[error("Select a token to transform first.")]
    NoSelection,
    /// Selected token carries no image
    #[error("No image found on selected token.")]
    NoImage,
    /// None of the requested tokens can take part in the operation
    #[error("None of the selected tokens can be transformed.")]
    NoEligibleTokens,
    #[error("Shape {0} is not in the library.")]
    ShapeNotFound(String),
    #[error("{0} cannot be summoned.")]
    NotSummonable(String),
    #[error("Please enter a name for the shape.")]
    InvalidName,
    #[error("Cannot add: token is already transformed.")]
    AlreadyTransformed,
    #[error("Select the summoning token first.")]
    SummonerMissing,
    /// Image dimensions could not be read
    #[error("Could not read image size for {url}.")]
    DimensionProbe {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("No space adjacent to the summoner.")]
    NoSpaceAdjacent,
    /// Anything the scene store reported
    #[error("Operation failed.")]
    Store(#[from] anyhow::Error),
}

impl WildshapeError {
    /// Severity used when this error is shown to the user
    pub fn severity(&self) -> Severity {
        match self {
            WildshapeError::NoSelection
            | WildshapeError::NoEligibleTokens
            | WildshapeError::NotSummonable(_)
            | WildshapeError::SummonerMissing
            | WildshapeError::AlreadyTransformed
            | WildshapeError::NoSpaceAdjacent => Severity::Warning,
            WildshapeError::NoImage
            | WildshapeError::ShapeNotFound(_)
            | WildshapeError::InvalidName
            | WildshapeError::DimensionProbe { .. }
            | WildshapeError::Store(_) => Severity::Error,
        }
    }

    /// Whether the error came from the store rather than a checked precondition
    pub fn is_store_failure(&self) -> bool {
        matches!(self, WildshapeError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_hide_details_from_the_user() {
        let err = WildshapeError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.to_string(), "Operation failed.");
        assert!(err.is_store_failure());
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn placement_exhaustion_is_a_warning() {
        assert_eq!(WildshapeError::NoSpaceAdjacent.severity(), Severity::Warning);
    }
}
