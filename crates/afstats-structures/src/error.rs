// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the autofocus statistics pipeline.
//!
//! Sub-calls return an [`AfResult`]; the orchestrator keeps the first
//! failure and still attempts independent best-effort publishes.

/// Common error type for pipeline operations.
///
/// # Examples
/// ```
/// use afstats_structures::AfError;
///
/// let err = AfError::InvalidInput("tuning data".into());
/// assert!(err.is_fatal());
/// assert!(!AfError::OptionalDataAbsent("gyro").is_fatal());
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AfError {
    /// Upstream dependency not yet available; the caller re-schedules.
    #[error("Dependency not ready: {0}")]
    NotReady(String),

    /// Mandatory input missing; the stage's primary publish is skipped.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Library load or capability read failed.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// PD/LCR hardware reported disabled after it was enabled in this session.
    #[error("Hardware consistency violation: {0}")]
    HardwareConsistencyViolation(String),

    /// Optional input (gyro, gravity, TOF, face or tracker ROI) absent.
    #[error("Optional data absent: {0}")]
    OptionalDataAbsent(&'static str),

    /// A bounded list was asked to hold more than its capacity.
    #[error("Capacity {capacity} exceeded while adding {what}")]
    DependencyOverflow { what: String, capacity: usize },

    /// Required previous-frame state is missing.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The algorithm plugin rejected a call.
    #[error("Algorithm failure: {0}")]
    AlgorithmFailure(String),
}

impl AfError {
    /// Whether the failure aborts the current call.
    ///
    /// `NotReady` drives re-scheduling and `OptionalDataAbsent` is
    /// silently omitted; neither is escalated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AfError::NotReady(_) | AfError::OptionalDataAbsent(_))
    }
}

/// Result type for pipeline operations
pub type AfResult<T> = Result<T, AfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(!AfError::NotReady("baf".into()).is_fatal());
        assert!(!AfError::OptionalDataAbsent("tof").is_fatal());
        assert!(AfError::HardwareConsistencyViolation("pd".into()).is_fatal());
        assert!(AfError::DependencyOverflow {
            what: "AfFrameControl".into(),
            capacity: 4
        }
        .is_fatal());
    }

    #[test]
    fn test_display_contains_context() {
        let err = AfError::DependencyOverflow {
            what: "vendor tag 7".into(),
            capacity: 2,
        };
        let text = err.to_string();
        assert!(text.contains("Capacity 2"));
        assert!(text.contains("vendor tag 7"));
    }
}
