//! Error taxonomy for the scheduling pipeline.
//!
//! Every failure the crate can produce collapses into one of four short
//! codes: `invalid_request`, `infeasible`, `timeout_unknown`,
//! `internal_validation_failed`. The core never returns a partial
//! schedule alongside an error.

use serde::Serialize;
use thiserror::Error;

/// Errors produced anywhere in the scheduling pipeline.
///
/// Each variant carries a `why` list: human-readable strings, each
/// naming the specific entity responsible. Error responses are the
/// only non-schedule output the core ever returns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Structural or semantic error in the request, detected before
    /// search (missing/invalid field, empty route, ineligible
    /// capability, non-monotonic calendar, negative duration, ...).
    #[error("invalid request: {}", why.join("; "))]
    InvalidRequest {
        /// Human-readable reasons, each naming an entity id.
        why: Vec<String>,
    },

    /// The Search Engine proved no assignment satisfies the
    /// constraints. No partial schedule is returned.
    #[error("infeasible: {}", why.join("; "))]
    Infeasible {
        /// Human-readable reasons for infeasibility, where known.
        why: Vec<String>,
    },

    /// The search budget expired without finding any feasible
    /// solution. The caller may retry with a larger budget.
    #[error("timeout before any feasible solution was found")]
    TimeoutUnknown {
        /// Human-readable context (e.g. the budget that expired).
        why: Vec<String>,
    },

    /// The Search Engine returned an assignment that the independent
    /// Validator rejected. This is a fatal engine bug; it is never
    /// expected in a correct build, and no schedule is emitted.
    #[error("internal validation failed: {}", why.join("; "))]
    InternalValidationFailed {
        /// Human-readable description of the violated invariant.
        why: Vec<String>,
    },
}

impl ScheduleError {
    /// Creates an [`InvalidRequest`](Self::InvalidRequest) from a single reason.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            why: vec![reason.into()],
        }
    }

    /// Creates an [`InvalidRequest`](Self::InvalidRequest) from several reasons.
    pub fn invalid_request_many(reasons: Vec<String>) -> Self {
        Self::InvalidRequest { why: reasons }
    }

    /// Creates an [`Infeasible`](Self::Infeasible) with a single reason.
    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::Infeasible {
            why: vec![reason.into()],
        }
    }

    /// Creates a [`TimeoutUnknown`](Self::TimeoutUnknown) with context.
    pub fn timeout_unknown(reason: impl Into<String>) -> Self {
        Self::TimeoutUnknown {
            why: vec![reason.into()],
        }
    }

    /// Creates an [`InternalValidationFailed`](Self::InternalValidationFailed) from a single reason.
    pub fn internal_validation_failed(reason: impl Into<String>) -> Self {
        Self::InternalValidationFailed {
            why: vec![reason.into()],
        }
    }

    /// Creates an [`InternalValidationFailed`](Self::InternalValidationFailed) from several reasons.
    pub fn internal_validation_failed_many(reasons: Vec<String>) -> Self {
        Self::InternalValidationFailed { why: reasons }
    }

    /// The short code used on the wire.
    pub fn short_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Infeasible { .. } => "infeasible",
            Self::TimeoutUnknown { .. } => "timeout_unknown",
            Self::InternalValidationFailed { .. } => "internal_validation_failed",
        }
    }

    /// The `why` list carried by this error.
    pub fn why(&self) -> &[String] {
        match self {
            Self::InvalidRequest { why }
            | Self::Infeasible { why }
            | Self::TimeoutUnknown { why }
            | Self::InternalValidationFailed { why } => why,
        }
    }
}

/// Wire shape of a failure response: `{"error": <code>, "why": [...]}`.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    why: &'a [String],
}

impl Serialize for ScheduleError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse {
            error: self.short_code(),
            why: self.why(),
        }
        .serialize(serializer)
    }
}

/// Convenience alias used throughout the crate.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
