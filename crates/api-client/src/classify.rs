//! Sorting responses into success, transient failure and permanent failure

use crate::error::StructuredError;
use fleetline_core::retry::RetryDecision;

/// What a single response means for the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx; the body belongs to the response decoder
    Success,
    /// Transient refusal that may succeed if sent again
    Retry(StructuredError),
    /// Failure that another attempt will not fix
    Permanent(StructuredError),
}

impl Outcome {
    /// Whether the response was a success
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Classify a response by status, decoding the body of anything that is not 2xx.
///
/// Only 412 and 429 are transient. Every other non-2xx status, 5xx included,
/// is permanent.
#[must_use]
pub fn classify(status: u16, body: &[u8]) -> Outcome {
    if (200..300).contains(&status) {
        return Outcome::Success;
    }

    let error = StructuredError::from_body(body);
    match RetryDecision::for_status(status) {
        RetryDecision::Retry => Outcome::Retry(error),
        RetryDecision::Fail => Outcome::Permanent(error),
    }
}
