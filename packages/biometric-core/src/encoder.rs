//! # Result Encoder
//!
//! Maps an [`AuthenticationOutcome`] to the two-variant [`TransportResult`]
//! handed across the boundary. Both adapters go through [`encode`], so
//! the encoding does not depend on how the caller waited.
//!
//! Declines are encoded as `Err(message)`, never as `Ok(false)`: callers
//! get exception-style failures and must match on the message if they
//! need to tell a decline from a platform error.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::outcome::AuthenticationOutcome;

/// Default success payload
pub const SUCCESS_MARKER: &str = "true";

/// Two-variant result safe to pass across a foreign-function boundary
///
/// Payloads are plain text, never references to platform objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum TransportResult<T, E> {
    /// Success with value
    Ok(T),
    /// Failure with message
    Err(E),
}

impl<T, E> TransportResult<T, E> {
    /// Whether this is the success variant
    pub fn is_ok(&self) -> bool {
        matches!(self, TransportResult::Ok(_))
    }

    /// Convert into a std `Result`
    pub fn into_result(self) -> std::result::Result<T, E> {
        match self {
            TransportResult::Ok(v) => Ok(v),
            TransportResult::Err(e) => Err(e),
        }
    }
}

impl<T, E> From<std::result::Result<T, E>> for TransportResult<T, E> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(v) => TransportResult::Ok(v),
            Err(e) => TransportResult::Err(e),
        }
    }
}

/// The transport result `authenticate` returns
pub type AuthResult = TransportResult<String, String>;

/// Encode one outcome
pub fn encode(outcome: AuthenticationOutcome, success_marker: &str) -> AuthResult {
    match outcome {
        AuthenticationOutcome::Authenticated => TransportResult::Ok(success_marker.to_string()),
        AuthenticationOutcome::Declined(message) | AuthenticationOutcome::Errored(message) => {
            TransportResult::Err(message)
        }
    }
}

/// Encode an outcome, or the error that stopped us from getting one
pub fn encode_result(result: Result<AuthenticationOutcome>, success_marker: &str) -> AuthResult {
    match result {
        Ok(outcome) => encode(outcome, success_marker),
        Err(e) => TransportResult::Err(e.to_string()),
    }
}
