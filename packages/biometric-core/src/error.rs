//! # Error Handling
//!
//! Error types for the biometric bridge.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Lifecycle Errors                                                  │
//! │  │   ├── NotInitialized        - bio_init() not called yet             │
//! │  │   └── AlreadyInitialized    - bio_init() called twice               │
//! │  │                                                                      │
//! │  ├── InvalidArgument           - Malformed reason text / policy        │
//! │  ├── Unavailable               - Biometrics cannot be attempted        │
//! │  ├── Declined                  - User did not authenticate             │
//! │  ├── Timeout                   - Caller stopped waiting                │
//! │  └── Internal                  - Should not happen                     │
//! │                                                                         │
//! │  Protocol violations (double delivery, abandoned while waited on)      │
//! │  are NOT errors: they panic. See `dispatcher::protocol_violation`.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crossing the Boundary
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR HANDLING FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Internal (Rust)              FFI Boundary              Host (Swift)   │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  ErrorCode + Message  ──────►  throw Error  │
//! │                              (integer + string)                        │
//! │                                                                         │
//! │  Example:                                                              │
//! │  Err(Error::Declined(..))  →  { code: 400, message: "Authentication    │
//! │                                  failed" }                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the biometric bridge
///
/// The `Declined` and `Unavailable` payloads are the exact text handed to
/// the caller, so their `Display` adds no prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Lifecycle Errors (100-199)
    // ========================================================================

    /// The C ABI state has not been initialized
    #[error("Biometric bridge has not been initialized. Call bio_init() first.")]
    NotInitialized,

    /// The C ABI state has already been initialized
    #[error("Biometric bridge has already been initialized.")]
    AlreadyInitialized,

    // ========================================================================
    // Request Errors (200-299)
    // ========================================================================

    /// Malformed input: undecodable reason text, unknown policy, bad config
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Platform Errors (300-399)
    // ========================================================================

    /// Biometric evaluation cannot be attempted (no hardware, not enrolled,
    /// locked out, or the platform reported an error)
    #[error("{0}")]
    Unavailable(String),

    // ========================================================================
    // User Errors (400-499)
    // ========================================================================

    /// The user did not authenticate
    #[error("{0}")]
    Declined(String),

    // ========================================================================
    // Wait Errors (500-599)
    // ========================================================================

    /// The caller stopped waiting before the platform answered
    #[error("{0}")]
    Timeout(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the error code for FFI
    ///
    /// Error codes are organized by category:
    /// - 100-199: Lifecycle
    /// - 200-299: Request
    /// - 300-399: Platform
    /// - 400-499: User
    /// - 500-599: Wait
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::NotInitialized => 100,
            Error::AlreadyInitialized => 101,
            Error::InvalidArgument(_) => 200,
            Error::Unavailable(_) => 300,
            Error::Declined(_) => 400,
            Error::Timeout(_) => 500,
            Error::Internal(_) => 900,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors may succeed if the caller asks again. Nothing is
    /// retried automatically.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Declined(_) | Error::Timeout(_))
    }

    /// Check if this error requires user action (enroll, unlock, ...)
    pub fn requires_user_action(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

// ============================================================================
// FFI ERROR REPRESENTATION
// ============================================================================

/// FFI-friendly error representation
#[derive(Debug, Clone)]
pub struct FfiError {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the error is recoverable
    pub recoverable: bool,
}

impl From<Error> for FfiError {
    fn from(err: Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
