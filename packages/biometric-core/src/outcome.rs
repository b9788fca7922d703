//! # Authentication Outcome
//!
//! The platform answers a policy evaluation with `(evaluated, error?)`.
//! This module folds that pair into the tri-state [`AuthenticationOutcome`].
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────┐
//! │ Platform completion          │ AuthenticationOutcome                │
//! ├──────────────────────────────┼──────────────────────────────────────┤
//! │ evaluated = true             │ Authenticated                        │
//! │ evaluated = false, no error  │ Declined("Authentication failed")    │
//! │ false, user-decline code     │ Declined(<platform message>)         │
//! │ false, any other code        │ Errored(<platform message>)          │
//! └──────────────────────────────┴──────────────────────────────────────┘
//! ```

use std::fmt;

use crate::error::Error;

/// Message for a decline that came without an error object
pub const DECLINED_MESSAGE: &str = "Authentication failed";

/// Message when evaluation cannot be attempted at all
pub const NOT_AVAILABLE_MESSAGE: &str = "not available";

/// Message when the caller stops waiting
pub const TIMED_OUT_MESSAGE: &str = "Authentication timed out";

/// Platform authentication error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformErrorCode {
    /// The user failed to provide valid credentials
    AuthenticationFailed,
    /// The user tapped cancel
    UserCancel,
    /// The user chose the fallback button
    UserFallback,
    /// The system canceled (another app came to the foreground)
    SystemCancel,
    /// No device passcode is set
    PasscodeNotSet,
    /// No biometric hardware, or access denied
    BiometryNotAvailable,
    /// No fingerprint / face enrolled
    BiometryNotEnrolled,
    /// Too many failed attempts
    BiometryLockout,
    /// The app invalidated the context
    AppCancel,
    /// The context was already invalidated
    InvalidContext,
    /// UI was required but interaction is disallowed
    NotInteractive,
    /// A code this bridge does not know about
    Other(i64),
}

impl PlatformErrorCode {
    /// Decode a raw platform error code
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            -1 => Self::AuthenticationFailed,
            -2 => Self::UserCancel,
            -3 => Self::UserFallback,
            -4 => Self::SystemCancel,
            -5 => Self::PasscodeNotSet,
            -6 => Self::BiometryNotAvailable,
            -7 => Self::BiometryNotEnrolled,
            -8 => Self::BiometryLockout,
            -9 => Self::AppCancel,
            -10 => Self::InvalidContext,
            -1004 => Self::NotInteractive,
            other => Self::Other(other),
        }
    }

    /// Raw platform value
    pub fn as_raw(self) -> i64 {
        match self {
            Self::AuthenticationFailed => -1,
            Self::UserCancel => -2,
            Self::UserFallback => -3,
            Self::SystemCancel => -4,
            Self::PasscodeNotSet => -5,
            Self::BiometryNotAvailable => -6,
            Self::BiometryNotEnrolled => -7,
            Self::BiometryLockout => -8,
            Self::AppCancel => -9,
            Self::InvalidContext => -10,
            Self::NotInteractive => -1004,
            Self::Other(raw) => raw,
        }
    }

    /// Whether the code means the user chose not to (or failed to) authenticate
    pub fn is_user_decline(self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed | Self::UserCancel | Self::UserFallback
        )
    }

    /// Fallback text when the platform sends an empty message
    pub fn default_description(self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "Application retry limit exceeded.",
            Self::UserCancel => "Canceled by user.",
            Self::UserFallback => "Fallback authentication mechanism selected.",
            Self::SystemCancel => "Canceled by system.",
            Self::PasscodeNotSet => "Passcode not set.",
            Self::BiometryNotAvailable => "Biometry is not available on this device.",
            Self::BiometryNotEnrolled => "No identities are enrolled.",
            Self::BiometryLockout => "Biometry is locked out.",
            Self::AppCancel => "Canceled by application.",
            Self::InvalidContext => "Authentication context is invalid.",
            Self::NotInteractive => "User interaction is required.",
            Self::Other(_) => "Authentication error.",
        }
    }
}

/// An error object reported by the platform, already reduced to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    /// Platform error code
    pub code: PlatformErrorCode,
    /// Localized description
    pub message: String,
}

impl PlatformError {
    /// Create a platform error
    pub fn new(code: PlatformErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The message to hand to the caller, never empty
    pub fn description(&self) -> String {
        if self.message.trim().is_empty() {
            self.code.default_description().to_string()
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.code.as_raw())
    }
}

/// Final result of one policy evaluation, produced exactly once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    /// The user authenticated
    Authenticated,
    /// The user did not authenticate
    Declined(String),
    /// Evaluation failed or could not be attempted
    Errored(String),
}

impl AuthenticationOutcome {
    /// Fold a platform completion into an outcome
    pub fn from_completion(evaluated: bool, error: Option<PlatformError>) -> Self {
        match (evaluated, error) {
            (true, None) => Self::Authenticated,
            (true, Some(stray)) => {
                tracing::warn!("Platform reported success with an error attached; ignoring {}", stray);
                Self::Authenticated
            }
            (false, None) => Self::Declined(DECLINED_MESSAGE.to_string()),
            (false, Some(err)) if err.code.is_user_decline() => Self::Declined(err.description()),
            (false, Some(err)) => Self::Errored(err.description()),
        }
    }

    /// The outcome for a request that was never submitted
    pub fn not_available() -> Self {
        Self::Errored(NOT_AVAILABLE_MESSAGE.to_string())
    }

    /// Short label for logs (never includes the message)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::Declined(_) => "declined",
            Self::Errored(_) => "errored",
        }
    }

    /// Whether the user authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// The failure as a bridge error, `None` when authenticated
    pub fn to_error(&self) -> Option<Error> {
        match self {
            Self::Authenticated => None,
            Self::Declined(message) => Some(Error::Declined(message.clone())),
            Self::Errored(message) => Some(Error::Unavailable(message.clone())),
        }
    }
}
