//! # Request Marshaling
//!
//! Turns caller-supplied reason text into an owned [`AuthenticationRequest`].
//!
//! The foreign buffer is only guaranteed to live for the duration of the
//! call that handed it over, so the marshaler always copies before the
//! request is submitted anywhere asynchronous.
//!
//! ```text
//! ┌────────────────────┐     marshal()      ┌─────────────────────────────┐
//! │ RawReason          │ ─────────────────► │ AuthenticationRequest       │
//! │  Utf8(&[u8])       │   copy + validate  │  reason: String (owned)     │
//! │  Utf16(&[u16])     │                    │  policy: Policy             │
//! │  CStr(&CStr)       │                    └─────────────────────────────┘
//! └────────────────────┘
//! ```

use std::ffi::CStr;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which credentials the platform may accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Fingerprint / face only
    #[default]
    BiometricsOnly,
    /// Biometrics, falling back to the device passcode
    BiometricsOrFallback,
}

impl Policy {
    /// Decode the platform's raw policy constant
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            1 => Ok(Policy::BiometricsOnly),
            2 => Ok(Policy::BiometricsOrFallback),
            other => Err(Error::InvalidArgument(format!("unknown policy {}", other))),
        }
    }

    /// Raw platform constant for this policy
    pub fn as_raw(self) -> i32 {
        match self {
            Policy::BiometricsOnly => 1,
            Policy::BiometricsOrFallback => 2,
        }
    }

    /// Parse the snake_case name used in config and on the CLI
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim() {
            "biometrics_only" => Ok(Policy::BiometricsOnly),
            "biometrics_or_fallback" => Ok(Policy::BiometricsOrFallback),
            other => Err(Error::InvalidArgument(format!("unknown policy '{}'", other))),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::BiometricsOnly => f.write_str("biometrics_only"),
            Policy::BiometricsOrFallback => f.write_str("biometrics_or_fallback"),
        }
    }
}

/// Reason text as it arrives from the foreign runtime (borrowed)
#[derive(Debug, Clone, Copy)]
pub enum RawReason<'a> {
    /// UTF-8 bytes (Rust strings, Swift `RustStr`)
    Utf8(&'a [u8]),
    /// UTF-16 code units (JNI, NSString, Windows HSTRING)
    Utf16(&'a [u16]),
    /// NUL-terminated C string
    CStr(&'a CStr),
}

/// A single biometric policy evaluation request
///
/// Immutable once constructed and consumed by the evaluation invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationRequest {
    reason: String,
    policy: Policy,
}

impl AuthenticationRequest {
    /// Build a request from Rust-native text
    ///
    /// Fails with `InvalidArgument` if the text contains a NUL character,
    /// since it must survive a later hop through a C string.
    pub fn new(reason: impl Into<String>, policy: Policy) -> Result<Self> {
        let reason = reason.into();
        if reason.contains('\0') {
            return Err(Error::InvalidArgument(
                "reason contains an interior NUL character".to_string(),
            ));
        }
        Ok(Self { reason, policy })
    }

    /// Copy and validate foreign reason text
    pub fn marshal(raw: RawReason<'_>, policy: Policy) -> Result<Self> {
        let reason = match raw {
            RawReason::Utf8(bytes) => std::str::from_utf8(bytes)
                .map_err(|e| Error::InvalidArgument(format!("reason is not valid UTF-8: {}", e)))?
                .to_owned(),
            RawReason::Utf16(units) => String::from_utf16(units)
                .map_err(|e| Error::InvalidArgument(format!("reason is not valid UTF-16: {}", e)))?,
            RawReason::CStr(c) => c
                .to_str()
                .map_err(|e| Error::InvalidArgument(format!("reason is not valid UTF-8: {}", e)))?
                .to_owned(),
        };
        Self::new(reason, policy)
    }

    /// Copy and validate a NUL-terminated C string
    ///
    /// # Safety
    /// `ptr` must be null or point to a NUL-terminated buffer that stays
    /// valid for the duration of this call.
    pub unsafe fn from_c_str(ptr: *const std::os::raw::c_char, policy: Policy) -> Result<Self> {
        if ptr.is_null() {
            return Err(Error::InvalidArgument("reason is null".to_string()));
        }
        Self::marshal(RawReason::CStr(CStr::from_ptr(ptr)), policy)
    }

    /// The localized reason shown by the platform prompt
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The policy to evaluate
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Split into owned parts
    pub fn into_parts(self) -> (String, Policy) {
        (self.reason, self.policy)
    }
}
