//! # Biometric Core
//!
//! Exposes a platform's biometric authentication (fingerprint / face match
//! against the secure enclave) to a caller living in another language
//! runtime.
//!
//! The biometric check itself is one platform call. This crate is about
//! getting its answer back across the boundary safely: the completion
//! fires exactly once, platform error objects become plain text, and the
//! caller can wait either by blocking a thread or by suspending a task.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      BIOMETRIC CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  caller (Swift / Kotlin / Rust)                                         │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐                   │
//! │  │   request   │──►│   invoker   │──►│  platform   │                   │
//! │  │ (marshal)   │   │ (submit 1x) │   │ (evaluate)  │                   │
//! │  └─────────────┘   └─────────────┘   └──────┬──────┘                   │
//! │                                             │ completion (any thread)   │
//! │                                             ▼                           │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐                   │
//! │  │   adapter   │◄──│   encoder   │◄──│ dispatcher  │                   │
//! │  │ block/await │   │ (transport) │   │ (one-shot)  │                   │
//! │  └─────────────┘   └─────────────┘   └─────────────┘                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types and FFI error codes
//! - [`config`] - Bridge configuration
//! - [`request`] - Request marshaling
//! - [`outcome`] - Platform completion to outcome
//! - [`encoder`] - Outcome to transport result
//! - [`dispatcher`] - One-shot completion handles
//! - [`invoker`] - Single submission per request
//! - [`adapter`] - Blocking and suspending wait strategies
//! - [`platform`] - Platform collaborator trait and simulator
//! - [`bridge`] - Caller-facing facade
//! - `ffi` - C ABI (feature `ffi`)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod adapter;
pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod invoker;
pub mod outcome;
pub mod platform;
pub mod request;

#[cfg(feature = "ffi")]
pub mod ffi;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use adapter::Strategy;
pub use bridge::BiometricBridge;
pub use config::BridgeConfig;
pub use dispatcher::{CompletionHandle, DispatchState, HandleId};
pub use encoder::{AuthResult, TransportResult};
pub use error::{Error, Result};
pub use outcome::{AuthenticationOutcome, PlatformError, PlatformErrorCode};
pub use platform::BiometricPlatform;
pub use request::{AuthenticationRequest, Policy, RawReason};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Biometric Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        target: std::env::consts::OS,
        ffi: cfg!(feature = "ffi"),
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// Whether the C ABI is compiled in
    pub ffi: bool,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================
