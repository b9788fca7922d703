//! # Platform Collaborator
//!
//! The bridge consumes exactly two platform operations:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BiometricPlatform                                                      │
//! │  ─────────────────                                                      │
//! │                                                                         │
//! │  • can_evaluate_policy(policy) -> Result<bool, PlatformError>          │
//! │      side-effect free, must not prompt                                  │
//! │                                                                         │
//! │  • evaluate_policy(request, completion)                                 │
//! │      prompts the user; calls completion.complete(..) exactly once,     │
//! │      later, on any thread, or drops it on teardown                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations:
//! - [`simulated::SimulatedPlatform`] - scripted, for tests and the CLI
//! - `ffi::ForeignPlatform` - a vtable registered by the host

pub mod simulated;

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::dispatcher::CompletionHandle;
use crate::outcome::PlatformError;
use crate::request::{AuthenticationRequest, Policy};

pub use simulated::{Delivery, SimulatedPlatform, SimulatedResponse};

/// The platform's biometric policy evaluation capability
pub trait BiometricPlatform: Send + Sync {
    /// Whether `policy` can be evaluated right now
    fn can_evaluate_policy(&self, policy: Policy) -> Result<bool, PlatformError>;

    /// Start evaluating `request`
    ///
    /// Must return without waiting for the user. `completion` may be
    /// completed before this returns, later from another thread, or
    /// dropped if the platform is torn down first.
    fn evaluate_policy(&self, request: AuthenticationRequest, completion: CompletionHandle);
}

/// Capability probe: never fails, never prompts
///
/// Any platform error reads as `false`. So does a panic inside the
/// platform's query in unwinding builds; under `panic = "abort"` (the
/// release profile) a panicking platform takes the process down instead.
pub fn probe(platform: &dyn BiometricPlatform, policy: Policy) -> bool {
    match catch_unwind(AssertUnwindSafe(|| platform.can_evaluate_policy(policy))) {
        Ok(Ok(available)) => available,
        Ok(Err(e)) => {
            tracing::debug!("Capability probe for {} failed: {}", policy, e);
            false
        }
        Err(_) => {
            tracing::warn!("Capability probe for {} panicked; treating as unavailable", policy);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::PlatformErrorCode;

    struct Failing;

    impl BiometricPlatform for Failing {
        fn can_evaluate_policy(&self, _policy: Policy) -> Result<bool, PlatformError> {
            Err(PlatformError::new(PlatformErrorCode::BiometryNotEnrolled, "No identities are enrolled."))
        }

        fn evaluate_policy(&self, _request: AuthenticationRequest, _completion: CompletionHandle) {}
    }

    struct Panicking;

    impl BiometricPlatform for Panicking {
        fn can_evaluate_policy(&self, _policy: Policy) -> Result<bool, PlatformError> {
            panic!("hardware query exploded");
        }

        fn evaluate_policy(&self, _request: AuthenticationRequest, _completion: CompletionHandle) {}
    }

    #[test]
    fn test_probe_error_is_false() {
        assert!(!probe(&Failing, Policy::BiometricsOnly));
    }

    #[test]
    #[cfg(panic = "unwind")]
    fn test_probe_panic_is_false() {
        assert!(!probe(&Panicking, Policy::BiometricsOnly));
    }

    #[test]
    fn test_probe_passes_through_availability() {
        assert!(probe(&SimulatedPlatform::new(), Policy::BiometricsOnly));
        assert!(!probe(&SimulatedPlatform::unavailable(), Policy::BiometricsOrFallback));
    }
}
