//! # Foreign Platform
//!
//! The host (Swift / Kotlin) registers its biometric API as a vtable of C
//! function pointers. Completion handles cross to the host as `u64`
//! tokens; the host answers each token exactly once through
//! `bio_completion_deliver` or `bio_completion_release`.

use std::ffi::CString;
use std::os::raw::{c_char, c_void};

use super::state;
use crate::dispatcher::CompletionHandle;
use crate::outcome::{AuthenticationOutcome, PlatformError};
use crate::platform::BiometricPlatform;
use crate::request::{AuthenticationRequest, Policy};

/// `canEvaluatePolicy(policy) -> bool`
pub type CanEvaluatePolicyFn = extern "C" fn(context: *mut c_void, policy: i32) -> bool;

/// `evaluatePolicy(policy, reason, completion)`
///
/// `reason` is only valid for the duration of the call; copy it.
pub type EvaluatePolicyFn =
    extern "C" fn(context: *mut c_void, policy: i32, reason: *const c_char, completion: u64);

/// Releases the host context once the bridge is done with it
pub type ReleaseContextFn = extern "C" fn(context: *mut c_void);

/// Host platform registration
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BioPlatformVTable {
    /// Opaque host pointer passed back on every call
    pub context: *mut c_void,
    /// Capability query (null: never available)
    pub can_evaluate_policy: Option<CanEvaluatePolicyFn>,
    /// Policy evaluation (null: never available)
    pub evaluate_policy: Option<EvaluatePolicyFn>,
    /// Context release (null: host keeps ownership)
    pub release_context: Option<ReleaseContextFn>,
}

/// [`BiometricPlatform`] backed by a host vtable
pub struct ForeignPlatform {
    vtable: BioPlatformVTable,
    generation: u64,
}

// SAFETY: the host guarantees its callbacks and context may be used from
// any thread; that is part of the bio_init contract.
unsafe impl Send for ForeignPlatform {}
unsafe impl Sync for ForeignPlatform {}

impl ForeignPlatform {
    /// Take ownership of the host registration
    pub fn new(vtable: BioPlatformVTable) -> Self {
        Self {
            vtable,
            generation: state::next_generation(),
        }
    }

    /// Lending generation of this registration
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl BiometricPlatform for ForeignPlatform {
    fn can_evaluate_policy(&self, policy: Policy) -> Result<bool, PlatformError> {
        match (self.vtable.can_evaluate_policy, self.vtable.evaluate_policy) {
            (Some(can_evaluate), Some(_)) => Ok(can_evaluate(self.vtable.context, policy.as_raw())),
            _ => Ok(false),
        }
    }

    fn evaluate_policy(&self, request: AuthenticationRequest, completion: CompletionHandle) {
        let Some(evaluate) = self.vtable.evaluate_policy else {
            completion.deliver(AuthenticationOutcome::not_available());
            return;
        };

        let (reason, policy) = request.into_parts();
        let reason = match CString::new(reason) {
            Ok(reason) => reason,
            Err(_) => {
                completion.deliver(AuthenticationOutcome::Errored(
                    "reason cannot be passed to the platform".to_string(),
                ));
                return;
            }
        };

        // Shut down while this request was being submitted: the handle has
        // been abandoned and the host never hears about it.
        let Some(token) = state::pending().lend(self.generation, completion) else {
            return;
        };
        evaluate(self.vtable.context, policy.as_raw(), reason.as_ptr(), token.as_raw());
    }
}

impl Drop for ForeignPlatform {
    fn drop(&mut self) {
        if let Some(release) = self.vtable.release_context {
            tracing::debug!("Releasing host platform context");
            release(self.vtable.context);
        }
    }
}
