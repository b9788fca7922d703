//! # Evaluation Invoker
//!
//! Issues at most one platform evaluation per request and never waits for
//! it. When the policy cannot be evaluated the handle is answered with
//! `Errored("not available")` right here, and the platform's evaluate
//! primitive is never called.

use crate::dispatcher::CompletionHandle;
use crate::outcome::AuthenticationOutcome;
use crate::platform::{self, BiometricPlatform};
use crate::request::AuthenticationRequest;

/// Submit `request` to `platform`, answering through `completion`
pub fn submit(
    platform: &dyn BiometricPlatform,
    request: AuthenticationRequest,
    completion: CompletionHandle,
) {
    let policy = request.policy();
    if !platform::probe(platform, policy) {
        tracing::debug!(
            "Policy {} not available; answering handle {} without prompting",
            policy,
            completion.id()
        );
        completion.deliver(AuthenticationOutcome::not_available());
        return;
    }

    tracing::debug!(
        "Submitting {} evaluation on handle {} (reason: {} bytes)",
        policy,
        completion.id(),
        request.reason().len()
    );
    platform.evaluate_policy(request, completion);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SimulatedPlatform;
    use crate::request::Policy;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_unavailable_never_reaches_platform() {
        let platform = SimulatedPlatform::unavailable();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);

        submit(
            &platform,
            AuthenticationRequest::new("unlock", Policy::BiometricsOnly).unwrap(),
            CompletionHandle::new(move |o| *sink.lock() = Some(o)),
        );

        assert_eq!(platform.evaluate_calls(), 0);
        assert_eq!(*seen.lock(), Some(AuthenticationOutcome::Errored("not available".into())));
    }

    #[test]
    fn test_available_submits_once() {
        let platform = SimulatedPlatform::new();
        submit(
            &platform,
            AuthenticationRequest::new("unlock", Policy::BiometricsOnly).unwrap(),
            CompletionHandle::new(|_| {}),
        );
        assert_eq!(platform.evaluate_calls(), 1);
        assert_eq!(platform.probe_calls(), 1);
    }
}
