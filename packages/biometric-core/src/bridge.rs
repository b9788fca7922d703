//! # Biometric Bridge
//!
//! The caller-facing capability object. It holds no per-request state:
//! every call marshals its own request, issues its own handle and waits
//! (or not) on its own primitive.
//!
//! ## Call Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  authenticate(reason, policy)                                           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  AuthenticationRequest::new      ── InvalidArgument ──► Err(message)    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  invoker::submit ── probe false ──► handle.deliver(Errored("not        │
//! │      │                              available"))                       │
//! │      ▼                                                                  │
//! │  platform.evaluate_policy(request, handle)                              │
//! │      │                                                                  │
//! │      ▼  (any thread)                                                    │
//! │  handle.complete(evaluated, error) ──► continuation                     │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  adapter wakes caller ──► encoder::encode ──► TransportResult           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use crate::adapter;
use crate::config::BridgeConfig;
use crate::dispatcher::{CompletionHandle, HandleId};
use crate::encoder::{self, AuthResult};
use crate::error::Result;
use crate::invoker;
use crate::outcome::AuthenticationOutcome;
use crate::platform::{self, BiometricPlatform};
use crate::request::{AuthenticationRequest, Policy};

/// Biometric authentication exposed over a platform collaborator
#[derive(Clone)]
pub struct BiometricBridge {
    platform: Arc<dyn BiometricPlatform>,
    config: BridgeConfig,
}

impl BiometricBridge {
    /// Create a bridge with default configuration
    pub fn new(platform: Arc<dyn BiometricPlatform>) -> Self {
        Self::with_config(platform, BridgeConfig::default())
    }

    /// Create a bridge with explicit configuration
    pub fn with_config(platform: Arc<dyn BiometricPlatform>, config: BridgeConfig) -> Self {
        Self { platform, config }
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ========================================================================
    // CAPABILITY PROBE
    // ========================================================================

    /// Whether biometrics-only evaluation is possible right now
    pub fn can_check_biometrics(&self) -> bool {
        self.can_evaluate(Policy::BiometricsOnly)
    }

    /// Whether `policy` can be evaluated right now
    pub fn can_evaluate(&self, policy: Policy) -> bool {
        platform::probe(self.platform.as_ref(), policy)
    }

    // ========================================================================
    // AUTHENTICATION (transport form)
    // ========================================================================

    /// Authenticate, parking the calling thread until the platform answers
    ///
    /// Do not call this from a thread the platform completes on.
    pub fn authenticate_blocking(&self, reason: &str, policy: Policy) -> AuthResult {
        let result = AuthenticationRequest::new(reason, policy)
            .and_then(|request| self.evaluate_blocking(request));
        encoder::encode_result(result, &self.config.success_marker)
    }

    /// Authenticate, suspending the calling task until the platform answers
    pub async fn authenticate(&self, reason: &str, policy: Policy) -> AuthResult {
        let result = match AuthenticationRequest::new(reason, policy) {
            Ok(request) => self.evaluate(request).await,
            Err(e) => Err(e),
        };
        encoder::encode_result(result, &self.config.success_marker)
    }

    // ========================================================================
    // AUTHENTICATION (outcome form)
    // ========================================================================

    /// Evaluate a marshaled request with the blocking strategy
    pub fn evaluate_blocking(&self, request: AuthenticationRequest) -> Result<AuthenticationOutcome> {
        adapter::wait_blocking(self.platform.as_ref(), request, self.config.wait_timeout())
    }

    /// Evaluate a marshaled request with the suspending strategy
    pub async fn evaluate(&self, request: AuthenticationRequest) -> Result<AuthenticationOutcome> {
        adapter::wait_suspending(self.platform.as_ref(), request, self.config.wait_timeout()).await
    }

    /// Submit without waiting
    ///
    /// Exactly one of `on_complete` or `on_abandon` runs, later, on
    /// whichever thread the platform uses. Returns as soon as the request
    /// is submitted.
    pub fn authenticate_with_callback<C, R>(
        &self,
        request: AuthenticationRequest,
        on_complete: C,
        on_abandon: R,
    ) -> HandleId
    where
        C: FnOnce(AuthenticationOutcome) + Send + 'static,
        R: FnOnce() + Send + 'static,
    {
        let handle = CompletionHandle::new(on_complete).with_release(on_abandon);
        let id = handle.id();
        invoker::submit(self.platform.as_ref(), request, handle);
        id
    }

    /// Encode an outcome with this bridge's success marker
    pub fn encode(&self, result: Result<AuthenticationOutcome>) -> AuthResult {
        encoder::encode_result(result, &self.config.success_marker)
    }
}

impl std::fmt::Debug for BiometricBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiometricBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::TransportResult;
    use crate::platform::{Delivery, SimulatedPlatform, SimulatedResponse};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn bridge_over(platform: &Arc<SimulatedPlatform>) -> BiometricBridge {
        BiometricBridge::new(platform.clone() as Arc<dyn BiometricPlatform>)
    }

    fn scenarios() -> Vec<(SimulatedResponse, AuthResult)> {
        vec![
            (SimulatedResponse::Authenticate, TransportResult::Ok("true".into())),
            (SimulatedResponse::Decline, TransportResult::Err("Authentication failed".into())),
            (SimulatedResponse::user_cancel(), TransportResult::Err("Authentication canceled.".into())),
            (SimulatedResponse::lockout(), TransportResult::Err("Biometry is locked out.".into())),
        ]
    }

    #[test]
    fn test_success_scenario() {
        let platform = Arc::new(SimulatedPlatform::new());
        let bridge = bridge_over(&platform);
        assert_eq!(
            bridge.authenticate_blocking("unlock vault", Policy::BiometricsOnly),
            TransportResult::Ok("true".into())
        );
    }

    #[test]
    fn test_decline_scenarios() {
        let platform = Arc::new(SimulatedPlatform::new().with_response(SimulatedResponse::Decline));
        let bridge = bridge_over(&platform);
        assert_eq!(
            bridge.authenticate_blocking("unlock vault", Policy::BiometricsOnly),
            TransportResult::Err("Authentication failed".into())
        );

        platform.set_response(SimulatedResponse::user_cancel());
        assert_eq!(
            bridge.authenticate_blocking("unlock vault", Policy::BiometricsOnly),
            TransportResult::Err("Authentication canceled.".into())
        );
    }

    #[tokio::test]
    async fn test_strategies_encode_identically() {
        for delivery in [Delivery::Inline, Delivery::Background(Duration::from_millis(5))] {
            for (response, expected) in scenarios() {
                let platform = Arc::new(
                    SimulatedPlatform::new()
                        .with_response(response)
                        .with_delivery(delivery),
                );
                let bridge = bridge_over(&platform);

                let suspended = bridge.authenticate("confirm", Policy::BiometricsOnly).await;
                let blocked = {
                    let bridge = bridge.clone();
                    tokio::task::spawn_blocking(move || {
                        bridge.authenticate_blocking("confirm", Policy::BiometricsOnly)
                    })
                    .await
                    .unwrap()
                };

                assert_eq!(suspended, expected);
                assert_eq!(blocked, expected);
                assert_eq!(platform.evaluate_calls(), 2);
            }
        }
    }

    #[test]
    fn test_unavailable_short_circuits() {
        let platform = Arc::new(SimulatedPlatform::unavailable());
        let bridge = bridge_over(&platform);

        assert!(!bridge.can_check_biometrics());
        assert_eq!(
            bridge.authenticate_blocking("unlock vault", Policy::BiometricsOnly),
            TransportResult::Err("not available".into())
        );
        assert_eq!(platform.evaluate_calls(), 0);
    }

    #[test]
    fn test_probe_is_idempotent_and_never_prompts() {
        let platform = Arc::new(SimulatedPlatform::new());
        let bridge = bridge_over(&platform);

        let answers: Vec<bool> = (0..10).map(|_| bridge.can_check_biometrics()).collect();
        assert!(answers.iter().all(|a| *a));
        assert_eq!(platform.probe_calls(), 10);
        assert_eq!(platform.evaluate_calls(), 0);

        platform.set_available(false);
        assert!(!bridge.can_check_biometrics());
        assert!(!bridge.can_check_biometrics());
    }

    #[tokio::test]
    async fn test_reason_reaches_platform_unmodified() {
        let platform = Arc::new(SimulatedPlatform::new());
        let bridge = bridge_over(&platform);
        let reasons = ["unlock vault", "", "Tresor entsperren 🔐 金庫"];

        for reason in reasons {
            bridge.authenticate_blocking(reason, Policy::BiometricsOnly);
            bridge.authenticate(reason, Policy::BiometricsOrFallback).await;
        }

        let expected: Vec<String> = reasons
            .iter()
            .flat_map(|r| [r.to_string(), r.to_string()])
            .collect();
        assert_eq!(platform.received_reasons(), expected);
    }

    #[tokio::test]
    async fn test_invalid_reason_fails_before_platform() {
        let platform = Arc::new(SimulatedPlatform::new());
        let bridge = bridge_over(&platform);

        let result = bridge.authenticate("bad\0reason", Policy::BiometricsOnly).await;
        assert!(matches!(result, TransportResult::Err(ref m) if m.starts_with("Invalid argument")));
        assert_eq!(platform.probe_calls(), 0);
        assert_eq!(platform.evaluate_calls(), 0);
    }

    #[test]
    fn test_callback_form_delivers_exactly_once() {
        for (response, expected) in scenarios() {
            let platform = Arc::new(SimulatedPlatform::new().with_response(response));
            let bridge = bridge_over(&platform);
            let delivered = Arc::new(Mutex::new(Vec::new()));
            let released = Arc::new(AtomicUsize::new(0));

            let sink = Arc::clone(&delivered);
            let rel = Arc::clone(&released);
            bridge.authenticate_with_callback(
                AuthenticationRequest::new("pay", Policy::BiometricsOnly).unwrap(),
                move |outcome| sink.lock().push(outcome),
                move || {
                    rel.fetch_add(1, Ordering::SeqCst);
                },
            );

            let delivered = delivered.lock();
            assert_eq!(delivered.len(), 1);
            assert_eq!(bridge.encode(Ok(delivered[0].clone())), expected);
            assert_eq!(released.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_teardown_abandons_without_delivery() {
        let platform = Arc::new(SimulatedPlatform::new().with_response(SimulatedResponse::Hold));
        let bridge = bridge_over(&platform);
        let delivered = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));

        let d = Arc::clone(&delivered);
        let r = Arc::clone(&released);
        bridge.authenticate_with_callback(
            AuthenticationRequest::new("pay", Policy::BiometricsOnly).unwrap(),
            move |_| {
                d.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                r.fetch_add(1, Ordering::SeqCst);
            },
        );
        assert_eq!(platform.held_count(), 1);

        assert_eq!(platform.teardown(), 1);
        assert_eq!(platform.teardown(), 0);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dropped_waiter_then_teardown() {
        let platform = Arc::new(SimulatedPlatform::new().with_response(SimulatedResponse::Hold));
        let bridge = bridge_over(&platform);

        let waited = tokio::time::timeout(
            Duration::from_millis(10),
            bridge.authenticate("pay", Policy::BiometricsOnly),
        )
        .await;
        assert!(waited.is_err());

        // Owner goes away after the caller stopped waiting: nothing to deliver to.
        assert_eq!(platform.teardown(), 1);
    }

    #[tokio::test]
    async fn test_configured_timeout() {
        let platform = Arc::new(SimulatedPlatform::new().with_response(SimulatedResponse::Hold));
        let bridge = BiometricBridge::with_config(
            platform.clone() as Arc<dyn BiometricPlatform>,
            BridgeConfig::default().with_wait_timeout(Some(Duration::from_millis(10))),
        );

        assert_eq!(
            bridge.authenticate("pay", Policy::BiometricsOnly).await,
            TransportResult::Err("Authentication timed out".into())
        );
        assert_eq!(
            bridge.authenticate_blocking("pay", Policy::BiometricsOnly),
            TransportResult::Err("Authentication timed out".into())
        );
        assert_eq!(platform.held_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_requests_are_independent() {
        let platform = Arc::new(
            SimulatedPlatform::new().with_delivery(Delivery::Background(Duration::from_millis(5))),
        );
        let bridge = bridge_over(&platform);

        let calls = (0..16).map(|i| {
            let bridge = bridge.clone();
            async move { bridge.authenticate(&format!("request {}", i), Policy::BiometricsOnly).await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| *r == TransportResult::Ok("true".into())));
        assert_eq!(platform.evaluate_calls(), 16);
    }
}
