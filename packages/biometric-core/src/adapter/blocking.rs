//! Blocking adapter: park the calling thread until the handle is delivered.
//!
//! The caller must not block a thread the platform might schedule the
//! completion on (for example the main thread when the platform answers
//! on the main queue). The adapter cannot detect that; it will deadlock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::dispatcher::{protocol_violation, CompletionHandle};
use crate::error::{Error, Result};
use crate::invoker;
use crate::outcome::{AuthenticationOutcome, TIMED_OUT_MESSAGE};
use crate::platform::BiometricPlatform;
use crate::request::AuthenticationRequest;

enum Slot {
    Empty,
    Ready(AuthenticationOutcome),
    Abandoned,
}

struct Shared {
    slot: Mutex<Slot>,
    signal: Condvar,
}

/// Writing half, owned by the completion handle's continuation
pub struct OutcomeSender {
    shared: Arc<Shared>,
    sent: bool,
}

/// Waiting half, owned by the blocked caller
pub struct OutcomeReceiver {
    shared: Arc<Shared>,
}

/// Create an empty one-shot rendezvous
pub fn channel() -> (OutcomeSender, OutcomeReceiver) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Empty),
        signal: Condvar::new(),
    });
    (
        OutcomeSender {
            shared: Arc::clone(&shared),
            sent: false,
        },
        OutcomeReceiver { shared },
    )
}

impl OutcomeSender {
    /// Store the outcome and wake the waiter
    pub fn send(mut self, outcome: AuthenticationOutcome) {
        self.fill(Slot::Ready(outcome));
        self.sent = true;
    }

    fn fill(&self, value: Slot) {
        *self.shared.slot.lock() = value;
        self.shared.signal.notify_one();
    }
}

impl Drop for OutcomeSender {
    fn drop(&mut self) {
        if !self.sent {
            self.fill(Slot::Abandoned);
        }
    }
}

impl OutcomeReceiver {
    /// Block until the outcome is stored
    ///
    /// Returns `Error::Timeout` if `timeout` elapses first. Panics with a
    /// protocol violation if the handle is abandoned while we wait.
    pub fn wait(self, timeout: Option<Duration>) -> Result<AuthenticationOutcome> {
        // A deadline past the clock's range means waiting forever.
        let deadline = timeout.and_then(|limit| Instant::now().checked_add(limit));
        let mut slot = self.shared.slot.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Empty) {
                Slot::Ready(outcome) => return Ok(outcome),
                Slot::Abandoned => {
                    drop(slot);
                    protocol_violation("completion handle abandoned while a caller was blocked on it");
                }
                Slot::Empty => {}
            }

            match deadline {
                None => self.shared.signal.wait(&mut slot),
                Some(deadline) => {
                    let timed_out = self.shared.signal.wait_until(&mut slot, deadline).timed_out();
                    if timed_out && matches!(*slot, Slot::Empty) {
                        tracing::debug!("Blocking wait gave up; the evaluation keeps running");
                        return Err(Error::Timeout(TIMED_OUT_MESSAGE.to_string()));
                    }
                }
            }
        }
    }
}

/// Submit `request` and park this thread until it is answered
pub fn wait_blocking(
    platform: &dyn BiometricPlatform,
    request: AuthenticationRequest,
    timeout: Option<Duration>,
) -> Result<AuthenticationOutcome> {
    if tokio::runtime::Handle::try_current().is_ok() {
        tracing::warn!(
            "Blocking biometric wait started on an async runtime thread; \
             a completion scheduled on this thread will deadlock"
        );
    }

    let (tx, rx) = channel();
    invoker::submit(platform, request, CompletionHandle::new(move |outcome| tx.send(outcome)));
    rx.wait(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Delivery, SimulatedPlatform, SimulatedResponse};
    use crate::request::Policy;

    fn request(reason: &str) -> AuthenticationRequest {
        AuthenticationRequest::new(reason, Policy::BiometricsOnly).unwrap()
    }

    #[test]
    fn test_inline_delivery_before_wait() {
        let platform = SimulatedPlatform::new();
        let outcome = wait_blocking(&platform, request("unlock vault"), None).unwrap();
        assert_eq!(outcome, AuthenticationOutcome::Authenticated);
    }

    #[test]
    fn test_unrepresentable_deadline_waits_without_one() {
        let platform = SimulatedPlatform::new()
            .with_delivery(Delivery::Background(Duration::from_millis(10)));
        let outcome = wait_blocking(&platform, request("unlock vault"), Some(Duration::MAX)).unwrap();
        assert_eq!(outcome, AuthenticationOutcome::Authenticated);
    }

    #[test]
    fn test_background_delivery() {
        let platform = SimulatedPlatform::new()
            .with_response(SimulatedResponse::Decline)
            .with_delivery(Delivery::Background(Duration::from_millis(20)));
        let outcome = wait_blocking(&platform, request("unlock vault"), None).unwrap();
        assert_eq!(outcome, AuthenticationOutcome::Declined("Authentication failed".into()));
    }

    #[test]
    fn test_timeout_leaves_evaluation_running() {
        let platform = SimulatedPlatform::new().with_response(SimulatedResponse::Hold);
        let result = wait_blocking(&platform, request("unlock vault"), Some(Duration::from_millis(10)));

        assert_eq!(result, Err(Error::Timeout("Authentication timed out".into())));
        assert_eq!(platform.held_count(), 1);
        // Late delivery to a departed waiter is accepted and discarded.
        assert!(platform.release_held(true, None));
    }

    #[test]
    fn test_abandonment_after_timeout_is_quiet() {
        let platform = SimulatedPlatform::new().with_response(SimulatedResponse::Hold);
        let _ = wait_blocking(&platform, request("x"), Some(Duration::from_millis(5)));
        assert_eq!(platform.teardown(), 1);
    }

    #[test]
    #[should_panic(expected = "protocol violation")]
    fn test_abandoned_while_waiting_faults() {
        let platform = SimulatedPlatform::new().with_response(SimulatedResponse::Drop);
        let _ = wait_blocking(&platform, request("x"), None);
    }

    #[test]
    fn test_rendezvous_across_threads() {
        let (tx, rx) = channel();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            tx.send(AuthenticationOutcome::Errored("Biometry is locked out.".into()));
        });
        assert_eq!(
            rx.wait(None).unwrap(),
            AuthenticationOutcome::Errored("Biometry is locked out.".into())
        );
        worker.join().unwrap();
    }
}
