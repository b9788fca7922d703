//! Scripted platform used by tests, the example, and the CLI.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::BiometricPlatform;
use crate::dispatcher::CompletionHandle;
use crate::outcome::{PlatformError, PlatformErrorCode};
use crate::request::{AuthenticationRequest, Policy};

/// What the simulated user / platform does with a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedResponse {
    /// `(true, nil)`
    Authenticate,
    /// `(false, nil)`
    Decline,
    /// `(false, error)`
    Fail(PlatformError),
    /// Keep the handle and never answer (until teardown)
    Hold,
    /// Drop the handle immediately without answering
    Drop,
}

impl SimulatedResponse {
    /// The user tapped cancel
    pub fn user_cancel() -> Self {
        SimulatedResponse::Fail(PlatformError::new(
            PlatformErrorCode::UserCancel,
            "Authentication canceled.",
        ))
    }

    /// Too many failed attempts
    pub fn lockout() -> Self {
        SimulatedResponse::Fail(PlatformError::new(
            PlatformErrorCode::BiometryLockout,
            "Biometry is locked out.",
        ))
    }
}

/// Which thread completes the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Before `evaluate_policy` returns, on the calling thread
    Inline,
    /// From a fresh background thread after a delay
    Background(Duration),
}

/// In-memory [`BiometricPlatform`] with call counters
pub struct SimulatedPlatform {
    availability: Mutex<Result<bool, PlatformError>>,
    response: Mutex<SimulatedResponse>,
    delivery: Mutex<Delivery>,
    probe_calls: AtomicUsize,
    evaluate_calls: AtomicUsize,
    received: Mutex<Vec<(String, Policy)>>,
    held: Mutex<Vec<CompletionHandle>>,
}

impl SimulatedPlatform {
    /// Available platform that authenticates inline
    pub fn new() -> Self {
        Self {
            availability: Mutex::new(Ok(true)),
            response: Mutex::new(SimulatedResponse::Authenticate),
            delivery: Mutex::new(Delivery::Inline),
            probe_calls: AtomicUsize::new(0),
            evaluate_calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    /// Platform with no biometric enrolled
    pub fn unavailable() -> Self {
        Self::new().with_availability(Err(PlatformError::new(
            PlatformErrorCode::BiometryNotEnrolled,
            "No identities are enrolled.",
        )))
    }

    /// Set the probe answer
    pub fn with_availability(self, availability: Result<bool, PlatformError>) -> Self {
        *self.availability.lock() = availability;
        self
    }

    /// Set the scripted response
    pub fn with_response(self, response: SimulatedResponse) -> Self {
        self.set_response(response);
        self
    }

    /// Set the delivery thread
    pub fn with_delivery(self, delivery: Delivery) -> Self {
        *self.delivery.lock() = delivery;
        self
    }

    /// Change the scripted response for later requests
    pub fn set_response(&self, response: SimulatedResponse) {
        *self.response.lock() = response;
    }

    /// Simulate enrollment changes
    pub fn set_available(&self, available: bool) {
        *self.availability.lock() = Ok(available);
    }

    /// How often the capability was queried
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// How often an evaluation was started
    pub fn evaluate_calls(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }

    /// Reason texts exactly as they reached the platform
    pub fn received_reasons(&self) -> Vec<String> {
        self.received.lock().iter().map(|(reason, _)| reason.clone()).collect()
    }

    /// Policies exactly as they reached the platform
    pub fn received_policies(&self) -> Vec<Policy> {
        self.received.lock().iter().map(|(_, policy)| *policy).collect()
    }

    /// Handles kept by [`SimulatedResponse::Hold`]
    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// Answer the oldest held handle
    pub fn release_held(&self, evaluated: bool, error: Option<PlatformError>) -> bool {
        let handle = {
            let mut held = self.held.lock();
            if held.is_empty() {
                return false;
            }
            held.remove(0)
        };
        handle.complete(evaluated, error);
        true
    }

    /// Tear the platform down: every held handle is abandoned
    pub fn teardown(&self) -> usize {
        let handles: Vec<_> = std::mem::take(&mut *self.held.lock());
        let count = handles.len();
        drop(handles);
        count
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl BiometricPlatform for SimulatedPlatform {
    fn can_evaluate_policy(&self, _policy: Policy) -> Result<bool, PlatformError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.availability.lock().clone()
    }

    fn evaluate_policy(&self, request: AuthenticationRequest, completion: CompletionHandle) {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        let (reason, policy) = request.into_parts();
        self.received.lock().push((reason, policy));

        let response = self.response.lock().clone();
        let answer = match response {
            SimulatedResponse::Authenticate => (true, None),
            SimulatedResponse::Decline => (false, None),
            SimulatedResponse::Fail(err) => (false, Some(err)),
            SimulatedResponse::Hold => {
                self.held.lock().push(completion);
                return;
            }
            SimulatedResponse::Drop => {
                drop(completion);
                return;
            }
        };

        let delivery = *self.delivery.lock();
        match delivery {
            Delivery::Inline => completion.complete(answer.0, answer.1),
            Delivery::Background(delay) => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    completion.complete(answer.0, answer.1);
                });
            }
        }
    }
}
