//! # Callback Dispatcher
//!
//! [`CompletionHandle`] is the right to deliver exactly one
//! [`AuthenticationOutcome`]. It is handed to the platform with every
//! evaluation and consumed by value when the platform answers.
//!
//! ## State Machine
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      COMPLETION HANDLE LIFECYCLE                        │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │                  deliver(outcome) / complete(..)                        │
//! │    ┌─────────┐  ─────────────────────────────────►  ┌───────────┐      │
//! │    │ Pending │   runs continuation, drops release   │ Delivered │      │
//! │    └─────────┘                                      └───────────┘      │
//! │         │                                                               │
//! │         │ dropped undelivered (owner torn down)                         │
//! │         ▼                                                               │
//! │    ┌───────────┐  runs release hook, continuation is dropped uncalled  │
//! │    │ Abandoned │                                                        │
//! │    └───────────┘                                                        │
//! │                                                                         │
//! │  Delivered and Abandoned are terminal. Delivering twice cannot be      │
//! │  written in Rust (deliver takes self); at the C boundary it is caught  │
//! │  by the handle table and reported through protocol_violation().        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::outcome::{AuthenticationOutcome, PlatformError};

/// Receives the outcome on the delivery path
pub type Continuation = Box<dyn FnOnce(AuthenticationOutcome) + Send + 'static>;

/// Runs on the abandonment path only
pub type ReleaseHook = Box<dyn FnOnce() + Send + 'static>;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value handed across the C boundary
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Rebuild from a raw token
    pub fn from_raw(raw: u64) -> Self {
        HandleId(raw)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dispatch state of a completion handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for the platform
    Pending,
    /// Outcome handed to the continuation
    Delivered,
    /// Dropped before delivery
    Abandoned,
}

/// Report a bridge bug and fault
///
/// Never returns. Under `panic = "abort"`, or inside an `extern "C"`
/// function, this takes the process down.
#[track_caller]
pub fn protocol_violation(detail: &str) -> ! {
    tracing::error!("protocol violation: {}", detail);
    panic!("protocol violation: {}", detail);
}

/// Single-use token for delivering one outcome
pub struct CompletionHandle {
    id: HandleId,
    state: DispatchState,
    continuation: Option<Continuation>,
    release: Option<ReleaseHook>,
}

impl CompletionHandle {
    /// Create a pending handle around a continuation
    pub fn new<F>(continuation: F) -> Self
    where
        F: FnOnce(AuthenticationOutcome) + Send + 'static,
    {
        let id = HandleId::next();
        tracing::debug!("Completion handle {} issued", id);
        Self {
            id,
            state: DispatchState::Pending,
            continuation: Some(Box::new(continuation)),
            release: None,
        }
    }

    /// Attach a hook that runs only if the handle is abandoned
    pub fn with_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }

    /// Identifier for logs and the C handle table
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Current state; `Pending` for any handle you can still hold
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Deliver the platform's raw completion
    pub fn complete(self, evaluated: bool, error: Option<PlatformError>) {
        self.deliver(AuthenticationOutcome::from_completion(evaluated, error));
    }

    /// Deliver an outcome, running the continuation exactly once
    pub fn deliver(mut self, outcome: AuthenticationOutcome) {
        self.transition(DispatchState::Delivered);
        tracing::debug!("Completion handle {} delivered ({})", self.id, outcome.kind());

        // The release hook belongs to the abandonment path only.
        drop(self.release.take());

        match self.continuation.take() {
            Some(continuation) => continuation(outcome),
            None => protocol_violation("completion handle has no continuation"),
        }
    }

    fn transition(&mut self, next: DispatchState) {
        if self.state != DispatchState::Pending {
            protocol_violation(&format!(
                "completion handle {} moved {:?} -> {:?}",
                self.id, self.state, next
            ));
        }
        self.state = next;
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        if self.state != DispatchState::Pending {
            return;
        }
        self.state = DispatchState::Abandoned;
        tracing::warn!("Completion handle {} abandoned before delivery", self.id);

        if let Some(release) = self.release.take() {
            release();
        }
        // Dropped, not called. Waiters observe this through their own
        // channel closing.
        drop(self.continuation.take());
    }
}

impl fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("has_release", &self.release.is_some())
            .finish()
    }
}
