//! # Concurrency Adapters
//!
//! The platform answers on an unspecified thread. These adapters turn that
//! single completion into something the caller can wait on.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        WAIT STRATEGIES                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Blocking                          Suspending                           │
//! │  ────────                          ──────────                           │
//! │  caller thread                     caller task                          │
//! │     │ submit(request, handle)         │ submit(request, handle)         │
//! │     ▼                                 ▼                                 │
//! │  Condvar wait  ◄── handle.deliver    .await oneshot ◄── handle.deliver │
//! │     │            (platform thread)    │             (platform thread)   │
//! │     ▼                                 ▼                                 │
//! │  read stored outcome               resumed with owned outcome           │
//! │                                                                         │
//! │  Thread is parked.                 Thread keeps running other tasks.    │
//! │  Deadlocks if the platform         Outcome must be an owned value;      │
//! │  completes on this same thread.    it is.                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The happens-before edge from delivery to the waiter comes from the
//! primitive itself (mutex + condvar, or the oneshot channel). Nothing
//! else is shared between the two sides.

pub mod blocking;
pub mod suspending;

use serde::{Deserialize, Serialize};

pub use blocking::wait_blocking;
pub use suspending::wait_suspending;

/// How a call site waits for the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Park the calling thread
    #[default]
    Blocking,
    /// Suspend the calling task
    Suspending,
}
