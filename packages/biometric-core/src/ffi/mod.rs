//! # FFI Bindings
//!
//! C ABI for Swift / Kotlin hosts that own the platform biometric API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         FFI ARCHITECTURE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Swift/Kotlin                                                           │
//! │         │  bio_init(vtable)   bio_authenticate(reason, policy)          │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Biometric Core                              │   │
//! │  │                                                                 │   │
//! │  │  BiometricBridge ─► ForeignPlatform ─► vtable.evaluate_policy   │   │
//! │  │                                            │  (u64 token)       │   │
//! │  │  HandleTable ◄── bio_completion_deliver ◄──┘                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  FfiResult { success, error_code, error_message, data }                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Fallible functions return an `FfiResult`; the host frees it with
//! `bio_free_result`. Protocol violations (a token delivered twice, or
//! released after delivery) abort the process.

mod c_api;
mod platform;
mod state;
mod types;

pub use c_api::*;
pub use platform::{BioPlatformVTable, CanEvaluatePolicyFn, EvaluatePolicyFn, ForeignPlatform, ReleaseContextFn};
pub use types::*;
