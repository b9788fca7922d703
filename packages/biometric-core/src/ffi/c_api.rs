//! # C API
//!
//! C-compatible FFI functions for Swift, Kotlin and other native hosts.
//!
//! All functions follow the naming convention: `bio_<action>`
//!
//! ```text
//! Host                                   Rust
//! ────                                   ────
//! bio_init(vtable, config) ───────────►  install bridge
//! bio_authenticate(reason, policy) ───►  marshal, submit
//!                 ◄─── vtable.evaluate_policy(ctx, policy, reason, token)
//! bio_completion_deliver(token, ..) ──►  handle.complete → waiter wakes
//!                 ◄─── FfiResult
//! bio_free_result(result)
//! ```

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::sync::Arc;

use super::platform::{BioPlatformVTable, ForeignPlatform};
use super::state;
use super::types::*;
use crate::bridge::BiometricBridge;
use crate::config::BridgeConfig;
use crate::dispatcher::HandleId;
use crate::error::{Error, Result};
use crate::outcome::{PlatformError, PlatformErrorCode};
use crate::request::{AuthenticationRequest, Policy};

/// Receives the result of a callback-form authentication
///
/// The callee owns `result` and must free it with `bio_free_result`.
pub type BioResultCallback = extern "C" fn(user_data: *mut c_void, result: FfiResult);

/// Receives `user_data` back when a request is abandoned
pub type BioReleaseCallback = extern "C" fn(user_data: *mut c_void);

#[derive(Clone, Copy)]
struct UserData(*mut c_void);

// SAFETY: the host promises user_data may be handed to any thread.
unsafe impl Send for UserData {}

impl UserData {
    fn into_raw(self) -> *mut c_void {
        self.0
    }
}

fn resolve_policy(raw: i32, config: &BridgeConfig) -> Result<Policy> {
    match raw {
        0 => Ok(config.default_policy),
        raw => Policy::from_raw(raw),
    }
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize the bridge with the host's platform
///
/// Takes ownership of `platform.context` in every case: if
/// initialization fails, `release_context` has run before this returns.
///
/// # Arguments
/// * `platform` - Host biometric API
/// * `config_json` - `BridgeConfig` as JSON (null: defaults + environment)
///
/// # Safety
/// `config_json` must be null or a valid NUL-terminated string. The
/// vtable's functions must be callable from any thread.
#[no_mangle]
pub unsafe extern "C" fn bio_init(
    platform: BioPlatformVTable,
    config_json: *const c_char,
) -> FfiResult {
    let platform = ForeignPlatform::new(platform);
    let generation = platform.generation();
    let platform = Arc::new(platform);

    let config = if config_json.is_null() {
        BridgeConfig::from_env()
    } else {
        match cstr_to_string(config_json) {
            Some(json) => match BridgeConfig::from_json(&json) {
                Ok(config) => config,
                Err(e) => return FfiResult::from_error(&e),
            },
            None => return FfiResult::err(200, "Invalid argument: config is not valid UTF-8"),
        }
    };

    let bridge = BiometricBridge::with_config(platform, config);
    if let Err(e) = state::init_bridge(bridge, generation) {
        return FfiResult::from_error(&e);
    }

    tracing::info!("Biometric bridge initialized (v{})", crate::version());
    FfiResult::ok_empty()
}

/// Shut the bridge down
///
/// Every completion token still held by the host is abandoned: callback
/// callers get `release(user_data)`. The host must not deliver those
/// tokens afterwards. A request still being submitted when this runs is
/// abandoned the same way instead of reaching the platform.
///
/// A thread blocked in `bio_authenticate` at that point is waiting on an
/// abandoned handle, which aborts the process.
#[no_mangle]
pub extern "C" fn bio_shutdown() -> FfiResult {
    match state::shutdown() {
        Ok(abandoned) => {
            tracing::info!("Biometric bridge shut down ({} pending abandoned)", abandoned);
            FfiResult::ok_empty()
        }
        Err(e) => FfiResult::from_error(&e),
    }
}

/// Get the library version (free with `bio_free_string`)
#[no_mangle]
pub extern "C" fn bio_version() -> *mut c_char {
    into_c_string(crate::version())
}

// ============================================================================
// CAPABILITY PROBE
// ============================================================================

/// Whether biometric evaluation is possible right now
///
/// Never prompts. Returns `false` when not initialized.
#[no_mangle]
pub extern "C" fn bio_can_check_biometrics() -> bool {
    match state::current_bridge() {
        Ok(bridge) => bridge.can_check_biometrics(),
        Err(_) => false,
    }
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Authenticate, blocking the calling thread until the platform answers
///
/// # Arguments
/// * `reason` - Localized reason shown in the prompt (UTF-8)
/// * `policy` - `1` biometrics only, `2` with passcode fallback, `0` default
///
/// Never call this on the thread the host delivers completions on.
///
/// # Safety
/// `reason` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bio_authenticate(reason: *const c_char, policy: i32) -> FfiResult {
    let bridge = match state::current_bridge() {
        Ok(b) => b,
        Err(e) => return FfiResult::from_error(&e),
    };

    let request = match resolve_policy(policy, bridge.config())
        .and_then(|policy| AuthenticationRequest::from_c_str(reason, policy))
    {
        Ok(r) => r,
        Err(e) => return FfiResult::from_error(&e),
    };

    FfiResult::from_outcome(bridge.evaluate_blocking(request), &bridge.config().success_marker)
}

/// Authenticate without blocking
///
/// On success the request is submitted and exactly one of
/// `callback(user_data, result)` or `release(user_data)` runs, on an
/// arbitrary thread. On failure neither runs and the host keeps
/// `user_data`.
///
/// Either one may run on the calling thread before this function returns:
/// `callback` when biometrics are unavailable (or the platform answers
/// inline), `release` when `bio_shutdown` races the submission. Hosts must
/// not hold a lock across this call that those callbacks take.
///
/// # Safety
/// `reason` must be null or a valid NUL-terminated string. `user_data`
/// must be usable from any thread.
#[no_mangle]
pub unsafe extern "C" fn bio_authenticate_with_callback(
    reason: *const c_char,
    policy: i32,
    callback: Option<BioResultCallback>,
    user_data: *mut c_void,
    release: Option<BioReleaseCallback>,
) -> FfiResult {
    let Some(callback) = callback else {
        return FfiResult::from_error(&Error::InvalidArgument("callback is null".to_string()));
    };

    let bridge = match state::current_bridge() {
        Ok(b) => b,
        Err(e) => return FfiResult::from_error(&e),
    };

    let request = match resolve_policy(policy, bridge.config())
        .and_then(|policy| AuthenticationRequest::from_c_str(reason, policy))
    {
        Ok(r) => r,
        Err(e) => return FfiResult::from_error(&e),
    };

    let user_data = UserData(user_data);
    let marker = bridge.config().success_marker.clone();
    bridge.authenticate_with_callback(
        request,
        move |outcome| callback(user_data.into_raw(), FfiResult::from_outcome(Ok(outcome), &marker)),
        move || {
            if let Some(release) = release {
                release(user_data.into_raw());
            }
        },
    );

    FfiResult::ok_empty()
}

// ============================================================================
// PLATFORM COMPLETIONS
// ============================================================================

/// Deliver the platform's answer for `completion`
///
/// # Arguments
/// * `evaluated` - Whether the policy evaluated successfully
/// * `error_code` - Platform error code, `0` for none
/// * `error_message` - Localized description (null for none; invalid
///   UTF-8 is replaced, never discarded)
///
/// Delivering an unknown or already-used token aborts the process.
///
/// # Safety
/// `error_message` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bio_completion_deliver(
    completion: u64,
    evaluated: bool,
    error_code: i64,
    error_message: *const c_char,
) {
    let message = if error_message.is_null() {
        None
    } else {
        Some(CStr::from_ptr(error_message).to_string_lossy().into_owned())
    };
    let error = if error_code == 0 && message.is_none() {
        None
    } else {
        Some(PlatformError::new(
            PlatformErrorCode::from_raw(error_code),
            message.unwrap_or_default(),
        ))
    };
    state::pending().deliver(HandleId::from_raw(completion), evaluated, error);
}

/// Give `completion` back without an answer (platform torn down)
///
/// Releasing an unknown or already-used token aborts the process.
#[no_mangle]
pub extern "C" fn bio_completion_release(completion: u64) {
    state::pending().release(HandleId::from_raw(completion));
}

// ============================================================================
// TESTS
// ============================================================================
