//! # Shared FFI State
//!
//! Process-global state behind the C ABI: the active bridge and the table
//! of completion handles currently lent to the host platform.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use crate::bridge::BiometricBridge;
use crate::dispatcher::{protocol_violation, CompletionHandle, HandleId};
use crate::error::{Error, Result};
use crate::outcome::PlatformError;

// ============================================================================
// BRIDGE
// ============================================================================

/// Global state
static STATE: Lazy<RwLock<FfiState>> = Lazy::new(|| RwLock::new(FfiState::default()));

/// Handles lent to the host platform, keyed by token
static PENDING: Lazy<HandleTable> = Lazy::new(HandleTable::new);

/// Source of lending generations, one per registered platform
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// FFI state holding the active bridge
#[derive(Default)]
pub(crate) struct FfiState {
    pub bridge: Option<BiometricBridge>,
}

/// Allocate the lending generation for a new platform registration
pub(crate) fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Install the bridge; fails if one is already installed
///
/// On success the handle table starts lending for `generation`.
pub(crate) fn init_bridge(bridge: BiometricBridge, generation: u64) -> Result<()> {
    let mut state = STATE.write();
    if state.bridge.is_some() {
        return Err(Error::AlreadyInitialized);
    }
    PENDING.open(generation);
    state.bridge = Some(bridge);
    Ok(())
}

/// Clone the active bridge out of the lock
///
/// Callers then block or submit without holding the state lock.
pub(crate) fn current_bridge() -> Result<BiometricBridge> {
    STATE.read().bridge.clone().ok_or(Error::NotInitialized)
}

/// Remove the bridge and abandon every handle still lent out
///
/// Lending is closed in the same critical section, so a submission racing
/// this call has its handle abandoned at `lend` instead of stranded in the
/// table. Returns how many handles were abandoned here.
pub(crate) fn shutdown() -> Result<usize> {
    let (bridge, drained) = {
        let mut state = STATE.write();
        let bridge = state.bridge.take().ok_or(Error::NotInitialized)?;
        (bridge, PENDING.close())
    };

    // Release hooks may call back into the C ABI: run them unlocked.
    let abandoned = drained.len();
    if abandoned > 0 {
        tracing::warn!("Abandoning {} completion handle(s) still held by the platform", abandoned);
    }
    drop(drained);
    // Dropping the last bridge clone releases the host's platform context.
    drop(bridge);
    Ok(abandoned)
}

pub(crate) fn pending() -> &'static HandleTable {
    &PENDING
}

// ============================================================================
// HANDLE TABLE
// ============================================================================

/// Completion handles lent to the host, addressed by their `u64` token
///
/// Tokens are never reused, so a second delivery (or a release after
/// delivery) finds no entry and is reported as a protocol violation.
///
/// The table only lends for the generation of the installed platform. A
/// platform still running after shutdown (or after a re-init) cannot lend
/// any more: its handles are abandoned on the spot.
pub(crate) struct HandleTable {
    inner: Mutex<Lending>,
}

struct Lending {
    generation: Option<u64>,
    handles: HashMap<HandleId, CompletionHandle>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Lending {
                generation: None,
                handles: HashMap::new(),
            }),
        }
    }

    /// Start lending for `generation`
    pub fn open(&self, generation: u64) {
        self.inner.lock().generation = Some(generation);
    }

    /// Lend a handle out for `generation`; returns its token
    ///
    /// Returns `None` if that generation is no longer lending. The handle
    /// has then already been abandoned.
    pub fn lend(&self, generation: u64, handle: CompletionHandle) -> Option<HandleId> {
        let id = handle.id();
        let mut inner = self.inner.lock();
        if inner.generation != Some(generation) {
            drop(inner);
            tracing::warn!("Platform generation {} is shut down; abandoning handle {}", generation, id);
            drop(handle);
            return None;
        }
        inner.handles.insert(id, handle);
        Some(id)
    }

    /// Take a handle back for its single use
    pub fn take(&self, id: HandleId) -> CompletionHandle {
        let handle = self.inner.lock().handles.remove(&id);
        match handle {
            Some(handle) => handle,
            None => protocol_violation(&format!(
                "completion token {} is unknown, already delivered or already released",
                id
            )),
        }
    }

    /// Host delivered the platform completion
    pub fn deliver(&self, id: HandleId, evaluated: bool, error: Option<PlatformError>) {
        // Lock is released before the continuation runs.
        let handle = self.take(id);
        handle.complete(evaluated, error);
    }

    /// Host gave the handle back undelivered
    pub fn release(&self, id: HandleId) {
        drop(self.take(id));
    }

    /// Stop lending and hand back everything still lent out
    ///
    /// The caller drops the returned handles, which abandons them.
    pub fn close(&self) -> Vec<CompletionHandle> {
        let mut inner = self.inner.lock();
        inner.generation = None;
        inner.handles.drain().map(|(_, h)| h).collect()
    }

    #[cfg(test)]
    pub fn contains(&self, id: HandleId) -> bool {
        self.inner.lock().handles.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::AuthenticationOutcome;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    const GENERATION: u64 = 7;

    fn open_table() -> HandleTable {
        let table = HandleTable::new();
        table.open(GENERATION);
        table
    }

    fn counted_handle(released: &Arc<AtomicUsize>) -> CompletionHandle {
        let r = Arc::clone(released);
        CompletionHandle::new(|_| panic!("abandoned handle must not deliver")).with_release(move || {
            r.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_lend_and_deliver() {
        let table = open_table();
        let delivered = Arc::new(parking_lot::Mutex::new(None));
        let sink = Arc::clone(&delivered);

        let id = table
            .lend(GENERATION, CompletionHandle::new(move |o| *sink.lock() = Some(o)))
            .unwrap();
        assert!(table.contains(id));

        table.deliver(id, true, None);
        assert!(!table.contains(id));
        assert_eq!(*delivered.lock(), Some(AuthenticationOutcome::Authenticated));
    }

    #[test]
    fn test_release_runs_abandon_path() {
        let table = open_table();
        let released = Arc::new(AtomicUsize::new(0));

        let id = table.lend(GENERATION, counted_handle(&released)).unwrap();
        table.release(id);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "protocol violation")]
    fn test_double_delivery_faults() {
        let table = open_table();
        let id = table.lend(GENERATION, CompletionHandle::new(|_| {})).unwrap();
        table.deliver(id, true, None);
        table.deliver(id, true, None);
    }

    #[test]
    #[should_panic(expected = "protocol violation")]
    fn test_release_after_delivery_faults() {
        let table = open_table();
        let id = table.lend(GENERATION, CompletionHandle::new(|_| {})).unwrap();
        table.deliver(id, false, None);
        table.release(id);
    }

    #[test]
    fn test_close_abandons_everything_lent() {
        let table = open_table();
        let released = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            table.lend(GENERATION, counted_handle(&released)).unwrap();
        }

        let drained = table.close();
        assert_eq!(drained.len(), 3);
        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(drained);
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert!(table.close().is_empty());
    }

    #[test]
    fn test_lend_after_close_abandons_immediately() {
        let table = open_table();
        table.close();
        let released = Arc::new(AtomicUsize::new(0));

        assert_eq!(table.lend(GENERATION, counted_handle(&released)), None);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(table.close().is_empty());
    }

    #[test]
    fn test_stale_generation_cannot_lend() {
        let table = open_table();
        table.close();
        table.open(GENERATION + 1);
        let released = Arc::new(AtomicUsize::new(0));

        assert_eq!(table.lend(GENERATION, counted_handle(&released)), None);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(table.lend(GENERATION + 1, counted_handle(&released)).is_some());
    }
}
