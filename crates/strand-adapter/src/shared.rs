//! Process-wide bridge
//!
//! The library is opened on first use and kept until [`shutdown`]. Callers
//! hold `Arc<Bridge>` clones; the library unloads when the last of them and
//! the shared slot have let go.

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use std::sync::{Arc, Mutex, MutexGuard};
use strand_config::LibraryConfig;

static SHARED: Mutex<Option<Arc<Bridge>>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Arc<Bridge>>> {
    SHARED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The shared bridge, opening the configured provider if none is open
pub fn shared(config: &LibraryConfig) -> BridgeResult<Arc<Bridge>> {
    get_or_open(|| Bridge::open(config))
}

/// The shared bridge, creating it with `open` if none is open
///
/// `open` runs at most once per open/shutdown cycle, under the slot's lock.
pub fn get_or_open<F>(open: F) -> BridgeResult<Arc<Bridge>>
where
    F: FnOnce() -> BridgeResult<Bridge>,
{
    let mut slot = slot();
    if let Some(bridge) = slot.as_ref() {
        return Ok(Arc::clone(bridge));
    }
    let bridge = Arc::new(open()?);
    tracing::debug!(origin = %bridge.origin(), "shared bridge opened");
    *slot = Some(Arc::clone(&bridge));
    Ok(bridge)
}

/// Whether a shared bridge is currently open
pub fn is_open() -> bool {
    slot().is_some()
}

/// Drop the shared slot's reference
///
/// Returns `true` if a bridge was open. Outstanding `Arc`s stay valid; the
/// next [`shared`] call opens a new bridge.
pub fn shutdown() -> bool {
    let bridge = slot().take();
    if let Some(bridge) = &bridge {
        tracing::debug!(
            origin = %bridge.origin(),
            outstanding = Arc::strong_count(bridge) - 1,
            "shared bridge shut down"
        );
    }
    bridge.is_some()
}
