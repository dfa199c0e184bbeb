//! Release ledger for everything handed across the boundary
//!
//! Each handle or buffer the provider returns is recorded here by address,
//! together with its kind and element count. Release functions consult the
//! ledger before freeing, so a double release, a foreign address or a wrong
//! length becomes a counted [`Violation`] instead of heap corruption.

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// What kind of provider allocation an address refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationKind {
    /// Boxed `Census` behind an opaque handle
    Census,
    /// NUL-terminated string from `CString::into_raw`
    CString,
    /// Boxed `[i32]` slice returned as `RawSlice`
    I32Slice,
}

impl AllocationKind {
    pub fn name(&self) -> &'static str {
        match self {
            AllocationKind::Census => "census",
            AllocationKind::CString => "c_string",
            AllocationKind::I32Slice => "i32_slice",
        }
    }
}

/// A live ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub kind: AllocationKind,
    /// Element count (bytes for strings, 1 for handles)
    pub len: usize,
}

/// A broken ownership rule detected at a release or use site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Null pointer where a live one was required
    Null,
    /// Address was never issued, or was already released
    Unknown { addr: usize },
    /// Address belongs to another kind of allocation
    KindMismatch {
        addr: usize,
        expected: AllocationKind,
        actual: AllocationKind,
    },
    /// Release length differs from the length handed out
    LengthMismatch {
        addr: usize,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Null => write!(f, "null pointer"),
            Violation::Unknown { addr } => {
                write!(f, "address {:#x} is not a live provider allocation", addr)
            }
            Violation::KindMismatch {
                addr,
                expected,
                actual,
            } => write!(
                f,
                "address {:#x} is a {} allocation, expected {}",
                addr,
                actual.name(),
                expected.name()
            ),
            Violation::LengthMismatch {
                addr,
                expected,
                actual,
            } => write!(
                f,
                "address {:#x} was issued with length {}, released with {}",
                addr, expected, actual
            ),
        }
    }
}

impl std::error::Error for Violation {}

static LIVE: LazyLock<Mutex<HashMap<usize, Allocation>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static VIOLATIONS: AtomicU64 = AtomicU64::new(0);

// Every mutation is a single insert or remove, so a poisoned map is still coherent.
fn live() -> MutexGuard<'static, HashMap<usize, Allocation>> {
    LIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Count `violation` and log where it happened
pub(crate) fn record(violation: Violation, site: &str) -> Violation {
    VIOLATIONS.fetch_add(1, Ordering::Relaxed);
    tracing::warn!(site, %violation, "contract violation");
    violation
}

/// Record a fresh allocation handed to the caller
pub fn register<T>(ptr: *const T, kind: AllocationKind, len: usize) {
    tracing::debug!(addr = ptr as usize, kind = kind.name(), len, "allocation issued");
    live().insert(ptr as usize, Allocation { kind, len });
}

/// Check that `ptr` is a live allocation of `kind` without releasing it
pub fn check<T>(ptr: *const T, kind: AllocationKind, site: &str) -> Result<(), Violation> {
    if ptr.is_null() {
        return Err(record(Violation::Null, site));
    }
    let addr = ptr as usize;
    match live().get(&addr) {
        Some(entry) if entry.kind == kind => Ok(()),
        Some(entry) => Err(record(
            Violation::KindMismatch {
                addr,
                expected: kind,
                actual: entry.kind,
            },
            site,
        )),
        None => Err(record(Violation::Unknown { addr }, site)),
    }
}

/// Remove `ptr` from the ledger if the release matches what was issued
///
/// `len` is compared only when given. On error the entry stays live, so a
/// later release with the right arguments still succeeds.
pub fn release<T>(
    ptr: *const T,
    kind: AllocationKind,
    len: Option<usize>,
    site: &str,
) -> Result<Allocation, Violation> {
    if ptr.is_null() {
        return Err(record(Violation::Null, site));
    }
    let addr = ptr as usize;
    let mut live = live();
    let entry = match live.get(&addr) {
        Some(entry) => *entry,
        None => {
            drop(live);
            return Err(record(Violation::Unknown { addr }, site));
        }
    };

    let mismatch = if entry.kind != kind {
        Some(Violation::KindMismatch {
            addr,
            expected: kind,
            actual: entry.kind,
        })
    } else {
        match len {
            Some(actual) if actual != entry.len => Some(Violation::LengthMismatch {
                addr,
                expected: entry.len,
                actual,
            }),
            _ => None,
        }
    };

    if let Some(violation) = mismatch {
        drop(live);
        return Err(record(violation, site));
    }

    live.remove(&addr);
    tracing::debug!(addr, kind = kind.name(), len = entry.len, "allocation released");
    Ok(entry)
}

/// Whether `ptr` is currently a live allocation
pub fn contains<T>(ptr: *const T) -> bool {
    live().contains_key(&(ptr as usize))
}

/// Number of live allocations across all kinds
pub fn live_count() -> usize {
    live().len()
}

/// Number of violations detected since process start
pub fn violation_count() -> u64 {
    VIOLATIONS.load(Ordering::Relaxed)
}

/// Number of contract violations the provider has detected so far
#[no_mangle]
pub extern "C" fn strand_contract_violations() -> u64 {
    violation_count()
}

/// Number of provider allocations not yet released
#[no_mangle]
pub extern "C" fn strand_live_allocations() -> u64 {
    live_count() as u64
}

/// Whether `addr` is a provider allocation that has not been released
///
/// Only compares the address; never dereferences it.
#[no_mangle]
pub extern "C" fn strand_is_live(addr: *const c_void) -> bool {
    !addr.is_null() && contains(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Distinct fake addresses per test; the ledger never dereferences them.
    fn fake(addr: usize) -> *const u8 {
        addr as *const u8
    }

    #[test]
    fn test_register_then_release() {
        let ptr = fake(0x1000_0010);
        register(ptr, AllocationKind::I32Slice, 6);
        assert!(contains(ptr));

        let entry = release(ptr, AllocationKind::I32Slice, Some(6), "test").unwrap();
        assert_eq!(entry.len, 6);
        assert!(!contains(ptr));
    }

    #[test]
    fn test_double_release_is_unknown() {
        let ptr = fake(0x1000_0020);
        register(ptr, AllocationKind::CString, 12);
        release(ptr, AllocationKind::CString, None, "test").unwrap();

        let again = release(ptr, AllocationKind::CString, None, "test");
        assert_eq!(
            again,
            Err(Violation::Unknown {
                addr: 0x1000_0020
            })
        );
    }

    #[test]
    fn test_length_mismatch_keeps_entry_live() {
        let ptr = fake(0x1000_0030);
        register(ptr, AllocationKind::I32Slice, 6);

        let wrong = release(ptr, AllocationKind::I32Slice, Some(5), "test");
        assert_eq!(
            wrong,
            Err(Violation::LengthMismatch {
                addr: 0x1000_0030,
                expected: 6,
                actual: 5
            })
        );
        assert!(contains(ptr));

        assert!(release(ptr, AllocationKind::I32Slice, Some(6), "test").is_ok());
    }

    #[test]
    fn test_kind_mismatch() {
        let ptr = fake(0x1000_0040);
        register(ptr, AllocationKind::Census, 1);

        let wrong = release(ptr, AllocationKind::CString, None, "test");
        assert!(matches!(wrong, Err(Violation::KindMismatch { .. })));
        assert!(check(ptr, AllocationKind::Census, "test").is_ok());

        release(ptr, AllocationKind::Census, None, "test").unwrap();
    }

    #[test]
    fn test_null_is_a_violation() {
        let before = violation_count();
        assert_eq!(
            release(std::ptr::null::<u8>(), AllocationKind::CString, None, "test"),
            Err(Violation::Null)
        );
        assert!(violation_count() > before);
    }

    #[test]
    fn test_is_live_export() {
        let ptr = fake(0x1000_0050);
        assert!(!strand_is_live(ptr as *const c_void));
        register(ptr, AllocationKind::Census, 1);
        assert!(strand_is_live(ptr as *const c_void));
        release(ptr, AllocationKind::Census, None, "test").unwrap();
        assert!(!strand_is_live(std::ptr::null()));
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::LengthMismatch {
            addr: 0x10,
            expected: 6,
            actual: 3,
        };
        assert_eq!(
            v.to_string(),
            "address 0x10 was issued with length 6, released with 3"
        );
    }
}
