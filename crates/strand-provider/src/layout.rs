//! Fixed-layout values: structs by value, static arrays and owned slices

use crate::ledger::{self, AllocationKind};
use std::ptr;

/// Two unsigned 32-bit fields, passed and returned by value
///
/// Layout: `x` at offset 0, `y` at offset 4, size 8, alignment 4.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pair {
    pub x: u32,
    pub y: u32,
}

impl From<(u32, u32)> for Pair {
    fn from((x, y): (u32, u32)) -> Self {
        Pair { x, y }
    }
}

impl From<Pair> for (u32, u32) {
    fn from(pair: Pair) -> Self {
        (pair.x, pair.y)
    }
}

/// Provider-owned `i32` buffer handed to the caller with its length
///
/// Release with `primes_free(ptr, len)` using both fields unchanged.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSlice {
    pub ptr: *mut i32,
    pub len: usize,
}

/// Backing storage for `fixed_triple`; never released, never written
pub static FIXED_TRIPLE: [i32; 3] = [11, 27, 31];

/// Backing storage for `fixed_quad`
pub static FIXED_QUAD: [i32; 4] = [1, 2, 3, 4];

/// Contents of every `primes_vec` allocation
pub const PRIMES: [i32; 6] = [11, 13, 17, 19, 23, 29];

/// Exchange the two fields
#[no_mangle]
pub extern "C" fn swap_pair(pair: Pair) -> Pair {
    Pair {
        x: pair.y,
        y: pair.x,
    }
}

/// Address of a static three-element array
///
/// No release exists: the memory belongs to the provider for the life of the
/// process. Callers read exactly three elements and never write.
#[no_mangle]
pub extern "C" fn fixed_triple() -> *const [i32; 3] {
    &FIXED_TRIPLE
}

/// Address of the first element of a static four-element array
#[no_mangle]
pub extern "C" fn fixed_quad() -> *const i32 {
    FIXED_QUAD.as_ptr()
}

/// Allocate a fresh copy of [`PRIMES`] and hand ownership to the caller
///
/// The buffer is a boxed slice, so its capacity always equals `len`.
#[no_mangle]
pub extern "C" fn primes_vec() -> RawSlice {
    let primes: Box<[i32]> = PRIMES.to_vec().into_boxed_slice();
    let len = primes.len();
    let ptr = Box::into_raw(primes) as *mut i32;
    ledger::register(ptr, AllocationKind::I32Slice, len);
    RawSlice { ptr, len }
}

/// Release a buffer returned by `primes_vec`
///
/// `len` must equal the length returned with `ptr`. A mismatch is reported
/// and the buffer stays allocated rather than being freed with the wrong
/// layout.
///
/// # Safety
///
/// `ptr` must be null or the `ptr` field of a `RawSlice` from `primes_vec`.
#[no_mangle]
pub unsafe extern "C" fn primes_free(ptr: *mut i32, len: usize) {
    if ptr.is_null() {
        return;
    }
    if ledger::release(ptr, AllocationKind::I32Slice, Some(len), "primes_free").is_ok() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn test_pair_layout() {
        assert_eq!(size_of::<Pair>(), 8);
        assert_eq!(align_of::<Pair>(), 4);
        assert_eq!(offset_of!(Pair, x), 0);
        assert_eq!(offset_of!(Pair, y), 4);
    }

    #[test]
    fn test_raw_slice_layout() {
        assert_eq!(size_of::<RawSlice>(), 2 * size_of::<usize>());
        assert_eq!(offset_of!(RawSlice, ptr), 0);
        assert_eq!(offset_of!(RawSlice, len), size_of::<usize>());
    }

    #[test]
    fn test_swap_pair() {
        assert_eq!(swap_pair(Pair { x: 10, y: 20 }), Pair { x: 20, y: 10 });
    }

    #[test]
    fn test_pair_tuple_conversion() {
        let pair = Pair::from((3, 4));
        assert_eq!(<(u32, u32)>::from(pair), (3, 4));
    }

    #[test]
    fn test_fixed_triple_is_static() {
        let first = fixed_triple();
        let second = fixed_triple();
        assert_eq!(first, second);
        assert_eq!(unsafe { *first }, [11, 27, 31]);
    }

    #[test]
    fn test_fixed_quad() {
        let values = unsafe { std::slice::from_raw_parts(fixed_quad(), 4) };
        assert_eq!(values, &[1, 2, 3, 4]);
    }

    #[test]
    #[serial]
    fn test_primes_round_trip() {
        let slice = primes_vec();
        assert_eq!(slice.len, PRIMES.len());
        let copied = unsafe { std::slice::from_raw_parts(slice.ptr, slice.len) }.to_vec();
        assert_eq!(copied, PRIMES);
        unsafe { primes_free(slice.ptr, slice.len) };
        assert!(!ledger::contains(slice.ptr));
    }

    #[test]
    #[serial]
    fn test_primes_free_wrong_length_is_refused() {
        let slice = primes_vec();
        unsafe { primes_free(slice.ptr, slice.len - 1) };
        assert!(ledger::contains(slice.ptr));
        // Contents untouched, correct release still works
        assert_eq!(unsafe { *slice.ptr }, 11);
        unsafe { primes_free(slice.ptr, slice.len) };
        assert!(!ledger::contains(slice.ptr));
    }
}
