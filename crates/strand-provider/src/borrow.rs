//! Views over caller-owned memory borrowed for the duration of one call

use std::ffi::{c_char, CStr};
use std::slice;

/// Borrow a caller-owned NUL-terminated UTF-8 string
///
/// Returns `None` for a null pointer or invalid UTF-8.
///
/// # Safety
///
/// - `s` must be null or point to a NUL-terminated byte sequence
/// - The bytes must stay unmodified for `'a`, which must not outlive the call
pub unsafe fn borrowed_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

/// Borrow a caller-owned array of `len` elements
///
/// A zero length yields an empty slice even for a null pointer. A null
/// pointer with a non-zero length yields `None`.
///
/// # Safety
///
/// - When non-null, `ptr` must be valid for reads of `len` elements
/// - The elements must stay unmodified for `'a`, which must not outlive the call
pub unsafe fn borrowed_slice<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    Some(slice::from_raw_parts(ptr, len))
}
