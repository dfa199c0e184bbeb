//! Scalar and borrowed-input functions

use crate::borrow::{borrowed_slice, borrowed_str};
use crate::ledger::{self, Violation};
use std::ffi::c_char;

/// Wrapping 32-bit addition
#[no_mangle]
pub extern "C" fn add_u32(a: u32, b: u32) -> u32 {
    a.wrapping_add(b)
}

/// Sum of the even elements of a caller-owned array
///
/// The array is only read. Overflow wraps. A null array with `len > 0` is
/// a contract violation and sums to `0`.
///
/// # Safety
///
/// When `len > 0`, `numbers` must be valid for reads of `len` elements for
/// the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn sum_even(numbers: *const u32, len: usize) -> u32 {
    let Some(numbers) = borrowed_slice(numbers, len) else {
        ledger::record(Violation::Null, "sum_even");
        return 0;
    };
    numbers
        .iter()
        .filter(|&&n| n % 2 == 0)
        .fold(0u32, |acc, &n| acc.wrapping_add(n))
}

/// Number of Unicode scalar values in a caller-owned UTF-8 string
///
/// Null or invalid UTF-8 counts as `0`.
///
/// # Safety
///
/// `text` must be null or a NUL-terminated string valid for this call.
#[no_mangle]
pub unsafe extern "C" fn count_chars(text: *const c_char) -> u32 {
    borrowed_str(text)
        .map(|text| text.chars().count() as u32)
        .unwrap_or(0)
}
