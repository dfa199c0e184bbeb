//! Owned string return: `chant_generate` allocates, `chant_free` releases

use crate::ledger::{self, AllocationKind};
use std::ffi::{c_char, CString};
use std::iter;
use std::ptr;

const OPENING: &str = "♪ ";
const REFRAIN: &str = "la ";
const CLOSING: &str = "encore! ♪";

/// Build the chant with `count` refrains
pub fn compose(count: u8) -> String {
    let mut chant =
        String::with_capacity(OPENING.len() + REFRAIN.len() * count as usize + CLOSING.len());
    chant.push_str(OPENING);
    chant.extend(iter::repeat(REFRAIN).take(count as usize));
    chant.push_str(CLOSING);
    chant
}

/// Allocate a NUL-terminated UTF-8 chant and hand ownership to the caller
///
/// The caller must copy what it needs, then pass the same pointer to
/// `chant_free` exactly once.
#[no_mangle]
pub extern "C" fn chant_generate(count: u8) -> *mut c_char {
    match CString::new(compose(count)) {
        Ok(chant) => {
            let len = chant.as_bytes().len();
            let raw = chant.into_raw();
            ledger::register(raw, AllocationKind::CString, len);
            raw
        }
        Err(_) => ptr::null_mut(),
    }
}

/// Release a string returned by `chant_generate`
///
/// Null is a no-op. Any other pointer not issued by `chant_generate` (or
/// already released) is reported and left untouched.
///
/// # Safety
///
/// `chant` must be null or a pointer returned by `chant_generate`.
#[no_mangle]
pub unsafe extern "C" fn chant_free(chant: *mut c_char) {
    if chant.is_null() {
        return;
    }
    if ledger::release(chant, AllocationKind::CString, None, "chant_free").is_ok() {
        drop(CString::from_raw(chant));
    }
}
