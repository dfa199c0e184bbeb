//! Safe wrappers for provider-owned memory
//!
//! Guards pair a returned pointer with the release function declared for it
//! and release exactly once on drop, after the caller has copied what it
//! needs.

use crate::marshal::MarshalError;
use crate::types::RawSlice;
use std::ffi::{c_char, CStr, CString, NulError};
use std::ptr::{self, NonNull};
use std::str::Utf8Error;

/// Release function for provider strings
pub type StringRelease = unsafe extern "C" fn(*mut c_char);

/// Release function for provider `i32` buffers
pub type SliceRelease = unsafe extern "C" fn(*mut i32, usize);

/// Caller-owned C string borrowed by the provider for one call
pub struct SafeCString {
    inner: CString,
}

impl SafeCString {
    pub fn new(s: &str) -> Result<Self, NulError> {
        Ok(Self {
            inner: CString::new(s)?,
        })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.inner.as_ptr()
    }
}

pub fn check_null<T>(ptr: *const T) -> Result<*const T, MarshalError> {
    if ptr.is_null() {
        Err(MarshalError::NullPointer)
    } else {
        Ok(ptr)
    }
}

/// Read-only view of `len` elements the caller does not own
pub struct BoundedBuffer<T> {
    ptr: *const T,
    len: usize,
}

impl<T> BoundedBuffer<T> {
    /// # Safety
    ///
    /// When `len > 0`, `ptr` must be valid for reads of `len` elements for
    /// as long as the buffer is used.
    pub unsafe fn new(ptr: *const T, len: usize) -> Result<Self, MarshalError> {
        if len > 0 {
            check_null(ptr)?;
        }
        Ok(Self { ptr, len })
    }

    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Provider string released through its declared release on drop
pub struct ProviderString {
    ptr: NonNull<c_char>,
    release: StringRelease,
}

impl ProviderString {
    /// Take charge of a string returned by the provider
    ///
    /// Returns `None` for null; there is nothing to release then.
    ///
    /// # Safety
    ///
    /// - `ptr` must be null or a live NUL-terminated string owned by the provider
    /// - `release` must be the provider's release for `ptr` and stay callable
    ///   until this guard drops
    pub unsafe fn from_raw(ptr: *mut c_char, release: StringRelease) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, release })
    }

    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }.to_str()
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr()
    }
}

impl Drop for ProviderString {
    fn drop(&mut self) {
        tracing::trace!(addr = self.ptr.as_ptr() as usize, "releasing provider string");
        unsafe { (self.release)(self.ptr.as_ptr()) }
    }
}

/// Provider `i32` buffer released with the identical `(ptr, len)` on drop
pub struct ProviderSlice {
    raw: RawSlice,
    release: SliceRelease,
}

impl ProviderSlice {
    /// Take charge of a buffer returned by the provider
    ///
    /// Returns `None` when `raw.ptr` is null.
    ///
    /// # Safety
    ///
    /// - `raw` must be exactly what the provider returned, valid for `raw.len` reads
    /// - `release` must be the provider's release for `raw` and stay callable
    ///   until this guard drops
    pub unsafe fn from_raw(raw: RawSlice, release: SliceRelease) -> Option<Self> {
        if raw.ptr.is_null() {
            return None;
        }
        Some(Self { raw, release })
    }

    pub fn as_slice(&self) -> &[i32] {
        unsafe { std::slice::from_raw_parts(self.raw.ptr, self.raw.len) }
    }

    pub fn len(&self) -> usize {
        self.raw.len
    }

    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }
}

impl Drop for ProviderSlice {
    fn drop(&mut self) {
        tracing::trace!(
            addr = self.raw.ptr as usize,
            len = self.raw.len,
            "releasing provider slice"
        );
        unsafe { (self.release)(self.raw.ptr, self.raw.len) }
    }
}

/// Copy exactly `N` elements from provider-static memory
///
/// Nothing is released: fixed arrays belong to the provider for the life of
/// the process.
///
/// # Safety
///
/// `ptr` must be null or valid for reads of `N` elements.
pub unsafe fn read_fixed<const N: usize>(ptr: *const i32) -> Option<[i32; N]> {
    if ptr.is_null() {
        return None;
    }
    Some(ptr::read(ptr as *const [i32; N]))
}
