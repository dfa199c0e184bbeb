//! Contract type vocabulary and mirror layouts
//!
//! Defines:
//! - `ExternType`: how a parameter or return value crosses the boundary
//! - `CType`: runtime representation of a value at the boundary
//! - `Pair`, `RawSlice`, `CensusOpaque`: the caller's own `#[repr(C)]`
//!   definitions of the provider's layouts
//!
//! Type mapping:
//! - ExternType::U8 → CType::U8(u8)
//! - ExternType::U32 → CType::U32(u32)
//! - ExternType::U64 → CType::U64(u64)
//! - ExternType::Bool → CType::Bool(bool)
//! - ExternType::CharPtr → CType::CharPtr(*const c_char), borrowed
//! - ExternType::U32Array → CType::U32Array { ptr, len }, borrowed
//! - ExternType::Pair → CType::Pair(Pair), by value
//! - ExternType::OwnedCString → CType::OwnedCString(*mut c_char)
//! - ExternType::FixedI32Array(n) → CType::FixedI32Array { ptr, len: n }
//! - ExternType::OwnedI32Slice → CType::OwnedI32Slice(RawSlice)
//! - ExternType::Void → CType::Void
//!
//! Handles and out-slots have no `CType`: they never cross a dynamic call.

use serde::{Deserialize, Serialize};
use std::ffi::c_char;
use std::fmt;
use std::mem::{align_of, size_of};

/// How one parameter or return value crosses the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternType {
    U8,
    U32,
    U64,
    Bool,
    /// Caller-owned NUL-terminated UTF-8, borrowed for one call
    CharPtr,
    /// Caller-owned `(*const u32, usize)`, borrowed for one call
    U32Array,
    /// `#[repr(C)]` struct passed and returned by value
    Pair,
    /// Provider-allocated string the caller must release
    OwnedCString,
    /// Pointer to `n` provider-static elements, never released
    FixedI32Array(usize),
    /// Provider-allocated `RawSlice` the caller must release
    OwnedI32Slice,
    /// Opaque census handle
    Handle,
    /// Caller-provided `*mut u32` written by the provider
    OutU32,
    Void,
}

impl ExternType {
    /// Whether values of this type hand ownership to the caller
    pub fn is_owned(&self) -> bool {
        matches!(self, ExternType::OwnedCString | ExternType::OwnedI32Slice)
    }

    /// Whether a managed `Value` can stand in for this type in a dynamic call
    ///
    /// Handles, out-slots and owned buffers only exist on the typed API.
    pub fn is_dynamic_param(&self) -> bool {
        !matches!(
            self,
            ExternType::Handle
                | ExternType::OutU32
                | ExternType::OwnedCString
                | ExternType::OwnedI32Slice
                | ExternType::FixedI32Array(_)
        )
    }
}

impl fmt::Display for ExternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternType::U8 => write!(f, "u8"),
            ExternType::U32 => write!(f, "u32"),
            ExternType::U64 => write!(f, "u64"),
            ExternType::Bool => write!(f, "bool"),
            ExternType::CharPtr => write!(f, "*const c_char"),
            ExternType::U32Array => write!(f, "*const u32, usize"),
            ExternType::Pair => write!(f, "Pair"),
            ExternType::OwnedCString => write!(f, "*mut c_char"),
            ExternType::FixedI32Array(n) => write!(f, "*const [i32; {}]", n),
            ExternType::OwnedI32Slice => write!(f, "RawSlice"),
            ExternType::Handle => write!(f, "*mut Census"),
            ExternType::OutU32 => write!(f, "*mut u32"),
            ExternType::Void => write!(f, "()"),
        }
    }
}

/// Runtime representation of a value at the boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CType {
    U8(u8),
    U32(u32),
    U64(u64),
    Bool(bool),
    CharPtr(*const c_char),
    U32Array { ptr: *const u32, len: usize },
    Pair(Pair),
    OwnedCString(*mut c_char),
    FixedI32Array { ptr: *const i32, len: usize },
    OwnedI32Slice(RawSlice),
    Void,
}

/// Caller-side definition of the provider's `Pair`
///
/// Must match field for field: `x: u32` at 0, `y: u32` at 4.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pair {
    pub x: u32,
    pub y: u32,
}

impl Pair {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Caller-side definition of the provider's owned `i32` buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSlice {
    pub ptr: *mut i32,
    pub len: usize,
}

/// Target of a census handle; never constructed or dereferenced here
#[repr(C)]
pub struct CensusOpaque {
    _private: [u8; 0],
}

const _: () = assert!(size_of::<Pair>() == 8);
const _: () = assert!(align_of::<Pair>() == 4);
const _: () = assert!(size_of::<RawSlice>() == 2 * size_of::<usize>());
const _: () = assert!(align_of::<RawSlice>() == align_of::<usize>());

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::mem::offset_of;

    #[test]
    fn test_pair_matches_provider_layout() {
        type Theirs = strand_provider::Pair;
        assert_eq!(size_of::<Pair>(), size_of::<Theirs>());
        assert_eq!(align_of::<Pair>(), align_of::<Theirs>());
        assert_eq!(offset_of!(Pair, x), offset_of!(Theirs, x));
        assert_eq!(offset_of!(Pair, y), offset_of!(Theirs, y));
    }

    #[test]
    fn test_raw_slice_matches_provider_layout() {
        type Theirs = strand_provider::RawSlice;
        assert_eq!(size_of::<RawSlice>(), size_of::<Theirs>());
        assert_eq!(align_of::<RawSlice>(), align_of::<Theirs>());
        assert_eq!(offset_of!(RawSlice, ptr), offset_of!(Theirs, ptr));
        assert_eq!(offset_of!(RawSlice, len), offset_of!(Theirs, len));
    }

    #[test]
    fn test_census_opaque_is_zero_sized() {
        assert_eq!(size_of::<CensusOpaque>(), 0);
    }

    #[rstest]
    #[case(ExternType::U32, "u32")]
    #[case(ExternType::CharPtr, "*const c_char")]
    #[case(ExternType::FixedI32Array(3), "*const [i32; 3]")]
    #[case(ExternType::Handle, "*mut Census")]
    #[case(ExternType::Void, "()")]
    fn test_display(#[case] ty: ExternType, #[case] expected: &str) {
        assert_eq!(ty.to_string(), expected);
    }

    #[test]
    fn test_owned_types() {
        assert!(ExternType::OwnedCString.is_owned());
        assert!(ExternType::OwnedI32Slice.is_owned());
        assert!(!ExternType::FixedI32Array(3).is_owned());
        assert!(!ExternType::CharPtr.is_owned());
    }

    #[test]
    fn test_dynamic_params() {
        assert!(ExternType::U32Array.is_dynamic_param());
        assert!(ExternType::Pair.is_dynamic_param());
        assert!(!ExternType::Handle.is_dynamic_param());
        assert!(!ExternType::OutU32.is_dynamic_param());
    }
}
