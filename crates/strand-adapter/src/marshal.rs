//! Value marshaling - managed values ↔ boundary values
//!
//! - `MarshalContext::to_c()`: build the boundary representation of an argument
//! - `MarshalContext::from_c()`: copy a returned value into a managed `Value`
//!
//! # Memory Safety
//!
//! - Borrowed strings and arrays are owned by the context until it drops,
//!   which is always after the call returns
//! - Returned pointers are null-checked and copied, never retained
//! - Range validation for every integer narrowing

use crate::safety::{check_null, BoundedBuffer};
use crate::types::{CType, ExternType, Pair};
use crate::value::Value;
use std::ffi::{CStr, CString};

/// Marshal error types
#[derive(Debug, Clone, PartialEq)]
pub enum MarshalError {
    /// Value kind does not fit the declared boundary type
    TypeMismatch { expected: String, got: String },
    /// Null pointer where data was expected
    NullPointer,
    /// String contains a NUL byte or is not UTF-8
    InvalidString(String),
    /// Integer does not fit the declared boundary type
    NumberOutOfRange { value: i128, target: String },
}

impl std::fmt::Display for MarshalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarshalError::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
            MarshalError::NullPointer => write!(f, "Null pointer"),
            MarshalError::InvalidString(msg) => write!(f, "Invalid string: {}", msg),
            MarshalError::NumberOutOfRange { value, target } => {
                write!(f, "Number {} out of range for {}", value, target)
            }
        }
    }
}

impl std::error::Error for MarshalError {}

fn narrow<T: TryFrom<i64>>(value: i64, target: &ExternType) -> Result<T, MarshalError> {
    T::try_from(value).map_err(|_| MarshalError::NumberOutOfRange {
        value: i128::from(value),
        target: target.to_string(),
    })
}

/// Marshal context for one call
///
/// Keeps every temporary buffer an argument points into alive until the
/// context is dropped.
///
/// # Example
///
/// ```
/// # use strand_adapter::marshal::MarshalContext;
/// # use strand_adapter::types::{CType, ExternType};
/// # use strand_adapter::value::Value;
/// let mut ctx = MarshalContext::new();
/// let c_value = ctx.to_c(&Value::Int(42), &ExternType::U32).unwrap();
/// assert_eq!(c_value, CType::U32(42));
/// ```
#[derive(Debug, Default)]
pub struct MarshalContext {
    strings: Vec<CString>,
    arrays: Vec<Box<[u32]>>,
}

impl MarshalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marshal a managed value as an argument of type `target`
    ///
    /// Pointers in the result stay valid for as long as `self` lives.
    pub fn to_c(&mut self, value: &Value, target: &ExternType) -> Result<CType, MarshalError> {
        match (value, target) {
            (Value::Int(n), ExternType::U8) => Ok(CType::U8(narrow(*n, target)?)),
            (Value::Int(n), ExternType::U32) => Ok(CType::U32(narrow(*n, target)?)),
            (Value::Int(n), ExternType::U64) => Ok(CType::U64(narrow(*n, target)?)),

            (Value::Bool(b), ExternType::Bool) => Ok(CType::Bool(*b)),

            (Value::Text(s), ExternType::CharPtr) => {
                let c_string = CString::new(s.as_str()).map_err(|e| {
                    MarshalError::InvalidString(format!("String contains null byte: {}", e))
                })?;
                // The heap buffer does not move when the CString does
                let ptr = c_string.as_ptr();
                self.strings.push(c_string);
                Ok(CType::CharPtr(ptr))
            }

            (Value::List(items), ExternType::U32Array) => {
                let numbers = items
                    .iter()
                    .map(|item| match item {
                        Value::Int(n) => narrow::<u32>(*n, &ExternType::U32),
                        other => Err(MarshalError::TypeMismatch {
                            expected: "list of u32".to_string(),
                            got: format!("list containing {}", other.type_name()),
                        }),
                    })
                    .collect::<Result<Box<[u32]>, _>>()?;
                let (ptr, len) = (numbers.as_ptr(), numbers.len());
                self.arrays.push(numbers);
                Ok(CType::U32Array { ptr, len })
            }

            (Value::Pair(x, y), ExternType::Pair) => Ok(CType::Pair(Pair::new(*x, *y))),

            (Value::Null, ExternType::Void) => Ok(CType::Void),

            _ => Err(MarshalError::TypeMismatch {
                expected: target.to_string(),
                got: value.type_name().to_string(),
            }),
        }
    }

    /// Copy a boundary value into a managed `Value`
    ///
    /// Owned returns are copied but not released; releasing is the caller's
    /// job once the copy exists.
    ///
    /// # Safety
    ///
    /// Every pointer in `c_value` must be null or valid for reads of the data
    /// its type describes (a NUL-terminated string, or `len` elements).
    pub unsafe fn from_c(&self, c_value: &CType) -> Result<Value, MarshalError> {
        match c_value {
            CType::U8(n) => Ok(Value::Int(i64::from(*n))),
            CType::U32(n) => Ok(Value::Int(i64::from(*n))),
            CType::U64(n) => i64::try_from(*n)
                .map(Value::Int)
                .map_err(|_| MarshalError::NumberOutOfRange {
                    value: i128::from(*n),
                    target: "int".to_string(),
                }),

            CType::Bool(b) => Ok(Value::Bool(*b)),

            CType::CharPtr(ptr) => copy_str(*ptr),
            CType::OwnedCString(ptr) => copy_str(*ptr),

            CType::U32Array { ptr, len } => {
                let buffer = BoundedBuffer::new(*ptr, *len)?;
                Ok(Value::ints(buffer.as_slice().iter().copied()))
            }
            CType::FixedI32Array { ptr, len } => {
                check_null(*ptr)?;
                let buffer = BoundedBuffer::new(*ptr, *len)?;
                Ok(Value::ints(buffer.as_slice().iter().copied()))
            }
            CType::OwnedI32Slice(raw) => {
                let buffer = BoundedBuffer::new(raw.ptr as *const i32, raw.len)?;
                Ok(Value::ints(buffer.as_slice().iter().copied()))
            }

            CType::Pair(pair) => Ok(Value::Pair(pair.x, pair.y)),

            CType::Void => Ok(Value::Null),
        }
    }
}

unsafe fn copy_str(ptr: *const std::ffi::c_char) -> Result<Value, MarshalError> {
    let ptr = check_null(ptr)?;
    let s = CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| MarshalError::InvalidString(format!("Invalid UTF-8: {}", e)))?;
    Ok(Value::text(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawSlice;
    use rstest::rstest;
    use std::ffi::c_char;

    #[rstest]
    #[case(Value::Int(0), ExternType::U8, CType::U8(0))]
    #[case(Value::Int(255), ExternType::U8, CType::U8(255))]
    #[case(Value::Int(4_000_000_000), ExternType::U32, CType::U32(4_000_000_000))]
    #[case(Value::Int(1 << 40), ExternType::U64, CType::U64(1 << 40))]
    #[case(Value::Bool(true), ExternType::Bool, CType::Bool(true))]
    #[case(Value::Pair(1, 2), ExternType::Pair, CType::Pair(Pair::new(1, 2)))]
    #[case(Value::Null, ExternType::Void, CType::Void)]
    fn test_to_c(#[case] value: Value, #[case] target: ExternType, #[case] expected: CType) {
        let mut ctx = MarshalContext::new();
        assert_eq!(ctx.to_c(&value, &target).unwrap(), expected);
    }

    #[rstest]
    #[case(256, ExternType::U8)]
    #[case(-1, ExternType::U8)]
    #[case(-1, ExternType::U32)]
    #[case(1 << 32, ExternType::U32)]
    #[case(-1, ExternType::U64)]
    fn test_to_c_out_of_range(#[case] n: i64, #[case] target: ExternType) {
        let mut ctx = MarshalContext::new();
        assert!(matches!(
            ctx.to_c(&Value::Int(n), &target),
            Err(MarshalError::NumberOutOfRange { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let mut ctx = MarshalContext::new();
        let err = ctx.to_c(&Value::text("1"), &ExternType::U32).unwrap_err();
        assert_eq!(
            err,
            MarshalError::TypeMismatch {
                expected: "u32".to_string(),
                got: "text".to_string(),
            }
        );
    }

    #[test]
    fn test_string_pinned_until_drop() {
        let mut ctx = MarshalContext::new();
        let c_value = ctx.to_c(&Value::text("90210"), &ExternType::CharPtr).unwrap();
        assert_eq!(ctx.strings.len(), 1);
        assert_eq!(unsafe { ctx.from_c(&c_value) }.unwrap(), Value::text("90210"));
    }

    #[test]
    fn test_interior_nul_rejected() {
        let mut ctx = MarshalContext::new();
        let err = ctx
            .to_c(&Value::text("902\010"), &ExternType::CharPtr)
            .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidString(_)));
        assert!(ctx.strings.is_empty());
    }

    #[test]
    fn test_array_argument() {
        let mut ctx = MarshalContext::new();
        let c_value = ctx
            .to_c(&Value::ints([1, 2, 3]), &ExternType::U32Array)
            .unwrap();
        let CType::U32Array { ptr, len } = c_value else {
            panic!("expected an array, got {:?}", c_value);
        };
        assert_eq!(len, 3);
        assert_eq!(unsafe { std::slice::from_raw_parts(ptr, len) }, &[1, 2, 3]);
    }

    #[test]
    fn test_array_argument_rejects_mixed_list() {
        let mut ctx = MarshalContext::new();
        let list = Value::List(vec![Value::Int(1), Value::text("2")]);
        assert!(matches!(
            ctx.to_c(&list, &ExternType::U32Array),
            Err(MarshalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_array_argument() {
        let mut ctx = MarshalContext::new();
        let c_value = ctx.to_c(&Value::List(vec![]), &ExternType::U32Array).unwrap();
        assert!(matches!(c_value, CType::U32Array { len: 0, .. }));
    }

    #[test]
    fn test_from_c_copies_fixed_array() {
        let backing = [11, 27, 31, 99];
        let ctx = MarshalContext::new();
        let value = unsafe {
            ctx.from_c(&CType::FixedI32Array {
                ptr: backing.as_ptr(),
                len: 3,
            })
        }
        .unwrap();
        assert_eq!(value, Value::ints([11, 27, 31]));
    }

    #[test]
    fn test_from_c_copies_owned_slice() {
        let mut backing = [2, 3, 5];
        let ctx = MarshalContext::new();
        let raw = RawSlice {
            ptr: backing.as_mut_ptr(),
            len: backing.len(),
        };
        let value = unsafe { ctx.from_c(&CType::OwnedI32Slice(raw)) }.unwrap();
        assert_eq!(value, Value::ints([2, 3, 5]));
    }

    #[test]
    fn test_from_c_null_string() {
        let ctx = MarshalContext::new();
        let result = unsafe { ctx.from_c(&CType::OwnedCString(std::ptr::null_mut())) };
        assert_eq!(result, Err(MarshalError::NullPointer));
    }

    #[test]
    fn test_from_c_invalid_utf8() {
        let bytes = [0xc3u8, 0x28, 0x00];
        let ctx = MarshalContext::new();
        let result = unsafe { ctx.from_c(&CType::CharPtr(bytes.as_ptr() as *const c_char)) };
        assert!(matches!(result, Err(MarshalError::InvalidString(_))));
    }
}
