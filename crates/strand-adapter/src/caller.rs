//! Dynamic calls through declared signatures
//!
//! Every symbol's signature is known from the contract table, so a call is a
//! direct function pointer cast chosen by signature key. No libffi, no
//! runtime signature discovery.
//!
//! Owned returns are copied into a `Value` first, then handed back through
//! the release function declared for them, exactly once, whether or not the
//! copy succeeded.

use crate::bindings::ProviderFns;
use crate::contract::Declaration;
use crate::marshal::{MarshalContext, MarshalError};
use crate::types::{CType, ExternType, Pair, RawSlice};
use crate::value::Value;
use std::ffi::c_char;
use std::mem::transmute;

/// FFI call errors
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// Argument or result conversion failed
    MarshalError(MarshalError),
    /// Wrong number of arguments
    ArityMismatch { expected: usize, got: usize },
    /// Signature cannot be called dynamically
    UnsupportedSignature(String),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::MarshalError(e) => write!(f, "Marshal error: {}", e),
            CallError::ArityMismatch { expected, got } => {
                write!(f, "Expected {} arguments, got {}", expected, got)
            }
            CallError::UnsupportedSignature(sig) => {
                write!(f, "Unsupported FFI signature: {}", sig)
            }
        }
    }
}

impl std::error::Error for CallError {}

impl From<MarshalError> for CallError {
    fn from(e: MarshalError) -> Self {
        CallError::MarshalError(e)
    }
}

/// A callable provider function with its declared signature
#[derive(Debug, Clone)]
pub struct ExternFunction {
    symbol: &'static str,
    fn_ptr: *const (),
    param_types: Vec<ExternType>,
    return_type: ExternType,
    /// Address of the release function for an owned return
    release_ptr: Option<*const ()>,
}

// Safety: only code addresses are stored, and they are never written through
unsafe impl Send for ExternFunction {}
unsafe impl Sync for ExternFunction {}

impl ExternFunction {
    /// # Safety
    ///
    /// - `fn_ptr` must point to a function whose real signature is
    ///   `param_types -> return_type`
    /// - the function must stay loaded for the life of this value
    pub unsafe fn new(
        symbol: &'static str,
        fn_ptr: *const (),
        param_types: Vec<ExternType>,
        return_type: ExternType,
    ) -> Self {
        Self {
            symbol,
            fn_ptr,
            param_types,
            return_type,
            release_ptr: None,
        }
    }

    /// Attach the release function for an owned return
    ///
    /// # Safety
    ///
    /// `release_ptr` must be the provider's release for this return type:
    /// `(*mut c_char)` for strings, `(*mut i32, usize)` for slices.
    pub unsafe fn with_release(mut self, release_ptr: *const ()) -> Self {
        self.release_ptr = Some(release_ptr);
        self
    }

    /// Bind a declaration to the resolved provider functions
    pub fn bind(decl: &'static Declaration, fns: &ProviderFns) -> Result<Self, CallError> {
        if !decl.is_dynamic() {
            return Err(CallError::UnsupportedSignature(format!(
                "{} (handles and owned arguments are only reachable through the typed API)",
                decl.signature()
            )));
        }
        let fn_ptr = fns
            .address_of(decl.symbol)
            .ok_or_else(|| CallError::UnsupportedSignature(decl.signature()))?;
        let release_ptr = match (decl.ret.is_owned(), decl.release) {
            (false, _) => None,
            (true, Some(release)) => Some(
                fns.address_of(release)
                    .ok_or_else(|| CallError::UnsupportedSignature(decl.signature()))?,
            ),
            (true, None) => {
                return Err(CallError::UnsupportedSignature(format!(
                    "{} (owned return without a release)",
                    decl.signature()
                )))
            }
        };

        // Safety: addresses come from the bound contract table
        let function = unsafe { Self::new(decl.symbol, fn_ptr, decl.params.to_vec(), decl.ret) };
        Ok(match release_ptr {
            Some(release) => unsafe { function.with_release(release) },
            None => function,
        })
    }

    /// Call with managed arguments and copy the result back
    ///
    /// # Safety
    ///
    /// The function pointer and signature must satisfy the contract of
    /// [`ExternFunction::new`], and the library must still be loaded.
    pub unsafe fn call(&self, args: &[Value]) -> Result<Value, CallError> {
        if args.len() != self.param_types.len() {
            return Err(CallError::ArityMismatch {
                expected: self.param_types.len(),
                got: args.len(),
            });
        }

        let mut ctx = MarshalContext::new();
        let c_args: Vec<CType> = args
            .iter()
            .zip(self.param_types.iter())
            .map(|(arg, ty)| ctx.to_c(arg, ty))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(symbol = self.symbol, args = c_args.len(), "calling provider");
        let c_result = self.call_with_signature(&c_args)?;

        let copied = ctx.from_c(&c_result);
        self.release(&c_result);
        Ok(copied?)
    }

    /// Call through a pointer cast matching the declared signature
    unsafe fn call_with_signature(&self, args: &[CType]) -> Result<CType, CallError> {
        let sig = self.signature_key();

        match (sig.as_str(), args) {
            ("()->U64", []) => {
                let f: unsafe extern "C" fn() -> u64 = transmute(self.fn_ptr);
                Ok(CType::U64(f()))
            }
            ("()->OwnedI32Slice", []) => {
                let f: unsafe extern "C" fn() -> RawSlice = transmute(self.fn_ptr);
                Ok(CType::OwnedI32Slice(f()))
            }
            (_, []) if matches!(self.return_type, ExternType::FixedI32Array(_)) => {
                let ExternType::FixedI32Array(len) = self.return_type else {
                    return Err(CallError::UnsupportedSignature(sig));
                };
                let f: unsafe extern "C" fn() -> *const i32 = transmute(self.fn_ptr);
                Ok(CType::FixedI32Array { ptr: f(), len })
            }

            ("(U8)->OwnedCString", [CType::U8(count)]) => {
                let f: unsafe extern "C" fn(u8) -> *mut c_char = transmute(self.fn_ptr);
                Ok(CType::OwnedCString(f(*count)))
            }
            ("(CharPtr)->U32", [CType::CharPtr(s)]) => {
                let f: unsafe extern "C" fn(*const c_char) -> u32 = transmute(self.fn_ptr);
                Ok(CType::U32(f(*s)))
            }
            ("(U32Array)->U32", [CType::U32Array { ptr, len }]) => {
                let f: unsafe extern "C" fn(*const u32, usize) -> u32 = transmute(self.fn_ptr);
                Ok(CType::U32(f(*ptr, *len)))
            }
            ("(Pair)->Pair", [CType::Pair(pair)]) => {
                let f: unsafe extern "C" fn(Pair) -> Pair = transmute(self.fn_ptr);
                Ok(CType::Pair(f(*pair)))
            }

            ("(U32,U32)->U32", [CType::U32(a), CType::U32(b)]) => {
                let f: unsafe extern "C" fn(u32, u32) -> u32 = transmute(self.fn_ptr);
                Ok(CType::U32(f(*a, *b)))
            }

            _ => Err(CallError::UnsupportedSignature(sig)),
        }
    }

    /// Hand an owned return back to the provider
    unsafe fn release(&self, result: &CType) {
        let Some(release_ptr) = self.release_ptr else {
            return;
        };
        match result {
            CType::OwnedCString(ptr) if !ptr.is_null() => {
                let f: unsafe extern "C" fn(*mut c_char) = transmute(release_ptr);
                f(*ptr);
            }
            CType::OwnedI32Slice(raw) if !raw.ptr.is_null() => {
                let f: unsafe extern "C" fn(*mut i32, usize) = transmute(release_ptr);
                f(raw.ptr, raw.len);
            }
            _ => {}
        }
    }

    /// Signature key for dispatch, e.g. `(U32,U32)->U32`
    fn signature_key(&self) -> String {
        let params: Vec<String> = self
            .param_types
            .iter()
            .map(|t| format!("{:?}", t))
            .collect();
        format!("({})->{:?}", params.join(","), self.return_type)
    }
}
