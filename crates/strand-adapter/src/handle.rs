//! RAII wrapper for the census opaque handle
//!
//! A `CensusHandle` moves `Created -> Populated -> Released` and is released
//! exactly once: explicitly through [`CensusHandle::release`], or by `Drop`
//! on every other exit path (early return, `?`, panic).
//!
//! The handle borrows the bridge's function table, so it cannot outlive the
//! loaded library. It holds a raw pointer and is therefore neither `Send`
//! nor `Sync`.

use crate::bindings::ProviderFns;
use crate::error::{BridgeError, BridgeResult};
use crate::marshal::MarshalError;
use crate::safety::SafeCString;
use crate::types::CensusOpaque;
use serde::Serialize;
use std::ffi::c_void;
use std::fmt;
use std::ptr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleState {
    /// Allocated by the provider, table still empty
    Created,
    /// Zip code table loaded
    Populated,
    /// Returned to the provider; no further calls allowed
    Released,
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleState::Created => write!(f, "created"),
            HandleState::Populated => write!(f, "populated"),
            HandleState::Released => write!(f, "released"),
        }
    }
}

pub struct CensusHandle<'b> {
    raw: *mut CensusOpaque,
    state: HandleState,
    fns: &'b ProviderFns,
}

impl<'b> CensusHandle<'b> {
    /// Ask the provider for a fresh handle
    pub(crate) fn create(fns: &'b ProviderFns) -> BridgeResult<Self> {
        let raw = unsafe { (fns.census_new)() };
        if raw.is_null() {
            return Err(BridgeError::NullReturn {
                symbol: "census_new",
            });
        }
        tracing::debug!(addr = raw as usize, "census handle created");
        Ok(Self {
            raw,
            state: HandleState::Created,
            fns,
        })
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Address of the provider state, `0` once released; for logging only
    pub fn addr(&self) -> usize {
        self.raw as usize
    }

    /// Load the zip code table; allowed once, straight after creation
    pub fn populate(&mut self) -> BridgeResult<()> {
        if self.state != HandleState::Created {
            return Err(BridgeError::InvalidTransition {
                state: self.state,
                operation: "populate",
            });
        }
        unsafe { (self.fns.census_populate)(self.raw) };
        self.state = HandleState::Populated;
        Ok(())
    }

    /// Population of `zip`, or `None` when the key is unknown
    ///
    /// Before `populate` every key is unknown.
    pub fn lookup(&self, zip: &str) -> BridgeResult<Option<u32>> {
        self.ensure_live("query")?;
        let zip = zip_code(zip)?;
        let mut population = 0u32;
        let found = unsafe { (self.fns.census_lookup)(self.raw, zip.as_ptr(), &mut population) };
        Ok(found.then_some(population))
    }

    /// Population of `zip` with the provider's sentinel: `0` when unknown
    ///
    /// Ambiguous for zip `00000`, whose population is also `0`; prefer
    /// [`CensusHandle::lookup`].
    pub fn population_or_zero(&self, zip: &str) -> BridgeResult<u32> {
        self.ensure_live("query")?;
        let zip = zip_code(zip)?;
        Ok(unsafe { (self.fns.census_population_of)(self.raw, zip.as_ptr()) })
    }

    /// Return the handle to the provider
    ///
    /// Fails with `ReleaseRefused` if the provider still reports this
    /// handle's address as live afterwards.
    pub fn release(mut self) -> BridgeResult<()> {
        let addr = self.raw;
        self.release_raw();
        if unsafe { (self.fns.strand_is_live)(addr as *const c_void) } {
            tracing::warn!(addr = addr as usize, "provider refused census release");
            return Err(BridgeError::ReleaseRefused {
                symbol: "census_free",
                addr: addr as usize,
            });
        }
        Ok(())
    }

    fn ensure_live(&self, operation: &'static str) -> BridgeResult<()> {
        match self.state {
            HandleState::Created | HandleState::Populated => Ok(()),
            HandleState::Released => Err(BridgeError::InvalidTransition {
                state: self.state,
                operation,
            }),
        }
    }

    fn release_raw(&mut self) {
        if self.state == HandleState::Released {
            return;
        }
        tracing::debug!(addr = self.raw as usize, state = %self.state, "census handle released");
        unsafe { (self.fns.census_free)(self.raw) };
        self.raw = ptr::null_mut();
        self.state = HandleState::Released;
    }
}

impl Drop for CensusHandle<'_> {
    fn drop(&mut self) {
        self.release_raw();
    }
}

impl fmt::Debug for CensusHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CensusHandle")
            .field("addr", &(self.raw as usize))
            .field("state", &self.state)
            .finish()
    }
}

fn zip_code(zip: &str) -> BridgeResult<SafeCString> {
    SafeCString::new(zip).map_err(|e| {
        BridgeError::Marshal(MarshalError::InvalidString(format!(
            "zip code contains null byte: {}",
            e
        )))
    })
}
