//! The caller's view of one provider
//!
//! A `Bridge` owns the loaded library together with the function table
//! resolved from it. Dropping the bridge unloads the library, and nothing
//! derived from it (handles, guards) can outlive it.

use crate::bindings::ProviderFns;
use crate::caller::ExternFunction;
use crate::contract;
use crate::error::{BridgeError, BridgeResult};
use crate::handle::CensusHandle;
use crate::loader::LibraryLoader;
use crate::marshal::MarshalError;
use crate::safety::{read_fixed, ProviderSlice, ProviderString, SafeCString};
use crate::types::Pair;
use crate::value::Value;
use libloading::Library;
use std::path::PathBuf;
use std::sync::Arc;
use strand_config::LibraryConfig;

/// Where a bridge's entry points came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Loaded at runtime from this file
    Loaded(PathBuf),
    /// Reference provider linked into the binary
    Linked,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Loaded(path) => write!(f, "{}", path.display()),
            Origin::Linked => write!(f, "linked"),
        }
    }
}

pub struct Bridge {
    fns: ProviderFns,
    origin: Origin,
    // Keeps every pointer in `fns` valid; must drop after anything using them
    _library: Option<Arc<Library>>,
}

impl Bridge {
    /// Load the configured provider and resolve the whole contract
    pub fn open(config: &LibraryConfig) -> BridgeResult<Self> {
        let mut loader = LibraryLoader::with_search_paths(config.search_paths.iter().cloned());
        Self::open_with(&mut loader, &config.name)
    }

    /// Load `name` through an existing loader
    pub fn open_with(loader: &mut LibraryLoader, name: &str) -> BridgeResult<Self> {
        let library = loader.load(name)?;
        let path = loader
            .loaded_path(name)
            .unwrap_or_else(|| PathBuf::from(name));
        // Safety: the provider is built from the same contract the table declares
        let fns = unsafe { ProviderFns::resolve(&library, name)? };
        tracing::info!(path = %path.display(), "provider bound");
        Ok(Self {
            fns,
            origin: Origin::Loaded(path),
            _library: Some(library),
        })
    }

    /// Bridge to the reference provider linked into this binary
    #[cfg(any(test, feature = "linked"))]
    pub fn linked() -> Self {
        tracing::info!("using linked provider");
        Self {
            fns: ProviderFns::linked(),
            origin: Origin::Linked,
            _library: None,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn fns(&self) -> &ProviderFns {
        &self.fns
    }

    pub fn add(&self, a: u32, b: u32) -> u32 {
        unsafe { (self.fns.add_u32)(a, b) }
    }

    /// Unicode scalar values in `text`, as counted by the provider
    pub fn count_chars(&self, text: &str) -> BridgeResult<u32> {
        let text = SafeCString::new(text).map_err(|e| {
            MarshalError::InvalidString(format!("String contains null byte: {}", e))
        })?;
        Ok(unsafe { (self.fns.count_chars)(text.as_ptr()) })
    }

    /// Generate a chant, copy it, release the provider's buffer
    pub fn chant(&self, count: u8) -> BridgeResult<String> {
        let raw = unsafe { (self.fns.chant_generate)(count) };
        let chant = unsafe { ProviderString::from_raw(raw, self.fns.chant_free) }.ok_or(
            BridgeError::NullReturn {
                symbol: "chant_generate",
            },
        )?;
        let text = chant
            .to_str()
            .map_err(|source| BridgeError::InvalidUtf8 {
                symbol: "chant_generate",
                source,
            })?
            .to_owned();
        Ok(text)
    }

    pub fn sum_even(&self, numbers: &[u32]) -> u32 {
        unsafe { (self.fns.sum_even)(numbers.as_ptr(), numbers.len()) }
    }

    pub fn swap(&self, pair: Pair) -> Pair {
        unsafe { (self.fns.swap_pair)(pair) }
    }

    pub fn fixed_triple(&self) -> BridgeResult<[i32; 3]> {
        let ptr = unsafe { (self.fns.fixed_triple)() };
        unsafe { read_fixed::<3>(ptr as *const i32) }.ok_or(BridgeError::NullReturn {
            symbol: "fixed_triple",
        })
    }

    pub fn fixed_quad(&self) -> BridgeResult<[i32; 4]> {
        let ptr = unsafe { (self.fns.fixed_quad)() };
        unsafe { read_fixed::<4>(ptr) }.ok_or(BridgeError::NullReturn {
            symbol: "fixed_quad",
        })
    }

    /// Copy the provider's prime vector and release it with the same length
    pub fn primes(&self) -> BridgeResult<Vec<i32>> {
        let raw = unsafe { (self.fns.primes_vec)() };
        let primes = unsafe { ProviderSlice::from_raw(raw, self.fns.primes_free) }.ok_or(
            BridgeError::NullReturn {
                symbol: "primes_vec",
            },
        )?;
        Ok(primes.as_slice().to_vec())
    }

    /// A fresh census handle, released when dropped
    pub fn census(&self) -> BridgeResult<CensusHandle<'_>> {
        CensusHandle::create(&self.fns)
    }

    /// Run `f` with a fresh census handle that is released however `f` exits
    pub fn with_census<T, F>(&self, f: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut CensusHandle<'_>) -> BridgeResult<T>,
    {
        let mut census = self.census()?;
        let outcome = f(&mut census);
        let released = census.release();
        let value = outcome?;
        released?;
        Ok(value)
    }

    pub fn contract_violations(&self) -> u64 {
        unsafe { (self.fns.strand_contract_violations)() }
    }

    pub fn live_allocations(&self) -> u64 {
        unsafe { (self.fns.strand_live_allocations)() }
    }

    /// Bind a declared symbol for dynamic calls
    pub fn function(&self, symbol: &str) -> BridgeResult<ExternFunction> {
        let decl =
            contract::find(symbol).ok_or_else(|| BridgeError::UnknownSymbol(symbol.to_string()))?;
        Ok(ExternFunction::bind(decl, &self.fns)?)
    }

    /// Call a declared symbol with managed arguments
    pub fn invoke(&self, symbol: &str, args: &[Value]) -> BridgeResult<Value> {
        let function = self.function(symbol)?;
        // Safety: bound from this bridge's table while `self` keeps the library loaded
        Ok(unsafe { function.call(args) }?)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge").field("origin", &self.origin).finish()
    }
}
