//! Resolved entry points of the provider
//!
//! `ProviderFns` is built once per bridge: every symbol of the contract is
//! looked up and copied into a typed function pointer, so a missing symbol
//! fails at open time instead of at first call.

use crate::loader::LoadError;
use crate::types::{CensusOpaque, Pair, RawSlice};
use libloading::Library;
use std::ffi::{c_char, c_void};

/// Typed function pointers for every exported symbol
///
/// The pointers are only valid while the library they came from stays
/// loaded; `Bridge` keeps the two together.
#[derive(Debug, Clone, Copy)]
pub struct ProviderFns {
    pub census_new: unsafe extern "C" fn() -> *mut CensusOpaque,
    pub census_free: unsafe extern "C" fn(*mut CensusOpaque),
    pub census_populate: unsafe extern "C" fn(*mut CensusOpaque),
    pub census_population_of: unsafe extern "C" fn(*const CensusOpaque, *const c_char) -> u32,
    pub census_lookup:
        unsafe extern "C" fn(*const CensusOpaque, *const c_char, *mut u32) -> bool,
    pub chant_generate: unsafe extern "C" fn(u8) -> *mut c_char,
    pub chant_free: unsafe extern "C" fn(*mut c_char),
    pub sum_even: unsafe extern "C" fn(*const u32, usize) -> u32,
    pub count_chars: unsafe extern "C" fn(*const c_char) -> u32,
    pub add_u32: unsafe extern "C" fn(u32, u32) -> u32,
    pub swap_pair: unsafe extern "C" fn(Pair) -> Pair,
    pub fixed_triple: unsafe extern "C" fn() -> *const [i32; 3],
    pub fixed_quad: unsafe extern "C" fn() -> *const i32,
    pub primes_vec: unsafe extern "C" fn() -> RawSlice,
    pub primes_free: unsafe extern "C" fn(*mut i32, usize),
    pub strand_contract_violations: unsafe extern "C" fn() -> u64,
    pub strand_live_allocations: unsafe extern "C" fn() -> u64,
    /// Liveness of a single provider address; not a dynamic-call symbol
    pub strand_is_live: unsafe extern "C" fn(*const c_void) -> bool,
}

unsafe fn bind<T: Copy>(library: &Library, name: &str, symbol: &str) -> Result<T, LoadError> {
    let found = library
        .get::<T>(symbol.as_bytes())
        .map_err(|_| LoadError::SymbolNotFound {
            library: name.to_string(),
            symbol: symbol.to_string(),
        })?;
    tracing::debug!(symbol, "bound provider symbol");
    Ok(*found)
}

impl ProviderFns {
    /// Look up every contract symbol in a loaded provider
    ///
    /// # Safety
    ///
    /// The library must export each symbol with exactly the signature
    /// declared here. Nothing at runtime can verify that.
    pub unsafe fn resolve(library: &Library, name: &str) -> Result<Self, LoadError> {
        Ok(Self {
            census_new: bind(library, name, "census_new")?,
            census_free: bind(library, name, "census_free")?,
            census_populate: bind(library, name, "census_populate")?,
            census_population_of: bind(library, name, "census_population_of")?,
            census_lookup: bind(library, name, "census_lookup")?,
            chant_generate: bind(library, name, "chant_generate")?,
            chant_free: bind(library, name, "chant_free")?,
            sum_even: bind(library, name, "sum_even")?,
            count_chars: bind(library, name, "count_chars")?,
            add_u32: bind(library, name, "add_u32")?,
            swap_pair: bind(library, name, "swap_pair")?,
            fixed_triple: bind(library, name, "fixed_triple")?,
            fixed_quad: bind(library, name, "fixed_quad")?,
            primes_vec: bind(library, name, "primes_vec")?,
            primes_free: bind(library, name, "primes_free")?,
            strand_contract_violations: bind(library, name, "strand_contract_violations")?,
            strand_live_allocations: bind(library, name, "strand_live_allocations")?,
            strand_is_live: bind(library, name, "strand_is_live")?,
        })
    }

    /// Entry points of the reference provider linked into this binary
    ///
    /// Provider signatures that mention its own `Census`, `Pair` or
    /// `RawSlice` are reinterpreted as the caller-side mirrors, whose
    /// layouts are asserted identical.
    #[cfg(any(test, feature = "linked"))]
    pub fn linked() -> Self {
        use std::mem::transmute;
        use strand_provider as provider;

        unsafe {
            Self {
                census_new: transmute::<
                    extern "C" fn() -> *mut provider::Census,
                    unsafe extern "C" fn() -> *mut CensusOpaque,
                >(provider::census_new),
                census_free: transmute::<
                    unsafe extern "C" fn(*mut provider::Census),
                    unsafe extern "C" fn(*mut CensusOpaque),
                >(provider::census_free),
                census_populate: transmute::<
                    unsafe extern "C" fn(*mut provider::Census),
                    unsafe extern "C" fn(*mut CensusOpaque),
                >(provider::census_populate),
                census_population_of: transmute::<
                    unsafe extern "C" fn(*const provider::Census, *const c_char) -> u32,
                    unsafe extern "C" fn(*const CensusOpaque, *const c_char) -> u32,
                >(provider::census_population_of),
                census_lookup: transmute::<
                    unsafe extern "C" fn(*const provider::Census, *const c_char, *mut u32) -> bool,
                    unsafe extern "C" fn(*const CensusOpaque, *const c_char, *mut u32) -> bool,
                >(provider::census_lookup),
                chant_generate: provider::chant_generate,
                chant_free: provider::chant_free,
                sum_even: provider::sum_even,
                count_chars: provider::count_chars,
                add_u32: provider::add_u32,
                swap_pair: transmute::<
                    extern "C" fn(provider::Pair) -> provider::Pair,
                    unsafe extern "C" fn(Pair) -> Pair,
                >(provider::swap_pair),
                fixed_triple: provider::fixed_triple,
                fixed_quad: provider::fixed_quad,
                primes_vec: transmute::<
                    extern "C" fn() -> provider::RawSlice,
                    unsafe extern "C" fn() -> RawSlice,
                >(provider::primes_vec),
                primes_free: provider::primes_free,
                strand_contract_violations: provider::strand_contract_violations,
                strand_live_allocations: provider::strand_live_allocations,
                strand_is_live: provider::strand_is_live,
            }
        }
    }

    /// Type-erased address of a contract symbol, for signature dispatch
    pub fn address_of(&self, symbol: &str) -> Option<*const ()> {
        let address = match symbol {
            "census_new" => self.census_new as *const (),
            "census_free" => self.census_free as *const (),
            "census_populate" => self.census_populate as *const (),
            "census_population_of" => self.census_population_of as *const (),
            "census_lookup" => self.census_lookup as *const (),
            "chant_generate" => self.chant_generate as *const (),
            "chant_free" => self.chant_free as *const (),
            "sum_even" => self.sum_even as *const (),
            "count_chars" => self.count_chars as *const (),
            "add_u32" => self.add_u32 as *const (),
            "swap_pair" => self.swap_pair as *const (),
            "fixed_triple" => self.fixed_triple as *const (),
            "fixed_quad" => self.fixed_quad as *const (),
            "primes_vec" => self.primes_vec as *const (),
            "primes_free" => self.primes_free as *const (),
            "strand_contract_violations" => self.strand_contract_violations as *const (),
            "strand_live_allocations" => self.strand_live_allocations as *const (),
            _ => return None,
        };
        Some(address)
    }
}
