//! Census - provider state behind an opaque handle
//!
//! Callers only ever see `*mut Census`. Lifecycle:
//! `census_new` -> `census_populate` -> queries -> `census_free` (exactly once).

use crate::borrow::borrowed_str;
use crate::ledger::{self, AllocationKind};
use std::collections::HashMap;
use std::ffi::c_char;

/// Number of five-digit zip codes loaded by `populate`
pub const ZIP_CODE_COUNT: u32 = 100_000;

/// Population lookup table keyed by five-digit zip code
#[derive(Debug, Default)]
pub struct Census {
    population: HashMap<String, u32>,
}

impl Census {
    pub fn new() -> Self {
        Self {
            population: HashMap::new(),
        }
    }

    /// Load every zip code `00000`..`99999`, population equal to its number
    pub fn populate(&mut self) {
        self.population.reserve(ZIP_CODE_COUNT as usize);
        for code in 0..ZIP_CODE_COUNT {
            self.population.insert(format!("{:05}", code), code);
        }
    }

    pub fn population_of(&self, zip: &str) -> Option<u32> {
        self.population.get(zip).copied()
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }
}

/// # Safety
///
/// `census` must be null or a pointer returned by `census_new`.
unsafe fn census_ref<'a>(census: *const Census, site: &str) -> Option<&'a Census> {
    ledger::check(census, AllocationKind::Census, site).ok()?;
    Some(&*census)
}

/// Allocate an empty census and hand ownership of it to the caller
///
/// The returned handle must be released exactly once with `census_free`.
#[no_mangle]
pub extern "C" fn census_new() -> *mut Census {
    let census = Box::into_raw(Box::new(Census::new()));
    ledger::register(census, AllocationKind::Census, 1);
    census
}

/// Release a census handle
///
/// Null is a no-op. An unknown or already-released handle is reported as a
/// contract violation and left untouched.
///
/// # Safety
///
/// `census` must be null or a pointer returned by `census_new`.
#[no_mangle]
pub unsafe extern "C" fn census_free(census: *mut Census) {
    if census.is_null() {
        return;
    }
    if ledger::release(census, AllocationKind::Census, None, "census_free").is_ok() {
        drop(Box::from_raw(census));
    }
}

/// Load the zip code table into a live census
///
/// # Safety
///
/// `census` must be a live handle from `census_new`, not used concurrently.
#[no_mangle]
pub unsafe extern "C" fn census_populate(census: *mut Census) {
    if ledger::check(census, AllocationKind::Census, "census_populate").is_err() {
        return;
    }
    (*census).populate();
}

/// Population for `zip`, or `0` when the key is unknown
///
/// `0` is also a real population (zip `00000`); use `census_lookup` to tell
/// the two apart.
///
/// # Safety
///
/// - `census` must be a live handle from `census_new`
/// - `zip` must be null or a NUL-terminated string valid for this call
#[no_mangle]
pub unsafe extern "C" fn census_population_of(census: *const Census, zip: *const c_char) -> u32 {
    let Some(census) = census_ref(census, "census_population_of") else {
        return 0;
    };
    borrowed_str(zip)
        .and_then(|zip| census.population_of(zip))
        .unwrap_or(0)
}

/// Look up `zip`, writing the population through `out` when found
///
/// Returns `false` and leaves `*out` untouched when the key is absent.
///
/// # Safety
///
/// - `census` must be a live handle from `census_new`
/// - `zip` must be null or a NUL-terminated string valid for this call
/// - `out` must be null or valid for a `u32` write
#[no_mangle]
pub unsafe extern "C" fn census_lookup(
    census: *const Census,
    zip: *const c_char,
    out: *mut u32,
) -> bool {
    let Some(census) = census_ref(census, "census_lookup") else {
        return false;
    };
    if out.is_null() {
        tracing::warn!("census_lookup called without an output slot");
        return false;
    }
    match borrowed_str(zip).and_then(|zip| census.population_of(zip)) {
        Some(population) => {
            *out = population;
            true
        }
        None => false,
    }
}
