//! Strand Provider - reference native side of the strand C-ABI contract
//!
//! Every exported function uses the C calling convention and documents who
//! owns each pointer it accepts or returns:
//! - Scalars and `#[repr(C)]` structs are copied (`add_u32`, `swap_pair`)
//! - Borrowed strings and arrays are read during the call only
//!   (`count_chars`, `sum_even`, `census_population_of`)
//! - Owned buffers are allocated here and must come back through the
//!   matching release function (`chant_generate`/`chant_free`,
//!   `primes_vec`/`primes_free`)
//! - Opaque handles are created and destroyed here (`census_new`/`census_free`)
//! - Fixed arrays point at `static` memory and are never released
//!   (`fixed_triple`, `fixed_quad`)
//!
//! # Safety
//!
//! Release functions validate their arguments against the [`ledger`] before
//! touching memory. No exported function unwinds across the boundary.

pub mod borrow;
pub mod census;
pub mod chant;
pub mod layout;
pub mod ledger;
pub mod numeric;

pub use census::{
    census_free, census_lookup, census_new, census_populate, census_population_of, Census,
};
pub use chant::{chant_free, chant_generate};
pub use layout::{
    fixed_quad, fixed_triple, primes_free, primes_vec, swap_pair, Pair, RawSlice, FIXED_QUAD,
    FIXED_TRIPLE, PRIMES,
};
pub use ledger::{
    strand_contract_violations, strand_is_live, strand_live_allocations, AllocationKind,
    Violation,
};
pub use numeric::{add_u32, count_chars, sum_even};
