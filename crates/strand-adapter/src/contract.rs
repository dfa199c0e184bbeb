//! Declared signatures for every symbol the provider exports
//!
//! Layouts are never derived from the provider's source. This table is the
//! caller's half of the contract: parameter types, return type and, for
//! every owned return, the one function allowed to release it.

use crate::types::ExternType;
use ExternType::*;

/// One exported symbol as the caller expects it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    pub symbol: &'static str,
    pub params: &'static [ExternType],
    pub ret: ExternType,
    /// Release function for an owned return
    pub release: Option<&'static str>,
}

impl Declaration {
    const fn new(symbol: &'static str, params: &'static [ExternType], ret: ExternType) -> Self {
        Self {
            symbol,
            params,
            ret,
            release: None,
        }
    }

    const fn released_by(self, release: &'static str) -> Self {
        Self {
            release: Some(release),
            ..self
        }
    }

    /// Rendered C-level signature, e.g. `add_u32(u32, u32) -> u32`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|ty| match ty {
                OwnedI32Slice => "*mut i32, usize".to_string(),
                other => other.to_string(),
            })
            .collect();
        match self.ret {
            Void => format!("{}({})", self.symbol, params.join(", ")),
            ret => format!("{}({}) -> {}", self.symbol, params.join(", "), ret),
        }
    }

    /// Whether the symbol can be called through `ExternFunction`
    pub fn is_dynamic(&self) -> bool {
        self.params.iter().all(ExternType::is_dynamic_param) && !matches!(self.ret, Handle | OutU32)
    }
}

/// The full contract, in the order the provider documents it
pub static CONTRACT: &[Declaration] = &[
    Declaration::new("add_u32", &[U32, U32], U32),
    Declaration::new("count_chars", &[CharPtr], U32),
    Declaration::new("sum_even", &[U32Array], U32),
    Declaration::new("swap_pair", &[Pair], Pair),
    Declaration::new("chant_generate", &[U8], OwnedCString).released_by("chant_free"),
    Declaration::new("chant_free", &[OwnedCString], Void),
    Declaration::new("fixed_triple", &[], FixedI32Array(3)),
    Declaration::new("fixed_quad", &[], FixedI32Array(4)),
    Declaration::new("primes_vec", &[], OwnedI32Slice).released_by("primes_free"),
    Declaration::new("primes_free", &[OwnedI32Slice], Void),
    Declaration::new("census_new", &[], Handle).released_by("census_free"),
    Declaration::new("census_populate", &[Handle], Void),
    Declaration::new("census_population_of", &[Handle, CharPtr], U32),
    Declaration::new("census_lookup", &[Handle, CharPtr, OutU32], Bool),
    Declaration::new("census_free", &[Handle], Void),
    Declaration::new("strand_contract_violations", &[], U64),
    Declaration::new("strand_live_allocations", &[], U64),
];

/// Look up a declaration by exported symbol name
pub fn find(symbol: &str) -> Option<&'static Declaration> {
    CONTRACT.iter().find(|decl| decl.symbol == symbol)
}

/// One line per symbol; owned returns name their release function
pub fn render() -> String {
    CONTRACT
        .iter()
        .map(|decl| match decl.release {
            Some(release) => format!("{}  [release: {}]", decl.signature(), release),
            None => decl.signature(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
