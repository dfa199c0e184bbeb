//! Strand Adapter - safe caller side of the strand C-ABI contract
//!
//! Resolves the provider's entry points once, declares every signature,
//! and turns each call into managed values:
//! - Scalars and `#[repr(C)]` structs are passed and returned by value
//! - Borrowed strings and arrays live in a [`MarshalContext`] until the call returns
//! - Owned returns are copied first, then released through their declared
//!   release function exactly once ([`safety`] guards)
//! - The census handle is wrapped in [`CensusHandle`], released on drop
//!
//! # Safety
//!
//! All `unsafe` code lives in this crate behind safe [`Bridge`] methods. The
//! one thing that cannot be checked at runtime is that the loaded provider
//! really exports the signatures in [`contract`].

pub mod bindings;
pub mod bridge;
pub mod caller;
pub mod contract;
pub mod error;
pub mod handle;
pub mod loader;
pub mod marshal;
pub mod safety;
pub mod scenarios;
pub mod shared;
pub mod types;
pub mod value;


pub use bindings::ProviderFns;
pub use bridge::{Bridge, Origin};
pub use caller::{CallError, ExternFunction};
pub use contract::{Declaration, CONTRACT};
pub use error::{BridgeError, BridgeResult};
pub use handle::{CensusHandle, HandleState};
pub use loader::{LibraryLoader, LoadError};
pub use marshal::{MarshalContext, MarshalError};
pub use scenarios::{Scenario, ScenarioReport};
pub use types::{CType, ExternType, Pair};
pub use value::Value;
