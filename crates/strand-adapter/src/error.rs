//! Adapter error types

use crate::caller::CallError;
use crate::handle::HandleState;
use crate::loader::LoadError;
use crate::marshal::MarshalError;
use std::str::Utf8Error;
use thiserror::Error;

/// Everything that can go wrong on the caller side of the boundary
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to load provider: {0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Marshal(#[from] MarshalError),

    #[error("{0}")]
    Call(#[from] CallError),

    #[error("{symbol} returned a null pointer")]
    NullReturn { symbol: &'static str },

    #[error("{symbol} returned invalid UTF-8: {source}")]
    InvalidUtf8 {
        symbol: &'static str,
        #[source]
        source: Utf8Error,
    },

    #[error("cannot {operation} a census handle that is {state}")]
    InvalidTransition {
        state: HandleState,
        operation: &'static str,
    },

    #[error("provider refused {symbol}: {addr:#x} is still live")]
    ReleaseRefused { symbol: &'static str, addr: usize },

    #[error("'{0}' is not part of the contract")]
    UnknownSymbol(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
