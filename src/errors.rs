//! Signal Bus Error Hierarchy
//!
//! Defines the error types surfaced synchronously by the signal engine,
//! its rate control and the settings loader.

use std::convert::Infallible;

use config::ConfigError;

use crate::Token;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failures of the dispatch engine's public operations
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Settings could not be loaded or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Settings loaded but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Detach with a token that is not (or no longer) attached
    #[error("Unknown signal token: {0}")]
    UnknownToken(Token),

    /// Rejected rate value, scheduler state left untouched
    #[error("Invalid dispatch rate {0}: rate should be a positive integer or unbounded")]
    InvalidRate(String),

    /// Engine constructed outside of a tokio runtime
    #[error("No tokio runtime available to drive signal dispatch")]
    RuntimeUnavailable,
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl Error {
    /// Returns the dispatch error kind, if this is one.
    pub fn as_dispatch(&self) -> Option<&DispatchError> {
        match self {
            Error::Dispatch(e) => Some(e),
            _ => None,
        }
    }
}
