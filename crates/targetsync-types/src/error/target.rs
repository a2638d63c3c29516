//! Target parsing errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing an `address:port` string into a target.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum TargetParseError {
    /// No `:port` suffix present
    #[error("Missing port in target: {input}")]
    MissingPort {
        /// The rejected input
        input: String,
    },

    /// Port is not a number in 0..=65535
    #[error("Invalid port in target: {input}")]
    InvalidPort {
        /// The rejected input
        input: String,
    },

    /// Address part is empty
    #[error("Empty address in target: {input}")]
    EmptyAddress {
        /// The rejected input
        input: String,
    },
}
