//! Error types for the neuronet engine.
//!
//! This module provides a unified error type for every fallible operation in
//! the crate, using the `thiserror` crate for ergonomic error handling.

use crate::codec::NetworkType;
use thiserror::Error;

/// The main error type for neuronet operations.
///
/// Every variant represents genuine misuse or corrupt input. None of them is
/// used for ordinary control flow and nothing in the engine retries.
#[derive(Error, Debug)]
pub enum NeuroError {
    /// A node was requested by an index outside `[0, count)`
    #[error("{kind} node index out of range: index {index}, count {count}")]
    IndexOutOfRange {
        /// Which layer was addressed ("input", "middle", "output")
        kind: &'static str,
        /// The index that was requested
        index: usize,
        /// The number of nodes in that layer
        count: usize,
    },

    /// A persisted network's type tag does not match the target network
    #[error("Cannot load data, invalid format: expected {expected:?} network, found {found:?}")]
    FormatMismatch {
        /// Type of the network being loaded into
        expected: NetworkType,
        /// Type tag stored in the stream
        found: NetworkType,
    },

    /// The persisted stream is structurally broken
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Input or target vector does not match the network dimension
    #[error("Invalid input size: expected {expected}, got {actual}")]
    InvalidInputSize {
        /// Expected size
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Invalid construction parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A BAM system output was read before a Run selected a network
    #[error("BAM system has no selected network; learn a pattern and run first")]
    NoNetworks,

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary encoding error occurred
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON encoding error occurred
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NeuroError {
    pub(crate) fn index(kind: &'static str, index: usize, count: usize) -> Self {
        NeuroError::IndexOutOfRange { kind, index, count }
    }
}

/// A specialized `Result` type for neuronet operations.
pub type Result<T> = std::result::Result<T, NeuroError>;
