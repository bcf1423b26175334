//! Error types for the Quasar render core.
//!
//! Only genuinely invariant-breaking conditions surface as errors here.
//! Recoverable conditions (virtual-texture pool exhausted, empty layers,
//! material prebuild failure) degrade or no-op instead — see the per-module
//! documentation.

use std::fmt;

/// Result type for render core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Render core errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A programming-error invariant was broken (corrupt spatial index,
    /// double-free of a pool slot, inconsistent batch ranges). Continuing
    /// past one of these would corrupt shared render state.
    InvariantViolated(String),

    /// An allocation request exceeded a fixed capacity (e.g. a dynamic
    /// buffer page, the quad-list index range).
    CapacityExceeded {
        /// Requested size/count
        requested: u64,
        /// Available capacity
        capacity: u64,
    },

    /// Backend-specific error reported by the graphics device
    BackendError(String),

    /// Invalid resource (zero-sized buffer, unknown handle, etc.)
    InvalidResource(String),
}

impl Error {
    /// Shorthand for an `InvariantViolated` error with a source tag.
    pub fn invariant(source: &str, msg: impl Into<String>) -> Self {
        Error::InvariantViolated(format!("[{}] {}", source, msg.into()))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvariantViolated(msg) => write!(f, "Invariant violated: {}", msg),
            Error::CapacityExceeded { requested, capacity } => {
                write!(f, "Capacity exceeded: requested {} of {}", requested, capacity)
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
