//! Error types for the validated parts of the API.
//!
//! The scheduling core itself never fails: a by-name operation that finds no
//! scene reports `false` or `None`, and an operation that is not valid in the
//! current state is ignored. Errors only come from checked constructors and
//! from trace backends refusing a record.

use thiserror::Error;

/// Errors reported by checked constructors and descriptor parsers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("invalid frame rate: {0} (must be finite and >= 0)")]
    InvalidFrameRate(f64),
    #[error("invalid duration: {0} s (must be finite and > 0)")]
    InvalidDuration(f64),
    #[error("invalid scene descriptor `{0}` (expected name:fps[:life_sec])")]
    InvalidDescriptor(String),
}

/// Errors a trace backend may report for a single record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("backend rejected record {0:#04x}")]
    Rejected(u8),
}
