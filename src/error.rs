//! Error taxonomy for the dispatch engine.
//!
//! Every failure mode in the crate is a variant of [`Error`]: unknown type
//! names, operand disagreements, missing kernel registrations, and integer
//! division by zero. All errors are reported synchronously to the caller of
//! `dispatch`/`invoke`; nothing is retried and nothing is swallowed.
//! Floating-point special values (NaN/Inf) are outcomes, not errors.

use crate::backend::Backend;
use crate::dtype::ElementType;

/// All errors that can occur while registering, dispatching, or executing
/// an element-wise operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A type name was not found in the [`TypeRegistry`](crate::dtype::TypeRegistry).
    #[error("unknown element type: {name:?}")]
    UnknownType { name: String },

    /// Operand or output element types disagree.
    #[error("element type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: ElementType,
        got: ElementType,
    },

    /// Operand or output shapes disagree. Broadcasting is not supported.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// No kernel was registered for this (op, element type, backend) triple.
    #[error("no kernel registered for {op:?} on {elem} ({backend:?})")]
    UnsupportedCombination {
        op: String,
        elem: ElementType,
        backend: Backend,
    },

    /// Integer division by zero. Floating-point division by zero is not an
    /// error; it produces signed infinity or NaN per IEEE-754.
    #[error("integer division by zero")]
    DivisionByZero,

    /// Data length does not match the shape product when building an array.
    #[error("element count mismatch: shape {shape:?} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    /// A second descriptor was registered under an already-known type name.
    #[error("element type already registered: {name:?}")]
    DuplicateType { name: String },

    /// A second kernel was registered under an already-occupied key.
    #[error("kernel already registered for {op:?} on {elem} ({backend:?})")]
    DuplicateKernel {
        op: String,
        elem: ElementType,
        backend: Backend,
    },

    /// GPU adapter, device, shader, or readback failure.
    #[error("gpu failure: {0}")]
    Gpu(String),
}

/// Convenience Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
