//! # Operation Kernels and Dispatch
//!
//! This module defines the element-wise kernels and dispatches them across
//! compute backends.
//!
//! ## Submodules
//!
//! - [`cpu`] — rayon-parallel CPU kernels (default backend)
//! - [`wgpu`] *(opt-in)* — GPU compute shader pipelines using `wgpu`
//! - [`dispatch`] — shape/type validation and unified invocation
//!
//! ## The floor-division family
//!
//! Two operation names are registered, one per numeric family:
//!
//! - [`FLOOR_DIV`] for integer element types — floor semantics (round toward
//!   negative infinity), integer division by zero is an error
//! - [`FLOOR_DIV_REAL`] for floating element types — `floor(a / b)` with
//!   IEEE-754 semantics, division by zero yields ±Inf or NaN
//!
//! Each kernel is a separate specialization for exactly one element type;
//! there is no implicit cross-type promotion.
//!
//! ## Extending the registry
//!
//! To add a new operation:
//!
//! 1. Implement it in one or more backends (e.g. `cpu`, `wgpu`)
//! 2. Register it from the backend's `register` function
//! 3. Invoke it by name through [`dispatch::invoke`]
//!
//! ## Feature Flags
//!
//! - `simd` — enables the AVX2-accelerated f64 CPU path
//! - `wgpu` — enables the `wgpu` (WebGPU) backend

pub mod cpu;
pub mod dispatch;
#[cfg(feature = "wgpu")]
pub mod wgpu;

/// Operation name for integer floor division.
pub const FLOOR_DIV: &str = "floor_div";

/// Operation name for real-valued floor division.
pub const FLOOR_DIV_REAL: &str = "floor_div_real";
