//! cwise: typed element-wise binary-operation dispatch for CPU and GPU.
//!
//! A small numeric dispatch engine: arrays carry a runtime element type,
//! kernels are registered once per (operation, element type, backend)
//! triple, and invocation resolves the exact triple — no silent fallback,
//! no implicit promotion — before running the kernel over the flat index
//! space with backend-appropriate parallelism.
//!
//! # Modules
//!
//! - [`dtype`] — element types, the [`Scalar`] bridge trait, and the
//!   name-keyed [`TypeRegistry`].
//! - [`arrays`] — the shape-carrying, runtime-typed [`Array`].
//! - [`backend`] — execution targets and the process default backend.
//! - [`registry`] — kernel registration and dispatch.
//! - [`ops`] — the floor-division kernel family and the execution engine.
//!
//! # Example
//!
//! ```
//! use cwise::{array, invoke, Backend, KernelRegistry};
//!
//! let registry = KernelRegistry::with_builtin_kernels();
//! let quot = invoke(
//!     &registry,
//!     "floor_div",
//!     Backend::Cpu,
//!     &array!([7i32, -7]),
//!     &array!([2i32, 2]),
//! )?;
//! assert_eq!(quot.as_slice::<i32>()?, &[3, -4]);
//! # Ok::<(), cwise::Error>(())
//! ```
//!
//! # Feature Flags
//!
//! - `wgpu` — enables the GPU backend ([`Backend::Gpu`])
//! - `simd` — enables the AVX2 CPU path for f64

pub mod arrays;
pub mod backend;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod registry;

pub use arrays::Array;
pub use backend::{Backend, default_backend, set_default_backend};
pub use dtype::{ElementType, Scalar, TypeDesc, TypeRegistry};
pub use error::{Error, Result};
pub use ops::dispatch::{execute, execute_into, invoke, invoke_default};
pub use ops::{FLOOR_DIV, FLOOR_DIV_REAL};
pub use registry::{Kernel, KernelFn, KernelRegistry};
