//! Backend selection module.
//!
//! This module defines the available execution targets for element-wise
//! kernels and provides functions to set and get the process-wide default
//! backend.
//!
//! # Supported Backends
//!
//! - `Cpu` — rayon-parallel pure Rust backend (default).
//! - `Gpu` — GPU-accelerated backend using `wgpu` (behind the `wgpu` feature).
//!
//! The default backend is stored globally using an `AtomicU8`, enabling fast
//! switching at runtime. It is only a convenience for
//! [`invoke_default`](crate::ops::dispatch::invoke_default); every dispatch
//! entry point also accepts the backend explicitly.

use core::convert::TryFrom;
use core::sync::atomic::{AtomicU8, Ordering};

/// Enumeration of supported execution backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Backend {
    /// Rayon-parallel CPU backend (default).
    #[default]
    Cpu = 0,
    /// GPU-accelerated backend using `wgpu`.
    Gpu,
}

impl TryFrom<u8> for Backend {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Cpu),
            1 => Ok(Self::Gpu),
            _ => Err(()),
        }
    }
}

/// Internal global state for the default backend.
static GLOBAL_DEFAULT_BACKEND: AtomicU8 = AtomicU8::new(Backend::Cpu as u8);

/// Sets the default backend used by `invoke_default`.
///
/// # Example
///
/// ```
/// use cwise::backend::{set_default_backend, Backend};
/// set_default_backend(Backend::Cpu);
/// ```
pub fn set_default_backend(b: Backend) {
    GLOBAL_DEFAULT_BACKEND.store(b as u8, Ordering::Release);
}

/// Returns the current default backend.
///
/// If the stored value is invalid, defaults to [`Backend::Cpu`].
pub fn default_backend() -> Backend {
    Backend::try_from(GLOBAL_DEFAULT_BACKEND.load(Ordering::Acquire)).unwrap_or_default()
}
