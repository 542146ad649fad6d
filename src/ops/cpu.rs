//! Parallel CPU backend kernels.
//!
//! # CPU Backend
//!
//! This module provides the CPU specializations of the floor-division
//! family, one per element type, stamped out by `macro_rules!` tables so
//! every type gets its own concrete kernel.
//!
//! ## Features
//!
//! - Parallel execution using [`rayon`](https://docs.rs/rayon)
//! - Optional SIMD acceleration using AVX2 (enabled via the `simd` feature
//!   flag) for the f64 kernel
//! - Pure Rust fallback path when SIMD is disabled or unavailable
//!
//! ## Semantics
//!
//! - Integer kernels round the quotient toward negative infinity, not toward
//!   zero: the truncated quotient is decremented when the remainder is
//!   nonzero and the operand signs differ. Overflow (`MIN / -1`) wraps.
//! - Integer division by zero fails with
//!   [`Error::DivisionByZero`](crate::error::Error::DivisionByZero); the
//!   divisor scan runs before any element is computed, so the whole call
//!   aborts and the output is untouched.
//! - Float kernels compute `floor(a / b)` with IEEE-754 semantics; division
//!   by zero produces signed infinity or NaN, never an error. F16 and BF16
//!   promote to f32 for the computation and demote the floored result, which
//!   keeps them bit-for-bit identical to the GPU backend's f32 transport.

use rayon::prelude::*;

use crate::arrays::Array;
use crate::backend::Backend;
use crate::dtype::ElementType;
use crate::error::{Error, Result};
use crate::ops::{FLOOR_DIV, FLOOR_DIV_REAL};
use crate::registry::KernelRegistry;

#[cfg(all(feature = "simd", target_arch = "x86_64", target_feature = "avx2"))]
use std::arch::x86_64::*;

macro_rules! floor_div_signed {
    ($fname:ident, $ty:ty) => {
        fn $fname(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
            let a = lhs.as_slice::<$ty>()?;
            let b = rhs.as_slice::<$ty>()?;
            if b.par_iter().any(|&d| d == 0) {
                return Err(Error::DivisionByZero);
            }
            out.as_mut_slice::<$ty>()?
                .par_iter_mut()
                .zip(a.par_iter().zip(b.par_iter()))
                .for_each(|(y, (&x, &d))| {
                    let q = x.wrapping_div(d);
                    let r = x.wrapping_rem(d);
                    *y = if r != 0 && ((x < 0) != (d < 0)) {
                        q.wrapping_sub(1)
                    } else {
                        q
                    };
                });
            Ok(())
        }
    };
}

macro_rules! floor_div_unsigned {
    ($fname:ident, $ty:ty) => {
        fn $fname(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
            let a = lhs.as_slice::<$ty>()?;
            let b = rhs.as_slice::<$ty>()?;
            if b.par_iter().any(|&d| d == 0) {
                return Err(Error::DivisionByZero);
            }
            out.as_mut_slice::<$ty>()?
                .par_iter_mut()
                .zip(a.par_iter().zip(b.par_iter()))
                .for_each(|(y, (&x, &d))| *y = x / d);
            Ok(())
        }
    };
}

macro_rules! floor_div_real {
    ($fname:ident, $ty:ty) => {
        fn $fname(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
            let a = lhs.as_slice::<$ty>()?;
            let b = rhs.as_slice::<$ty>()?;
            out.as_mut_slice::<$ty>()?
                .par_iter_mut()
                .zip(a.par_iter().zip(b.par_iter()))
                .for_each(|(y, (&x, &d))| *y = (x / d).floor());
            Ok(())
        }
    };
}

macro_rules! floor_div_half {
    ($fname:ident, $ty:ty) => {
        fn $fname(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
            let a = lhs.as_slice::<$ty>()?;
            let b = rhs.as_slice::<$ty>()?;
            out.as_mut_slice::<$ty>()?
                .par_iter_mut()
                .zip(a.par_iter().zip(b.par_iter()))
                .for_each(|(y, (&x, &d))| {
                    *y = <$ty>::from_f32((x.to_f32() / d.to_f32()).floor());
                });
            Ok(())
        }
    };
}

floor_div_signed!(floor_div_i32, i32);
floor_div_signed!(floor_div_i16, i16);
floor_div_signed!(floor_div_i64, i64);
floor_div_unsigned!(floor_div_u8, u8);
floor_div_unsigned!(floor_div_u16, u16);
floor_div_real!(floor_div_f32, f32);
floor_div_half!(floor_div_f16, half::f16);
floor_div_half!(floor_div_bf16, half::bf16);

/// The f64 kernel is written out longhand so it can carry the AVX2 path.
fn floor_div_f64(lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
    let a = lhs.as_slice::<f64>()?;
    let b = rhs.as_slice::<f64>()?;
    let o = out.as_mut_slice::<f64>()?;

    #[cfg(all(feature = "simd", target_arch = "x86_64", target_feature = "avx2"))]
    {
        const LANES: usize = 4;
        o.par_chunks_mut(LANES)
            .zip(a.par_chunks(LANES).zip(b.par_chunks(LANES)))
            .for_each(|(out_chunk, (a_chunk, b_chunk))| unsafe {
                let mut a_buf = [0.0; LANES];
                // Padding lanes divide by one so no spurious FP exceptions fire.
                let mut b_buf = [1.0; LANES];
                a_buf[..a_chunk.len()].copy_from_slice(a_chunk);
                b_buf[..b_chunk.len()].copy_from_slice(b_chunk);

                let x = _mm256_loadu_pd(a_buf.as_ptr());
                let d = _mm256_loadu_pd(b_buf.as_ptr());
                let y = _mm256_floor_pd(_mm256_div_pd(x, d));

                let mut out_buf = [0.0; LANES];
                _mm256_storeu_pd(out_buf.as_mut_ptr(), y);
                out_chunk.copy_from_slice(&out_buf[..a_chunk.len()]);
            });
    }

    #[cfg(not(all(feature = "simd", target_arch = "x86_64", target_feature = "avx2")))]
    {
        o.par_iter_mut()
            .zip(a.par_iter().zip(b.par_iter()))
            .for_each(|(y, (&x, &d))| *y = (x / d).floor());
    }

    Ok(())
}

/// Installs every CPU kernel into the registry. Called once at startup by
/// [`KernelRegistry::with_builtin_kernels`].
pub fn register(reg: &mut KernelRegistry) -> Result<()> {
    reg.register(FLOOR_DIV, ElementType::I32, Backend::Cpu, floor_div_i32)?;
    reg.register(FLOOR_DIV, ElementType::U8, Backend::Cpu, floor_div_u8)?;
    reg.register(FLOOR_DIV, ElementType::U16, Backend::Cpu, floor_div_u16)?;
    reg.register(FLOOR_DIV, ElementType::I16, Backend::Cpu, floor_div_i16)?;
    reg.register(FLOOR_DIV, ElementType::I64, Backend::Cpu, floor_div_i64)?;
    reg.register(FLOOR_DIV_REAL, ElementType::F16, Backend::Cpu, floor_div_f16)?;
    reg.register(FLOOR_DIV_REAL, ElementType::F32, Backend::Cpu, floor_div_f32)?;
    reg.register(FLOOR_DIV_REAL, ElementType::F64, Backend::Cpu, floor_div_f64)?;
    reg.register(
        FLOOR_DIV_REAL,
        ElementType::BF16,
        Backend::Cpu,
        floor_div_bf16,
    )?;
    Ok(())
}
