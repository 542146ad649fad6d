//! Execution engine: validation and unified invocation.
//!
//! This layer sits between the caller and the concrete kernels. It checks
//! that both operands and the output agree on shape and element type, then
//! hands the arrays to the kernel resolved by the
//! [`KernelRegistry`](crate::registry::KernelRegistry).
//!
//! # Behavior
//! - Shapes must match exactly; broadcasting is a documented extension
//!   point, not a default — mismatches fail with `ShapeMismatch`.
//! - Element types must match exactly across both operands, the output, and
//!   the kernel's own specialization — no silent promotion.
//! - A failing element computation (integer division by zero) aborts the
//!   whole call; partial writes to the output are permitted but must not be
//!   relied upon.
//! - On the GPU backend the launch is asynchronous; the kernel blocks on
//!   completion internally, so the output is ready when the call returns.

use crate::arrays::Array;
use crate::backend::{Backend, default_backend};
use crate::error::{Error, Result};
use crate::registry::{Kernel, KernelRegistry};

fn check_agreement(kernel: &Kernel, lhs: &Array, rhs: &Array, out: &Array) -> Result<()> {
    if lhs.shape() != rhs.shape() {
        return Err(Error::ShapeMismatch {
            expected: lhs.shape().to_vec(),
            got: rhs.shape().to_vec(),
        });
    }
    if lhs.shape() != out.shape() {
        return Err(Error::ShapeMismatch {
            expected: lhs.shape().to_vec(),
            got: out.shape().to_vec(),
        });
    }
    for arr in [lhs, rhs, out] {
        if arr.element_type() != kernel.element_type() {
            return Err(Error::TypeMismatch {
                expected: kernel.element_type(),
                got: arr.element_type(),
            });
        }
    }
    Ok(())
}

/// Applies a kernel element-wise into a caller-provided output array.
///
/// Requires `lhs.shape == rhs.shape == out.shape` and that all three arrays
/// carry the kernel's element type. Each output element is written exactly
/// once with no ordering guarantee between elements.
pub fn execute_into(kernel: &Kernel, lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
    check_agreement(kernel, lhs, rhs, out)?;
    if lhs.is_empty() {
        return Ok(());
    }
    log::trace!(
        "executing {} [{}] on {:?}, {} elements",
        kernel.op(),
        kernel.element_type(),
        kernel.backend(),
        lhs.len()
    );
    kernel.run(lhs, rhs, out)
}

/// Applies a kernel element-wise, allocating the output array.
pub fn execute(kernel: &Kernel, lhs: &Array, rhs: &Array) -> Result<Array> {
    let mut out = Array::zeros(lhs.shape().to_vec(), kernel.element_type());
    execute_into(kernel, lhs, rhs, &mut out)?;
    Ok(out)
}

/// Resolves an operation by name and applies it to two arrays.
///
/// The element type is taken from `lhs`; the dispatch fails with
/// [`Error::UnsupportedCombination`] when no kernel was registered for the
/// exact (op, type, backend) triple.
///
/// # Example
/// ```
/// use cwise::{array, invoke, Backend, KernelRegistry};
///
/// let reg = KernelRegistry::with_builtin_kernels();
/// let out = invoke(&reg, "floor_div", Backend::Cpu, &array!([7i32]), &array!([2i32]))?;
/// assert_eq!(out.as_slice::<i32>()?, &[3]);
/// # Ok::<(), cwise::Error>(())
/// ```
pub fn invoke(
    registry: &KernelRegistry,
    op: &str,
    backend: Backend,
    lhs: &Array,
    rhs: &Array,
) -> Result<Array> {
    let kernel = registry.dispatch(op, lhs.element_type(), backend)?;
    execute(kernel, lhs, rhs)
}

/// Like [`invoke`], using the process-wide default backend.
pub fn invoke_default(
    registry: &KernelRegistry,
    op: &str,
    lhs: &Array,
    rhs: &Array,
) -> Result<Array> {
    invoke(registry, op, default_backend(), lhs, rhs)
}
