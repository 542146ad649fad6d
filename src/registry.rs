//! Kernel registry and dispatch.
//!
//! The registry maps an (operation name, element type, backend) triple to a
//! concrete kernel. Registration happens once at startup — backend modules
//! install their specializations through [`KernelRegistry::register`] — and
//! the table is read-only afterwards, so any number of threads can dispatch
//! concurrently through a shared reference.
//!
//! There is deliberately no fallback: if no kernel was registered for the
//! exact triple, dispatch fails with
//! [`UnsupportedCombination`](crate::error::Error::UnsupportedCombination)
//! rather than silently substituting a different type or backend.

use std::collections::HashMap;

use crate::arrays::Array;
use crate::backend::Backend;
use crate::dtype::ElementType;
use crate::error::{Error, Result};

/// A concrete per-element computation over two whole arrays.
///
/// Kernels assume their inputs were validated by the execution engine: equal
/// shapes, and element types matching the kernel's own. A plain function
/// pointer keeps the registry `Sync` with no locking.
pub type KernelFn = fn(&Array, &Array, &mut Array) -> Result<()>;

/// Handle to one registered kernel: the callable plus the key it was
/// registered under.
#[derive(Debug)]
pub struct Kernel {
    op: Box<str>,
    elem: ElementType,
    backend: Backend,
    f: KernelFn,
}

impl Kernel {
    /// The operation name this kernel implements.
    pub fn op(&self) -> &str {
        &self.op
    }

    /// The element type this kernel is specialized for.
    pub fn element_type(&self) -> ElementType {
        self.elem
    }

    /// The backend this kernel runs on.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub(crate) fn run(&self, lhs: &Array, rhs: &Array, out: &mut Array) -> Result<()> {
        (self.f)(lhs, rhs, out)
    }
}

/// Read-only-after-init table of registered kernels.
///
/// Modeled as an explicitly constructed object passed to dispatch calls; the
/// crate keeps no hidden global kernel state.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    table: HashMap<String, HashMap<(ElementType, Backend), Kernel>>,
}

impl KernelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in kernel installed: the CPU
    /// floor-division family, plus the GPU family when the `wgpu` feature is
    /// enabled.
    pub fn with_builtin_kernels() -> Self {
        let mut reg = Self::new();
        // Built-in registration uses distinct keys, so it cannot collide.
        crate::ops::cpu::register(&mut reg).unwrap_or_else(|e| unreachable!("{e}"));
        #[cfg(feature = "wgpu")]
        crate::ops::wgpu::register(&mut reg).unwrap_or_else(|e| unreachable!("{e}"));
        reg
    }

    /// Registers a kernel for an (op, element type, backend) triple.
    ///
    /// At most one entry may exist per key; a second registration fails with
    /// [`Error::DuplicateKernel`].
    pub fn register(
        &mut self,
        op: &str,
        elem: ElementType,
        backend: Backend,
        f: KernelFn,
    ) -> Result<()> {
        let per_op = self.table.entry(op.to_string()).or_default();
        if per_op.contains_key(&(elem, backend)) {
            return Err(Error::DuplicateKernel {
                op: op.to_string(),
                elem,
                backend,
            });
        }
        log::debug!("registered kernel {op} [{elem}] on {backend:?}");
        per_op.insert(
            (elem, backend),
            Kernel {
                op: op.into(),
                elem,
                backend,
                f,
            },
        );
        Ok(())
    }

    /// Resolves an (op, element type, backend) triple to its kernel handle.
    ///
    /// Resolving the same triple twice returns the same handle. Fails with
    /// [`Error::UnsupportedCombination`] if nothing was registered for the
    /// exact triple.
    pub fn dispatch(&self, op: &str, elem: ElementType, backend: Backend) -> Result<&Kernel> {
        self.table
            .get(op)
            .and_then(|per_op| per_op.get(&(elem, backend)))
            .ok_or_else(|| Error::UnsupportedCombination {
                op: op.to_string(),
                elem,
                backend,
            })
    }

    /// Whether a kernel exists for the triple.
    pub fn supports(&self, op: &str, elem: ElementType, backend: Backend) -> bool {
        self.table
            .get(op)
            .is_some_and(|per_op| per_op.contains_key(&(elem, backend)))
    }

    /// Iterates over all registered (op, element type, backend) keys.
    pub fn keys(&self) -> impl Iterator<Item = (&str, ElementType, Backend)> {
        self.table.iter().flat_map(|(op, per_op)| {
            per_op
                .keys()
                .map(move |&(elem, backend)| (op.as_str(), elem, backend))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_: &Array, _: &Array, _: &mut Array) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut reg = KernelRegistry::new();
        reg.register("nop", ElementType::I32, Backend::Cpu, nop)
            .unwrap();
        let k = reg.dispatch("nop", ElementType::I32, Backend::Cpu).unwrap();
        assert_eq!(k.op(), "nop");
        assert_eq!(k.element_type(), ElementType::I32);
        assert_eq!(k.backend(), Backend::Cpu);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut reg = KernelRegistry::new();
        reg.register("nop", ElementType::I32, Backend::Cpu, nop)
            .unwrap();
        assert!(matches!(
            reg.register("nop", ElementType::I32, Backend::Cpu, nop),
            Err(Error::DuplicateKernel { .. })
        ));
    }

    #[test]
    fn test_no_fallback_across_types_or_backends() {
        let mut reg = KernelRegistry::new();
        reg.register("nop", ElementType::I32, Backend::Cpu, nop)
            .unwrap();
        assert!(matches!(
            reg.dispatch("nop", ElementType::I64, Backend::Cpu),
            Err(Error::UnsupportedCombination { .. })
        ));
        assert!(matches!(
            reg.dispatch("nop", ElementType::I32, Backend::Gpu),
            Err(Error::UnsupportedCombination { .. })
        ));
        assert!(matches!(
            reg.dispatch("other", ElementType::I32, Backend::Cpu),
            Err(Error::UnsupportedCombination { .. })
        ));
    }

    #[test]
    fn test_dispatch_is_idempotent() {
        let mut reg = KernelRegistry::new();
        reg.register("nop", ElementType::I32, Backend::Cpu, nop)
            .unwrap();
        let a = reg.dispatch("nop", ElementType::I32, Backend::Cpu).unwrap();
        let b = reg.dispatch("nop", ElementType::I32, Backend::Cpu).unwrap();
        assert!(std::ptr::eq(a, b));
    }
}
