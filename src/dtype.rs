//! Element types and the type registry.
//!
//! Every array carries an [`ElementType`] that fixes its element size and
//! numeric behavior at creation time. The supported set mirrors the types a
//! floor-division kernel family is instantiated over:
//!
//! - `I32`, `I16`, `I64` — signed integers
//! - `U8`, `U16` — unsigned integers
//! - `F32`, `F64` — IEEE single and double floats
//! - `F16`, `BF16` — reduced-precision floats, for mixed-precision work
//!
//! The [`Scalar`] trait is the bridge between Rust's type system and the
//! runtime [`ElementType`], so generic code can write `fn zeros<T: Scalar>`
//! and have the element type determined from `T`.

use std::collections::HashMap;
use std::fmt;

use crate::arrays::Buffer;
use crate::error::{Error, Result};

/// Enum of all supported element data types.
///
/// Stored inside every array so operations can be dispatched to the correct
/// typed kernel at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    I32,
    U8,
    U16,
    I16,
    I64,
    F16,
    F32,
    F64,
    BF16,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::F16 | ElementType::BF16 => 2,
            ElementType::I32 | ElementType::F32 => 4,
            ElementType::I64 | ElementType::F64 => 8,
        }
    }

    /// Whether this is a floating-point type (IEEE semantics, no division
    /// errors).
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            ElementType::F16 | ElementType::BF16 | ElementType::F32 | ElementType::F64
        )
    }

    /// Whether this type carries a sign bit.
    pub fn is_signed(&self) -> bool {
        !matches!(self, ElementType::U8 | ElementType::U16)
    }

    /// Whether this is a half-precision type (F16 or BF16).
    pub fn is_half(&self) -> bool {
        matches!(self, ElementType::F16 | ElementType::BF16)
    }

    /// The canonical lowercase name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::I32 => "i32",
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::I16 => "i16",
            ElementType::I64 => "i64",
            ElementType::F16 => "f16",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::BF16 => "bf16",
        }
    }

    /// All supported element types, in registration order.
    pub const ALL: [ElementType; 9] = [
        ElementType::I32,
        ElementType::U8,
        ElementType::U16,
        ElementType::I16,
        ElementType::I64,
        ElementType::F16,
        ElementType::F32,
        ElementType::F64,
        ElementType::BF16,
    ];
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Immutable descriptor for one registered element type.
///
/// Byte width and signedness are fixed at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDesc {
    pub name: &'static str,
    pub elem: ElementType,
    pub size_in_bytes: usize,
    pub is_float: bool,
    pub is_signed: bool,
}

impl TypeDesc {
    /// Builds the descriptor for an element type.
    pub fn of(elem: ElementType) -> Self {
        Self {
            name: elem.name(),
            elem,
            size_in_bytes: elem.size_in_bytes(),
            is_float: elem.is_float(),
            is_signed: elem.is_signed(),
        }
    }
}

/// Name-keyed table of element type descriptors.
///
/// Populated once at startup and read-only thereafter. Lookups for names
/// that were never registered fail with [`Error::UnknownType`].
#[derive(Debug, Default)]
pub struct TypeRegistry {
    table: HashMap<&'static str, TypeDesc>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with all nine built-in types.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        for elem in ElementType::ALL {
            // Built-in names are distinct, so registration cannot collide.
            let _ = reg.register(TypeDesc::of(elem));
        }
        reg
    }

    /// Adds a descriptor exactly once.
    pub fn register(&mut self, desc: TypeDesc) -> Result<()> {
        if self.table.contains_key(desc.name) {
            return Err(Error::DuplicateType {
                name: desc.name.to_string(),
            });
        }
        self.table.insert(desc.name, desc);
        Ok(())
    }

    /// Looks up a descriptor by name.
    pub fn resolve(&self, name: &str) -> Result<&TypeDesc> {
        self.table.get(name).ok_or_else(|| Error::UnknownType {
            name: name.to_string(),
        })
    }
}

/// Trait implemented by Rust types that can be stored in an [`Array`].
///
/// Provides the mapping between the concrete Rust type and the
/// [`ElementType`] enum, plus conversions in and out of the type-erased
/// buffer and through f64 for generic numeric code.
///
/// [`Array`]: crate::arrays::Array
pub trait Scalar: Copy + Send + Sync + fmt::Debug + 'static {
    /// The corresponding [`ElementType`] variant.
    const ELEM: ElementType;

    /// Wraps a vector of this type into a type-erased buffer.
    fn into_buffer(v: Vec<Self>) -> Buffer;

    /// Borrows the typed contents of a buffer, or `None` on type mismatch.
    fn buffer_slice(b: &Buffer) -> Option<&[Self]>;

    /// Mutably borrows the typed contents of a buffer.
    fn buffer_slice_mut(b: &mut Buffer) -> Option<&mut [Self]>;

    /// Creates a value of this type from f64.
    fn from_f64(v: f64) -> Self;

    /// Converts this value to f64.
    fn to_f64(self) -> f64;

    /// The zero value.
    fn zero() -> Self {
        Self::from_f64(0.0)
    }
}

macro_rules! impl_scalar {
    ($ty:ty, $elem:ident, $variant:ident, |$v:ident| $from:expr, |$s:ident| $to:expr) => {
        impl Scalar for $ty {
            const ELEM: ElementType = ElementType::$elem;

            fn into_buffer(v: Vec<Self>) -> Buffer {
                Buffer::$variant(v)
            }

            fn buffer_slice(b: &Buffer) -> Option<&[Self]> {
                match b {
                    Buffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn buffer_slice_mut(b: &mut Buffer) -> Option<&mut [Self]> {
                match b {
                    Buffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn from_f64($v: f64) -> Self {
                $from
            }

            fn to_f64(self) -> f64 {
                let $s = self;
                $to
            }
        }
    };
}

impl_scalar!(i32, I32, I32, |v| v as i32, |s| s as f64);
impl_scalar!(u8, U8, U8, |v| v as u8, |s| s as f64);
impl_scalar!(u16, U16, U16, |v| v as u16, |s| s as f64);
impl_scalar!(i16, I16, I16, |v| v as i16, |s| s as f64);
impl_scalar!(i64, I64, I64, |v| v as i64, |s| s as f64);
impl_scalar!(half::f16, F16, F16, |v| half::f16::from_f64(v), |s| s
    .to_f32() as f64);
impl_scalar!(f32, F32, F32, |v| v as f32, |s| s as f64);
impl_scalar!(f64, F64, F64, |v| v, |s| s);
impl_scalar!(half::bf16, BF16, BF16, |v| half::bf16::from_f64(v), |s| s
    .to_f32() as f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_sizes() {
        assert_eq!(ElementType::U8.size_in_bytes(), 1);
        assert_eq!(ElementType::F16.size_in_bytes(), 2);
        assert_eq!(ElementType::BF16.size_in_bytes(), 2);
        assert_eq!(ElementType::I32.size_in_bytes(), 4);
        assert_eq!(ElementType::F64.size_in_bytes(), 8);
        assert_eq!(ElementType::I64.size_in_bytes(), 8);
    }

    #[test]
    fn test_element_type_flags() {
        assert!(ElementType::F16.is_float());
        assert!(ElementType::BF16.is_half());
        assert!(!ElementType::I32.is_float());
        assert!(ElementType::I16.is_signed());
        assert!(!ElementType::U16.is_signed());
    }

    #[test]
    fn test_registry_resolve() {
        let reg = TypeRegistry::builtin();
        let desc = reg.resolve("bf16").unwrap();
        assert_eq!(desc.elem, ElementType::BF16);
        assert_eq!(desc.size_in_bytes, 2);
        assert!(desc.is_float);
    }

    #[test]
    fn test_registry_unknown_type() {
        let reg = TypeRegistry::builtin();
        assert!(matches!(
            reg.resolve("complex64"),
            Err(Error::UnknownType { .. })
        ));
    }

    #[test]
    fn test_registry_duplicate() {
        let mut reg = TypeRegistry::builtin();
        assert!(matches!(
            reg.register(TypeDesc::of(ElementType::F32)),
            Err(Error::DuplicateType { .. })
        ));
    }

    #[test]
    fn test_scalar_element_types() {
        assert_eq!(i32::ELEM, ElementType::I32);
        assert_eq!(half::f16::ELEM, ElementType::F16);
        assert_eq!(half::bf16::ELEM, ElementType::BF16);
        assert_eq!(f64::ELEM, ElementType::F64);
    }

    #[test]
    fn test_scalar_f64_roundtrip() {
        assert_eq!(i64::from_f64(42.0).to_f64(), 42.0);
        assert_eq!(half::bf16::from_f64(2.0).to_f64(), 2.0);
    }
}
