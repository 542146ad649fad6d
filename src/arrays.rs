//! Core array data structure.
//!
//! An [`Array`] is an ownership-bearing buffer of one element type with a
//! fixed shape and flat row-major data layout. Arrays are created by the
//! caller, read by kernels, and destroyed by their owner; the engine never
//! retains them.
//!
//! ## Design Highlights
//! - Arrays are runtime-typed: the element type travels with the data as a
//!   [`Buffer`] variant, so heterogeneous code can hold `Array` values
//!   without generics, while kernels get typed slices back out.
//! - Shape is stored as a `Vec<usize>` and enforced at construction.
//! - The `array!` macro supports ergonomic creation from nested literals.
//!
//! ## Limitations
//! - Row-major only
//! - No broadcasting, slicing, or shape inference

use crate::dtype::{ElementType, Scalar};
use crate::error::{Error, Result};

/// Type-erased element storage: one vector variant per supported scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    I32(Vec<i32>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    I64(Vec<i64>),
    F16(Vec<half::f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    BF16(Vec<half::bf16>),
}

impl Buffer {
    /// The element type stored in this buffer.
    pub fn element_type(&self) -> ElementType {
        match self {
            Buffer::I32(_) => ElementType::I32,
            Buffer::U8(_) => ElementType::U8,
            Buffer::U16(_) => ElementType::U16,
            Buffer::I16(_) => ElementType::I16,
            Buffer::I64(_) => ElementType::I64,
            Buffer::F16(_) => ElementType::F16,
            Buffer::F32(_) => ElementType::F32,
            Buffer::F64(_) => ElementType::F64,
            Buffer::BF16(_) => ElementType::BF16,
        }
    }

    /// Number of elements held.
    pub fn len(&self) -> usize {
        match self {
            Buffer::I32(v) => v.len(),
            Buffer::U8(v) => v.len(),
            Buffer::U16(v) => v.len(),
            Buffer::I16(v) => v.len(),
            Buffer::I64(v) => v.len(),
            Buffer::F16(v) => v.len(),
            Buffer::F32(v) => v.len(),
            Buffer::F64(v) => v.len(),
            Buffer::BF16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn zeros(elem: ElementType, n: usize) -> Buffer {
        match elem {
            ElementType::I32 => Buffer::I32(vec![0; n]),
            ElementType::U8 => Buffer::U8(vec![0; n]),
            ElementType::U16 => Buffer::U16(vec![0; n]),
            ElementType::I16 => Buffer::I16(vec![0; n]),
            ElementType::I64 => Buffer::I64(vec![0; n]),
            ElementType::F16 => Buffer::F16(vec![half::f16::ZERO; n]),
            ElementType::F32 => Buffer::F32(vec![0.0; n]),
            ElementType::F64 => Buffer::F64(vec![0.0; n]),
            ElementType::BF16 => Buffer::BF16(vec![half::bf16::ZERO; n]),
        }
    }
}

/// An N-dimensional array with a shape and flat row-major data.
///
/// All elements share one [`ElementType`]. `shape` defines the structure,
/// e.g. `[2, 3]` for a 2×3 matrix; the buffer holds the flattened content in
/// row-major order, and its length always equals the product of the
/// dimension sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: Vec<usize>,
    data: Buffer,
}

impl Array {
    /// Creates an array from a shape and flat typed data.
    ///
    /// Fails with [`Error::ElementCountMismatch`] if the number of elements
    /// does not match the shape product.
    pub fn from_vec<T: Scalar>(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.iter().product::<usize>();
        if expected != data.len() {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            shape,
            data: T::into_buffer(data),
        })
    }

    /// Creates a zero-filled array of the given shape and element type.
    pub fn zeros(shape: impl Into<Vec<usize>>, elem: ElementType) -> Self {
        let shape = shape.into();
        let n = shape.iter().product::<usize>();
        Self {
            shape,
            data: Buffer::zeros(elem, n),
        }
    }

    /// The element type of this array.
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// The dimension sizes, outermost first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of elements (product of the dimension sizes).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrows the flat data as a typed slice.
    ///
    /// Fails with [`Error::TypeMismatch`] if `T` is not the stored type.
    pub fn as_slice<T: Scalar>(&self) -> Result<&[T]> {
        T::buffer_slice(&self.data).ok_or(Error::TypeMismatch {
            expected: T::ELEM,
            got: self.element_type(),
        })
    }

    /// Mutably borrows the flat data as a typed slice.
    ///
    /// Fails with [`Error::TypeMismatch`] if `T` is not the stored type.
    pub fn as_mut_slice<T: Scalar>(&mut self) -> Result<&mut [T]> {
        let got = self.element_type();
        T::buffer_slice_mut(&mut self.data).ok_or(Error::TypeMismatch {
            expected: T::ELEM,
            got,
        })
    }
}

/// Defines an array from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in
/// shape. Innermost entries are matched as expressions, so negated literals
/// like `-7` work; the element type is inferred from them.
///
/// # Example
/// ```
/// use cwise::array;
/// let a = array!([[1.0f32, -2.0], [3.0, 4.0]]);
/// assert_eq!(a.shape(), &[2, 2]);
/// ```
#[macro_export]
macro_rules! array {
    // Every element is itself a bracketed row: recurse per row and stack.
    ([ $( [ $($row:tt)* ] ),+ $(,)? ]) => {{
        let children = vec![ $( $crate::array!([ $($row)* ]) ),+ ];
        let first_shape = children[0].shape().to_vec();
        assert!(children.iter().all(|c| c.shape() == &first_shape[..]),
            "ragged array literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(&first_shape);
        $crate::arrays::__from_nested(shape, children)
    }};

    // Flat leaf row: expression fragments accept unary minus.
    ([ $( $x:expr ),+ $(,)? ]) => {{
        let data = vec![ $( $x ),+ ];
        let shape = vec![data.len()];
        $crate::arrays::Array::from_vec(shape, data).unwrap()
    }};

    ($x:expr) => {
        $crate::arrays::Array::from_vec(Vec::<usize>::new(), vec![$x]).unwrap()
    };
}

/// Flattens uniformly-shaped children into one array. Macro support only.
#[doc(hidden)]
pub fn __from_nested(shape: Vec<usize>, children: Vec<Array>) -> Array {
    let data = match children[0].data {
        Buffer::I32(_) => concat::<i32>(&children),
        Buffer::U8(_) => concat::<u8>(&children),
        Buffer::U16(_) => concat::<u16>(&children),
        Buffer::I16(_) => concat::<i16>(&children),
        Buffer::I64(_) => concat::<i64>(&children),
        Buffer::F16(_) => concat::<half::f16>(&children),
        Buffer::F32(_) => concat::<f32>(&children),
        Buffer::F64(_) => concat::<f64>(&children),
        Buffer::BF16(_) => concat::<half::bf16>(&children),
    };
    Array { shape, data }
}

fn concat<T: Scalar>(children: &[Array]) -> Buffer {
    let mut flat = Vec::with_capacity(children.len() * children[0].len());
    for c in children {
        // Uniformity is checked by the macro before this runs.
        flat.extend_from_slice(T::buffer_slice(&c.data).unwrap());
    }
    T::into_buffer(flat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_checks_element_count() {
        let err = Array::from_vec(vec![2, 2], vec![1.0f32, 2.0, 3.0]);
        assert!(matches!(err, Err(Error::ElementCountMismatch { .. })));
    }

    #[test]
    fn test_typed_slice_access() {
        let a = Array::from_vec(vec![3], vec![1i32, 2, 3]).unwrap();
        assert_eq!(a.as_slice::<i32>().unwrap(), &[1, 2, 3]);
        assert!(matches!(
            a.as_slice::<f32>(),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_zeros() {
        let a = Array::zeros(vec![2, 3], ElementType::U16);
        assert_eq!(a.len(), 6);
        assert_eq!(a.element_type(), ElementType::U16);
        assert_eq!(a.as_slice::<u16>().unwrap(), &[0; 6]);
    }

    #[test]
    fn test_array_macro() {
        let a = array!([[1.0f64, 2.0], [3.0, 4.0]]);
        assert_eq!(a.shape(), &[2, 2]);
        assert_eq!(a.as_slice::<f64>().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_array_macro_ints() {
        let a = array!([[-7i32, 7], [2, -2]]);
        assert_eq!(a.element_type(), ElementType::I32);
        assert_eq!(a.as_slice::<i32>().unwrap(), &[-7, 7, 2, -2]);
    }

    #[test]
    fn test_array_macro_negative_literals() {
        let a = array!([-7i32]);
        assert_eq!(a.shape(), &[1]);
        assert_eq!(a.as_slice::<i32>().unwrap(), &[-7]);

        let b = array!([-7.5f64, 2.0, -0.5]);
        assert_eq!(b.shape(), &[3]);
        assert_eq!(b.as_slice::<f64>().unwrap(), &[-7.5, 2.0, -0.5]);
    }

    #[test]
    fn test_array_macro_nested_mixed_signs() {
        let a = array!([[[1i32], [-2]], [[3], [-4]]]);
        assert_eq!(a.shape(), &[2, 2, 1]);
        assert_eq!(a.as_slice::<i32>().unwrap(), &[1, -2, 3, -4]);
    }
}
