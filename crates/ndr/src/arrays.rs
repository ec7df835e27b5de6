//! NDR array types
//!
//! NDR supports several array types:
//!
//! - Fixed arrays: size known at compile time
//! - Conformant arrays: size determined at runtime, transmitted as prefix
//! - Varying arrays: subset of elements transmitted
//! - Conformant varying arrays: both conformant and varying
//!
//! Counts are in elements, 4 bytes under NDR20 and 8 under NDR64. The flat
//! part of an array is its counts and the flat part of each element; element
//! referents follow in the deferred part, in element order.

use std::marker::PhantomData;

use crate::{NdrContext, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// Smallest number of bytes one element of `T` can occupy on the wire
fn min_element_size<T: NdrDecode>(ctx: &NdrContext) -> usize {
    ctx.resolve_align(T::ndr_align(ctx)).max(1)
}

fn count_to_u64(count: usize) -> u64 {
    count as u64
}

fn count_from_u64(count: u64) -> Result<usize> {
    usize::try_from(count).map_err(|_| NdrError::IntegerOverflow)
}

/// Write the conformance of a conformant array
///
/// Structures with an embedded conformant array write this at their start
/// and the elements at their end.
pub fn encode_conformance(w: &mut NdrWriter, max_count: usize) -> Result<()> {
    w.write_size(count_to_u64(max_count))
}

/// Read a conformance written by [`encode_conformance`]
pub fn decode_conformance(r: &mut NdrReader) -> Result<u64> {
    r.read_size()
}

/// Write the flat part of each element
pub fn encode_elements<T: NdrEncode>(w: &mut NdrWriter, elements: &[T]) -> Result<()> {
    for elem in elements {
        elem.ndr_encode(w)?;
    }
    Ok(())
}

/// Write the deferred part of each element
pub fn encode_elements_deferred<T: NdrEncode>(w: &mut NdrWriter, elements: &[T]) -> Result<()> {
    for elem in elements {
        elem.ndr_encode_deferred(w)?;
    }
    Ok(())
}

/// Read the flat part of `count` elements after checking the count is plausible
pub fn decode_elements<T: NdrDecode>(r: &mut NdrReader, count: usize) -> Result<Vec<T>> {
    let element_size = min_element_size::<T>(r.context());
    r.check_count(count, element_size)?;
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        elements.push(T::ndr_decode(r)?);
    }
    Ok(elements)
}

/// Read the deferred part of each element
pub fn decode_elements_deferred<T: NdrDecode>(r: &mut NdrReader, elements: &mut [T]) -> Result<()> {
    for elem in elements {
        elem.ndr_decode_deferred(r)?;
    }
    Ok(())
}

/// Fixed-size array
///
/// Wire format: just the elements (no size prefix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedArray<T, const N: usize> {
    pub elements: [T; N],
}

impl<T: Default, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            elements: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T, const N: usize> FixedArray<T, N> {
    pub fn new(elements: [T; N]) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for FixedArray<T, N> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements(w, &self.elements)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(w, &self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        T::ndr_align(ctx)
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for FixedArray<T, N> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let elements: Vec<T> = decode_elements(r, N)?;
        let got = elements.len();
        let elements = elements
            .try_into()
            .map_err(|_| NdrError::ArraySizeMismatch { expected: N, got })?;
        Ok(Self { elements })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(r, &mut self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        T::ndr_align(ctx)
    }
}

/// Conformant array - size determined at runtime
///
/// Wire format:
/// ```text
/// max_count: size     # Maximum elements
/// elements[max_count] # Element data
/// ```
///
/// In a structure the conformance moves to the structure start; see
/// [`encode_conformance`] and [`decode_elements`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantArray<T> {
    pub elements: Vec<T>,
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode> NdrEncode for ConformantArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        encode_conformance(w, self.elements.len())?;
        encode_elements(w, &self.elements)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(w, &self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size().max(T::ndr_align(ctx))
    }
}

impl<T: NdrDecode> NdrDecode for ConformantArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let max_count = count_from_u64(decode_conformance(r)?)?;
        let elements = decode_elements(r, max_count)?;
        Ok(Self { elements })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(r, &mut self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size().max(T::ndr_align(ctx))
    }
}

/// Varying array - subset of a fixed array transmitted
///
/// Wire format:
/// ```text
/// offset: size       # First transmitted element
/// actual_count: size # Number of transmitted elements
/// elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingArray<T, const N: usize> {
    pub offset: usize,
    pub elements: Vec<T>,
    _marker: PhantomData<[T; N]>,
}

impl<T, const N: usize> Default for VaryingArray<T, N> {
    fn default() -> Self {
        Self {
            offset: 0,
            elements: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<T, const N: usize> VaryingArray<T, N> {
    pub fn new(elements: Vec<T>) -> Self {
        Self::with_offset(0, elements)
    }

    pub fn with_offset(offset: usize, elements: Vec<T>) -> Self {
        Self {
            offset,
            elements,
            _marker: PhantomData,
        }
    }

    fn check_bounds(offset: usize, actual_count: usize) -> Result<()> {
        let end = offset.checked_add(actual_count).ok_or(NdrError::IntegerOverflow)?;
        if end > N {
            return Err(NdrError::ArraySizeMismatch { expected: N, got: end });
        }
        Ok(())
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for VaryingArray<T, N> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        Self::check_bounds(self.offset, self.elements.len())?;
        w.write_size(count_to_u64(self.offset))?;
        w.write_size(count_to_u64(self.elements.len()))?;
        encode_elements(w, &self.elements)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(w, &self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size().max(T::ndr_align(ctx))
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for VaryingArray<T, N> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let offset = count_from_u64(r.read_size()?)?;
        let actual_count = count_from_u64(r.read_size()?)?;
        Self::check_bounds(offset, actual_count)?;
        let elements = decode_elements(r, actual_count)?;
        Ok(Self::with_offset(offset, elements))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(r, &mut self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size().max(T::ndr_align(ctx))
    }
}

/// Conformant varying array - size and subset determined at runtime
///
/// Wire format:
/// ```text
/// max_count: size    # Maximum elements (conformance)
/// offset: size       # First transmitted element
/// actual_count: size # Number of transmitted elements
/// elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConformantVaryingArray<T> {
    pub max_count: usize,
    pub offset: usize,
    pub elements: Vec<T>,
}

impl<T> ConformantVaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        let len = elements.len();
        Self::with_max(len, elements)
    }

    pub fn with_max(max_count: usize, elements: Vec<T>) -> Self {
        Self {
            max_count,
            offset: 0,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Check `offset + actual_count <= max_count`
pub(crate) fn check_varying(max_count: u64, offset: u64, actual_count: u64) -> Result<()> {
    let end = offset.checked_add(actual_count).ok_or(NdrError::IntegerOverflow)?;
    if end > max_count {
        return Err(NdrError::ConformanceMismatch {
            max_count,
            actual_count: end,
        });
    }
    Ok(())
}

impl<T: NdrEncode> NdrEncode for ConformantVaryingArray<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let max_count = count_to_u64(self.max_count);
        let offset = count_to_u64(self.offset);
        let actual_count = count_to_u64(self.elements.len());
        check_varying(max_count, offset, actual_count)?;
        w.write_size(max_count)?;
        w.write_size(offset)?;
        w.write_size(actual_count)?;
        encode_elements(w, &self.elements)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        encode_elements_deferred(w, &self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size().max(T::ndr_align(ctx))
    }
}

impl<T: NdrDecode> NdrDecode for ConformantVaryingArray<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let max_count = r.read_size()?;
        let offset = r.read_size()?;
        let actual_count = r.read_size()?;
        check_varying(max_count, offset, actual_count)?;

        let elements = decode_elements(r, count_from_u64(actual_count)?)?;
        Ok(Self {
            max_count: count_from_u64(max_count)?,
            offset: count_from_u64(offset)?,
            elements,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        decode_elements_deferred(r, &mut self.elements)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size().max(T::ndr_align(ctx))
    }
}
