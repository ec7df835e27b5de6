//! NDR discriminated unions
//!
//! A union is a discriminant followed by the arm it selects. Non-encapsulated
//! unions (`switch_is`) carry the discriminant as a separate value written
//! right before the arm; encapsulated unions wrap both in a structure.
//! Under NDR64 the union is aligned to the larger of the discriminant size
//! and its arm alignment before the discriminant, and the arm is aligned
//! again after it.

use crate::{NdrContext, NdrDecode, NdrDiscriminant, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// A discriminated union
///
/// Implementors dispatch on the discriminant in [`ndr_decode_arm`](NdrUnion::ndr_decode_arm)
/// and return [`NdrError::InvalidDiscriminant`] for a value with no arm.
pub trait NdrUnion: Sized {
    /// Discriminant type
    type Switch: NdrDiscriminant;

    /// Discriminant selecting the current arm
    fn switch_value(&self) -> Self::Switch;

    /// Encode the flat part of the current arm
    fn ndr_encode_arm(&self, w: &mut NdrWriter) -> Result<()>;

    /// Encode referents of the current arm
    fn ndr_encode_arm_deferred(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }

    /// Decode the flat part of the arm selected by `switch`
    fn ndr_decode_arm(switch: Self::Switch, r: &mut NdrReader) -> Result<Self>;

    /// Decode referents of the current arm
    fn ndr_decode_arm_deferred(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }

    /// Largest alignment of any arm
    fn arm_align(_ctx: &NdrContext) -> usize {
        1
    }
}

fn union_align<U: NdrUnion>(ctx: &NdrContext) -> usize {
    <U::Switch as crate::NdrPrimitive>::SIZE.max(U::arm_align(ctx))
}

/// Write a non-encapsulated union: discriminant, then the arm
pub fn write_union<U: NdrUnion>(w: &mut NdrWriter, value: &U) -> Result<()> {
    w.write_union_align(union_align::<U>(w.context()))?;
    w.write_switch(value.switch_value())?;
    let align = U::arm_align(w.context());
    w.write_union_align(align)?;
    value.ndr_encode_arm(w)
}

/// Read a non-encapsulated union whose discriminant must equal `expected`
///
/// `expected` is the value of the field named by the union's `switch_is`.
pub fn read_union<U: NdrUnion>(r: &mut NdrReader, expected: U::Switch) -> Result<U> {
    r.read_union_align(union_align::<U>(r.context()))?;
    let switch: U::Switch = r.read_switch()?;
    if switch != expected {
        return Err(NdrError::DiscriminantMismatch {
            expected: expected.as_u64(),
            got: switch.as_u64(),
        });
    }
    let align = U::arm_align(r.context());
    r.read_union_align(align)?;
    U::ndr_decode_arm(switch, r)
}

/// Encapsulated union: the discriminant travels inside the structure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Encapsulated<U>(pub U);

impl<U: NdrUnion> Encapsulated<U> {
    fn struct_align(ctx: &NdrContext) -> usize {
        union_align::<U>(ctx)
    }
}

impl<U: NdrUnion> NdrEncode for Encapsulated<U> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let align = Self::struct_align(w.context());
        w.write_align(align)?;
        write_union(w, &self.0)?;
        w.write_trailing_gap(align)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.ndr_encode_arm_deferred(w)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        Self::struct_align(ctx)
    }
}

impl<U: NdrUnion> NdrDecode for Encapsulated<U> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let align = Self::struct_align(r.context());
        r.read_align(align)?;
        let switch: U::Switch = r.read_switch()?;
        let arm_align = U::arm_align(r.context());
        r.read_union_align(arm_align)?;
        let value = U::ndr_decode_arm(switch, r)?;
        r.read_trailing_gap(align)?;
        Ok(Self(value))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.ndr_decode_arm_deferred(r)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        Self::struct_align(ctx)
    }
}
