//! VARIANT wire representation (MS-OAUT 2.2.29)
//!
//! `wireVARIANTStr` is a fixed header followed by a non-encapsulated union
//! switched on `vt`. The union's `u32` discriminant is written right before
//! the arm and must agree with `vt` when decoding.

use msrpc_ndr::{
    read_union, write_union, NdrContext, NdrDecode, NdrEncode, NdrError, NdrReader, NdrUnion,
    NdrWriter, Result, UniquePtr,
};

use crate::BStr;

/// `VARTYPE` values with a wire arm
pub mod vt {
    pub const VT_EMPTY: u16 = 0;
    pub const VT_NULL: u16 = 1;
    pub const VT_I2: u16 = 2;
    pub const VT_I4: u16 = 3;
    pub const VT_R4: u16 = 4;
    pub const VT_R8: u16 = 5;
    pub const VT_CY: u16 = 6;
    pub const VT_DATE: u16 = 7;
    pub const VT_BSTR: u16 = 8;
    pub const VT_ERROR: u16 = 10;
    pub const VT_BOOL: u16 = 11;
    pub const VT_VARIANT: u16 = 12;
    pub const VT_I1: u16 = 16;
    pub const VT_UI1: u16 = 17;
    pub const VT_UI2: u16 = 18;
    pub const VT_UI4: u16 = 19;
    pub const VT_I8: u16 = 20;
    pub const VT_UI8: u16 = 21;
    pub const VT_INT: u16 = 22;
    pub const VT_UINT: u16 = 23;
    pub const VT_BYREF: u16 = 0x4000;
}

/// `VARIANT_BOOL` true
pub const VARIANT_TRUE: i16 = -1;

/// `VARIANT_BOOL` false
pub const VARIANT_FALSE: i16 = 0;

/// Value carried by a VARIANT, one variant per supported `vt`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VariantValue {
    #[default]
    Empty,
    Null,
    I1(i8),
    UI1(u8),
    I2(i16),
    UI2(u16),
    I4(i32),
    UI4(u32),
    Int(i32),
    UInt(u32),
    I8(i64),
    UI8(u64),
    R4(f32),
    R8(f64),
    /// Currency, in units of 1/10000
    Cy(i64),
    Date(f64),
    Bool(bool),
    /// `SCODE`
    Error(i32),
    BStr(BStr),
    /// `VT_VARIANT | VT_BYREF`
    VariantRef(UniquePtr<Variant>),
}

impl VariantValue {
    /// `vt` for this value
    pub fn vartype(&self) -> u16 {
        match self {
            VariantValue::Empty => vt::VT_EMPTY,
            VariantValue::Null => vt::VT_NULL,
            VariantValue::I1(_) => vt::VT_I1,
            VariantValue::UI1(_) => vt::VT_UI1,
            VariantValue::I2(_) => vt::VT_I2,
            VariantValue::UI2(_) => vt::VT_UI2,
            VariantValue::I4(_) => vt::VT_I4,
            VariantValue::UI4(_) => vt::VT_UI4,
            VariantValue::Int(_) => vt::VT_INT,
            VariantValue::UInt(_) => vt::VT_UINT,
            VariantValue::I8(_) => vt::VT_I8,
            VariantValue::UI8(_) => vt::VT_UI8,
            VariantValue::R4(_) => vt::VT_R4,
            VariantValue::R8(_) => vt::VT_R8,
            VariantValue::Cy(_) => vt::VT_CY,
            VariantValue::Date(_) => vt::VT_DATE,
            VariantValue::Bool(_) => vt::VT_BOOL,
            VariantValue::Error(_) => vt::VT_ERROR,
            VariantValue::BStr(_) => vt::VT_BSTR,
            VariantValue::VariantRef(_) => vt::VT_VARIANT | vt::VT_BYREF,
        }
    }
}

impl NdrUnion for VariantValue {
    type Switch = u32;

    fn switch_value(&self) -> u32 {
        u32::from(self.vartype())
    }

    fn ndr_encode_arm(&self, w: &mut NdrWriter) -> Result<()> {
        match self {
            VariantValue::Empty | VariantValue::Null => Ok(()),
            VariantValue::I1(v) => w.write_data(*v),
            VariantValue::UI1(v) => w.write_data(*v),
            VariantValue::I2(v) => w.write_data(*v),
            VariantValue::UI2(v) => w.write_data(*v),
            VariantValue::I4(v) | VariantValue::Int(v) | VariantValue::Error(v) => w.write_data(*v),
            VariantValue::UI4(v) | VariantValue::UInt(v) => w.write_data(*v),
            VariantValue::I8(v) | VariantValue::Cy(v) => w.write_data(*v),
            VariantValue::UI8(v) => w.write_data(*v),
            VariantValue::R4(v) => w.write_data(*v),
            VariantValue::R8(v) | VariantValue::Date(v) => w.write_data(*v),
            VariantValue::Bool(v) => w.write_data(if *v { VARIANT_TRUE } else { VARIANT_FALSE }),
            VariantValue::BStr(v) => v.ndr_encode(w),
            VariantValue::VariantRef(v) => v.ndr_encode(w),
        }
    }

    fn ndr_encode_arm_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        match self {
            VariantValue::BStr(v) => v.ndr_encode_deferred(w),
            VariantValue::VariantRef(v) => v.ndr_encode_deferred(w),
            _ => Ok(()),
        }
    }

    fn ndr_decode_arm(switch: u32, r: &mut NdrReader) -> Result<Self> {
        let Ok(vartype) = u16::try_from(switch) else {
            return Err(NdrError::InvalidDiscriminant(u64::from(switch)));
        };
        let value = match vartype {
            vt::VT_EMPTY => VariantValue::Empty,
            vt::VT_NULL => VariantValue::Null,
            vt::VT_I1 => VariantValue::I1(r.read_data()?),
            vt::VT_UI1 => VariantValue::UI1(r.read_data()?),
            vt::VT_I2 => VariantValue::I2(r.read_data()?),
            vt::VT_UI2 => VariantValue::UI2(r.read_data()?),
            vt::VT_I4 => VariantValue::I4(r.read_data()?),
            vt::VT_UI4 => VariantValue::UI4(r.read_data()?),
            vt::VT_INT => VariantValue::Int(r.read_data()?),
            vt::VT_UINT => VariantValue::UInt(r.read_data()?),
            vt::VT_I8 => VariantValue::I8(r.read_data()?),
            vt::VT_UI8 => VariantValue::UI8(r.read_data()?),
            vt::VT_R4 => VariantValue::R4(r.read_data()?),
            vt::VT_R8 => VariantValue::R8(r.read_data()?),
            vt::VT_CY => VariantValue::Cy(r.read_data()?),
            vt::VT_DATE => VariantValue::Date(r.read_data()?),
            vt::VT_BOOL => VariantValue::Bool(r.read_data::<i16>()? != VARIANT_FALSE),
            vt::VT_ERROR => VariantValue::Error(r.read_data()?),
            vt::VT_BSTR => VariantValue::BStr(BStr::ndr_decode(r)?),
            v if v == vt::VT_VARIANT | vt::VT_BYREF => {
                VariantValue::VariantRef(UniquePtr::ndr_decode(r)?)
            }
            _ => return Err(NdrError::InvalidDiscriminant(u64::from(switch))),
        };
        Ok(value)
    }

    fn ndr_decode_arm_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        match self {
            VariantValue::BStr(v) => v.ndr_decode_deferred(r),
            VariantValue::VariantRef(v) => v.ndr_decode_deferred(r),
            _ => Ok(()),
        }
    }

    fn arm_align(_ctx: &NdrContext) -> usize {
        8
    }
}

/// `wireVARIANTStr`
///
/// `clSize` is not stored: it is computed when encoding and ignored when
/// decoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variant {
    pub rpc_reserved: u32,
    pub reserved: [u16; 3],
    pub value: VariantValue,
}

impl Variant {
    pub fn new(value: VariantValue) -> Self {
        Self { value, ..Self::default() }
    }

    pub fn vartype(&self) -> u16 {
        self.value.vartype()
    }

    fn write_fields(&self, w: &mut NdrWriter, cl_size: u32) -> Result<()> {
        w.write_align(8)?;
        w.write_data(cl_size)?;
        w.write_data(self.rpc_reserved)?;
        w.write_data(self.vartype())?;
        for reserved in self.reserved {
            w.write_data(reserved)?;
        }
        write_union(w, &self.value)?;
        w.write_trailing_gap(8)
    }

    /// Size of the encoded VARIANT, referents included, in 8-byte units
    fn wire_size(&self, ctx: &NdrContext) -> Result<u32> {
        let mut scratch = NdrWriter::new(*ctx);
        self.write_fields(&mut scratch, 0)?;
        self.value.ndr_encode_arm_deferred(&mut scratch)?;
        u32::try_from(scratch.len().div_ceil(8)).map_err(|_| NdrError::IntegerOverflow)
    }
}

impl From<VariantValue> for Variant {
    fn from(value: VariantValue) -> Self {
        Self::new(value)
    }
}

impl NdrEncode for Variant {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let cl_size = self.wire_size(w.context())?;
        self.write_fields(w, cl_size)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.value.ndr_encode_arm_deferred(w)
    }

    fn ndr_align(_ctx: &NdrContext) -> usize {
        8
    }
}

impl NdrDecode for Variant {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        r.read_align(8)?;
        let _cl_size: u32 = r.read_data()?;
        let rpc_reserved = r.read_data()?;
        let vartype: u16 = r.read_data()?;
        let mut reserved = [0u16; 3];
        for slot in &mut reserved {
            *slot = r.read_data()?;
        }
        let value = read_union(r, u32::from(vartype))?;
        r.read_trailing_gap(8)?;
        Ok(Self { rpc_reserved, reserved, value })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.value.ndr_decode_arm_deferred(r)
    }

    fn ndr_align(_ctx: &NdrContext) -> usize {
        8
    }
}

/// `VARIANT` as passed in parameters: a unique pointer to `wireVARIANTStr`
pub type WireVariant = UniquePtr<Variant>;
