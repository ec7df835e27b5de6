//! NDR primitive type implementations
//!
//! NDR primitive types and their encodings:
//!
//! | MIDL Type     | Rust Type | Size | Alignment |
//! |---------------|-----------|------|-----------|
//! | boolean       | bool      | 1    | 1         |
//! | byte/char     | u8        | 1    | 1         |
//! | small         | i8        | 1    | 1         |
//! | short         | i16       | 2    | 2         |
//! | long/int      | i32       | 4    | 4         |
//! | hyper         | i64       | 8    | 8         |
//! | unsigned short| u16       | 2    | 2         |
//! | unsigned long | u32       | 4    | 4         |
//! | unsigned hyper| u64       | 8    | 8         |
//! | float         | f32       | 4    | 4         |
//! | double        | f64       | 8    | 8         |
//! | wchar_t       | u16       | 2    | 2         |
//! | __int3264     | Int3264   | 4/8  | 4/8       |

use crate::{NdrContext, NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};
use bytes::{Buf, BufMut};

/// A fixed-size scalar with natural alignment
///
/// Primitives are the only values [`NdrWriter::write_data`] and
/// [`NdrReader::read_data`] accept; everything else is built from them.
pub trait NdrPrimitive: Copy + Sized {
    /// Wire size in bytes, also the alignment
    const SIZE: usize;

    /// Put the value in the context's byte order
    fn put<B: BufMut>(self, ctx: &NdrContext, buf: &mut B);

    /// Get a value in the context's byte order; the caller checked `remaining()`
    fn get<B: Buf>(ctx: &NdrContext, buf: &mut B) -> Self;
}

/// An integral primitive usable as a union discriminant
pub trait NdrDiscriminant: NdrPrimitive + Eq {
    /// Widen for comparison and error reporting
    fn as_u64(self) -> u64;
}

// Macro to implement NdrPrimitive/NdrEncode/NdrDecode for scalar types
macro_rules! impl_ndr_primitive {
    ($ty:ty, $size:expr, $put:ident, $get:ident) => {
        impl NdrPrimitive for $ty {
            const SIZE: usize = $size;

            #[inline]
            fn put<B: BufMut>(self, ctx: &NdrContext, buf: &mut B) {
                ctx.$put(buf, self);
            }

            #[inline]
            fn get<B: Buf>(ctx: &NdrContext, buf: &mut B) -> Self {
                ctx.$get(buf)
            }
        }

        impl NdrEncode for $ty {
            fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
                w.write_data(*self)
            }

            fn ndr_align(_ctx: &NdrContext) -> usize {
                $size
            }
        }

        impl NdrDecode for $ty {
            fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
                r.read_data()
            }

            fn ndr_align(_ctx: &NdrContext) -> usize {
                $size
            }
        }
    };
}

macro_rules! impl_ndr_discriminant {
    ($($ty:ty),*) => {
        $(
            impl NdrDiscriminant for $ty {
                #[inline]
                fn as_u64(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_ndr_primitive!(u8, 1, put_u8, get_u8);
impl_ndr_primitive!(i8, 1, put_i8, get_i8);
impl_ndr_primitive!(u16, 2, put_u16, get_u16);
impl_ndr_primitive!(i16, 2, put_i16, get_i16);
impl_ndr_primitive!(u32, 4, put_u32, get_u32);
impl_ndr_primitive!(i32, 4, put_i32, get_i32);
impl_ndr_primitive!(u64, 8, put_u64, get_u64);
impl_ndr_primitive!(i64, 8, put_i64, get_i64);
impl_ndr_primitive!(f32, 4, put_f32, get_f32);
impl_ndr_primitive!(f64, 8, put_f64, get_f64);

impl_ndr_discriminant!(u8, i8, u16, i16, u32, i32, u64, i64);

/// NDR boolean - encoded as a single byte (0x00 = false, 0x01 = true)
impl NdrPrimitive for bool {
    const SIZE: usize = 1;

    fn put<B: BufMut>(self, _ctx: &NdrContext, buf: &mut B) {
        buf.put_u8(u8::from(self));
    }

    fn get<B: Buf>(_ctx: &NdrContext, buf: &mut B) -> Self {
        buf.get_u8() != 0
    }
}

impl NdrEncode for bool {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_data(*self)
    }

    fn ndr_align(_ctx: &NdrContext) -> usize {
        1
    }
}

impl NdrDecode for bool {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        r.read_data()
    }

    fn ndr_align(_ctx: &NdrContext) -> usize {
        1
    }
}

/// `__int3264` - 32 bits under NDR20, 64 bits under NDR64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Int3264(pub i64);

impl NdrEncode for Int3264 {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        if w.context().is_ndr64() {
            w.write_data(self.0)
        } else {
            let narrow = i32::try_from(self.0).map_err(|_| crate::NdrError::IntegerOverflow)?;
            w.write_data(narrow)
        }
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for Int3264 {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        if r.context().is_ndr64() {
            Ok(Self(r.read_data::<i64>()?))
        } else {
            Ok(Self(i64::from(r.read_data::<i32>()?)))
        }
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// `unsigned __int3264` - 32 bits under NDR20, 64 bits under NDR64
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct UInt3264(pub u64);

impl NdrEncode for UInt3264 {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        if w.context().is_ndr64() {
            w.write_data(self.0)
        } else {
            let narrow = u32::try_from(self.0).map_err(|_| crate::NdrError::IntegerOverflow)?;
            w.write_data(narrow)
        }
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for UInt3264 {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        if r.context().is_ndr64() {
            Ok(Self(r.read_data::<u64>()?))
        } else {
            Ok(Self(u64::from(r.read_data::<u32>()?)))
        }
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// GUID/UUID type for NDR encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// Nil GUID
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Parse from string "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx", braces optional
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('{').trim_end_matches('}');
        if s.len() != 36 {
            return None;
        }
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 5 {
            return None;
        }
        // exact-length groups of hex digits only; from_str_radix would take a sign
        let well_formed = parts
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(part, len)| part.len() == len && part.bytes().all(|b| b.is_ascii_hexdigit()));
        if !well_formed {
            return None;
        }

        let data1 = u32::from_str_radix(parts[0], 16).ok()?;
        let data2 = u16::from_str_radix(parts[1], 16).ok()?;
        let data3 = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;
        let node_str = parts[4];

        let mut data4 = [0u8; 8];
        data4[..2].copy_from_slice(&clock.to_be_bytes());
        for i in 0..6 {
            data4[2 + i] = u8::from_str_radix(node_str.get(i * 2..i * 2 + 2)?, 16).ok()?;
        }

        Some(Self { data1, data2, data3, data4 })
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl NdrEncode for Guid {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_align(4)?;
        w.write_data(self.data1)?;
        w.write_data(self.data2)?;
        w.write_data(self.data3)?;
        w.write_bytes(&self.data4);
        w.write_trailing_gap(4)
    }

    fn ndr_align(_ctx: &NdrContext) -> usize {
        4
    }
}

impl NdrDecode for Guid {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        r.read_align(4)?;
        let data1 = r.read_data()?;
        let data2 = r.read_data()?;
        let data3 = r.read_data()?;
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&r.read_bytes(8)?);
        r.read_trailing_gap(4)?;
        Ok(Self { data1, data2, data3, data4 })
    }

    fn ndr_align(_ctx: &NdrContext) -> usize {
        4
    }
}
