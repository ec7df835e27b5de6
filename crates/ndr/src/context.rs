//! NDR encoding/decoding context
//!
//! The context carries the negotiated transfer syntax, the byte order of the
//! data representation label and the decode limits. It also provides the
//! alignment arithmetic and primitive byte-order helpers used by the writer
//! and reader.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};

use crate::error::{MAX_NDR_ALLOCATION_SIZE, MAX_NDR_ARRAY_ELEMENTS, MAX_NDR_DEPTH};

/// Alignment request meaning "the size of a pointer on the wire".
///
/// Resolves to 4 under NDR20 and 8 under NDR64.
pub const ALIGN_POINTER: usize = 9;

/// Negotiated transfer syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum TransferSyntax {
    /// NDR 2.0 (8a885d04-1ceb-11c9-9fe8-08002b104860)
    #[default]
    Ndr20,
    /// NDR64 (71710533-beba-4937-8319-b5dbef9ccc36)
    Ndr64,
}

impl TransferSyntax {
    /// Transfer syntax UUID string
    pub fn uuid(self) -> &'static str {
        match self {
            TransferSyntax::Ndr20 => "8a885d04-1ceb-11c9-9fe8-08002b104860",
            TransferSyntax::Ndr64 => "71710533-beba-4937-8319-b5dbef9ccc36",
        }
    }

    /// Transfer syntax version
    pub fn version(self) -> u32 {
        match self {
            TransferSyntax::Ndr20 => 2,
            TransferSyntax::Ndr64 => 1,
        }
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferSyntax::Ndr20 => f.write_str("ndr20"),
            TransferSyntax::Ndr64 => f.write_str("ndr64"),
        }
    }
}

/// Error returned when parsing an unknown transfer syntax name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transfer syntax: {0}")]
pub struct UnknownTransferSyntax(pub String);

impl FromStr for TransferSyntax {
    type Err = UnknownTransferSyntax;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ndr20" | "ndr" => Ok(TransferSyntax::Ndr20),
            "ndr64" => Ok(TransferSyntax::Ndr64),
            other => Err(UnknownTransferSyntax(other.to_string())),
        }
    }
}

/// Bounds applied while decoding untrusted input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdrLimits {
    /// Maximum element count of a single array or string
    pub max_array_elements: usize,
    /// Maximum bytes a single array or string may allocate
    pub max_allocation_size: usize,
    /// Maximum nesting of pointer referents, counting the top-level value
    pub max_depth: usize,
}

impl Default for NdrLimits {
    fn default() -> Self {
        Self {
            max_array_elements: MAX_NDR_ARRAY_ELEMENTS,
            max_allocation_size: MAX_NDR_ALLOCATION_SIZE,
            max_depth: MAX_NDR_DEPTH,
        }
    }
}

/// NDR encoding/decoding context
#[derive(Debug, Clone, Copy)]
pub struct NdrContext {
    /// Whether to use little-endian byte order
    pub little_endian: bool,
    /// Transfer syntax in effect
    pub syntax: TransferSyntax,
    /// Decode limits
    pub limits: NdrLimits,
}

impl NdrContext {
    /// Create a new NDR20 context with little-endian byte order (default)
    pub fn new() -> Self {
        Self {
            little_endian: true,
            syntax: TransferSyntax::Ndr20,
            limits: NdrLimits::default(),
        }
    }

    /// Create an NDR64 context
    pub fn ndr64() -> Self {
        Self {
            syntax: TransferSyntax::Ndr64,
            ..Self::new()
        }
    }

    /// Create a context with big-endian byte order
    pub fn big_endian() -> Self {
        Self {
            little_endian: false,
            ..Self::new()
        }
    }

    /// Create a context with specified byte order
    pub fn with_byte_order(little_endian: bool) -> Self {
        Self {
            little_endian,
            ..Self::new()
        }
    }

    /// Create a context for the given transfer syntax
    pub fn with_syntax(syntax: TransferSyntax) -> Self {
        Self { syntax, ..Self::new() }
    }

    /// Create a context from a DCE data representation label.
    ///
    /// Only the integer representation nibble matters to NDR decoding here;
    /// ASCII characters and IEEE floats are assumed.
    pub fn from_drep(drep: [u8; 4]) -> Self {
        Self::with_byte_order(drep[0] & 0xf0 != 0)
    }

    /// Replace the decode limits
    pub fn with_limits(mut self, limits: NdrLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Data representation label for this context
    pub fn drep(&self) -> [u8; 4] {
        [if self.little_endian { 0x10 } else { 0x00 }, 0, 0, 0]
    }

    /// True under NDR64
    #[inline]
    pub fn is_ndr64(&self) -> bool {
        self.syntax == TransferSyntax::Ndr64
    }

    /// Width in bytes of referent IDs, conformance, offsets and counts
    #[inline]
    pub fn pointer_size(&self) -> usize {
        if self.is_ndr64() {
            8
        } else {
            4
        }
    }

    /// Resolve an alignment request, mapping [`ALIGN_POINTER`] to the syntax pointer size
    #[inline]
    pub fn resolve_align(&self, alignment: usize) -> usize {
        if alignment == ALIGN_POINTER {
            self.pointer_size()
        } else {
            alignment
        }
    }

    /// Calculate padding needed to align to the given boundary
    #[inline]
    pub fn align_padding(position: usize, alignment: usize) -> usize {
        if alignment == 0 || alignment == 1 {
            return 0;
        }
        let remainder = position % alignment;
        if remainder == 0 {
            0
        } else {
            alignment - remainder
        }
    }

    // Primitive encoding methods

    /// Put a u8
    #[inline]
    pub fn put_u8<B: BufMut>(&self, buf: &mut B, value: u8) {
        buf.put_u8(value);
    }

    /// Put an i8
    #[inline]
    pub fn put_i8<B: BufMut>(&self, buf: &mut B, value: i8) {
        buf.put_i8(value);
    }

    /// Put a u16
    #[inline]
    pub fn put_u16<B: BufMut>(&self, buf: &mut B, value: u16) {
        if self.little_endian {
            buf.put_u16_le(value);
        } else {
            buf.put_u16(value);
        }
    }

    /// Put an i16
    #[inline]
    pub fn put_i16<B: BufMut>(&self, buf: &mut B, value: i16) {
        if self.little_endian {
            buf.put_i16_le(value);
        } else {
            buf.put_i16(value);
        }
    }

    /// Put a u32
    #[inline]
    pub fn put_u32<B: BufMut>(&self, buf: &mut B, value: u32) {
        if self.little_endian {
            buf.put_u32_le(value);
        } else {
            buf.put_u32(value);
        }
    }

    /// Put an i32
    #[inline]
    pub fn put_i32<B: BufMut>(&self, buf: &mut B, value: i32) {
        if self.little_endian {
            buf.put_i32_le(value);
        } else {
            buf.put_i32(value);
        }
    }

    /// Put a u64
    #[inline]
    pub fn put_u64<B: BufMut>(&self, buf: &mut B, value: u64) {
        if self.little_endian {
            buf.put_u64_le(value);
        } else {
            buf.put_u64(value);
        }
    }

    /// Put an i64
    #[inline]
    pub fn put_i64<B: BufMut>(&self, buf: &mut B, value: i64) {
        if self.little_endian {
            buf.put_i64_le(value);
        } else {
            buf.put_i64(value);
        }
    }

    /// Put an f32
    #[inline]
    pub fn put_f32<B: BufMut>(&self, buf: &mut B, value: f32) {
        if self.little_endian {
            buf.put_f32_le(value);
        } else {
            buf.put_f32(value);
        }
    }

    /// Put an f64
    #[inline]
    pub fn put_f64<B: BufMut>(&self, buf: &mut B, value: f64) {
        if self.little_endian {
            buf.put_f64_le(value);
        } else {
            buf.put_f64(value);
        }
    }

    // Primitive decoding methods. Callers check `remaining()` first.

    /// Get a u8
    #[inline]
    pub fn get_u8<B: Buf>(&self, buf: &mut B) -> u8 {
        buf.get_u8()
    }

    /// Get an i8
    #[inline]
    pub fn get_i8<B: Buf>(&self, buf: &mut B) -> i8 {
        buf.get_i8()
    }

    /// Get a u16
    #[inline]
    pub fn get_u16<B: Buf>(&self, buf: &mut B) -> u16 {
        if self.little_endian {
            buf.get_u16_le()
        } else {
            buf.get_u16()
        }
    }

    /// Get an i16
    #[inline]
    pub fn get_i16<B: Buf>(&self, buf: &mut B) -> i16 {
        if self.little_endian {
            buf.get_i16_le()
        } else {
            buf.get_i16()
        }
    }

    /// Get a u32
    #[inline]
    pub fn get_u32<B: Buf>(&self, buf: &mut B) -> u32 {
        if self.little_endian {
            buf.get_u32_le()
        } else {
            buf.get_u32()
        }
    }

    /// Get an i32
    #[inline]
    pub fn get_i32<B: Buf>(&self, buf: &mut B) -> i32 {
        if self.little_endian {
            buf.get_i32_le()
        } else {
            buf.get_i32()
        }
    }

    /// Get a u64
    #[inline]
    pub fn get_u64<B: Buf>(&self, buf: &mut B) -> u64 {
        if self.little_endian {
            buf.get_u64_le()
        } else {
            buf.get_u64()
        }
    }

    /// Get an i64
    #[inline]
    pub fn get_i64<B: Buf>(&self, buf: &mut B) -> i64 {
        if self.little_endian {
            buf.get_i64_le()
        } else {
            buf.get_i64()
        }
    }

    /// Get an f32
    #[inline]
    pub fn get_f32<B: Buf>(&self, buf: &mut B) -> f32 {
        if self.little_endian {
            buf.get_f32_le()
        } else {
            buf.get_f32()
        }
    }

    /// Get an f64
    #[inline]
    pub fn get_f64<B: Buf>(&self, buf: &mut B) -> f64 {
        if self.little_endian {
            buf.get_f64_le()
        } else {
            buf.get_f64()
        }
    }
}

impl Default for NdrContext {
    fn default() -> Self {
        Self::new()
    }
}
