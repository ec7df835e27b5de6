//! BSTR wire representation (MS-OAUT 2.2.23)
//!
//! A `BSTR` travels as `wireBSTR`: a unique pointer to a `FLAGGED_WORD_BLOB`.
//! The blob is a conformant structure, so its conformance is written before
//! the structure itself.

use msrpc_ndr::{
    decode_conformance, decode_elements, encode_conformance, encode_elements, NdrContext,
    NdrDecode, NdrEncode, NdrError, NdrPtr, NdrReader, NdrWriter, Result, UniquePtr,
};

/// `FLAGGED_WORD_BLOB`
///
/// `flags` carries the string length in bytes; `data` holds UTF-16 code units
/// and its length is the `clSize` field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlaggedWordBlob {
    pub flags: u32,
    pub data: Vec<u16>,
}

impl FlaggedWordBlob {
    /// Blob for a string, with `flags` set to its byte length
    pub fn new(s: &str) -> Self {
        Self::from_utf16(s.encode_utf16().collect())
    }

    /// Blob for UTF-16 code units
    ///
    /// `flags` saturates for data too long to marshal; encoding such a blob
    /// fails with [`NdrError::IntegerOverflow`].
    pub fn from_utf16(data: Vec<u16>) -> Self {
        let flags = byte_len(data.len()).unwrap_or(u32::MAX);
        Self { flags, data }
    }

    /// Decode the UTF-16 payload, replacing invalid sequences
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.data)
    }
}

/// Byte length of `units` UTF-16 code units as carried in `fFlags`
fn byte_len(units: usize) -> Result<u32> {
    units
        .checked_mul(2)
        .and_then(|len| u32::try_from(len).ok())
        .ok_or(NdrError::IntegerOverflow)
}

// The conformant `asData` array ends the structure, so no end padding follows it.
impl NdrEncode for FlaggedWordBlob {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        byte_len(self.data.len())?;
        let cl_size = u32::try_from(self.data.len()).map_err(|_| NdrError::IntegerOverflow)?;
        encode_conformance(w, self.data.len())?;
        w.write_align(4)?;
        w.write_data(self.flags)?;
        w.write_data(cl_size)?;
        encode_elements(w, &self.data)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for FlaggedWordBlob {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let conformance = decode_conformance(r)?;
        r.read_align(4)?;
        let flags: u32 = r.read_data()?;
        let cl_size: u32 = r.read_data()?;
        if conformance != u64::from(cl_size) {
            return Err(NdrError::ConformanceMismatch {
                max_count: conformance,
                actual_count: u64::from(cl_size),
            });
        }
        let data = decode_elements(r, cl_size as usize)?;
        Ok(Self { flags, data })
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// `BSTR` as marshaled: null is distinct from the empty string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BStr(pub UniquePtr<FlaggedWordBlob>);

impl BStr {
    pub fn new(s: &str) -> Self {
        Self(UniquePtr::new(FlaggedWordBlob::new(s)))
    }

    pub fn null() -> Self {
        Self(UniquePtr::null())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// UTF-16 code units, `None` for a null BSTR
    pub fn as_utf16(&self) -> Option<&[u16]> {
        self.0.as_ref().map(|blob| blob.data.as_slice())
    }

    /// Text of the string, `None` for a null BSTR
    pub fn to_string_lossy(&self) -> Option<String> {
        self.0.as_ref().map(FlaggedWordBlob::to_string_lossy)
    }
}

impl From<&str> for BStr {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Option<&str>> for BStr {
    fn from(s: Option<&str>) -> Self {
        s.map_or_else(Self::null, Self::new)
    }
}

impl NdrEncode for BStr {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.ndr_encode_deferred(w)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for BStr {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Ok(Self(UniquePtr::ndr_decode(r)?))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.ndr_decode_deferred(r)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}
