//! NDR string types
//!
//! NDR strings are conformant varying arrays with a null terminator.
//!
//! Wire format:
//! ```text
//! max_count: size    # Maximum elements including null
//! offset: size       # Always 0
//! actual_count: size # Actual elements including null
//! chars[actual_count]
//! ```
//!
//! Nothing follows the characters; whatever comes next aligns itself.

use crate::arrays::check_varying;
use crate::{NdrContext, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

fn encode_header(w: &mut NdrWriter, len_with_null: usize) -> Result<()> {
    let count = len_with_null as u64;
    w.write_size(count)?;
    w.write_size(0)?;
    w.write_size(count)
}

/// Read the three counts and return the element count, terminator included
fn decode_header(r: &mut NdrReader, element_size: usize) -> Result<usize> {
    let max_count = r.read_size()?;
    let offset = r.read_size()?;
    let actual_count = r.read_size()?;

    if offset != 0 {
        return Err(NdrError::InvalidString(format!("non-zero offset {offset}")));
    }
    check_varying(max_count, offset, actual_count)?;
    if actual_count == 0 {
        return Err(NdrError::InvalidString("missing null terminator".to_string()));
    }

    let count = usize::try_from(actual_count).map_err(|_| NdrError::IntegerOverflow)?;
    r.check_count(count, element_size)?;
    Ok(count)
}

/// ANSI string type (null-terminated char*)
///
/// Used for [string] annotated char* parameters in MIDL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrString(pub String);

impl NdrString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for NdrString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NdrString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for NdrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl NdrEncode for NdrString {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let bytes = self.0.as_bytes();
        encode_header(w, bytes.len() + 1)?;
        w.write_bytes(bytes);
        w.write_bytes(&[0]);
        Ok(())
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for NdrString {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let count = decode_header(r, 1)?;
        let chars = r.read_bytes(count)?;
        let Some((&0, text)) = chars.split_last() else {
            return Err(NdrError::InvalidString("missing null terminator".to_string()));
        };
        Ok(Self(String::from_utf8(text.to_vec())?))
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// Unicode string type (null-terminated wchar_t*)
///
/// Used for [string] annotated wchar_t* parameters in MIDL.
/// Encoded as UTF-16 code units in the context's byte order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdrWString(pub String);

impl NdrWString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for NdrWString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NdrWString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for NdrWString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl NdrEncode for NdrWString {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let units: Vec<u16> = self.0.encode_utf16().collect();
        encode_header(w, units.len() + 1)?;
        for unit in units {
            w.write_data(unit)?;
        }
        w.write_data(0u16)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for NdrWString {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let count = decode_header(r, 2)?;
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(r.read_data::<u16>()?);
        }
        if units.pop() != Some(0) {
            return Err(NdrError::InvalidString("missing null terminator".to_string()));
        }
        let s = char::decode_utf16(units).collect::<std::result::Result<String, _>>()?;
        Ok(Self(s))
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}
