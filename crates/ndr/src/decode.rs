//! NDR decoding trait

use crate::{NdrContext, NdrReader, Result};

/// Trait for types that can be decoded from NDR format
///
/// Mirrors [`NdrEncode`](crate::NdrEncode): [`ndr_decode`](NdrDecode::ndr_decode)
/// reads the flat part and leaves embedded pointers pending, and
/// [`ndr_decode_deferred`](NdrDecode::ndr_decode_deferred) fills them from
/// the referents that follow.
pub trait NdrDecode: Sized {
    /// Decode the flat part of a value
    fn ndr_decode(r: &mut NdrReader) -> Result<Self>;

    /// Decode the referents of pending embedded pointers
    fn ndr_decode_deferred(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }

    /// Get the NDR alignment requirement for this type
    fn ndr_align(_ctx: &NdrContext) -> usize {
        1
    }
}
