//! NDR encoding trait

use crate::{NdrContext, NdrWriter, Result};

/// Trait for types that can be encoded to NDR format
///
/// Encoding runs in two phases. [`ndr_encode`](NdrEncode::ndr_encode) writes
/// the flat part of the value: primitives, embedded structures, and the
/// referent IDs of embedded pointers. [`ndr_encode_deferred`](NdrEncode::ndr_encode_deferred)
/// then writes the pointees those IDs refer to, in field order. Types without
/// embedded pointers only implement the first phase.
pub trait NdrEncode {
    /// Encode the flat part of this value
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()>;

    /// Encode the referents of any embedded pointers
    fn ndr_encode_deferred(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }

    /// Get the NDR alignment requirement for this type
    fn ndr_align(_ctx: &NdrContext) -> usize
    where
        Self: Sized,
    {
        1
    }
}

impl<T: NdrEncode> NdrEncode for &T {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        (**self).ndr_encode_deferred(w)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        T::ndr_align(ctx)
    }
}
