//! NDR stream reader
//!
//! Mirror of [`NdrWriter`](crate::NdrWriter). Every read checks the remaining
//! input first, so truncated stub data always surfaces as
//! [`NdrError::BufferUnderflow`] rather than a panic or a zero-filled value.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::{NdrContext, NdrDecode, NdrEnum, NdrError, NdrPrimitive, Result};

/// Decode state of a full pointer referent
#[derive(Clone)]
pub(crate) enum FullReferent {
    /// Referent ID seen, body not yet read
    Pending,
    /// Body is being decoded further up the stack
    Decoding,
    /// Body decoded; later occurrences alias this value
    Decoded(Arc<dyn Any + Send + Sync>),
}

/// NDR stream reader
pub struct NdrReader {
    buf: Bytes,
    pos: usize,
    ctx: NdrContext,
    unique_referents: HashSet<u64>,
    full_referents: HashMap<u64, FullReferent>,
    depth: usize,
}

impl std::fmt::Debug for NdrReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdrReader")
            .field("pos", &self.pos)
            .field("len", &self.buf.len())
            .field("ctx", &self.ctx)
            .field("depth", &self.depth)
            .finish()
    }
}

impl NdrReader {
    /// Create a reader over stub data
    pub fn new(data: impl Into<Bytes>, ctx: NdrContext) -> Self {
        Self {
            buf: data.into(),
            pos: 0,
            ctx,
            unique_referents: HashSet::new(),
            full_referents: HashMap::new(),
            depth: 0,
        }
    }

    /// Decoding context
    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Offset from the start of the stub data
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once every byte of the stub data has been consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let have = self.remaining();
        if needed > have {
            return Err(NdrError::BufferUnderflow { needed, have });
        }
        Ok(())
    }

    fn skip_padding(&mut self, alignment: usize) -> Result<()> {
        let padding = NdrContext::align_padding(self.pos, alignment);
        self.ensure(padding)?;
        self.pos += padding;
        Ok(())
    }

    /// Skip padding up to the given alignment
    pub fn read_align(&mut self, alignment: usize) -> Result<()> {
        let alignment = self.ctx.resolve_align(alignment);
        self.skip_padding(alignment)
    }

    /// Skip union arm alignment after the discriminant; NDR64 only
    pub fn read_union_align(&mut self, alignment: usize) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.read_align(alignment)?;
        }
        Ok(())
    }

    /// Skip a structure's end padding; NDR64 only
    pub fn read_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.read_align(alignment)?;
        }
        Ok(())
    }

    /// Read a primitive at its natural alignment
    pub fn read_data<T: NdrPrimitive>(&mut self) -> Result<T> {
        self.skip_padding(T::SIZE)?;
        self.ensure(T::SIZE)?;
        let mut window = &self.buf[self.pos..self.pos + T::SIZE];
        let value = T::get(&self.ctx, &mut window);
        self.pos += T::SIZE;
        Ok(value)
    }

    /// Read raw octets without alignment
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        let bytes = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(bytes)
    }

    /// Read a conformance, offset or actual count
    pub fn read_size(&mut self) -> Result<u64> {
        if self.ctx.is_ndr64() {
            self.read_data::<u64>()
        } else {
            Ok(u64::from(self.read_data::<u32>()?))
        }
    }

    /// Read a count and check it against the decode limits and the remaining input
    ///
    /// `element_size` is the smallest number of bytes one element can occupy.
    pub fn read_count(&mut self, element_size: usize) -> Result<usize> {
        let count = self.read_size()?;
        let count = usize::try_from(count).map_err(|_| NdrError::IntegerOverflow)?;
        self.check_count(count, element_size)?;
        Ok(count)
    }

    /// Reject element counts that exceed the limits or could not fit in the input
    pub fn check_count(&self, count: usize, element_size: usize) -> Result<()> {
        let limits = self.ctx.limits;
        if count > limits.max_array_elements {
            debug!(count, limit = limits.max_array_elements, "array count over limit");
            return Err(NdrError::AllocationLimitExceeded {
                requested: count,
                limit: limits.max_array_elements,
            });
        }
        let bytes = count
            .checked_mul(element_size.max(1))
            .ok_or(NdrError::IntegerOverflow)?;
        if bytes > limits.max_allocation_size {
            debug!(bytes, limit = limits.max_allocation_size, "allocation over limit");
            return Err(NdrError::AllocationLimitExceeded {
                requested: bytes,
                limit: limits.max_allocation_size,
            });
        }
        if bytes > self.remaining() {
            return Err(NdrError::BufferUnderflow {
                needed: bytes,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read a union discriminant
    pub fn read_switch<T: NdrPrimitive>(&mut self) -> Result<T> {
        self.read_data()
    }

    /// Read a `v1_enum` value, rejecting values outside the declared range
    pub fn read_enum<E: NdrEnum>(&mut self) -> Result<E> {
        let raw = self.read_enum_raw()?;
        E::from_ndr(raw).ok_or(NdrError::InvalidEnumValue(raw))
    }

    /// Read a `v1_enum` value as an opaque integer
    pub fn read_enum_raw(&mut self) -> Result<u32> {
        self.read_data()
    }

    /// Read a plain (16-bit) IDL enum
    pub fn read_enum16(&mut self) -> Result<u16> {
        let raw = if self.ctx.is_ndr64() {
            self.read_data::<u32>()?
        } else {
            u32::from(self.read_data::<u16>()?)
        };
        if raw > 0x7fff {
            return Err(NdrError::InvalidEnumValue(raw));
        }
        Ok(raw as u16)
    }

    /// Read a pointer-sized referent ID
    pub fn read_referent_id(&mut self) -> Result<u64> {
        if self.ctx.is_ndr64() {
            self.read_data::<u64>()
        } else {
            Ok(u64::from(self.read_data::<u32>()?))
        }
    }

    /// Read the flat part of a pointer
    pub fn read_pointer<P: NdrDecode>(&mut self) -> Result<P> {
        P::ndr_decode(self)
    }

    /// Read the referents left pending by a value's flat part
    pub fn read_deferred<T: NdrDecode>(&mut self, value: &mut T) -> Result<()> {
        value.ndr_decode_deferred(self)
    }

    /// Read a top-level parameter: its flat part immediately followed by its referents
    ///
    /// Every pointer body is read through here, so the nesting of referents
    /// is bounded by [`NdrLimits::max_depth`](crate::NdrLimits::max_depth).
    pub fn read_top_level<T: NdrDecode>(&mut self) -> Result<T> {
        self.enter()?;
        let result = T::ndr_decode(self).and_then(|mut value| {
            value.ndr_decode_deferred(self)?;
            Ok(value)
        });
        self.depth -= 1;
        result
    }

    /// Current referent nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn enter(&mut self) -> Result<()> {
        let limit = self.ctx.limits.max_depth;
        if self.depth >= limit {
            debug!(limit, pos = self.pos, "referent nesting over limit");
            return Err(NdrError::DepthLimitExceeded(limit));
        }
        self.depth += 1;
        Ok(())
    }

    /// Record a non-null unique or embedded `[ref]` referent ID
    pub(crate) fn register_unique(&mut self, id: u64) -> Result<()> {
        if self.full_referents.contains_key(&id) || !self.unique_referents.insert(id) {
            debug!(referent = id, "duplicate unique referent");
            return Err(NdrError::DuplicateReferent(id));
        }
        trace!(referent = id, "unique referent");
        Ok(())
    }

    /// Record a non-null full pointer referent ID seen in a flat part
    pub(crate) fn register_full(&mut self, id: u64) -> Result<()> {
        if self.unique_referents.contains(&id) {
            debug!(referent = id, "full pointer reuses a unique referent");
            return Err(NdrError::DuplicateReferent(id));
        }
        self.full_referents.entry(id).or_insert(FullReferent::Pending);
        Ok(())
    }

    /// Look up a full pointer referent at its deferred visit
    ///
    /// A pending referent moves to decoding; the caller owns reading its body.
    pub(crate) fn begin_full(&mut self, id: u64) -> FullReferent {
        let state = self.full_referents.entry(id).or_insert(FullReferent::Pending);
        if matches!(state, FullReferent::Pending) {
            *state = FullReferent::Decoding;
            return FullReferent::Pending;
        }
        state.clone()
    }

    /// Publish a decoded full pointer referent for later aliases
    pub(crate) fn finish_full(&mut self, id: u64, value: Arc<dyn Any + Send + Sync>) {
        trace!(referent = id, "full referent decoded");
        self.full_referents.insert(id, FullReferent::Decoded(value));
    }
}

/// Decode a single top-level value from stub data
pub fn decode<T: NdrDecode>(data: impl Into<Bytes>, ctx: NdrContext) -> Result<T> {
    let mut r = NdrReader::new(data, ctx);
    r.read_top_level()
}
