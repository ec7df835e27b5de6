//! NDR stream writer
//!
//! The writer owns the output buffer and the per-message pointer state:
//! the referent ID allocator and the full-pointer identity table. Stub data
//! alignment is relative to the start of the buffer, which is where the
//! stub data begins in a request or response PDU.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{NdrContext, NdrEncode, NdrEnum, NdrError, NdrPrimitive, Result};

/// First referent ID handed out, matching what Windows stubs emit
pub const FIRST_REFERENT_ID: u64 = 0x0002_0000;

/// Distance between consecutive referent IDs
pub const REFERENT_ID_STEP: u64 = 4;

#[derive(Debug, Clone, Copy)]
struct FullReferent {
    id: u64,
    body_written: bool,
}

/// NDR stream writer
#[derive(Debug)]
pub struct NdrWriter {
    buf: BytesMut,
    ctx: NdrContext,
    next_referent: u64,
    full_referents: HashMap<usize, FullReferent>,
}

impl NdrWriter {
    /// Create a writer for the given context
    pub fn new(ctx: NdrContext) -> Self {
        Self::with_capacity(ctx, 0)
    }

    /// Create a writer with a preallocated buffer
    pub fn with_capacity(ctx: NdrContext, capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            ctx,
            next_referent: FIRST_REFERENT_ID,
            full_referents: HashMap::new(),
        }
    }

    /// Encoding context
    pub fn context(&self) -> &NdrContext {
        &self.ctx
    }

    /// Current offset from the start of the stub data
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True until the first byte is written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View of the bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return the encoded stub data
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    fn pad(&mut self, alignment: usize) {
        let padding = NdrContext::align_padding(self.buf.len(), alignment);
        self.buf.put_bytes(0, padding);
    }

    /// Pad with zero bytes up to the given alignment
    ///
    /// [`ALIGN_POINTER`](crate::ALIGN_POINTER) aligns to the syntax pointer size.
    pub fn write_align(&mut self, alignment: usize) -> Result<()> {
        let alignment = self.ctx.resolve_align(alignment);
        self.pad(alignment);
        Ok(())
    }

    /// Align a union arm after its discriminant; NDR64 only
    pub fn write_union_align(&mut self, alignment: usize) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.write_align(alignment)?;
        }
        Ok(())
    }

    /// Pad a structure's end up to its alignment; NDR64 only
    pub fn write_trailing_gap(&mut self, alignment: usize) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.write_align(alignment)?;
        }
        Ok(())
    }

    /// Write a primitive at its natural alignment
    pub fn write_data<T: NdrPrimitive>(&mut self, value: T) -> Result<()> {
        self.pad(T::SIZE);
        value.put(&self.ctx, &mut self.buf);
        Ok(())
    }

    /// Write raw octets without alignment
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Write a conformance, offset or actual count
    ///
    /// Four bytes under NDR20, eight under NDR64.
    pub fn write_size(&mut self, size: u64) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.write_data(size)
        } else {
            let narrow = u32::try_from(size).map_err(|_| NdrError::SizeOutOfRange(size))?;
            self.write_data(narrow)
        }
    }

    /// Write a union discriminant
    pub fn write_switch<T: NdrPrimitive>(&mut self, value: T) -> Result<()> {
        self.write_data(value)
    }

    /// Write a `v1_enum` value: four bytes regardless of the enum's logical width
    pub fn write_enum<E: NdrEnum>(&mut self, value: E) -> Result<()> {
        self.write_data(value.to_ndr())
    }

    /// Write a raw `v1_enum` value
    pub fn write_enum_raw(&mut self, value: u32) -> Result<()> {
        self.write_data(value)
    }

    /// Write a plain (16-bit) IDL enum
    ///
    /// NDR20 carries these as a short limited to 0..=0x7fff; NDR64 widens them to four bytes.
    pub fn write_enum16(&mut self, value: u16) -> Result<()> {
        if self.ctx.is_ndr64() {
            return self.write_data(u32::from(value));
        }
        if value > 0x7fff {
            return Err(NdrError::InvalidEnumValue(u32::from(value)));
        }
        self.write_data(value)
    }

    /// Write a pointer-sized referent ID (zero for null)
    pub fn write_referent_id(&mut self, id: u64) -> Result<()> {
        if self.ctx.is_ndr64() {
            self.write_data(id)
        } else {
            let narrow = u32::try_from(id).map_err(|_| NdrError::SizeOutOfRange(id))?;
            self.write_data(narrow)
        }
    }

    /// Write the flat part of a pointer: its referent ID, or nothing for `[ref]`
    pub fn write_pointer<P: NdrEncode>(&mut self, pointer: &P) -> Result<()> {
        pointer.ndr_encode(self)
    }

    /// Write the referents queued by a value's flat part
    pub fn write_deferred<T: NdrEncode + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.ndr_encode_deferred(self)
    }

    /// Write a top-level parameter: its flat part immediately followed by its referents
    pub fn write_top_level<T: NdrEncode + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.ndr_encode(self)?;
        value.ndr_encode_deferred(self)
    }

    /// Allocate a fresh referent ID
    pub fn next_referent_id(&mut self) -> u64 {
        let id = self.next_referent;
        self.next_referent += REFERENT_ID_STEP;
        trace!(referent = id, "allocated referent");
        id
    }

    /// Referent ID for a full pointer whose target lives at `address`
    ///
    /// The same address always yields the same ID within one message.
    pub(crate) fn full_referent_id(&mut self, address: usize) -> u64 {
        if let Some(existing) = self.full_referents.get(&address) {
            trace!(referent = existing.id, "full pointer aliases earlier referent");
            return existing.id;
        }
        let id = self.next_referent_id();
        self.full_referents.insert(address, FullReferent { id, body_written: false });
        id
    }

    /// Claim the right to write the body of the full pointer target at `address`
    ///
    /// Returns true exactly once per target: at the first deferred visit.
    pub(crate) fn claim_full_body(&mut self, address: usize) -> bool {
        match self.full_referents.get_mut(&address) {
            Some(entry) if !entry.body_written => {
                entry.body_written = true;
                true
            }
            Some(_) => false,
            None => {
                let id = self.next_referent_id();
                self.full_referents.insert(address, FullReferent { id, body_written: true });
                true
            }
        }
    }
}

/// Encode a single top-level value into fresh stub data
pub fn encode<T: NdrEncode + ?Sized>(value: &T, ctx: NdrContext) -> Result<Bytes> {
    let mut w = NdrWriter::new(ctx);
    w.write_top_level(value)?;
    Ok(w.finish())
}
