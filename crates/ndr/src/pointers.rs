//! NDR pointer types
//!
//! NDR supports three pointer semantics:
//!
//! - Reference (`[ref]`): Non-null. At top level the pointee follows inline
//!   with no wire representation; embedded, it carries a referent ID like
//!   the others.
//! - Unique (`[unique]`): Nullable, referent ID, no aliasing
//! - Full (`[ptr]`): Nullable, referent ID, aliasing allowed
//!
//! Referent IDs are written in the flat part of the enclosing construct and
//! the pointees follow in its deferred part. Decoding a pointer's flat part
//! leaves it pending; [`NdrDecode::ndr_decode_deferred`] fills it in.

use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::trace;

use crate::reader::FullReferent;
use crate::{NdrContext, NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// Trait for NDR pointer types
pub trait NdrPtr {
    type Target;

    /// Check if the pointer is null
    fn is_null(&self) -> bool;

    /// Get the inner value, if any
    fn get(&self) -> Option<&Self::Target>;
}

/// Top-level reference pointer - non-null, data follows inline
///
/// The `[ref]` attribute on a parameter. The pointer itself is not
/// transmitted; the pointee data is always present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> NdrPtr for RefPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&T> {
        Some(&self.0)
    }
}

impl<T: NdrEncode> NdrEncode for RefPtr<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        self.0.ndr_encode_deferred(w)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        T::ndr_align(ctx)
    }
}

impl<T: NdrDecode> NdrDecode for RefPtr<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Ok(Self(T::ndr_decode(r)?))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0.ndr_decode_deferred(r)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        T::ndr_align(ctx)
    }
}

/// Embedded reference pointer - non-null, referent ID with deferred pointee
///
/// A `[ref]` pointer inside a structure, array or union arm. A null
/// referent ID on the wire is rejected with [`NdrError::NullRefPointer`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbeddedRefPtr<T>(pub T);

impl<T> EmbeddedRefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for EmbeddedRefPtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for EmbeddedRefPtr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> NdrPtr for EmbeddedRefPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&T> {
        Some(&self.0)
    }
}

impl<T: NdrEncode> NdrEncode for EmbeddedRefPtr<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        let id = w.next_referent_id();
        w.write_referent_id(id)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_top_level(&self.0)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl<T: NdrDecode + Default> NdrDecode for EmbeddedRefPtr<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let id = r.read_referent_id()?;
        if id == 0 {
            return Err(NdrError::NullRefPointer);
        }
        r.register_unique(id)?;
        Ok(Self(T::default()))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        self.0 = r.read_top_level()?;
        Ok(())
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// Unique pointer - nullable, no aliasing
///
/// The `[unique]` attribute in MIDL. Encoded as a referent ID (0 = null)
/// with the pointee following in the deferred part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquePtr<T>(pub Option<Box<T>>);

impl<T> UniquePtr<T> {
    pub fn new(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn from_option(opt: Option<T>) -> Self {
        Self(opt.map(Box::new))
    }

    pub fn into_option(self) -> Option<T> {
        self.0.map(|b| *b)
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.0.as_deref()
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()
    }
}

impl<T> Default for UniquePtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Option<T>> for UniquePtr<T> {
    fn from(opt: Option<T>) -> Self {
        Self::from_option(opt)
    }
}

impl<T> NdrPtr for UniquePtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        self.0.is_none()
    }

    fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }
}

impl<T: NdrEncode> NdrEncode for UniquePtr<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        match &self.0 {
            None => w.write_referent_id(0),
            Some(_) => {
                let id = w.next_referent_id();
                w.write_referent_id(id)
            }
        }
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        match &self.0 {
            None => Ok(()),
            Some(value) => w.write_top_level(&**value),
        }
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl<T: NdrDecode + Default> NdrDecode for UniquePtr<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let id = r.read_referent_id()?;
        if id == 0 {
            return Ok(Self::null());
        }
        r.register_unique(id)?;
        Ok(Self::new(T::default()))
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        if let Some(slot) = self.0.as_mut() {
            **slot = r.read_top_level()?;
        }
        Ok(())
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// Full pointer - nullable, aliasing allowed
///
/// The `[ptr]` attribute in MIDL. Identity is the `Arc`: two full pointers
/// holding the same `Arc` within one message encode the same referent ID and
/// a single body. Decoding restores the sharing, so aliases come back as
/// clones of one `Arc`.
#[derive(Debug, Clone)]
pub struct FullPtr<T> {
    value: Option<Arc<T>>,
    referent_id: u64,
}

impl<T> FullPtr<T> {
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Point at an existing shared value
    pub fn from_arc(value: Arc<T>) -> Self {
        Self { value: Some(value), referent_id: 0 }
    }

    pub fn null() -> Self {
        Self { value: None, referent_id: 0 }
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.value.as_deref()
    }

    /// The shared value, if any
    pub fn as_arc(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }

    pub fn into_arc(self) -> Option<Arc<T>> {
        self.value
    }

    /// True if both pointers refer to the same allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Referent ID read from the wire; zero for pointers built locally
    pub fn referent_id(&self) -> u64 {
        self.referent_id
    }

    fn address(value: &Arc<T>) -> usize {
        Arc::as_ptr(value) as *const () as usize
    }
}

impl<T> Default for FullPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Option<T>> for FullPtr<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(value) => Self::new(value),
            None => Self::null(),
        }
    }
}

impl<T> From<Arc<T>> for FullPtr<T> {
    fn from(value: Arc<T>) -> Self {
        Self::from_arc(value)
    }
}

impl<T: PartialEq> PartialEq for FullPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for FullPtr<T> {}

impl<T> NdrPtr for FullPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        self.value.is_none()
    }

    fn get(&self) -> Option<&T> {
        self.value.as_deref()
    }
}

impl<T: NdrEncode> NdrEncode for FullPtr<T> {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        match &self.value {
            None => w.write_referent_id(0),
            Some(value) => {
                let id = w.full_referent_id(Self::address(value));
                w.write_referent_id(id)
            }
        }
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        match &self.value {
            Some(value) if w.claim_full_body(Self::address(value)) => {
                w.write_top_level(&**value)
            }
            _ => Ok(()),
        }
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl<T: NdrDecode + Send + Sync + 'static> NdrDecode for FullPtr<T> {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let id = r.read_referent_id()?;
        if id != 0 {
            r.register_full(id)?;
        }
        Ok(Self { value: None, referent_id: id })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        let id = self.referent_id;
        if id == 0 || self.value.is_some() {
            return Ok(());
        }
        let value = match r.begin_full(id) {
            FullReferent::Pending => {
                let value = Arc::new(r.read_top_level::<T>()?);
                r.finish_full(id, value.clone() as Arc<dyn Any + Send + Sync>);
                value
            }
            FullReferent::Decoding => return Err(NdrError::ReferentCycle(id)),
            FullReferent::Decoded(existing) => {
                trace!(referent = id, "full pointer alias");
                existing
                    .downcast::<T>()
                    .map_err(|_| NdrError::ReferentTypeMismatch(id))?
            }
        };
        self.value = Some(value);
        Ok(())
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}
