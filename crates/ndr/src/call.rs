//! Operation marshaling seam
//!
//! Each RPC method is a struct holding its `[in]` and `[out]` parameters.
//! Client code marshals the request and unmarshals the response into the
//! same struct; server code does the reverse. The helpers here wrap a call's
//! stub data and log failures with the fault a server would return.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::{NdrContext, NdrReader, NdrWriter, Result};

/// One interface method
pub trait Operation: Default {
    /// Operation number within the interface, base interfaces included
    const OPNUM: u16;

    /// Method name for diagnostics
    const NAME: &'static str;

    /// Write the `[in]` parameters
    fn marshal_request(&self, w: &mut NdrWriter) -> Result<()>;

    /// Read the `[in]` parameters
    fn unmarshal_request(&mut self, r: &mut NdrReader) -> Result<()>;

    /// Write the `[out]` parameters and return value
    fn marshal_response(&self, w: &mut NdrWriter) -> Result<()>;

    /// Read the `[out]` parameters and return value
    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()>;
}

/// Marshal a request's stub data
pub fn encode_request<O: Operation>(op: &O, ctx: NdrContext) -> Result<Bytes> {
    let mut w = NdrWriter::new(ctx);
    op.marshal_request(&mut w)?;
    debug!("{} (opnum {}): request {} bytes", O::NAME, O::OPNUM, w.len());
    Ok(w.finish())
}

/// Unmarshal a request's stub data into a fresh operation
pub fn decode_request<O: Operation>(stub_data: impl Into<Bytes>, ctx: NdrContext) -> Result<O> {
    let mut op = O::default();
    let mut r = NdrReader::new(stub_data, ctx);
    if let Err(e) = op.unmarshal_request(&mut r) {
        warn!(
            "{} (opnum {}): bad request stub data at offset {}: {} -> fault {}",
            O::NAME,
            O::OPNUM,
            r.position(),
            e,
            e.fault_status()
        );
        return Err(e);
    }
    Ok(op)
}

/// Marshal a response's stub data
pub fn encode_response<O: Operation>(op: &O, ctx: NdrContext) -> Result<Bytes> {
    let mut w = NdrWriter::new(ctx);
    op.marshal_response(&mut w)?;
    debug!("{} (opnum {}): response {} bytes", O::NAME, O::OPNUM, w.len());
    Ok(w.finish())
}

/// Unmarshal a response's stub data into the operation that sent the request
pub fn decode_response<O: Operation>(op: &mut O, stub_data: impl Into<Bytes>, ctx: NdrContext) -> Result<()> {
    let mut r = NdrReader::new(stub_data, ctx);
    op.unmarshal_response(&mut r).map_err(|e| {
        warn!(
            "{} (opnum {}): bad response stub data at offset {}: {}",
            O::NAME,
            O::OPNUM,
            r.position(),
            e
        );
        e
    })
}

/// Opnum layout of an interface: its base's methods followed by its own
///
/// DCOM interfaces number their methods after those of every interface they
/// derive from, so a layout is its base plus a method count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceLayout {
    pub name: &'static str,
    pub base: Option<&'static InterfaceLayout>,
    pub methods: u16,
}

/// Owner of an opnum within an interface chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOpnum {
    /// Interface that declares the method
    pub interface: &'static str,
    /// Method index within that interface
    pub index: u16,
}

impl InterfaceLayout {
    /// Interface with no base
    pub const fn root(name: &'static str, methods: u16) -> Self {
        Self { name, base: None, methods }
    }

    /// Interface deriving from `base`
    pub const fn derived(base: &'static InterfaceLayout, name: &'static str, methods: u16) -> Self {
        Self { name, base: Some(base), methods }
    }

    /// First opnum of this interface's own methods
    pub const fn first_opnum(&self) -> u16 {
        match self.base {
            Some(base) => base.end_opnum(),
            None => 0,
        }
    }

    /// One past the last opnum of this interface
    pub const fn end_opnum(&self) -> u16 {
        self.first_opnum() + self.methods
    }

    /// Opnum of this interface's method at `index`
    pub fn opnum(&self, index: u16) -> Option<u16> {
        (index < self.methods).then(|| self.first_opnum() + index)
    }

    /// Find which interface in the chain declares `opnum`
    pub fn resolve(&self, opnum: u16) -> Option<ResolvedOpnum> {
        let mut layout = self;
        loop {
            let first = layout.first_opnum();
            if opnum >= first && opnum < first + layout.methods {
                return Some(ResolvedOpnum {
                    interface: layout.name,
                    index: opnum - first,
                });
            }
            layout = layout.base?;
        }
    }
}

/// `IUnknown`: QueryInterface, AddRef, Release
pub const IUNKNOWN: InterfaceLayout = InterfaceLayout::root("IUnknown", 3);
