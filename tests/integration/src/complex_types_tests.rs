//! Complex Types Tests - NDR Encoding Scenarios
//!
//! These tests exercise complex data type handling:
//! - Nested structures with embedded pointers
//! - Conformant and varying arrays of structures
//! - Full pointers shared between fields
//! - VARIANT and BSTR payloads
//! - Both transfer syntaxes and both byte orders

mod common;

use std::sync::Arc;

use common::*;
use msrpc_ndr::{
    decode, decode_conformance, decode_elements, decode_elements_deferred, encode,
    encode_conformance, encode_elements, encode_elements_deferred, ndr_enum, ConformantArray,
    ConformantVaryingArray, EmbeddedRefPtr, FixedArray, FullPtr, Guid, NdrContext, NdrDecode,
    NdrEncode, NdrError, NdrReader, NdrString, NdrWString, NdrWriter, Result, UniquePtr, VaryingArray,
};
use msrpc_oaut::{BStr, Variant, VariantValue, WireVariant};

ndr_enum! {
    /// Delivery guarantee of a queued message
    pub enum Delivery {
        Express = 0,
        Recoverable = 1,
    }
}

/// Message property block: scalars, an enum, and two embedded pointers
#[derive(Debug, Clone, PartialEq, Default)]
struct MessageProps {
    id: Guid,
    delivery: Delivery,
    priority: u8,
    label: UniquePtr<NdrWString>,
    body_size: u32,
    correlation: UniquePtr<FixedArray<u8, 20>>,
}

impl NdrEncode for MessageProps {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_align(<Self as NdrEncode>::ndr_align(w.context()))?;
        self.id.ndr_encode(w)?;
        w.write_enum(self.delivery)?;
        w.write_data(self.priority)?;
        w.write_pointer(&self.label)?;
        w.write_data(self.body_size)?;
        w.write_pointer(&self.correlation)?;
        w.write_trailing_gap(<Self as NdrEncode>::ndr_align(w.context()))
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_deferred(&self.label)?;
        w.write_deferred(&self.correlation)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for MessageProps {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        r.read_align(<Self as NdrDecode>::ndr_align(r.context()))?;
        let props = Self {
            id: Guid::ndr_decode(r)?,
            delivery: r.read_enum()?,
            priority: r.read_data()?,
            label: r.read_pointer()?,
            body_size: r.read_data()?,
            correlation: r.read_pointer()?,
        };
        r.read_trailing_gap(<Self as NdrDecode>::ndr_align(r.context()))?;
        Ok(props)
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        r.read_deferred(&mut self.label)?;
        r.read_deferred(&mut self.correlation)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// Structure ending in a conformant array, so its conformance leads the structure
#[derive(Debug, Clone, PartialEq, Default)]
struct MessageBatch {
    queue: EmbeddedRefPtr<NdrString>,
    messages: Vec<MessageProps>,
}

impl NdrEncode for MessageBatch {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        encode_conformance(w, self.messages.len())?;
        w.write_align(<Self as NdrEncode>::ndr_align(w.context()))?;
        w.write_pointer(&self.queue)?;
        w.write_data(self.messages.len() as u32)?;
        encode_elements(w, &self.messages)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_deferred(&self.queue)?;
        encode_elements_deferred(w, &self.messages)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

impl NdrDecode for MessageBatch {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        let conformance = decode_conformance(r)?;
        r.read_align(<Self as NdrDecode>::ndr_align(r.context()))?;
        let queue = r.read_pointer()?;
        let count: u32 = r.read_data()?;
        if u64::from(count) != conformance {
            return Err(NdrError::ConformanceMismatch {
                max_count: conformance,
                actual_count: u64::from(count),
            });
        }
        let messages = decode_elements(r, count as usize)?;
        Ok(Self { queue, messages })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        r.read_deferred(&mut self.queue)?;
        decode_elements_deferred(r, &mut self.messages)
    }

    fn ndr_align(ctx: &NdrContext) -> usize {
        ctx.pointer_size()
    }
}

/// Two routes that may point at the same host record
#[derive(Debug, Clone, PartialEq, Default)]
struct Routes {
    primary: FullPtr<NdrWString>,
    backup: FullPtr<NdrWString>,
}

impl NdrEncode for Routes {
    fn ndr_encode(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_pointer(&self.primary)?;
        w.write_pointer(&self.backup)
    }

    fn ndr_encode_deferred(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_deferred(&self.primary)?;
        w.write_deferred(&self.backup)
    }
}

impl NdrDecode for Routes {
    fn ndr_decode(r: &mut NdrReader) -> Result<Self> {
        Ok(Self {
            primary: r.read_pointer()?,
            backup: r.read_pointer()?,
        })
    }

    fn ndr_decode_deferred(&mut self, r: &mut NdrReader) -> Result<()> {
        r.read_deferred(&mut self.primary)?;
        r.read_deferred(&mut self.backup)
    }
}

fn sample_props(n: u8) -> MessageProps {
    MessageProps {
        id: Guid {
            data1: 0x1234_5678 + u32::from(n),
            data2: 0x9abc,
            data3: 0xdef0,
            data4: [n, 1, 2, 3, 4, 5, 6, 7],
        },
        delivery: if n % 2 == 0 { Delivery::Express } else { Delivery::Recoverable },
        priority: n,
        label: if n % 3 == 0 {
            UniquePtr::null()
        } else {
            UniquePtr::new(NdrWString::new(format!("order-{n}")))
        },
        body_size: 1024 * u32::from(n),
        correlation: UniquePtr::new(FixedArray::new([n; 20])),
    }
}

#[test]
fn test_nested_struct_roundtrip_all_contexts() {
    init_logging();

    let props = sample_props(4);
    for ctx in all_contexts() {
        assert_roundtrip(&props, ctx);
    }
}

#[test]
fn test_struct_with_trailing_conformant_array() {
    init_logging();

    let batch = MessageBatch {
        queue: EmbeddedRefPtr::new(NdrString::new("DIRECT=OS:host\\private$\\orders")),
        messages: (1..=6).map(sample_props).collect(),
    };
    for ctx in all_contexts() {
        let bytes = assert_roundtrip(&batch, ctx);
        let mut r = NdrReader::new(bytes, ctx);
        assert_eq!(r.read_size().unwrap(), 6);
    }
}

#[test]
fn test_empty_batch() {
    let batch = MessageBatch {
        queue: EmbeddedRefPtr::new(NdrString::new("q")),
        messages: Vec::new(),
    };
    let bytes = assert_roundtrip(&batch, NdrContext::new());
    // conformance, queue referent, count, then the queue string
    assert_eq!(&bytes[..12], &[0, 0, 0, 0, 0x00, 0x00, 0x02, 0x00, 0, 0, 0, 0]);
}

#[test]
fn test_deferred_referents_follow_field_order() {
    let props = MessageProps {
        label: UniquePtr::new(NdrWString::new("a")),
        correlation: UniquePtr::new(FixedArray::new([0xee; 20])),
        ..Default::default()
    };
    let bytes = encode(&props, NdrContext::new()).unwrap();

    // guid 16, enum 4, priority 1 + pad 3, label ref 4, body 4, correlation ref 4
    assert_eq!(&bytes[24..28], &[0x00, 0x00, 0x02, 0x00]);
    assert_eq!(&bytes[32..36], &[0x04, 0x00, 0x02, 0x00]);
    // label body: max 2, offset 0, actual 2, "a\0"
    assert_eq!(&bytes[36..52], &[2, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, b'a', 0, 0, 0]);
    assert_eq!(&bytes[52..], &[0xee; 20]);
}

#[test]
fn test_big_endian_wire_bytes() {
    let value = ConformantVaryingArray::with_max(4, vec![0x0102u16, 0x0304]);
    let bytes = encode(&value, NdrContext::big_endian()).unwrap();
    assert_eq!(
        &bytes[..],
        &[0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 2, 0x01, 0x02, 0x03, 0x04]
    );

    let decoded: ConformantVaryingArray<u16> = decode(bytes, NdrContext::big_endian()).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_drep_selects_byte_order() {
    let ctx = NdrContext::from_drep([0x00, 0x00, 0x00, 0x00]);
    assert!(!ctx.little_endian);

    let bytes = encode(&0x1122_3344u32, ctx).unwrap();
    assert_eq!(&bytes[..], &[0x11, 0x22, 0x33, 0x44]);
}

#[test]
fn test_array_of_unique_pointers() {
    let names = ConformantArray::new(vec![
        UniquePtr::new(NdrWString::new("alpha")),
        UniquePtr::null(),
        UniquePtr::new(NdrWString::new("gamma")),
    ]);
    for ctx in all_contexts() {
        assert_roundtrip(&names, ctx);
    }

    let bytes = encode(&names, NdrContext::new()).unwrap();
    // conformance then three referent IDs, the null one taking no ID
    assert_eq!(
        &bytes[..16],
        &[3, 0, 0, 0, 0x00, 0x00, 0x02, 0x00, 0, 0, 0, 0, 0x04, 0x00, 0x02, 0x00]
    );
}

#[test]
fn test_varying_array_window() {
    let window: VaryingArray<u32, 16> = VaryingArray::with_offset(3, vec![30, 40, 50]);
    for ctx in all_contexts() {
        assert_roundtrip(&window, ctx);
    }
}

#[test]
fn test_full_pointer_sharing_survives_roundtrip() {
    init_logging();

    let host = Arc::new(NdrWString::new("broker.example.com"));
    let routes = Routes {
        primary: FullPtr::from_arc(host.clone()),
        backup: FullPtr::from_arc(host),
    };

    for ctx in all_contexts() {
        let bytes = encode(&routes, ctx).unwrap();
        let unshared = encode(
            &Routes {
                primary: FullPtr::new(NdrWString::new("broker.example.com")),
                backup: FullPtr::new(NdrWString::new("broker.example.com")),
            },
            ctx,
        )
        .unwrap();
        assert!(bytes.len() < unshared.len(), "aliased body written once");

        let decoded: Routes = decode(bytes, ctx).unwrap();
        assert_eq!(decoded, routes);
        assert!(decoded.primary.ptr_eq(&decoded.backup));

        let decoded: Routes = decode(unshared, ctx).unwrap();
        assert!(!decoded.primary.ptr_eq(&decoded.backup));
    }
}

#[test]
fn test_full_pointer_shared_across_parameters() {
    let shared = Arc::new(NdrWString::new("shared"));
    let first = FullPtr::from_arc(shared.clone());
    let second = FullPtr::from_arc(shared);

    let mut w = NdrWriter::new(NdrContext::new());
    w.write_top_level(&first).unwrap();
    w.write_top_level(&second).unwrap();
    let bytes = w.finish();

    let mut r = NdrReader::new(bytes, NdrContext::new());
    let a: FullPtr<NdrWString> = r.read_top_level().unwrap();
    let b: FullPtr<NdrWString> = r.read_top_level().unwrap();
    assert!(r.is_empty());
    assert!(a.ptr_eq(&b));
    assert_eq!(a.referent_id(), b.referent_id());
}

#[test]
fn test_variant_array() {
    init_logging();

    let values: ConformantArray<WireVariant> = ConformantArray::new(vec![
        UniquePtr::new(Variant::new(VariantValue::I4(-7))),
        UniquePtr::new(Variant::new(VariantValue::BStr(BStr::new("label")))),
        UniquePtr::null(),
        UniquePtr::new(Variant::new(VariantValue::R8(2.5))),
        UniquePtr::new(Variant::new(VariantValue::Bool(false))),
        UniquePtr::new(Variant::new(VariantValue::VariantRef(UniquePtr::new(Variant::new(
            VariantValue::BStr(BStr::null()),
        ))))),
    ]);
    for ctx in all_contexts() {
        let bytes = assert_roundtrip(&values, ctx);
        assert_every_prefix_truncated::<ConformantArray<WireVariant>>(&bytes, ctx);
    }
}

#[test]
fn test_variant_cl_size_counts_referents() {
    let short = encode(&Variant::new(VariantValue::BStr(BStr::new("x"))), NdrContext::new()).unwrap();
    let long = encode(
        &Variant::new(VariantValue::BStr(BStr::new("a much longer string value"))),
        NdrContext::new(),
    )
    .unwrap();
    assert!(long[0] > short[0]);
    assert_eq!(usize::from(long[0]) * 8, long.len().next_multiple_of(8));
}
