//! Operation Tests - request and response stub data for DCOM methods
//!
//! Each operation struct sequences its parameters the way a generated stub
//! would; the tests drive a client and a server side through the same bytes.

mod common;

use common::*;
use msrpc_ndr::{
    decode_request, decode_response, encode_request, encode_response, ndr_enum, NdrContext,
    NdrError, NdrPtr, NdrReader, NdrWriter, Operation, ResolvedOpnum, Result, UniquePtr,
};
use msrpc_oaut::{vt, BStr, Variant, VariantValue, WireVariant};

/// `IMSMQQueue4::Receive`
///
/// Every `[in, optional] VARIANT*` parameter is independently nullable; an
/// omitted one travels as a null pointer, not as `VT_EMPTY` or `VT_ERROR`.
#[derive(Debug, Default, PartialEq)]
struct Receive {
    transaction: WireVariant,
    want_destination_queue: WireVariant,
    want_body: WireVariant,
    receive_timeout: WireVariant,
    want_connector_type: WireVariant,
    hresult: i32,
}

impl Operation for Receive {
    const OPNUM: u16 = OPNUM_RECEIVE;
    const NAME: &'static str = "IMSMQQueue4::Receive";

    fn marshal_request(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_top_level(&self.transaction)?;
        w.write_top_level(&self.want_destination_queue)?;
        w.write_top_level(&self.want_body)?;
        w.write_top_level(&self.receive_timeout)?;
        w.write_top_level(&self.want_connector_type)
    }

    fn unmarshal_request(&mut self, r: &mut NdrReader) -> Result<()> {
        self.transaction = r.read_top_level()?;
        self.want_destination_queue = r.read_top_level()?;
        self.want_body = r.read_top_level()?;
        self.receive_timeout = r.read_top_level()?;
        self.want_connector_type = r.read_top_level()?;
        Ok(())
    }

    fn marshal_response(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_data(self.hresult)
    }

    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()> {
        self.hresult = r.read_data()?;
        Ok(())
    }
}

/// `IUpdateSearcher::Search`
#[derive(Debug, Default, PartialEq)]
struct Search {
    criteria: BStr,
    hresult: i32,
}

impl Operation for Search {
    const OPNUM: u16 = OPNUM_SEARCH;
    const NAME: &'static str = "IUpdateSearcher::Search";

    fn marshal_request(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_top_level(&self.criteria)
    }

    fn unmarshal_request(&mut self, r: &mut NdrReader) -> Result<()> {
        self.criteria = r.read_top_level()?;
        Ok(())
    }

    fn marshal_response(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_data(self.hresult)
    }

    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()> {
        self.hresult = r.read_data()?;
        Ok(())
    }
}

ndr_enum! {
    /// Update source a searcher queries
    pub enum ServerSelection {
        Default = 0,
        ManagedServer = 1,
        WindowsUpdate = 2,
        Others = 3,
    }
}

/// `IUpdateSearcher::ServerSelection` property get
#[derive(Debug, Default, PartialEq)]
struct GetServerSelection {
    selection: ServerSelection,
    hresult: i32,
}

impl Operation for GetServerSelection {
    const OPNUM: u16 = 13;
    const NAME: &'static str = "IUpdateSearcher::get_ServerSelection";

    fn marshal_request(&self, _w: &mut NdrWriter) -> Result<()> {
        Ok(())
    }

    fn unmarshal_request(&mut self, _r: &mut NdrReader) -> Result<()> {
        Ok(())
    }

    fn marshal_response(&self, w: &mut NdrWriter) -> Result<()> {
        w.write_enum(self.selection)?;
        w.write_data(self.hresult)
    }

    fn unmarshal_response(&mut self, r: &mut NdrReader) -> Result<()> {
        self.selection = r.read_enum()?;
        self.hresult = r.read_data()?;
        Ok(())
    }
}

fn variant(value: VariantValue) -> WireVariant {
    UniquePtr::new(Variant::new(value))
}

#[test]
fn test_receive_with_all_optionals_omitted() {
    init_logging();

    let request = Receive::default();
    for ctx in all_contexts() {
        let stub = encode_request(&request, ctx).unwrap();
        assert_eq!(stub.len(), 5 * ctx.pointer_size());
        assert!(stub.iter().all(|&b| b == 0));

        let server_side: Receive = decode_request(stub, ctx).unwrap();
        assert!(server_side.transaction.is_null());
        assert!(server_side.want_destination_queue.is_null());
        assert!(server_side.want_body.is_null());
        assert!(server_side.receive_timeout.is_null());
        assert!(server_side.want_connector_type.is_null());
    }
}

#[test]
fn test_receive_with_some_optionals() {
    init_logging();

    let request = Receive {
        want_body: variant(VariantValue::Bool(true)),
        receive_timeout: variant(VariantValue::I4(5000)),
        ..Default::default()
    };
    for ctx in all_contexts() {
        let stub = encode_request(&request, ctx).unwrap();
        let server_side: Receive = decode_request(stub, ctx).unwrap();
        assert_eq!(server_side, request);

        assert!(server_side.transaction.is_null());
        let timeout = server_side.receive_timeout.as_ref().unwrap();
        assert_eq!(timeout.vartype(), vt::VT_I4);
        assert_eq!(timeout.value, VariantValue::I4(5000));
    }
}

#[test]
fn test_receive_referents_are_sequential() {
    let request = Receive {
        transaction: variant(VariantValue::I4(1)),
        want_body: variant(VariantValue::Bool(false)),
        ..Default::default()
    };
    let stub = encode_request(&request, NdrContext::new()).unwrap();
    assert_eq!(&stub[..4], &[0x00, 0x00, 0x02, 0x00]);

    // transaction referent, pad to 8, 24-byte VARIANT, then a null destination queue
    assert_eq!(&stub[32..36], &[0, 0, 0, 0]);
    assert_eq!(&stub[36..40], &[0x04, 0x00, 0x02, 0x00]);
}

#[test]
fn test_receive_response() {
    let ctx = NdrContext::new();
    let reply = Receive {
        hresult: 0xC00E_001Bu32 as i32,
        ..Default::default()
    };
    let stub = encode_response(&reply, ctx).unwrap();
    assert_eq!(&stub[..], &[0x1b, 0x00, 0x0e, 0xc0]);

    let mut client_side = Receive::default();
    decode_response(&mut client_side, stub, ctx).unwrap();
    assert_eq!(client_side.hresult, reply.hresult);
}

#[test]
fn test_search_request() {
    init_logging();

    let request = Search {
        criteria: BStr::new("IsInstalled=0 and Type='Software'"),
        ..Default::default()
    };
    for ctx in all_contexts() {
        let stub = encode_request(&request, ctx).unwrap();
        let server_side: Search = decode_request(stub.clone(), ctx).unwrap();
        assert_eq!(
            server_side.criteria.to_string_lossy().as_deref(),
            Some("IsInstalled=0 and Type='Software'")
        );
        assert_every_prefix_truncated::<BStr>(&stub, ctx);
    }
}

#[test]
fn test_search_with_null_criteria() {
    let request = Search::default();
    let stub = encode_request(&request, NdrContext::new()).unwrap();
    let server_side: Search = decode_request(stub, NdrContext::new()).unwrap();
    assert!(server_side.criteria.is_null());
}

#[test]
fn test_search_opnum_resolves_through_interface_chain() {
    assert_eq!(IUPDATE_SEARCHER.first_opnum(), 7);
    assert_eq!(IUPDATE_SEARCHER.end_opnum(), 25);
    assert_eq!(IUPDATE_SEARCHER2.first_opnum(), 25);
    assert_eq!(IUPDATE_SEARCHER3.first_opnum(), 27);
    assert_eq!(IUPDATE_SEARCHER3.end_opnum(), 29);

    assert_eq!(
        IUPDATE_SEARCHER3.resolve(Search::OPNUM),
        Some(ResolvedOpnum { interface: "IUpdateSearcher", index: 12 })
    );
    assert_eq!(IUPDATE_SEARCHER.opnum(12), Some(Search::OPNUM));
    assert_eq!(
        IUPDATE_SEARCHER3.resolve(GetServerSelection::OPNUM).map(|r| r.interface),
        Some("IUpdateSearcher")
    );
    assert_eq!(
        IUPDATE_SEARCHER3.resolve(4).map(|r| r.interface),
        Some("IDispatch")
    );
    assert_eq!(
        IUPDATE_SEARCHER3.resolve(28),
        Some(ResolvedOpnum { interface: "IUpdateSearcher3", index: 1 })
    );
    assert_eq!(IUPDATE_SEARCHER2.resolve(27), None);
}

#[test]
fn test_enum_out_parameter() {
    let reply = GetServerSelection {
        selection: ServerSelection::WindowsUpdate,
        hresult: 0,
    };
    for ctx in all_contexts() {
        let stub = encode_response(&reply, ctx).unwrap();
        assert_eq!(stub.len(), 8);

        let mut client_side = GetServerSelection::default();
        decode_response(&mut client_side, stub, ctx).unwrap();
        assert_eq!(client_side, reply);
    }
}

#[test]
fn test_enum_out_of_range_response() {
    let stub = vec![7, 0, 0, 0, 0, 0, 0, 0];
    let mut client_side = GetServerSelection::default();
    let err = decode_response(&mut client_side, stub, NdrContext::new()).unwrap_err();
    assert!(matches!(err, NdrError::InvalidEnumValue(7)));
}
