//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fmt::Debug;

use bytes::Bytes;
use msrpc_ndr::{decode, encode, InterfaceLayout, NdrContext, NdrDecode, NdrEncode, NdrError};
use msrpc_oaut::IDISPATCH;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber; `RUST_LOG` controls verbosity
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Every transfer syntax and byte order combination worth exercising
pub fn all_contexts() -> [NdrContext; 4] {
    let ndr64_be = NdrContext {
        little_endian: false,
        ..NdrContext::ndr64()
    };
    [NdrContext::new(), NdrContext::big_endian(), NdrContext::ndr64(), ndr64_be]
}

/// Encode then decode `value`, asserting it survives unchanged
pub fn assert_roundtrip<T>(value: &T, ctx: NdrContext) -> Bytes
where
    T: NdrEncode + NdrDecode + PartialEq + Debug,
{
    let bytes = encode(value, ctx).unwrap();
    let decoded: T = decode(bytes.clone(), ctx).unwrap();
    assert_eq!(&decoded, value, "{:?}", ctx.syntax);
    bytes
}

/// Decode every strict prefix of `bytes`, asserting each one is rejected as truncated
pub fn assert_every_prefix_truncated<T: NdrDecode + Debug>(bytes: &Bytes, ctx: NdrContext) {
    for len in 0..bytes.len() {
        match decode::<T>(bytes.slice(..len), ctx) {
            Err(err) => assert!(err.is_truncated(), "len {len}: {err:?}"),
            Ok(value) => panic!("len {len}: decoded {value:?} from a truncated buffer"),
        }
    }
}

/// Decode and return the error, failing the test on success
pub fn decode_err<T: NdrDecode + Debug>(bytes: impl Into<Bytes>, ctx: NdrContext) -> NdrError {
    match decode::<T>(bytes, ctx) {
        Err(err) => err,
        Ok(value) => panic!("expected an error, decoded {value:?}"),
    }
}

// Windows Update Agent searcher chain, each version adding methods to the last
pub const IUPDATE_SEARCHER: InterfaceLayout =
    InterfaceLayout::derived(&IDISPATCH, "IUpdateSearcher", 18);
pub const IUPDATE_SEARCHER2: InterfaceLayout =
    InterfaceLayout::derived(&IUPDATE_SEARCHER, "IUpdateSearcher2", 2);
pub const IUPDATE_SEARCHER3: InterfaceLayout =
    InterfaceLayout::derived(&IUPDATE_SEARCHER2, "IUpdateSearcher3", 2);

/// `IUpdateSearcher::Search`
pub const OPNUM_SEARCH: u16 = 19;

/// `IMSMQQueue4::Receive`
pub const OPNUM_RECEIVE: u16 = 20;
