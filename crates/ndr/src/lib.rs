//! NDR (Network Data Representation) codec for MSRPC and DCOM stubs
//!
//! This crate implements the NDR wire format of DCE RPC and MS-RPCE for both
//! the NDR20 and NDR64 transfer syntaxes. Generated operation structs sequence
//! calls on [`NdrWriter`] and [`NdrReader`]; the types here supply the
//! building blocks.
//!
//! # NDR Wire Format
//!
//! NDR is the standard encoding for DCE RPC data. Key characteristics:
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes)
//! - Structures align to their largest member
//! - Pointers are referent IDs; the data they point to is deferred until
//!   the enclosing construct's flat part is complete
//! - Conformant data (arrays with runtime-determined size) carries its size
//!   in elements ahead of the data
//! - Strings are conformant varying arrays with null terminator
//!
//! # Example
//!
//! ```
//! use msrpc_ndr::{decode, encode, NdrContext, NdrWString, UniquePtr};
//!
//! let name = UniquePtr::new(NdrWString::new("queue"));
//! let bytes = encode(&name, NdrContext::new()).unwrap();
//! let back: UniquePtr<NdrWString> = decode(bytes, NdrContext::new()).unwrap();
//! assert_eq!(back, name);
//! ```

mod arrays;
mod call;
mod context;
mod decode;
mod encode;
mod enums;
mod error;
mod fault;
mod pointers;
mod primitives;
mod reader;
mod strings;
mod union;
mod writer;

pub use arrays::{
    decode_conformance, decode_elements, decode_elements_deferred, encode_conformance,
    encode_elements, encode_elements_deferred, ConformantArray, ConformantVaryingArray,
    FixedArray, VaryingArray,
};
pub use call::{
    decode_request, decode_response, encode_request, encode_response, InterfaceLayout,
    Operation, ResolvedOpnum, IUNKNOWN,
};
pub use context::{NdrContext, NdrLimits, TransferSyntax, UnknownTransferSyntax, ALIGN_POINTER};
pub use decode::NdrDecode;
pub use encode::NdrEncode;
pub use enums::NdrEnum;
pub use error::{
    NdrError, NdrErrorKind, Result, MAX_NDR_ALLOCATION_SIZE, MAX_NDR_ARRAY_ELEMENTS, MAX_NDR_DEPTH,
};
pub use fault::FaultStatus;
pub use pointers::{EmbeddedRefPtr, FullPtr, NdrPtr, RefPtr, UniquePtr};
pub use primitives::{Guid, Int3264, NdrDiscriminant, NdrPrimitive, UInt3264};
pub use reader::{decode, NdrReader};
pub use strings::{NdrString, NdrWString};
pub use union::{read_union, write_union, Encapsulated, NdrUnion};
pub use writer::{encode, NdrWriter, FIRST_REFERENT_ID, REFERENT_ID_STEP};

/// Re-export bytes for convenience
pub use bytes::{Buf, BufMut, Bytes, BytesMut};
