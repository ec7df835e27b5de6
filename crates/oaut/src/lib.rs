//! OLE Automation wire types (MS-OAUT)
//!
//! `BSTR` and `VARIANT` are the payload types nearly every automation-style
//! DCOM interface passes. Both are built from the NDR primitives in
//! [`msrpc_ndr`]: a BSTR is a unique pointer to a conformant structure and a
//! VARIANT is a header plus a discriminated union.

mod bstr;
mod variant;

pub use bstr::{BStr, FlaggedWordBlob};
pub use variant::{vt, Variant, VariantValue, WireVariant, VARIANT_FALSE, VARIANT_TRUE};

use msrpc_ndr::{InterfaceLayout, IUNKNOWN};

/// `IDispatch`: GetTypeInfoCount, GetTypeInfo, GetIDsOfNames, Invoke
pub const IDISPATCH: InterfaceLayout = InterfaceLayout::derived(&IUNKNOWN, "IDispatch", 4);
