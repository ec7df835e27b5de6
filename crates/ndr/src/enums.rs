//! NDR enumerations
//!
//! `v1_enum` types travel as four bytes under both transfer syntaxes. Plain
//! IDL enums are 16-bit under NDR20 and are handled by
//! [`NdrWriter::write_enum16`](crate::NdrWriter::write_enum16) directly.

/// A `v1_enum` with a closed set of values
pub trait NdrEnum: Copy + Sized {
    /// Wire value
    fn to_ndr(self) -> u32;

    /// Value for a wire integer, or `None` if it is not a declared variant
    fn from_ndr(value: u32) -> Option<Self>;
}

/// Declare a `v1_enum` type
///
/// The first variant is the `Default`. The generated type implements
/// [`NdrEnum`], [`NdrEncode`](crate::NdrEncode) and
/// [`NdrDecode`](crate::NdrDecode); decoding a value outside the declared
/// set fails with [`NdrError::InvalidEnumValue`](crate::NdrError::InvalidEnumValue).
///
/// ```
/// msrpc_ndr::ndr_enum! {
///     pub enum QueueAccess {
///         Receive = 1,
///         Send = 2,
///         Peek = 32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! ndr_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(#[$first_meta:meta])*
            $first:ident = $first_value:expr
            $(, $(#[$variant_meta:meta])* $variant:ident = $value:expr)*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(u32)]
        $vis enum $name {
            $(#[$first_meta])*
            #[default]
            $first = $first_value,
            $($(#[$variant_meta])* $variant = $value,)*
        }

        impl $crate::NdrEnum for $name {
            fn to_ndr(self) -> u32 {
                self as u32
            }

            fn from_ndr(value: u32) -> ::core::option::Option<Self> {
                match value {
                    v if v == $name::$first as u32 => ::core::option::Option::Some($name::$first),
                    $(v if v == $name::$variant as u32 => ::core::option::Option::Some($name::$variant),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::NdrEncode for $name {
            fn ndr_encode(&self, w: &mut $crate::NdrWriter) -> $crate::Result<()> {
                w.write_enum(*self)
            }

            fn ndr_align(_ctx: &$crate::NdrContext) -> usize {
                4
            }
        }

        impl $crate::NdrDecode for $name {
            fn ndr_decode(r: &mut $crate::NdrReader) -> $crate::Result<Self> {
                r.read_enum()
            }

            fn ndr_align(_ctx: &$crate::NdrContext) -> usize {
                4
            }
        }
    };
}
