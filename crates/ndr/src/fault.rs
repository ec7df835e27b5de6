//! Mapping of decode failures to RPC fault statuses
//!
//! A server that fails to unmarshal a request must answer with a fault PDU
//! instead of dropping the connection. These are the status values Windows
//! stubs use for the equivalent NDR engine failures.

use crate::error::{NdrError, NdrErrorKind};

/// Fault status codes carried in a fault PDU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FaultStatus {
    /// `nca_s_fault_int_overflow`
    IntOverflow = 0x1c00_0010,
    /// `nca_s_fault_invalid_tag`
    InvalidTag = 0x1c00_0006,
    /// `nca_s_fault_invalid_bound`
    InvalidBound = 0x1c00_0007,
    /// `nca_s_fault_remote_no_memory`
    RemoteNoMemory = 0x1c00_001b,
    /// `nca_s_fault_codeset_conv_error`
    CodesetConvError = 0x1c00_0023,
    /// `RPC_X_NULL_REF_POINTER`
    NullRefPointer = 0x0000_06f4,
    /// `RPC_X_ENUM_VALUE_OUT_OF_RANGE`
    EnumValueOutOfRange = 0x0000_06f5,
    /// `RPC_X_BAD_STUB_DATA`
    BadStubData = 0x0000_06f7,
}

impl FaultStatus {
    /// Raw status value
    pub fn code(self) -> u32 {
        self as u32
    }

    /// HRESULT a COM caller sees for this fault
    ///
    /// Win32 codes are wrapped with `HRESULT_FROM_WIN32`; `nca_s_*` codes are
    /// already in HRESULT-like form and pass through.
    pub fn hresult(self) -> u32 {
        let code = self.code();
        if code & 0xffff_0000 == 0 {
            0x8007_0000 | code
        } else {
            code
        }
    }
}

impl std::fmt::Display for FaultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} (0x{:08x})", self, self.code())
    }
}

impl NdrError {
    /// Fault status the dispatch layer should return for this error
    pub fn fault_status(&self) -> FaultStatus {
        match self {
            NdrError::NullRefPointer => FaultStatus::NullRefPointer,
            NdrError::InvalidEnumValue(_) => FaultStatus::EnumValueOutOfRange,
            NdrError::IntegerOverflow => FaultStatus::IntOverflow,
            NdrError::Utf8Error(_) | NdrError::Utf16Error(_) => FaultStatus::CodesetConvError,
            NdrError::ConformanceMismatch { .. }
            | NdrError::ArraySizeMismatch { .. }
            | NdrError::DiscriminantMismatch { .. }
            | NdrError::SizeOutOfRange(_) => FaultStatus::InvalidBound,
            _ => match self.kind() {
                NdrErrorKind::UnknownDiscriminant => FaultStatus::InvalidTag,
                NdrErrorKind::LimitExceeded => FaultStatus::RemoteNoMemory,
                _ => FaultStatus::BadStubData,
            },
        }
    }
}
