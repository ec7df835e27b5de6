//! NDR error types

use thiserror::Error;

/// Default upper bound on the element count of any decoded array
pub const MAX_NDR_ARRAY_ELEMENTS: usize = 1 << 20;

/// Default upper bound on the bytes a single decoded string or array may allocate
pub const MAX_NDR_ALLOCATION_SIZE: usize = 16 * 1024 * 1024;

/// Default upper bound on how deeply referents may nest while decoding
pub const MAX_NDR_DEPTH: usize = 64;

/// NDR encoding/decoding errors
#[derive(Debug, Error)]
pub enum NdrError {
    /// Buffer underflow - the stream ended before the value did
    #[error("buffer underflow: needed {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// Invalid string - not null terminated or non-zero offset
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// A unique pointer referent ID was seen twice in one message
    #[error("duplicate unique referent ID 0x{0:x}")]
    DuplicateReferent(u64),

    /// A full pointer referent ID was already bound to a different type
    #[error("referent ID 0x{0:x} aliases a value of a different type")]
    ReferentTypeMismatch(u64),

    /// A full pointer referent refers back to a value still being decoded
    #[error("referent ID 0x{0:x} forms a cycle")]
    ReferentCycle(u64),

    /// A `[ref]` pointer was null
    #[error("null reference pointer")]
    NullRefPointer,

    /// Array size mismatch
    #[error("array size mismatch: expected {expected}, got {got}")]
    ArraySizeMismatch { expected: usize, got: usize },

    /// Conformance mismatch
    #[error("conformance mismatch: max_count={max_count}, actual_count={actual_count}")]
    ConformanceMismatch { max_count: u64, actual_count: u64 },

    /// Invalid discriminant for union
    #[error("invalid union discriminant: {0}")]
    InvalidDiscriminant(u64),

    /// Union discriminant on the wire disagrees with its `switch_is` field
    #[error("union discriminant mismatch: field says {expected}, wire says {got}")]
    DiscriminantMismatch { expected: u64, got: u64 },

    /// Invalid enum value
    #[error("invalid enum value: {0}")]
    InvalidEnumValue(u32),

    /// A size or count does not fit the transfer syntax
    #[error("size {0} out of range for transfer syntax")]
    SizeOutOfRange(u64),

    /// Decoded size exceeds the configured limit
    #[error("allocation limit exceeded: requested {requested}, limit {limit}")]
    AllocationLimitExceeded { requested: usize, limit: usize },

    /// Referents nest deeper than the configured limit
    #[error("nesting depth limit {0} exceeded")]
    DepthLimitExceeded(usize),

    /// Integer overflow while computing a size
    #[error("integer overflow")]
    IntegerOverflow,

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16Error(#[from] std::char::DecodeUtf16Error),
}

/// Coarse classification of [`NdrError`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NdrErrorKind {
    /// Input ended early
    Truncated,
    /// A referent ID, size prefix or discriminant contradicts the rest of the message
    Inconsistent,
    /// Union discriminant has no arm
    UnknownDiscriminant,
    /// A value is outside its declared domain
    InvalidValue,
    /// A decode limit was hit
    LimitExceeded,
}

impl NdrError {
    /// Classify the error
    pub fn kind(&self) -> NdrErrorKind {
        match self {
            NdrError::BufferUnderflow { .. } => NdrErrorKind::Truncated,
            NdrError::DuplicateReferent(_)
            | NdrError::ReferentTypeMismatch(_)
            | NdrError::ReferentCycle(_)
            | NdrError::ArraySizeMismatch { .. }
            | NdrError::ConformanceMismatch { .. }
            | NdrError::DiscriminantMismatch { .. } => NdrErrorKind::Inconsistent,
            NdrError::InvalidDiscriminant(_) => NdrErrorKind::UnknownDiscriminant,
            NdrError::InvalidString(_)
            | NdrError::NullRefPointer
            | NdrError::InvalidEnumValue(_)
            | NdrError::SizeOutOfRange(_)
            | NdrError::IntegerOverflow
            | NdrError::Utf8Error(_)
            | NdrError::Utf16Error(_) => NdrErrorKind::InvalidValue,
            NdrError::AllocationLimitExceeded { .. } | NdrError::DepthLimitExceeded(_) => {
                NdrErrorKind::LimitExceeded
            }
        }
    }

    /// True if the stream ended before the value did
    pub fn is_truncated(&self) -> bool {
        self.kind() == NdrErrorKind::Truncated
    }
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
