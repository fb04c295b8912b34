//! Structured diagnostics for the decode path.
//!
//! Recoverable conditions are *data*: they are appended to the enclosing
//! record's diagnostic log and never abort anything. Fatal conditions travel
//! as `Err(Diagnostic)` through the decoders, abort the current record and
//! surface in the block result. Nothing in the decode path panics on
//! adversarial input.

use std::fmt;

use thiserror::Error;

/// How a diagnostic affects the decode in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Attached to the record; decoding continues.
    Recoverable,
    /// Aborts the current record; the block decoder moves on.
    Fatal,
}

/// Every way a decode can go sideways.
///
/// The severity of each kind is intrinsic, see [`DiagnosticKind::severity`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticKind {
    #[error("read past end of input: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("invalid data block length {len}")]
    InvalidBlockLength { len: u16 },

    #[error("category {category} is not registered")]
    UnknownCategory { category: u8 },

    #[error("repetition count {count} exceeds the {remaining} remaining bytes")]
    InvalidRepetition { count: u8, remaining: usize },

    #[error("invalid explicit field length {len}")]
    InvalidExplicitLength { len: u8 },

    #[error("extension chain exceeds {max} octets")]
    ExtensionTooLong { max: usize },

    #[error("compound nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },

    #[error("presence bit {bit} is set but the slot is spare")]
    SparePresent { bit: usize },

    #[error("value {raw} has no enum mapping")]
    UnknownEnum { raw: u64 },

    #[error("invalid 6-bit character code {code:#04x}")]
    CharacterDecode { code: u8 },

    #[error("record ended with {remaining} unconsumed bytes")]
    RecordUnderrun { remaining: usize },

    #[error("mandatory item absent from FSPEC")]
    MandatoryMissing,
}

impl DiagnosticKind {
    /// Severity per the decoder's error taxonomy.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::Truncated { .. }
            | DiagnosticKind::InvalidBlockLength { .. }
            | DiagnosticKind::InvalidRepetition { .. }
            | DiagnosticKind::InvalidExplicitLength { .. }
            | DiagnosticKind::ExtensionTooLong { .. }
            | DiagnosticKind::NestingTooDeep { .. } => Severity::Fatal,

            DiagnosticKind::UnknownCategory { .. }
            | DiagnosticKind::SparePresent { .. }
            | DiagnosticKind::UnknownEnum { .. }
            | DiagnosticKind::CharacterDecode { .. }
            | DiagnosticKind::RecordUnderrun { .. }
            | DiagnosticKind::MandatoryMissing => Severity::Recoverable,
        }
    }
}

/// A single decode diagnostic with byte-level context.
///
/// `byte_offset` is absolute within the slice handed to
/// [`Decoder::decode_block`](crate::decode::Decoder::decode_block), so a
/// caller can always map a diagnostic back to the offending bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub category: Option<u8>,
    pub item: Option<String>,
    pub byte_offset: usize,
    pub bit: Option<u16>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, byte_offset: usize) -> Self {
        Diagnostic {
            kind,
            category: None,
            item: None,
            byte_offset,
            bit: None,
        }
    }

    pub fn with_category(mut self, category: u8) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.item = Some(item.to_string());
        self
    }

    pub fn with_bit(mut self, bit: u16) -> Self {
        self.bit = Some(bit);
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.byte_offset)?;
        if let Some(cat) = self.category {
            write!(f, ", cat {cat:03}")?;
        }
        if let Some(item) = &self.item {
            write!(f, ", item {item}")?;
        }
        if let Some(bit) = self.bit {
            write!(f, ", bit {bit}")?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for Diagnostic {}

/// Load-time schema rejection.
///
/// Raised while building or registering a category schema. Registration is
/// transactional: a failed `register` leaves the previous registry state
/// untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("cat {category:03}: duplicate item id {item}")]
    DuplicateItem { category: u8, item: String },

    #[error("cat {category:03}, item {item}: duplicate field name {field}")]
    DuplicateField {
        category: u8,
        item: String,
        field: String,
    },

    #[error("cat {category:03}, item {item}: bit range {from}..{to} is invalid")]
    BadBitRange {
        category: u8,
        item: String,
        from: u16,
        to: u16,
    },

    #[error("cat {category:03}, item {item}: fields cover {covered} of {expected} bits")]
    CoverageMismatch {
        category: u8,
        item: String,
        covered: u32,
        expected: u32,
    },

    #[error("cat {category:03}, item {item}: overlapping bit ranges at bit {bit}")]
    OverlappingFields { category: u8, item: String, bit: u16 },

    #[error("cat {category:03}, item {item}: field wider than 64 bits")]
    FieldTooWide { category: u8, item: String },

    #[error("cat {category:03}, item {item}: variable group claims the extension bit")]
    FxBitClaimed { category: u8, item: String },

    #[error("cat {category:03}, item {item}: {reason}")]
    InvalidLayout {
        category: u8,
        item: String,
        reason: String,
    },

    #[error("cat {category:03}: UAP slot {frn} references unknown item {item}")]
    UnknownUapItem {
        category: u8,
        frn: usize,
        item: String,
    },

    #[error("cat {category:03}: {reason}")]
    InvalidUap { category: u8, reason: String },

    #[error("cat {category:03}: selector references unknown UAP {uap}")]
    UnknownSelectorUap { category: u8, uap: String },

    #[error("cat {category:03}: {reason}")]
    InvalidSelector { category: u8, reason: String },

    #[error("cat {category:03}, BDS register {register:#04x}: layout must be exactly 7 bytes")]
    BadBdsLayout { category: u8, register: u8 },
}
