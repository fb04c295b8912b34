//! Decoded output: the data record value tree.
//!
//! Every node carries the absolute byte range it was decoded from, so any
//! value can be traced back to the originating bytes of the block. The tree
//! owns its data; the decoder holds no state between blocks.

use std::fmt;
use std::ops::Range;

use crate::diag::Diagnostic;

/// A decoded scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    /// A fixed-point quantity. The raw integer is kept alongside the LSB
    /// scale so callers can re-apply a site-specific scale when a category
    /// parameterizes the exponent; `as_f64` multiplies on demand.
    Scaled { raw: i64, scale: f64 },
    Float(f64),
    Str(String),
    /// Integer rendered in octal (Mode-3/A codes and friends).
    Octal(u64),
    /// Integer rendered in hex (ICAO 24-bit addresses and friends).
    Hex(u64),
    /// Flag word preserved as-is.
    Bitmap(u64),
    /// Enumerated code; `label` is `None` when the code has no mapping.
    Enum { raw: u64, label: Option<String> },
}

impl Value {
    /// Numeric view of the value, where one exists.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Unsigned(v) | Value::Octal(v) | Value::Hex(v) | Value::Bitmap(v) => {
                Some(*v as f64)
            }
            Value::Signed(v) => Some(*v as f64),
            Value::Scaled { raw, scale } => Some(*raw as f64 * scale),
            Value::Float(v) => Some(*v),
            Value::Enum { raw, .. } => Some(*raw as f64),
            Value::Str(_) => None,
        }
    }

    /// Raw unsigned view, where one exists.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Unsigned(v) | Value::Octal(v) | Value::Hex(v) | Value::Bitmap(v) => Some(*v),
            Value::Enum { raw, .. } => Some(*raw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Enum { label, .. } => label.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Signed(v) => write!(f, "{v}"),
            Value::Scaled { raw, scale } => write!(f, "{}", *raw as f64 * scale),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Octal(v) => write!(f, "0o{v:o}"),
            Value::Hex(v) => write!(f, "0x{v:X}"),
            Value::Bitmap(v) => write!(f, "{v:#b}"),
            Value::Enum { raw, label: Some(l) } => write!(f, "{l} ({raw})"),
            Value::Enum { raw, label: None } => write!(f, "{raw}"),
        }
    }
}

/// A decoded leaf with byte-level traceability.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: Value,
    /// The packed bits the value was extracted from.
    pub raw: u64,
    pub raw_range: Range<usize>,
}

/// An item node holding named child nodes in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub children: Vec<(String, Node)>,
    pub raw_range: Range<usize>,
}

impl Group {
    /// Looks up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }
}

/// Ordered occurrences of a repetitive item's inner record.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub elements: Vec<Node>,
    pub raw_range: Range<usize>,
}

/// Bytes the core does not interpret: explicit-format payloads and unknown
/// BDS registers (`tag` holds the register number for the latter).
#[derive(Debug, Clone, PartialEq)]
pub struct Opaque {
    pub bytes: Vec<u8>,
    pub tag: Option<u8>,
    pub raw_range: Range<usize>,
}

/// One node of a decoded data record.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Scalar(Scalar),
    Sequence(Sequence),
    Opaque(Opaque),
}

impl Node {
    pub fn raw_range(&self) -> Range<usize> {
        match self {
            Node::Group(g) => g.raw_range.clone(),
            Node::Scalar(s) => s.raw_range.clone(),
            Node::Sequence(s) => s.raw_range.clone(),
            Node::Opaque(o) => o.raw_range.clone(),
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Node::Opaque(o) => Some(o),
            _ => None,
        }
    }

    /// Descends into a group child; convenience for `as_group` + `child`.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.as_group().and_then(|g| g.child(name))
    }

    /// Scalar value of a group child, for the common leaf access.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Node::as_scalar).map(|s| &s.value)
    }
}

/// One decoded data record: items in UAP/FSPEC order plus the recoverable
/// diagnostics raised while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub items: Vec<(String, Node)>,
    pub diagnostics: Vec<Diagnostic>,
    pub raw_range: Range<usize>,
}

impl Record {
    /// Looks up an item by its identifier ("010", "SP", ...).
    pub fn item(&self, id: &str) -> Option<&Node> {
        self.items.iter().find(|(n, _)| n == id).map(|(_, node)| node)
    }

    pub fn has(&self, id: &str) -> bool {
        self.item(id).is_some()
    }
}

/// One decoded data block.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub category: u8,
    pub edition: String,
    pub records: Vec<Record>,
    pub raw_range: Range<usize>,
}

/// Everything `decode_block` produced over one input slice: zero or more
/// decoded blocks plus the block-level diagnostic log. Recoverable record
/// diagnostics stay attached to their records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockResult {
    pub blocks: Vec<DataBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(value: Value) -> Node {
        Node::Scalar(Scalar {
            raw: 0,
            value,
            raw_range: 0..1,
        })
    }

    #[test]
    fn scaled_preserves_raw_and_scale() {
        let v = Value::Scaled { raw: -256, scale: 0.25 };
        assert_eq!(v.as_f64(), Some(-64.0));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Octal(0o7500).to_string(), "0o7500");
        assert_eq!(Value::Hex(0x4840D6).to_string(), "0x4840D6");
        assert_eq!(
            Value::Enum { raw: 2, label: Some("SSR".into()) }.to_string(),
            "SSR (2)"
        );
    }

    #[test]
    fn group_lookup_by_name() {
        let group = Group {
            children: vec![
                ("SAC".into(), scalar(Value::Unsigned(8))),
                ("SIC".into(), scalar(Value::Unsigned(119))),
            ],
            raw_range: 3..5,
        };
        let node = Node::Group(group);

        assert_eq!(node.field("SIC"), Some(&Value::Unsigned(119)));
        assert_eq!(node.field("XXX"), None);
        assert_eq!(node.raw_range(), 3..5);
    }

    #[test]
    fn record_item_lookup() {
        let rec = Record {
            items: vec![("010".into(), scalar(Value::Unsigned(1)))],
            diagnostics: Vec::new(),
            raw_range: 3..6,
        };

        assert!(rec.has("010"));
        assert!(!rec.has("020"));
    }
}
