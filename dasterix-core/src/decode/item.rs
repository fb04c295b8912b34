//! The six format-variant decoders.
//!
//! Dispatch is a match on [`ItemLayout`]; each arm consumes schema plus
//! cursor and produces one node of the record tree. Recoverable warnings go
//! to `diags`; fatal conditions come back as `Err` and abort the record.

use crate::cursor::{Cursor, Window};
use crate::decode::Limits;
use crate::diag::{Diagnostic, DiagnosticKind};
use crate::extract;
use crate::fspec::Fspec;
use crate::schema::{
    CategorySchema, CompoundLayout, Element, FixedLayout, ItemDef, ItemLayout, RepetitiveLayout,
    VariableLayout,
};
use crate::value::{Group, Node, Opaque, Scalar, Sequence, Value};

/// Decodes one data item according to its schema layout.
///
/// `depth` counts compound nesting levels; top-level items enter at 0.
pub(crate) fn decode_item(
    schema: &CategorySchema,
    limits: &Limits,
    item: &ItemDef,
    cur: &mut Cursor<'_>,
    diags: &mut Vec<Diagnostic>,
    depth: usize,
) -> Result<Node, Diagnostic> {
    log::trace!(
        "cat {:03} item {} ({}) at offset {}",
        schema.category,
        item.id,
        item.layout.format_name(),
        cur.offset()
    );
    match &item.layout {
        ItemLayout::Fixed(fixed) => decode_fixed(schema, item, fixed, cur, diags),
        ItemLayout::Variable(var) => decode_variable(schema, limits, item, var, cur, diags),
        ItemLayout::Compound(comp) => decode_compound(schema, limits, item, comp, cur, diags, depth),
        ItemLayout::Repetitive(rep) => decode_repetitive(schema, item, rep, cur, diags),
        ItemLayout::Explicit => decode_explicit(schema, item, cur),
        ItemLayout::Bds => decode_bds(schema, item, cur, diags),
    }
}

fn tag(schema: &CategorySchema, item: &ItemDef, diag: Diagnostic) -> Diagnostic {
    diag.with_category(schema.category).with_item(&item.id)
}

/// Extracts every element of a byte window into named scalars, appending
/// extraction warnings to the record log. Spare bits produce nothing.
fn extract_window(
    schema: &CategorySchema,
    item: &ItemDef,
    elements: &[Element],
    win: &Window<'_>,
    children: &mut Vec<(String, Node)>,
    diags: &mut Vec<Diagnostic>,
) {
    for element in elements {
        let (name, scalar, warning) = match element {
            Element::Field(field) => {
                let (scalar, warning) = extract::decode_field(field, win);
                (field.name.clone(), scalar, warning)
            }
            Element::Enum(field) => {
                let (scalar, warning) = extract::decode_enum(field, win);
                (field.name.clone(), scalar, warning)
            }
            Element::Spare { .. } => continue,
        };
        if let Some(kind) = warning {
            let (from, _) = element.bit_range();
            diags.push(
                tag(
                    schema,
                    item,
                    Diagnostic::new(kind, win.range().start).with_bit(from),
                ),
            );
        }
        children.push((name, Node::Scalar(scalar)));
    }
}

fn decode_fixed(
    schema: &CategorySchema,
    item: &ItemDef,
    fixed: &FixedLayout,
    cur: &mut Cursor<'_>,
    diags: &mut Vec<Diagnostic>,
) -> Result<Node, Diagnostic> {
    let win = cur
        .window(fixed.bytes)
        .map_err(|d| tag(schema, item, d))?;

    let mut children = Vec::new();
    extract_window(schema, item, &fixed.elements, &win, &mut children, diags);
    Ok(Node::Group(Group {
        children,
        raw_range: win.range(),
    }))
}

/// FX-chained octets, each decoded with its declared group layout.
///
/// Octets past the declared groups are still consumed (the FX chain must be
/// honoured to stay synchronized with the wire) and surface as raw `EXTn`
/// bitmap scalars. The chain cap is the schema's declared length or the
/// configured limit, whichever is larger.
fn decode_variable(
    schema: &CategorySchema,
    limits: &Limits,
    item: &ItemDef,
    var: &VariableLayout,
    cur: &mut Cursor<'_>,
    diags: &mut Vec<Diagnostic>,
) -> Result<Node, Diagnostic> {
    let start = cur.offset();
    let cap = limits.max_variable_parts.max(var.groups.len());
    let mut children = Vec::new();
    let mut part = 0usize;

    loop {
        let win = cur.window(1).map_err(|d| tag(schema, item, d))?;
        let byte = win.bytes()[0];

        match var.groups.get(part) {
            Some(group) => {
                extract_window(schema, item, &group.elements, &win, &mut children, diags)
            }
            None => {
                let bits = (byte >> 1) as u64;
                children.push((
                    format!("EXT{}", part + 1),
                    Node::Scalar(Scalar {
                        value: Value::Bitmap(bits),
                        raw: bits,
                        raw_range: win.range(),
                    }),
                ));
            }
        }

        part += 1;
        if byte & 0x01 == 0 {
            break;
        }
        if part >= cap {
            return Err(tag(
                schema,
                item,
                Diagnostic::new(DiagnosticKind::ExtensionTooLong { max: cap }, cur.offset()),
            ));
        }
    }

    Ok(Node::Group(Group {
        children,
        raw_range: start..cur.offset(),
    }))
}

/// Primary bitmap (variable-shaped), then sub-items in bitmap bit order.
fn decode_compound(
    schema: &CategorySchema,
    limits: &Limits,
    item: &ItemDef,
    comp: &CompoundLayout,
    cur: &mut Cursor<'_>,
    diags: &mut Vec<Diagnostic>,
    depth: usize,
) -> Result<Node, Diagnostic> {
    if depth >= limits.max_nesting {
        return Err(tag(
            schema,
            item,
            Diagnostic::new(
                DiagnosticKind::NestingTooDeep {
                    max: limits.max_nesting,
                },
                cur.offset(),
            ),
        ));
    }

    let start = cur.offset();
    let octets_needed = comp.slots.len().div_ceil(crate::fspec::DATA_BITS_PER_OCTET);
    let cap = limits.max_variable_parts.max(octets_needed);
    let primary = Fspec::read(cur, cap).map_err(|d| tag(schema, item, d))?;

    let mut children = Vec::new();
    for bit in primary.frns() {
        match comp.slots.get(bit - 1) {
            Some(Some(idx)) => {
                // Index validity is a schema invariant.
                let Some(sub) = schema.item(*idx) else {
                    continue;
                };
                let node = decode_item(schema, limits, sub, cur, diags, depth + 1)?;
                children.push((sub.id.clone(), node));
            }
            // Spare slot or a bit past the declared sub-items: nothing on the
            // wire to consume, report and move on.
            Some(None) | None => {
                diags.push(tag(
                    schema,
                    item,
                    Diagnostic::new(DiagnosticKind::SparePresent { bit }, start),
                ));
            }
        }
    }

    Ok(Node::Group(Group {
        children,
        raw_range: start..cur.offset(),
    }))
}

/// One REP byte, then REP copies of the fixed inner record.
///
/// The inner size is statically known, so an impossible REP fails before any
/// element is consumed rather than truncating mid-sequence.
fn decode_repetitive(
    schema: &CategorySchema,
    item: &ItemDef,
    rep: &RepetitiveLayout,
    cur: &mut Cursor<'_>,
    diags: &mut Vec<Diagnostic>,
) -> Result<Node, Diagnostic> {
    let start = cur.offset();
    let count = cur.read_byte().map_err(|d| tag(schema, item, d))?;

    if count as usize * rep.inner.bytes > cur.remaining() {
        return Err(tag(
            schema,
            item,
            Diagnostic::new(
                DiagnosticKind::InvalidRepetition {
                    count,
                    remaining: cur.remaining(),
                },
                start,
            ),
        ));
    }

    let mut elements = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let win = cur.window(rep.inner.bytes).map_err(|d| tag(schema, item, d))?;
        let mut children = Vec::new();
        extract_window(schema, item, &rep.inner.elements, &win, &mut children, diags);
        elements.push(Node::Group(Group {
            children,
            raw_range: win.range(),
        }));
    }

    Ok(Node::Sequence(Sequence {
        elements,
        raw_range: start..cur.offset(),
    }))
}

/// One inclusive length byte, then opaque payload.
fn decode_explicit(
    schema: &CategorySchema,
    item: &ItemDef,
    cur: &mut Cursor<'_>,
) -> Result<Node, Diagnostic> {
    let start = cur.offset();
    let len = cur.read_byte().map_err(|d| tag(schema, item, d))?;

    if len == 0 || len as usize - 1 > cur.remaining() {
        return Err(tag(
            schema,
            item,
            Diagnostic::new(DiagnosticKind::InvalidExplicitLength { len }, start),
        ));
    }

    let payload = cur.read_bytes(len as usize - 1).map_err(|d| tag(schema, item, d))?;
    Ok(Node::Opaque(Opaque {
        bytes: payload.to_vec(),
        tag: None,
        raw_range: start..cur.offset(),
    }))
}

/// One register byte plus seven payload bytes.
///
/// Registers present in the category's BDS catalog decode into a group led
/// by a `REG` scalar; unknown registers are preserved as tagged opaque
/// nodes, which is not an error.
fn decode_bds(
    schema: &CategorySchema,
    item: &ItemDef,
    cur: &mut Cursor<'_>,
    diags: &mut Vec<Diagnostic>,
) -> Result<Node, Diagnostic> {
    let win = cur.window(8).map_err(|d| tag(schema, item, d))?;
    let register = win.bytes()[0];

    let Some(layout) = schema.bds_layout(register) else {
        return Ok(Node::Opaque(Opaque {
            bytes: win.bytes()[1..].to_vec(),
            tag: Some(register),
            raw_range: win.range(),
        }));
    };

    let mut children = vec![(
        "REG".to_string(),
        Node::Scalar(Scalar {
            value: Value::Hex(register as u64),
            raw: register as u64,
            raw_range: win.range().start..win.range().start + 1,
        }),
    )];
    extract_window(schema, item, &layout.elements, &win.tail(1), &mut children, diags);

    Ok(Node::Group(Group {
        children,
        raw_range: win.range(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BitField, Encoding, Rule, Uap, UapSlot, VariableGroup};

    fn field(name: &str, from: u16, to: u16) -> Element {
        Element::Field(BitField {
            name: name.to_string(),
            from,
            to,
            encoding: Encoding::Unsigned,
            scale: None,
            unit: None,
        })
    }

    fn item(id: &str, layout: ItemLayout) -> ItemDef {
        ItemDef {
            id: id.to_string(),
            name: format!("Item {id}"),
            rule: Rule::Optional,
            layout,
        }
    }

    /// Schema whose arena is exactly `items`, all addressable from one UAP.
    fn schema_with(items: Vec<ItemDef>) -> CategorySchema {
        let slots = (0..items.len()).map(UapSlot::Item).collect();
        CategorySchema::new(
            99,
            "1.0",
            "Test",
            items,
            vec![Uap {
                name: "default".into(),
                slots,
            }],
            None,
            Vec::new(),
        )
    }

    fn decode(
        schema: &CategorySchema,
        idx: usize,
        data: &[u8],
    ) -> (Result<Node, Diagnostic>, Vec<Diagnostic>, usize) {
        let mut cur = Cursor::new(data);
        let mut diags = Vec::new();
        let result = decode_item(
            schema,
            &Limits::default(),
            &schema.items[idx],
            &mut cur,
            &mut diags,
            0,
        );
        (result, diags, cur.consumed())
    }

    #[test]
    fn fixed_consumes_exactly_declared_bytes() {
        let schema = schema_with(vec![item(
            "010",
            ItemLayout::Fixed(FixedLayout {
                bytes: 2,
                elements: vec![field("SAC", 16, 9), field("SIC", 8, 1)],
            }),
        )]);

        let (result, diags, consumed) = decode(&schema, 0, &[0x08, 0x77, 0xFF]);
        let node = result.unwrap();

        assert_eq!(consumed, 2);
        assert!(diags.is_empty());
        assert_eq!(node.field("SAC"), Some(&Value::Unsigned(0x08)));
        assert_eq!(node.field("SIC"), Some(&Value::Unsigned(0x77)));
        assert_eq!(node.raw_range(), 0..2);
    }

    #[test]
    fn fixed_truncated_is_fatal() {
        let schema = schema_with(vec![item(
            "010",
            ItemLayout::Fixed(FixedLayout {
                bytes: 4,
                elements: vec![field("A", 32, 1)],
            }),
        )]);

        let (result, _, consumed) = decode(&schema, 0, &[0x01, 0x02]);
        let err = result.unwrap_err();

        assert!(matches!(err.kind, DiagnosticKind::Truncated { need: 4, have: 2 }));
        assert_eq!(err.item.as_deref(), Some("010"));
        assert_eq!(consumed, 0);
    }

    #[test]
    fn variable_single_octet() {
        let schema = schema_with(vec![item(
            "020",
            ItemLayout::Variable(VariableLayout {
                groups: vec![VariableGroup {
                    elements: vec![field("TYP", 8, 6), field("FLAGS", 5, 2)],
                }],
            }),
        )]);

        // 0x22: TYP=1, FLAGS=1, FX=0.
        let (result, _, consumed) = decode(&schema, 0, &[0x22]);
        let node = result.unwrap();

        assert_eq!(consumed, 1);
        assert_eq!(node.field("TYP"), Some(&Value::Unsigned(1)));
        assert_eq!(node.field("FLAGS"), Some(&Value::Unsigned(1)));
    }

    #[test]
    fn variable_extension_chain() {
        let schema = schema_with(vec![item(
            "020",
            ItemLayout::Variable(VariableLayout {
                groups: vec![
                    VariableGroup {
                        elements: vec![field("A", 8, 2)],
                    },
                    VariableGroup {
                        elements: vec![field("B", 8, 2)],
                    },
                    VariableGroup {
                        elements: vec![field("C", 8, 2)],
                    },
                ],
            }),
        )]);

        // Three bytes: FX set on the first two, clear on the last.
        let (result, _, consumed) = decode(&schema, 0, &[0x81, 0x03, 0x00]);
        let node = result.unwrap();

        assert_eq!(consumed, 3);
        assert_eq!(node.field("A"), Some(&Value::Unsigned(0x40)));
        assert_eq!(node.field("B"), Some(&Value::Unsigned(0x01)));
        assert_eq!(node.field("C"), Some(&Value::Unsigned(0x00)));
    }

    #[test]
    fn variable_last_byte_has_fx_clear_invariant() {
        let schema = schema_with(vec![item(
            "020",
            ItemLayout::Variable(VariableLayout {
                groups: vec![VariableGroup {
                    elements: vec![field("A", 8, 2)],
                }],
            }),
        )]);

        // Extension past the declared single group: consumed as raw EXT2.
        let (result, _, consumed) = decode(&schema, 0, &[0x03, 0x54]);
        let node = result.unwrap();

        assert_eq!(consumed, 2);
        assert_eq!(node.field("A"), Some(&Value::Unsigned(0x01)));
        assert_eq!(node.field("EXT2"), Some(&Value::Bitmap(0x2A)));
    }

    #[test]
    fn variable_runaway_chain_is_fatal() {
        let schema = schema_with(vec![item(
            "020",
            ItemLayout::Variable(VariableLayout {
                groups: vec![VariableGroup {
                    elements: vec![field("A", 8, 2)],
                }],
            }),
        )]);

        let (result, _, _) = decode(&schema, 0, &[0x01; 16]);
        let err = result.unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::ExtensionTooLong { max: 8 });
    }

    fn compound_schema() -> CategorySchema {
        // Arena: [0] = compound parent, [1] and [2] = fixed sub-items.
        let sub_a = item(
            "SRL",
            ItemLayout::Fixed(FixedLayout {
                bytes: 1,
                elements: vec![field("VAL", 8, 1)],
            }),
        );
        let sub_b = item(
            "SAM",
            ItemLayout::Fixed(FixedLayout {
                bytes: 1,
                elements: vec![field("AMP", 8, 1)],
            }),
        );
        let parent = item(
            "130",
            ItemLayout::Compound(CompoundLayout {
                slots: vec![Some(1), None, Some(2)],
            }),
        );
        schema_with(vec![parent, sub_a, sub_b])
    }

    #[test]
    fn compound_decodes_present_subitems_in_bitmap_order() {
        let schema = compound_schema();

        // Primary 0xA0: bits 1 and 3 set, FX clear. Sub-items follow.
        let (result, diags, consumed) = decode(&schema, 0, &[0xA0, 0x11, 0x22]);
        let node = result.unwrap();
        let group = node.as_group().unwrap();

        assert_eq!(consumed, 3);
        assert!(diags.is_empty());
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[0].0, "SRL");
        assert_eq!(group.children[1].0, "SAM");
        assert_eq!(node.get("SRL").unwrap().field("VAL"), Some(&Value::Unsigned(0x11)));
    }

    #[test]
    fn compound_spare_bit_set_is_recoverable() {
        let schema = compound_schema();

        // Primary 0xE0: bits 1, 2 (spare), 3 set.
        let (result, diags, consumed) = decode(&schema, 0, &[0xE0, 0x11, 0x22]);
        let node = result.unwrap();

        assert_eq!(consumed, 3);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::SparePresent { bit: 2 });
        assert_eq!(node.as_group().unwrap().children.len(), 2);
    }

    #[test]
    fn compound_nesting_cap_is_fatal() {
        let schema = compound_schema();
        let mut cur = Cursor::new(&[0xA0, 0x11, 0x22]);
        let mut diags = Vec::new();

        let err = decode_item(
            &schema,
            &Limits::default(),
            &schema.items[0],
            &mut cur,
            &mut diags,
            8,
        )
        .unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::NestingTooDeep { max: 8 });
    }

    fn repetitive_schema() -> CategorySchema {
        schema_with(vec![item(
            "250",
            ItemLayout::Repetitive(RepetitiveLayout {
                inner: FixedLayout {
                    bytes: 2,
                    elements: vec![field("X", 16, 9), field("Y", 8, 1)],
                },
            }),
        )])
    }

    #[test]
    fn repetitive_decodes_rep_elements() {
        let schema = repetitive_schema();

        let (result, _, consumed) = decode(&schema, 0, &[0x02, 0x01, 0x02, 0x03, 0x04]);
        let node = result.unwrap();
        let seq = node.as_sequence().unwrap();

        assert_eq!(consumed, 5);
        assert_eq!(seq.elements.len(), 2);
        assert_eq!(seq.elements[1].field("X"), Some(&Value::Unsigned(0x03)));
    }

    #[test]
    fn repetitive_zero_count_is_empty_not_error() {
        let schema = repetitive_schema();

        let (result, diags, consumed) = decode(&schema, 0, &[0x00]);
        let node = result.unwrap();

        assert_eq!(consumed, 1);
        assert!(diags.is_empty());
        assert!(node.as_sequence().unwrap().elements.is_empty());
    }

    #[test]
    fn repetitive_overcommit_fails_before_reading_elements() {
        let schema = repetitive_schema();

        let (result, _, _) = decode(&schema, 0, &[0x05, 0x01, 0x02]);
        let err = result.unwrap_err();
        assert_eq!(
            err.kind,
            DiagnosticKind::InvalidRepetition { count: 5, remaining: 2 }
        );
    }

    #[test]
    fn explicit_exposes_opaque_payload() {
        let schema = schema_with(vec![item("SP", ItemLayout::Explicit)]);

        let (result, _, consumed) = decode(&schema, 0, &[0x04, 0xDE, 0xAD, 0xBE]);
        let node = result.unwrap();
        let opaque = node.as_opaque().unwrap();

        // Cursor advances by exactly L.
        assert_eq!(consumed, 4);
        assert_eq!(opaque.bytes, vec![0xDE, 0xAD, 0xBE]);
        assert_eq!(opaque.tag, None);
    }

    #[test]
    fn explicit_zero_length_is_fatal() {
        let schema = schema_with(vec![item("SP", ItemLayout::Explicit)]);

        let (result, _, _) = decode(&schema, 0, &[0x00, 0xFF]);
        let err = result.unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::InvalidExplicitLength { len: 0 });
    }

    #[test]
    fn explicit_overlong_length_is_fatal() {
        let schema = schema_with(vec![item("SP", ItemLayout::Explicit)]);

        let (result, _, _) = decode(&schema, 0, &[0x09, 0x01]);
        let err = result.unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::InvalidExplicitLength { len: 9 });
    }

    fn bds_schema() -> CategorySchema {
        let mut schema = schema_with(vec![item("MBD", ItemLayout::Bds)]);
        schema.bds.push((
            0x40,
            FixedLayout {
                bytes: 7,
                elements: vec![field("MCP_ALT", 56, 44), Element::Spare { from: 43, to: 1 }],
            },
        ));
        schema
    }

    #[test]
    fn bds_known_register_decodes_as_group() {
        let schema = bds_schema();

        let data = [0x40, 0x85, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00];
        let (result, _, consumed) = decode(&schema, 0, &data);
        let node = result.unwrap();

        assert_eq!(consumed, 8);
        assert_eq!(node.field("REG"), Some(&Value::Hex(0x40)));
        // Top 13 bits of the 7-byte payload: 0x8530 >> 3.
        assert_eq!(node.field("MCP_ALT"), Some(&Value::Unsigned(0x10A6)));
    }

    #[test]
    fn bds_unknown_register_is_tagged_opaque_not_error() {
        let schema = bds_schema();

        let data = [0x60, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let (result, diags, consumed) = decode(&schema, 0, &data);
        let node = result.unwrap();
        let opaque = node.as_opaque().unwrap();

        assert_eq!(consumed, 8);
        assert!(diags.is_empty());
        assert_eq!(opaque.tag, Some(0x60));
        assert_eq!(opaque.bytes.len(), 7);
    }

    #[test]
    fn bds_truncated_is_fatal() {
        let schema = bds_schema();

        let (result, _, _) = decode(&schema, 0, &[0x40, 0x01]);
        assert!(matches!(
            result.unwrap_err().kind,
            DiagnosticKind::Truncated { need: 8, have: 2 }
        ));
    }
}
