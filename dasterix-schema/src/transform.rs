//! Lowers the parsed XML document into the core schema model.
//!
//! Compound sub-items are pushed into the item arena bottom-up, so every
//! slot reference is an index to an already-built definition and the arena
//! stays acyclic by construction. The result is validated before it leaves
//! this module; from here on the schema is trusted.

use std::collections::HashMap;

use dasterix_core::diag::SchemaError;
use dasterix_core::schema::{
    BitField, CategorySchema, CompoundLayout, Element, Encoding, EnumField, FixedLayout, ItemDef,
    ItemIdx, ItemLayout, RepetitiveLayout, Rule, Uap, UapSelector, UapSlot, VariableGroup,
    VariableLayout,
};

use crate::xml_model::{
    CategoryXml, ElementXml, FixedXml, LayoutXml, SubEntryXml,
};

/// Builds and validates a [`CategorySchema`] from a parsed document.
///
/// # Errors
///
/// Returns the first inconsistency found, either while lowering (unknown
/// encodings, unresolvable UAP slots or selector names, bad BDS register
/// numbers, duplicate item ids) or from [`CategorySchema::validate`].
pub fn build_category(doc: &CategoryXml) -> Result<CategorySchema, SchemaError> {
    let mut arena: Vec<ItemDef> = Vec::new();
    let mut top: HashMap<String, ItemIdx> = HashMap::new();

    for item in &doc.items {
        let rule = parse_rule(doc.id, &item.id, item.rule.as_deref())?;
        let idx = build_item(doc.id, &item.id, &item.name, rule, &item.layout, &mut arena)?;
        if top.insert(item.id.clone(), idx).is_some() {
            return Err(SchemaError::DuplicateItem {
                category: doc.id,
                item: item.id.clone(),
            });
        }
    }

    let mut uaps = Vec::new();
    for (i, uap) in doc.uaps.iter().enumerate() {
        let name = match &uap.name {
            Some(name) => name.clone(),
            None if i == 0 => "default".to_string(),
            None => format!("uap{i}"),
        };
        let mut slots = Vec::new();
        for (frn0, slot) in uap.slots.iter().enumerate() {
            let id = slot.trim();
            if id.is_empty() || id == "-" || id.eq_ignore_ascii_case("spare") {
                slots.push(UapSlot::Spare);
            } else {
                let idx = top.get(id).copied().ok_or_else(|| SchemaError::UnknownUapItem {
                    category: doc.id,
                    frn: frn0 + 1,
                    item: id.to_string(),
                })?;
                slots.push(UapSlot::Item(idx));
            }
        }
        uaps.push(Uap { name, slots });
    }

    let selector = match &doc.selector {
        Some(sel) => {
            let resolve = |name: &str| {
                uaps.iter()
                    .position(|u| u.name == name)
                    .ok_or_else(|| SchemaError::UnknownSelectorUap {
                        category: doc.id,
                        uap: name.to_string(),
                    })
            };
            let mut cases = Vec::with_capacity(sel.cases.len());
            for case in &sel.cases {
                cases.push((case.value, resolve(&case.uap)?));
            }
            Some(UapSelector {
                offset: sel.offset,
                from: sel.from,
                to: sel.to,
                cases,
                fallback: resolve(&sel.fallback)?,
            })
        }
        None => None,
    };

    let mut bds = Vec::new();
    for entry in &doc.bds {
        let register = parse_register(doc.id, &entry.register)?;
        let item_tag = format!("BDS:{}", entry.register);
        bds.push((register, build_fixed(doc.id, &item_tag, &entry.layout)?));
    }

    let schema = CategorySchema::new(
        doc.id,
        doc.edition.clone(),
        doc.name.clone(),
        arena,
        uaps,
        selector,
        bds,
    );
    schema.validate()?;
    log::debug!(
        "built cat {:03} edition {}: {} item(s), {} UAP(s)",
        schema.category,
        schema.edition,
        schema.items.len(),
        schema.uaps.len()
    );
    Ok(schema)
}

/// Lowers one item (or compound sub-item) into the arena, returning its
/// index. Sub-items land before their parent.
fn build_item(
    category: u8,
    id: &str,
    name: &str,
    rule: Rule,
    layout: &LayoutXml,
    arena: &mut Vec<ItemDef>,
) -> Result<ItemIdx, SchemaError> {
    let layout = match layout {
        LayoutXml::Fixed(fixed) => ItemLayout::Fixed(build_fixed(category, id, fixed)?),
        LayoutXml::Variable(var) => {
            let mut groups = Vec::with_capacity(var.groups.len());
            for group in &var.groups {
                groups.push(VariableGroup {
                    elements: build_elements(category, id, &group.elements)?,
                });
            }
            ItemLayout::Variable(VariableLayout { groups })
        }
        LayoutXml::Compound(comp) => {
            let mut slots = Vec::with_capacity(comp.subs.len());
            for entry in &comp.subs {
                match entry {
                    SubEntryXml::Sub(sub) => {
                        let idx =
                            build_item(category, &sub.id, &sub.name, Rule::Optional, &sub.layout, arena)?;
                        slots.push(Some(idx));
                    }
                    SubEntryXml::Spare => slots.push(None),
                }
            }
            ItemLayout::Compound(CompoundLayout { slots })
        }
        LayoutXml::Repetitive(rep) => ItemLayout::Repetitive(RepetitiveLayout {
            inner: build_fixed(category, id, &rep.inner)?,
        }),
        LayoutXml::Explicit => ItemLayout::Explicit,
        LayoutXml::Bds => ItemLayout::Bds,
    };

    arena.push(ItemDef {
        id: id.to_string(),
        name: name.to_string(),
        rule,
        layout,
    });
    Ok(arena.len() - 1)
}

fn build_fixed(category: u8, item: &str, fixed: &FixedXml) -> Result<FixedLayout, SchemaError> {
    Ok(FixedLayout {
        bytes: fixed.bytes,
        elements: build_elements(category, item, &fixed.elements)?,
    })
}

fn build_elements(
    category: u8,
    item: &str,
    elements: &[ElementXml],
) -> Result<Vec<Element>, SchemaError> {
    elements
        .iter()
        .map(|element| match element {
            ElementXml::Field(f) => Ok(Element::Field(BitField {
                name: f.name.clone(),
                from: f.from,
                to: f.to,
                encoding: parse_encoding(category, item, f.encoding.as_deref())?,
                scale: f.scale,
                unit: f.unit.clone(),
            })),
            ElementXml::Enum(e) => Ok(Element::Enum(EnumField {
                name: e.name.clone(),
                from: e.from,
                to: e.to,
                values: e.values.iter().map(|v| (v.code, v.name.clone())).collect(),
            })),
            ElementXml::Spare(s) => Ok(Element::Spare {
                from: s.from,
                to: s.to,
            }),
        })
        .collect()
}

fn parse_rule(category: u8, item: &str, rule: Option<&str>) -> Result<Rule, SchemaError> {
    match rule {
        None => Ok(Rule::Optional),
        Some(text) => match text.to_ascii_lowercase().as_str() {
            "optional" => Ok(Rule::Optional),
            "mandatory" => Ok(Rule::Mandatory),
            other => Err(SchemaError::InvalidLayout {
                category,
                item: item.to_string(),
                reason: format!("unknown rule {other:?}"),
            }),
        },
    }
}

fn parse_encoding(
    category: u8,
    item: &str,
    encoding: Option<&str>,
) -> Result<Encoding, SchemaError> {
    match encoding {
        None => Ok(Encoding::Unsigned),
        Some(text) => match text.to_ascii_lowercase().as_str() {
            "unsigned" => Ok(Encoding::Unsigned),
            "signed" => Ok(Encoding::Signed),
            "float" => Ok(Encoding::Float),
            "ascii" => Ok(Encoding::Ascii),
            "icao6" => Ok(Encoding::Icao6),
            "octal" => Ok(Encoding::Octal),
            "hex" => Ok(Encoding::Hex),
            "bitmap" => Ok(Encoding::Bitmap),
            other => Err(SchemaError::InvalidLayout {
                category,
                item: item.to_string(),
                reason: format!("unknown encoding {other:?}"),
            }),
        },
    }
}

fn parse_register(category: u8, register: &str) -> Result<u8, SchemaError> {
    let digits = register.trim().trim_start_matches("0x");
    u8::from_str_radix(digits, 16).map_err(|_| SchemaError::InvalidLayout {
        category,
        item: format!("BDS:{register}"),
        reason: "register number is not a hex byte".to_string(),
    })
}
