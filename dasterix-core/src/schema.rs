//! In-memory category schema: items, layouts, bit-field descriptors, UAPs.
//!
//! The model is pure data. Item definitions live in a flat arena indexed by
//! [`ItemIdx`]; compound sub-items reference the arena by index, which keeps
//! ownership acyclic and lets a whole category drop in one deallocation.
//! Everything here is treated as trusted once [`CategorySchema::validate`]
//! has passed — the schema loader is the only place untrusted content is
//! tolerated.

use std::collections::HashMap;

use crate::diag::SchemaError;

/// Index of an [`ItemDef`] in a category's arena.
pub type ItemIdx = usize;

/// Presence rule for a UAP-addressable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule {
    #[default]
    Optional,
    Mandatory,
}

/// How a field's raw bits become a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Unsigned,
    /// Two's complement.
    Signed,
    /// IEEE 754; the field must be exactly 32 or 64 bits wide.
    Float,
    /// One 8-bit character per byte.
    Ascii,
    /// ICAO 6-bit character groups (callsigns).
    Icao6,
    /// Stored as an integer, rendered in octal.
    Octal,
    /// Stored as an integer, rendered in hex.
    Hex,
    /// Flag word kept raw.
    Bitmap,
}

/// A named bit field within an item's byte window.
///
/// `from`/`to` use ASTERIX bit numbering: 1-based, MSB-first, `from >= to`.
/// For variable-format items the numbering is per octet (8..2; bit 1 is FX).
#[derive(Debug, Clone, PartialEq)]
pub struct BitField {
    pub name: String,
    pub from: u16,
    pub to: u16,
    pub encoding: Encoding,
    /// LSB weight for fixed-point quantities.
    pub scale: Option<f64>,
    pub unit: Option<String>,
}

impl BitField {
    pub fn width(&self) -> u16 {
        self.from - self.to + 1
    }
}

/// An enumerated bit field with its code table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumField {
    pub name: String,
    pub from: u16,
    pub to: u16,
    pub values: Vec<(u64, String)>,
}

impl EnumField {
    pub fn label(&self, code: u64) -> Option<&str> {
        self.values
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| name.as_str())
    }
}

/// One element of a byte window's bit layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Field(BitField),
    Enum(EnumField),
    Spare { from: u16, to: u16 },
}

impl Element {
    pub fn bit_range(&self) -> (u16, u16) {
        match self {
            Element::Field(f) => (f.from, f.to),
            Element::Enum(e) => (e.from, e.to),
            Element::Spare { from, to } => (*from, *to),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Element::Field(f) => Some(&f.name),
            Element::Enum(e) => Some(&e.name),
            Element::Spare { .. } => None,
        }
    }
}

/// Fixed-format payload: `bytes` bytes covered exactly by `elements`.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedLayout {
    pub bytes: usize,
    pub elements: Vec<Element>,
}

/// One octet of a variable-format item: seven data bits, FX implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableGroup {
    pub elements: Vec<Element>,
}

/// Variable-format payload: FX-chained octet groups.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLayout {
    pub groups: Vec<VariableGroup>,
}

/// Compound-format payload: primary bitmap slots in order; `None` is spare.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundLayout {
    pub slots: Vec<Option<ItemIdx>>,
}

/// Repetitive-format payload: REP copies of a fixed inner record.
#[derive(Debug, Clone, PartialEq)]
pub struct RepetitiveLayout {
    pub inner: FixedLayout,
}

/// Format-specific payload schema of an item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemLayout {
    Fixed(FixedLayout),
    Variable(VariableLayout),
    Compound(CompoundLayout),
    Repetitive(RepetitiveLayout),
    /// One inclusive length byte, then opaque payload (RE/SP).
    Explicit,
    /// One register byte plus seven payload bytes, decoded through the
    /// category's BDS catalog.
    Bds,
}

impl ItemLayout {
    /// Short format name for messages and traces.
    pub fn format_name(&self) -> &'static str {
        match self {
            ItemLayout::Fixed(_) => "fixed",
            ItemLayout::Variable(_) => "variable",
            ItemLayout::Compound(_) => "compound",
            ItemLayout::Repetitive(_) => "repetitive",
            ItemLayout::Explicit => "explicit",
            ItemLayout::Bds => "bds",
        }
    }
}

/// One data item definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    /// Short identifier, unique among UAP-addressable items ("010", "SP").
    pub id: String,
    pub name: String,
    pub rule: Rule,
    pub layout: ItemLayout,
}

/// One UAP slot: the item a presence bit refers to, or a spare position.
#[derive(Debug, Clone, PartialEq)]
pub enum UapSlot {
    Item(ItemIdx),
    Spare,
}

/// User Application Profile: FRN (1-based) to item mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Uap {
    pub name: String,
    pub slots: Vec<UapSlot>,
}

impl Uap {
    /// Slot for a 1-based FRN, `None` past the declared table.
    pub fn slot(&self, frn: usize) -> Option<&UapSlot> {
        self.slots.get(frn - 1)
    }
}

/// Discriminator-based UAP selection rule.
///
/// A look-ahead read of one byte at `offset` from record start; bits
/// `from..=to` of that byte select the UAP via `cases`, falling back to
/// `fallback` when the byte is absent or no case matches. The rule is always
/// declared by the schema — the core never infers it.
#[derive(Debug, Clone, PartialEq)]
pub struct UapSelector {
    pub offset: usize,
    pub from: u16,
    pub to: u16,
    pub cases: Vec<(u64, usize)>,
    pub fallback: usize,
}

/// A complete category definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySchema {
    pub category: u8,
    pub edition: String,
    pub name: String,
    /// Item arena; UAP slots and compound slots index into it.
    pub items: Vec<ItemDef>,
    pub uaps: Vec<Uap>,
    pub selector: Option<UapSelector>,
    /// BDS register catalog: register number to 7-byte payload layout.
    pub bds: Vec<(u8, FixedLayout)>,
    /// UAP-addressable item ids to arena index.
    index: HashMap<String, ItemIdx>,
}

impl CategorySchema {
    /// Assembles a schema. `index` is built from `uaps`: every item an UAP
    /// references becomes addressable by id.
    pub fn new(
        category: u8,
        edition: impl Into<String>,
        name: impl Into<String>,
        items: Vec<ItemDef>,
        uaps: Vec<Uap>,
        selector: Option<UapSelector>,
        bds: Vec<(u8, FixedLayout)>,
    ) -> Self {
        let mut index = HashMap::new();
        for uap in &uaps {
            for slot in &uap.slots {
                if let UapSlot::Item(idx) = slot {
                    if let Some(item) = items.get(*idx) {
                        index.entry(item.id.clone()).or_insert(*idx);
                    }
                }
            }
        }
        CategorySchema {
            category,
            edition: edition.into(),
            name: name.into(),
            items,
            uaps,
            selector,
            bds,
            index,
        }
    }

    pub fn item(&self, idx: ItemIdx) -> Option<&ItemDef> {
        self.items.get(idx)
    }

    /// Looks up a UAP-addressable item by id.
    pub fn item_by_id(&self, id: &str) -> Option<&ItemDef> {
        self.index.get(id).and_then(|idx| self.items.get(*idx))
    }

    pub fn bds_layout(&self, register: u8) -> Option<&FixedLayout> {
        self.bds
            .iter()
            .find(|(reg, _)| *reg == register)
            .map(|(_, layout)| layout)
    }

    /// Checks internal consistency; run once at registration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint: bit coverage, overlap, field
    /// width, FX reservation, UAP resolution, selector sanity or BDS layout
    /// size.
    pub fn validate(&self) -> Result<(), SchemaError> {
        // Two arena entries with the same id are fine for compound sub-items,
        // but UAP-addressable ids must be unambiguous.
        let mut uap_ids = HashMap::new();
        for uap in &self.uaps {
            for slot in &uap.slots {
                if let UapSlot::Item(idx) = slot {
                    let item = self.items.get(*idx).ok_or_else(|| SchemaError::InvalidUap {
                        category: self.category,
                        reason: format!("slot index {idx} outside the item arena"),
                    })?;
                    if let Some(prev) = uap_ids.insert(item.id.clone(), *idx) {
                        if prev != *idx {
                            return Err(SchemaError::DuplicateItem {
                                category: self.category,
                                item: item.id.clone(),
                            });
                        }
                    }
                }
            }
            if uap.slots.is_empty() {
                return Err(SchemaError::InvalidUap {
                    category: self.category,
                    reason: format!("UAP {} has no slots", uap.name),
                });
            }
        }
        if self.uaps.is_empty() {
            return Err(SchemaError::InvalidUap {
                category: self.category,
                reason: "category declares no UAP".into(),
            });
        }

        for item in &self.items {
            self.validate_item(item)?;
        }

        if let Some(sel) = &self.selector {
            if sel.from < sel.to || sel.from > 8 || sel.to < 1 {
                return Err(SchemaError::InvalidSelector {
                    category: self.category,
                    reason: format!("discriminator bit range {}..{}", sel.from, sel.to),
                });
            }
            for (_, uap_idx) in sel.cases.iter().chain(std::iter::once(&(0, sel.fallback))) {
                if *uap_idx >= self.uaps.len() {
                    return Err(SchemaError::InvalidSelector {
                        category: self.category,
                        reason: format!("case references UAP index {uap_idx}"),
                    });
                }
            }
        }

        for (register, layout) in &self.bds {
            if layout.bytes != 7 {
                return Err(SchemaError::BadBdsLayout {
                    category: self.category,
                    register: *register,
                });
            }
            self.validate_window(&format!("BDS:{register:02X}"), layout.bytes, &layout.elements)?;
        }

        Ok(())
    }

    fn validate_item(&self, item: &ItemDef) -> Result<(), SchemaError> {
        match &item.layout {
            ItemLayout::Fixed(fixed) => {
                self.validate_window(&item.id, fixed.bytes, &fixed.elements)
            }
            ItemLayout::Repetitive(rep) => {
                if rep.inner.bytes == 0 {
                    return Err(SchemaError::InvalidLayout {
                        category: self.category,
                        item: item.id.clone(),
                        reason: "repetitive inner record is empty".into(),
                    });
                }
                self.validate_window(&item.id, rep.inner.bytes, &rep.inner.elements)
            }
            ItemLayout::Variable(var) => self.validate_variable(item, var),
            ItemLayout::Compound(comp) => self.validate_compound(item, comp),
            ItemLayout::Explicit | ItemLayout::Bds => Ok(()),
        }
    }

    /// Fixed-window checks: ranges sane, widths capped, coverage exact,
    /// no overlap, no duplicate field names.
    fn validate_window(
        &self,
        item: &str,
        bytes: usize,
        elements: &[Element],
    ) -> Result<(), SchemaError> {
        let total_bits = (bytes * 8) as u32;
        if bytes == 0 {
            return Err(SchemaError::InvalidLayout {
                category: self.category,
                item: item.to_string(),
                reason: "zero-byte window".into(),
            });
        }

        let mut covered = vec![false; total_bits as usize];
        let mut names = HashMap::new();
        let mut sum = 0u32;
        for element in elements {
            let (from, to) = element.bit_range();
            if from < to || to < 1 || from as u32 > total_bits {
                return Err(SchemaError::BadBitRange {
                    category: self.category,
                    item: item.to_string(),
                    from,
                    to,
                });
            }
            if from - to + 1 > 64 {
                return Err(SchemaError::FieldTooWide {
                    category: self.category,
                    item: item.to_string(),
                });
            }
            if let Some(name) = element.name() {
                if names.insert(name.to_string(), ()).is_some() {
                    return Err(SchemaError::DuplicateField {
                        category: self.category,
                        item: item.to_string(),
                        field: name.to_string(),
                    });
                }
            }
            if let Element::Field(f) = element {
                let width = f.width();
                if f.encoding == Encoding::Float && width != 32 && width != 64 {
                    return Err(SchemaError::InvalidLayout {
                        category: self.category,
                        item: item.to_string(),
                        reason: format!("float field {} is {width} bits wide", f.name),
                    });
                }
            }
            for bit in to..=from {
                let slot = &mut covered[(bit - 1) as usize];
                if *slot {
                    return Err(SchemaError::OverlappingFields {
                        category: self.category,
                        item: item.to_string(),
                        bit,
                    });
                }
                *slot = true;
            }
            sum += (from - to + 1) as u32;
        }

        if sum != total_bits {
            return Err(SchemaError::CoverageMismatch {
                category: self.category,
                item: item.to_string(),
                covered: sum,
                expected: total_bits,
            });
        }
        Ok(())
    }

    /// Variable groups: one octet each, bits 8..2, bit 1 reserved for FX,
    /// data bits fully covered.
    fn validate_variable(&self, item: &ItemDef, var: &VariableLayout) -> Result<(), SchemaError> {
        if var.groups.is_empty() {
            return Err(SchemaError::InvalidLayout {
                category: self.category,
                item: item.id.clone(),
                reason: "variable item declares no octet groups".into(),
            });
        }
        let mut names = HashMap::new();
        for group in &var.groups {
            let mut covered = [false; 7];
            let mut sum = 0u32;
            for element in &group.elements {
                let (from, to) = element.bit_range();
                if to == 1 {
                    return Err(SchemaError::FxBitClaimed {
                        category: self.category,
                        item: item.id.clone(),
                    });
                }
                if from < to || to < 2 || from > 8 {
                    return Err(SchemaError::BadBitRange {
                        category: self.category,
                        item: item.id.clone(),
                        from,
                        to,
                    });
                }
                if let Some(name) = element.name() {
                    if names.insert(name.to_string(), ()).is_some() {
                        return Err(SchemaError::DuplicateField {
                            category: self.category,
                            item: item.id.clone(),
                            field: name.to_string(),
                        });
                    }
                }
                for bit in to..=from {
                    let slot = &mut covered[(bit - 2) as usize];
                    if *slot {
                        return Err(SchemaError::OverlappingFields {
                            category: self.category,
                            item: item.id.clone(),
                            bit,
                        });
                    }
                    *slot = true;
                }
                sum += (from - to + 1) as u32;
            }
            if sum != 7 {
                return Err(SchemaError::CoverageMismatch {
                    category: self.category,
                    item: item.id.clone(),
                    covered: sum,
                    expected: 7,
                });
            }
        }
        Ok(())
    }

    fn validate_compound(&self, item: &ItemDef, comp: &CompoundLayout) -> Result<(), SchemaError> {
        if comp.slots.iter().all(Option::is_none) {
            return Err(SchemaError::InvalidLayout {
                category: self.category,
                item: item.id.clone(),
                reason: "compound item declares no sub-items".into(),
            });
        }
        for slot in comp.slots.iter().flatten() {
            let sub = self.items.get(*slot).ok_or_else(|| SchemaError::InvalidLayout {
                category: self.category,
                item: item.id.clone(),
                reason: format!("sub-item index {slot} outside the item arena"),
            })?;
            // Nesting depth itself is enforced at decode time; here it is
            // enough that the reference resolves and the sub-item is sound.
            if let ItemLayout::Bds = sub.layout {
                return Err(SchemaError::InvalidLayout {
                    category: self.category,
                    item: item.id.clone(),
                    reason: format!("sub-item {} may not use the BDS format", sub.id),
                });
            }
        }
        Ok(())
    }
}
