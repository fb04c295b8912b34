//! Serde model of the XML category specification dialect.
//!
//! One document per category. Layout variants are selected by the element
//! name inside `<item>` (`<fixed>`, `<variable>`, `<compound>`,
//! `<repetitive>`, `<explicit>`, `<bds>`); window contents are an ordered
//! mix of `<field>`, `<enum>` and `<spare>` elements, captured in document
//! order.

use serde::Deserialize;

//
// Top-level structures
//
#[derive(Debug, Deserialize)]
pub struct CategoryXml {
    #[serde(rename = "@id")]
    pub id: u8,

    #[serde(rename = "@name", default)]
    pub name: String,

    #[serde(rename = "@edition", default)]
    pub edition: String,

    #[serde(rename = "item", default)]
    pub items: Vec<ItemXml>,

    #[serde(rename = "uap", default)]
    pub uaps: Vec<UapXml>,

    #[serde(rename = "selector", default)]
    pub selector: Option<SelectorXml>,

    #[serde(rename = "bds", default)]
    pub bds: Vec<BdsXml>,
}

#[derive(Debug, Deserialize)]
pub struct ItemXml {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@name", default)]
    pub name: String,

    #[serde(rename = "@rule", default)]
    pub rule: Option<String>,

    #[serde(rename = "$value")]
    pub layout: LayoutXml,
}

//
// Layout variants, keyed by element name
//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutXml {
    Fixed(FixedXml),
    Variable(VariableXml),
    Compound(CompoundXml),
    Repetitive(RepetitiveXml),
    Explicit,
    Bds,
}

#[derive(Debug, Deserialize)]
pub struct FixedXml {
    #[serde(rename = "@bytes")]
    pub bytes: usize,

    #[serde(rename = "$value", default)]
    pub elements: Vec<ElementXml>,
}

#[derive(Debug, Deserialize)]
pub struct VariableXml {
    #[serde(rename = "group", default)]
    pub groups: Vec<GroupXml>,
}

#[derive(Debug, Deserialize)]
pub struct GroupXml {
    #[serde(rename = "$value", default)]
    pub elements: Vec<ElementXml>,
}

#[derive(Debug, Deserialize)]
pub struct CompoundXml {
    #[serde(rename = "$value", default)]
    pub subs: Vec<SubEntryXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubEntryXml {
    Sub(SubItemXml),
    Spare,
}

#[derive(Debug, Deserialize)]
pub struct SubItemXml {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@name", default)]
    pub name: String,

    #[serde(rename = "$value")]
    pub layout: LayoutXml,
}

#[derive(Debug, Deserialize)]
pub struct RepetitiveXml {
    #[serde(rename = "fixed")]
    pub inner: FixedXml,
}

//
// Leaf / structural nodes
//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementXml {
    Field(FieldXml),
    Enum(EnumXml),
    Spare(SpareXml),
}

#[derive(Debug, Deserialize)]
pub struct FieldXml {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@from")]
    pub from: u16,

    #[serde(rename = "@to")]
    pub to: u16,

    #[serde(rename = "@encoding", default)]
    pub encoding: Option<String>,

    #[serde(rename = "@scale", default)]
    pub scale: Option<f64>,

    #[serde(rename = "@unit", default)]
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnumXml {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@from")]
    pub from: u16,

    #[serde(rename = "@to")]
    pub to: u16,

    #[serde(rename = "value", default)]
    pub values: Vec<ValueXml>,
}

#[derive(Debug, Deserialize)]
pub struct ValueXml {
    #[serde(rename = "@code")]
    pub code: u64,

    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpareXml {
    #[serde(rename = "@from")]
    pub from: u16,

    #[serde(rename = "@to")]
    pub to: u16,
}

//
// UAP, selector, BDS catalog
//
#[derive(Debug, Deserialize)]
pub struct UapXml {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,

    /// Item ids in FRN order; `-` marks a spare slot.
    #[serde(rename = "frn", default)]
    pub slots: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectorXml {
    #[serde(rename = "@offset")]
    pub offset: usize,

    #[serde(rename = "@from")]
    pub from: u16,

    #[serde(rename = "@to")]
    pub to: u16,

    #[serde(rename = "@default")]
    pub fallback: String,

    #[serde(rename = "case", default)]
    pub cases: Vec<CaseXml>,
}

#[derive(Debug, Deserialize)]
pub struct CaseXml {
    #[serde(rename = "@value")]
    pub value: u64,

    #[serde(rename = "@uap")]
    pub uap: String,
}

#[derive(Debug, Deserialize)]
pub struct BdsXml {
    /// Register number in hex, e.g. `40` for BDS 4,0.
    #[serde(rename = "@register")]
    pub register: String,

    #[serde(rename = "@name", default)]
    pub name: String,

    #[serde(rename = "fixed")]
    pub layout: FixedXml,
}
