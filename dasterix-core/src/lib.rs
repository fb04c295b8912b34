//! # dasterix-core
//!
//! Core runtime library for data-driven ASTERIX message decoding.
//!
//! Where its sibling projects generate per-category Rust code, this crate
//! interprets category schemas at runtime: a schema describes the items, bit
//! layouts and User Application Profile of a category, and one generic
//! decoder walks any byte stream against it. Schemas are produced by the
//! `dasterix-schema` loader and registered once at startup; decoding itself
//! is pure, reentrant and bounds-checked end to end.
//!
//! ## Key components
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Cursor`] / [`cursor::Window`] | Bounds-checked byte reads and scoped bit extraction |
//! | [`Fspec`] | Field Specification bitmap (FX-chained presence bits) |
//! | [`CategorySchema`] | One category's items, layouts, UAPs and BDS catalog |
//! | [`Registry`] | `(category, edition)` schema store |
//! | [`Decoder`] | Block/record decoding over the registry |
//! | [`Node`] / [`Record`] / [`BlockResult`] | Decoded output tree |
//! | [`Diagnostic`] | Structured recoverable/fatal decode diagnostics |
//!
//! ## Example
//!
//! ```rust
//! use dasterix_core::{Decoder, schema::*};
//!
//! let items = vec![ItemDef {
//!     id: "010".into(),
//!     name: "Data Source Identifier".into(),
//!     rule: Rule::Optional,
//!     layout: ItemLayout::Fixed(FixedLayout {
//!         bytes: 2,
//!         elements: vec![
//!             Element::Field(BitField {
//!                 name: "SAC".into(), from: 16, to: 9,
//!                 encoding: Encoding::Unsigned, scale: None, unit: None,
//!             }),
//!             Element::Field(BitField {
//!                 name: "SIC".into(), from: 8, to: 1,
//!                 encoding: Encoding::Unsigned, scale: None, unit: None,
//!             }),
//!         ],
//!     }),
//! }];
//! let uap = Uap { name: "default".into(), slots: vec![UapSlot::Item(0)] };
//! let schema = CategorySchema::new(48, "1.31", "Demo", items, vec![uap], None, Vec::new());
//!
//! let mut decoder = Decoder::new();
//! decoder.register_category(schema).unwrap();
//!
//! let result = decoder.decode_block(&[0x30, 0x00, 0x06, 0x80, 0x08, 0x77]);
//! assert_eq!(result.blocks[0].records.len(), 1);
//! ```

pub mod cursor;
pub mod decode;
pub mod diag;
pub mod extract;
pub mod fspec;
pub mod icao;
pub mod registry;
pub mod schema;
pub mod value;

pub use cursor::Cursor;
pub use decode::{Decoder, Limits};
pub use diag::{Diagnostic, DiagnosticKind, SchemaError, Severity};
pub use fspec::Fspec;
pub use registry::Registry;
pub use schema::CategorySchema;
pub use value::{BlockResult, DataBlock, Node, Record, Value};
