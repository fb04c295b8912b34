//! Dasterix - data-driven ASTERIX message decoding library.
//!
//! This crate re-exports the runtime core (`dasterix-core`) and the schema
//! loader (`dasterix-schema`) for convenient single-import usage.
//!
//! ## Crate Structure
//!
//! - [`rt`] - Runtime decoding (Decoder, Registry, record tree, diagnostics)
//! - [`schema`] - XML category specification loading
//!
//! ## Usage
//!
//! ```rust
//! use dasterix::{Decoder, load_category};
//!
//! let cat048 = load_category(r#"
//!     <category id="48" name="Monoradar Target Reports" edition="1.31">
//!       <item id="010" rule="mandatory">
//!         <fixed bytes="2">
//!           <field name="SAC" from="16" to="9"/>
//!           <field name="SIC" from="8" to="1"/>
//!         </fixed>
//!       </item>
//!       <uap><frn>010</frn></uap>
//!     </category>
//! "#).unwrap();
//!
//! let mut decoder = Decoder::new();
//! decoder.register_category(cat048).unwrap();
//!
//! let result = decoder.decode_block(&[0x30, 0x00, 0x06, 0x80, 0x08, 0x77]);
//! let record = &result.blocks[0].records[0];
//! assert_eq!(record.item("010").unwrap().field("SIC").unwrap().as_u64(), Some(0x77));
//! ```

/// Re-export of dasterix-core as `rt`.
///
/// Contains the runtime decoding types:
/// - [`Decoder`](rt::Decoder) - Block/record decoding over registered categories
/// - [`Registry`](rt::Registry) - `(category, edition)` schema store
/// - [`Record`](rt::Record) / [`Node`](rt::Node) - Decoded output tree
/// - [`Diagnostic`](rt::Diagnostic) - Structured decode diagnostics
/// - [`Limits`](rt::Limits) - Decode resource bounds
pub mod rt {
    pub use dasterix_core::*;
}

/// Re-export of dasterix-schema as `schema`.
///
/// Contains the loading pipeline:
/// - [`parse_category`](schema::parse_category) - XML to document model
/// - [`build_category`](schema::build_category) - document model to schema
/// - [`load_category`](schema::load_category) - both steps chained
pub mod schema {
    pub use dasterix_schema::*;
}

// Re-export commonly used types at the crate root for convenience
pub use rt::{
    BlockResult, CategorySchema, DataBlock, Decoder, Diagnostic, DiagnosticKind, Limits, Node,
    Record, Registry, SchemaError, Severity, Value,
};
pub use schema::{LoadError, load_category};
