//! # dasterix-schema
//!
//! XML category specification loader for the dasterix ASTERIX decoder.
//!
//! This crate is the only place untrusted schema content is tolerated: it
//! parses category specification documents ([`parser`]), lowers them into
//! the core schema model ([`transform`]) and validates the result. From its
//! output onward the schema is trusted data.
//!
//! ## Pipeline
//!
//! ```text
//! XML text --parse_category--> CategoryXml --build_category--> CategorySchema
//! ```
//!
//! [`load_category`] chains the two steps.
//!
//! ## Example
//!
//! ```rust
//! use dasterix_schema::load_category;
//!
//! let schema = load_category(r#"
//!     <category id="48" name="Demo" edition="1.31">
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
//! assert_eq!(schema.category, 48);
//! ```

pub mod parser;
pub mod transform;
pub mod xml_model;

use dasterix_core::CategorySchema;
use dasterix_core::diag::SchemaError;
use thiserror::Error;

pub use parser::parse_category;
pub use transform::build_category;

/// Why a category document failed to load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed category document: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Parses, lowers and validates a category specification document.
///
/// Deterministic and idempotent: the same document always yields the same
/// schema or the same error.
pub fn load_category(xml: &str) -> Result<CategorySchema, LoadError> {
    let doc = parse_category(xml)?;
    Ok(build_category(&doc)?)
}
