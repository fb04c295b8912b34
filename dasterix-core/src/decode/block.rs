//! Block decoder: CAT/LEN framing and the public decoding surface.
//!
//! A data block is `[CAT][LEN, big-endian, inclusive][records...]`. The
//! decoder walks as many blocks as the input slice holds. Unknown categories
//! consume their whole block and decoding continues; framing damage (bad
//! LEN, truncated payload) ends the walk because block boundaries cannot be
//! recovered past it.

use crate::cursor::Cursor;
use crate::decode::{Limits, record::decode_record};
use crate::diag::{Diagnostic, DiagnosticKind, SchemaError};
use crate::registry::Registry;
use crate::schema::CategorySchema;
use crate::value::{BlockResult, DataBlock};

/// CAT byte plus the two LEN bytes.
pub const BLOCK_HEADER_LEN: usize = 3;

/// The ASTERIX decoder: a category registry plus decode resource bounds.
///
/// Register schemas at startup, then share the decoder freely: decoding
/// borrows `self` immutably and keeps no state between calls, so threads may
/// decode different blocks concurrently over one instance.
#[derive(Debug, Default)]
pub struct Decoder {
    registry: Registry,
    limits: Limits,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Decoder {
            registry: Registry::new(),
            limits,
        }
    }

    /// Validates and registers a category schema.
    ///
    /// # Errors
    ///
    /// Returns the schema's first consistency violation; the registry keeps
    /// its previous state.
    pub fn register_category(&mut self, schema: CategorySchema) -> Result<(), SchemaError> {
        self.registry.register(schema)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Decodes every data block in `bytes`.
    ///
    /// Never returns an error and never panics: fatal conditions yield a
    /// partial result, with the failures in the diagnostic log. Byte ranges
    /// in the result are offsets into `bytes`.
    pub fn decode_block(&self, bytes: &[u8]) -> BlockResult {
        let mut cur = Cursor::new(bytes);
        let mut result = BlockResult::default();

        while !cur.is_empty() {
            let block_start = cur.offset();
            let Ok(cat) = cur.read_byte() else { break };

            let len_bytes = match cur.read_bytes(2) {
                Ok(b) => b,
                Err(diag) => {
                    result.diagnostics.push(diag.with_category(cat));
                    break;
                }
            };
            let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]);
            if (len as usize) < BLOCK_HEADER_LEN {
                result.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::InvalidBlockLength { len }, block_start)
                        .with_category(cat),
                );
                break;
            }
            let payload_len = len as usize - BLOCK_HEADER_LEN;
            if payload_len > cur.remaining() {
                result.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::Truncated {
                            need: payload_len,
                            have: cur.remaining(),
                        },
                        cur.offset(),
                    )
                    .with_category(cat),
                );
                break;
            }

            let Some(schema) = self.registry.lookup(cat) else {
                log::debug!("skipping unregistered cat {cat} block ({len} bytes)");
                result.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnknownCategory { category: cat },
                    block_start,
                ));
                // The block is consumed; the walk continues behind it.
                let Ok(_) = cur.read_bytes(payload_len) else { break };
                continue;
            };

            let payload_base = cur.offset();
            let Ok(payload) = cur.read_bytes(payload_len) else { break };
            let mut records_cur = Cursor::with_base(payload, payload_base);
            let mut records = Vec::new();

            while !records_cur.is_empty() {
                match decode_record(schema, &self.limits, &mut records_cur) {
                    Ok(record) => {
                        // A record can never read past the payload sub-slice.
                        debug_assert!(record.raw_range.end <= payload_base + payload_len);
                        records.push(record);
                    }
                    Err(fatal) => {
                        // Records are not separately framed: once one is
                        // lost, the rest of this block is lost with it.
                        log::debug!("cat {cat:03}: record aborted: {fatal}");
                        result.diagnostics.push(fatal);
                        break;
                    }
                }
            }

            log::trace!(
                "cat {cat:03}: block at {block_start} decoded, {} record(s)",
                records.len()
            );
            result.blocks.push(DataBlock {
                category: cat,
                edition: schema.edition.clone(),
                records,
                raw_range: block_start..payload_base + payload_len,
            });
        }

        result
    }
}
