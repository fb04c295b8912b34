//! Record decoder: FSPEC walk over the active UAP.
//!
//! A record is FSPEC plus items, packed without separators; it is not
//! separately length-framed, so the decoder consumes exactly what the FSPEC
//! and schema dictate and the block decoder calls it again on whatever
//! follows. Items land in the output in FRN order, which is both UAP order
//! and wire order.

use crate::cursor::Cursor;
use crate::decode::{Limits, item::decode_item};
use crate::diag::{Diagnostic, DiagnosticKind};
use crate::fspec::Fspec;
use crate::schema::{CategorySchema, Rule, Uap, UapSlot};
use crate::value::Record;

/// Picks the active UAP for the record starting at `cur`.
///
/// Without a selector the first declared UAP is the default. With one, a
/// non-consuming look-ahead reads the discriminator byte at the declared
/// offset from record start; an absent byte or unmatched value selects the
/// schema's fallback UAP.
fn select_uap<'s>(schema: &'s CategorySchema, cur: &Cursor<'_>) -> &'s Uap {
    let Some(sel) = &schema.selector else {
        return &schema.uaps[0];
    };

    let chosen = match cur.peek_slice().get(sel.offset) {
        Some(&byte) => {
            let width = (sel.from - sel.to + 1) as u32;
            let raw = ((byte as u64) >> (sel.to - 1)) & ((1u64 << width) - 1);
            sel.cases
                .iter()
                .find(|(value, _)| *value == raw)
                .map(|(_, uap)| *uap)
                .unwrap_or(sel.fallback)
        }
        None => sel.fallback,
    };
    // Selector indices were checked at registration.
    &schema.uaps[chosen]
}

/// Decodes one record from the block payload cursor.
///
/// Recoverable diagnostics accumulate on the returned record; a fatal
/// diagnostic aborts the record and comes back as `Err`, at which point the
/// rest of the block payload is unattributable.
pub(crate) fn decode_record(
    schema: &CategorySchema,
    limits: &Limits,
    cur: &mut Cursor<'_>,
) -> Result<Record, Diagnostic> {
    let start = cur.offset();
    let uap = select_uap(schema, cur);
    log::trace!(
        "cat {:03}: record at offset {start} using UAP {}",
        schema.category,
        uap.name
    );

    let fspec = Fspec::read(cur, limits.max_fspec_octets)
        .map_err(|d| d.with_category(schema.category))?;

    let mut items = Vec::new();
    let mut diagnostics = Vec::new();
    let mut past_uap = false;

    for frn in fspec.frns() {
        match uap.slot(frn) {
            Some(UapSlot::Item(idx)) => {
                // Slot indices were checked at registration.
                let Some(item) = schema.item(*idx) else {
                    continue;
                };
                let node = decode_item(schema, limits, item, cur, &mut diagnostics, 0)?;
                items.push((item.id.clone(), node));
            }
            Some(UapSlot::Spare) => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::SparePresent { bit: frn }, cur.offset())
                        .with_category(schema.category),
                );
            }
            // Presence bit past the declared UAP: the sender speaks a longer
            // profile than the schema. Those items sit after every known one,
            // so the residue is handled once the loop is done.
            None => {
                past_uap = true;
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::SparePresent { bit: frn }, cur.offset())
                        .with_category(schema.category),
                );
            }
        }
    }

    for (frn, slot) in uap.slots.iter().enumerate() {
        let UapSlot::Item(idx) = slot else { continue };
        let Some(item) = schema.item(*idx) else { continue };
        if item.rule == Rule::Mandatory && !fspec.is_set(frn + 1) {
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::MandatoryMissing, start)
                    .with_category(schema.category)
                    .with_item(&item.id),
            );
        }
    }

    // Bytes belonging to items the UAP cannot name would desynchronize the
    // record loop if left in place: consume them and say so.
    if past_uap && cur.remaining() > 0 {
        let remaining = cur.remaining();
        diagnostics.push(
            Diagnostic::new(DiagnosticKind::RecordUnderrun { remaining }, cur.offset())
                .with_category(schema.category),
        );
        cur.read_bytes(remaining)?;
    }

    Ok(Record {
        items,
        diagnostics,
        raw_range: start..cur.offset(),
    })
}
