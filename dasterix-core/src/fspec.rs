//! Field Specification (FSPEC) bitmap.
//!
//! The FSPEC heads every record: a chain of octets whose LSB (FX) announces
//! a further octet. The seven data bits of each octet are presence bits,
//! numbered as Field Reference Numbers (FRN) 1.. in wire order. The same
//! shape also heads compound items as the primary subfield bitmap.

use crate::cursor::Cursor;
use crate::diag::{Diagnostic, DiagnosticKind};

/// Number of presence bits per FSPEC octet (bit 1 is FX).
pub const DATA_BITS_PER_OCTET: usize = 7;

/// A parsed FSPEC bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fspec {
    bytes: Vec<u8>,
}

impl Fspec {
    /// Reads an FX-chained octet sequence from `cur`.
    ///
    /// Stops at the first octet whose FX bit is clear. If FX is still set on
    /// the `max_octets`-th octet, the chain is runaway and the read fails
    /// with [`ExtensionTooLong`](DiagnosticKind::ExtensionTooLong); if the
    /// input ends while FX demands another octet, the failure is
    /// [`Truncated`](DiagnosticKind::Truncated).
    pub fn read(cur: &mut Cursor<'_>, max_octets: usize) -> Result<Self, Diagnostic> {
        let mut bytes = Vec::new();

        loop {
            let byte = cur.read_byte()?;
            bytes.push(byte);

            if byte & 0x01 == 0 {
                break;
            }
            if bytes.len() >= max_octets {
                return Err(Diagnostic::new(
                    DiagnosticKind::ExtensionTooLong { max: max_octets },
                    cur.offset(),
                ));
            }
        }

        Ok(Fspec { bytes })
    }

    /// Number of octets read.
    pub fn octets(&self) -> usize {
        self.bytes.len()
    }

    /// Highest FRN this FSPEC can express.
    pub fn max_frn(&self) -> usize {
        self.bytes.len() * DATA_BITS_PER_OCTET
    }

    /// Whether the presence bit for 1-based `frn` is set.
    ///
    /// FRNs beyond the read octets are reported clear.
    pub fn is_set(&self, frn: usize) -> bool {
        if frn == 0 {
            return false;
        }
        let octet = (frn - 1) / DATA_BITS_PER_OCTET;
        let bit = (frn - 1) % DATA_BITS_PER_OCTET;
        self.bytes
            .get(octet)
            .map(|b| b & (0x80 >> bit) != 0)
            .unwrap_or(false)
    }

    /// Set FRNs in ascending order, which is also wire order of the items.
    pub fn frns(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.max_frn()).filter(|&frn| self.is_set(frn))
    }
}
