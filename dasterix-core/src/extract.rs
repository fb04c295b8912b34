//! Bit-field extraction: from a byte window to typed scalar values.
//!
//! Each element of a layout maps a bit range of the window to one scalar.
//! Extraction itself cannot fail — ranges were checked at schema load — but
//! it can raise recoverable warnings (unknown enum codes, reserved ICAO-6
//! characters), which the caller appends to the record's diagnostic log.

use crate::cursor::Window;
use crate::diag::DiagnosticKind;
use crate::icao;
use crate::schema::{BitField, Encoding, EnumField};
use crate::value::{Scalar, Value};

/// Sign-extends `raw` interpreted as a `width`-bit two's complement value.
fn sign_extend(raw: u64, width: u16) -> i64 {
    if width >= 64 {
        return raw as i64;
    }
    let shift = 64 - width as u32;
    ((raw << shift) as i64) >> shift
}

/// Decodes ICAO 6-bit character groups; reserved codes become `?` and the
/// first offending code is reported.
fn decode_icao6(raw: u64, width: u16) -> (String, Option<DiagnosticKind>) {
    let groups = width / 6;
    let mut out = String::with_capacity(groups as usize);
    let mut warning = None;
    for i in (0..groups).rev() {
        let code = ((raw >> (i * 6)) & 0x3F) as u8;
        match icao::decode(code) {
            Some(c) => out.push(c),
            None => {
                out.push(icao::REPLACEMENT);
                warning.get_or_insert(DiagnosticKind::CharacterDecode { code });
            }
        }
    }
    (out, warning)
}

/// Decodes 8-bit characters, most significant byte first.
fn decode_ascii(raw: u64, width: u16) -> String {
    let bytes = width / 8;
    let mut out = String::with_capacity(bytes as usize);
    for i in (0..bytes).rev() {
        let byte = ((raw >> (i * 8)) & 0xFF) as u8;
        out.push(byte as char);
    }
    out
}

/// Extracts one plain field from the window.
///
/// Returns the scalar plus at most one warning to attach to the record.
pub fn decode_field(field: &BitField, win: &Window<'_>) -> (Scalar, Option<DiagnosticKind>) {
    let raw = win.bits(field.from, field.to);
    let width = field.width();

    let (value, warning) = match field.encoding {
        Encoding::Unsigned => match field.scale {
            Some(scale) => (Value::Scaled { raw: raw as i64, scale }, None),
            None => (Value::Unsigned(raw), None),
        },
        Encoding::Signed => {
            let signed = sign_extend(raw, width);
            match field.scale {
                Some(scale) => (Value::Scaled { raw: signed, scale }, None),
                None => (Value::Signed(signed), None),
            }
        }
        Encoding::Float => {
            let value = match width {
                32 => f32::from_bits(raw as u32) as f64,
                64 => f64::from_bits(raw),
                // Guarded at schema load; keep the raw bits if it slips.
                _ => raw as f64,
            };
            (Value::Float(value), None)
        }
        Encoding::Ascii => (Value::Str(decode_ascii(raw, width)), None),
        Encoding::Icao6 => {
            let (text, warning) = decode_icao6(raw, width);
            (Value::Str(text), warning)
        }
        Encoding::Octal => (Value::Octal(raw), None),
        Encoding::Hex => (Value::Hex(raw), None),
        Encoding::Bitmap => (Value::Bitmap(raw), None),
    };

    let scalar = Scalar {
        value,
        raw,
        raw_range: win.range(),
    };
    (scalar, warning)
}

/// Extracts an enumerated field; unknown codes keep the raw value and raise
/// an [`UnknownEnum`](DiagnosticKind::UnknownEnum) warning.
pub fn decode_enum(field: &EnumField, win: &Window<'_>) -> (Scalar, Option<DiagnosticKind>) {
    let raw = win.bits(field.from, field.to);
    let label = field.label(raw).map(str::to_string);
    let warning = match label {
        None => Some(DiagnosticKind::UnknownEnum { raw }),
        Some(_) => None,
    };
    let scalar = Scalar {
        value: Value::Enum { raw, label },
        raw,
        raw_range: win.range(),
    };
    (scalar, warning)
}
