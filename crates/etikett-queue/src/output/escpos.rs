// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ESC/POS label renderer for receipt-style network printers.
//
// Layout of one copy:
//   ESC @               initialise
//   ESC a 1             centre
//   GS ! 0x11 .. LF     label line at double width/height (omitted if empty)
//   GS H 2              human-readable text below the barcode
//   GS w n / GS h n     module width / bar height
//   GS k 73 n {B..      CODE128, code set B
//   ESC J n             feed to the end of the label
//   GS V 0              full cut

use etikett_core::error::{EtikettError, Result};
use etikett_core::settings::LabelSettings;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;

/// `GS k` system id for CODE128 with an explicit length byte.
const BARCODE_CODE128: u8 = 73;

/// Code set selector prefixed to CODE128 data.
const CODE128_SET_B: &[u8] = b"{B";

/// Feed resolution of a 203 dpi head, in millimetres per dot.
const MM_PER_DOT: f32 = 0.125;

/// Render one copy of a label as ESC/POS bytes.
pub fn render(label: &str, content: &str, settings: &LabelSettings) -> Result<Vec<u8>> {
    if !content.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(EtikettError::Dispatch(
            "CODE128 content must be printable ASCII".into(),
        ));
    }
    let data_len = content.len() + CODE128_SET_B.len();
    let data_len = u8::try_from(data_len).map_err(|_| {
        EtikettError::Dispatch(format!(
            "barcode content too long: {} bytes (max {})",
            content.len(),
            u8::MAX as usize - CODE128_SET_B.len()
        ))
    })?;
    let label = super::label_bytes(label)?;

    let mut buf = Vec::with_capacity(64 + label.len() + content.len());
    buf.extend_from_slice(&[ESC, b'@']);
    buf.extend_from_slice(&[ESC, b'a', 1]);

    if !label.is_empty() {
        buf.extend_from_slice(&[GS, b'!', 0x11]);
        buf.extend_from_slice(&label);
        buf.push(LF);
        buf.extend_from_slice(&[GS, b'!', 0x00]);
    }

    buf.extend_from_slice(&[GS, b'H', 2]);
    buf.extend_from_slice(&[GS, b'w', settings.barcode_width]);
    buf.extend_from_slice(&[GS, b'h', settings.barcode_height.min(255) as u8]);
    buf.extend_from_slice(&[GS, b'k', BARCODE_CODE128, data_len]);
    buf.extend_from_slice(CODE128_SET_B);
    buf.extend_from_slice(content.as_bytes());
    buf.push(LF);

    buf.extend_from_slice(&[ESC, b'J', feed_dots(settings.label_height_mm)]);
    buf.extend_from_slice(&[GS, b'V', 0]);
    Ok(buf)
}

/// Dots to feed for a label of the given height, capped at one `ESC J`.
fn feed_dots(label_height_mm: f32) -> u8 {
    (label_height_mm / MM_PER_DOT).clamp(0.0, 255.0) as u8
}
