// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TSPL label renderer for USB thermal label printers.

use std::fmt::Write as _;

use etikett_core::error::{EtikettError, Result};
use etikett_core::settings::LabelSettings;

/// Left margin and top offset of the label text, in dots.
const TEXT_ORIGIN: (u32, u32) = (10, 10);

/// Vertical position of the barcode when a label line sits above it.
const BARCODE_Y_BELOW_TEXT: u32 = 50;

/// Escape a string for a TSPL double-quoted argument.
fn quoted(value: &[u8]) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for &b in value {
        if b == b'"' {
            out.push_str("\\[\"]");
        } else {
            out.push(b as char);
        }
    }
    out.push('"');
    out
}

/// Render one copy of a label as a TSPL program.
pub fn render(label: &str, content: &str, settings: &LabelSettings) -> Result<Vec<u8>> {
    if !content.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(EtikettError::Dispatch(
            "CODE128 content must be printable ASCII".into(),
        ));
    }
    if content.len() > super::MAX_CONTENT_BYTES {
        return Err(EtikettError::Dispatch(format!(
            "barcode content too long: {} bytes (max {})",
            content.len(),
            super::MAX_CONTENT_BYTES
        )));
    }
    let label = super::label_bytes(label)?;

    let mut program = String::with_capacity(192);
    // Writing to a String cannot fail.
    let _ = write!(
        program,
        "SIZE {} mm, {} mm\r\nGAP 2 mm, 0 mm\r\nDIRECTION {}\r\nCLS\r\n",
        settings.label_width_mm, settings.label_height_mm, settings.direction
    );

    let barcode_y = if label.is_empty() {
        TEXT_ORIGIN.1
    } else {
        let _ = write!(
            program,
            "TEXT {},{},\"3\",0,1,1,{}\r\n",
            TEXT_ORIGIN.0,
            TEXT_ORIGIN.1,
            quoted(&label)
        );
        BARCODE_Y_BELOW_TEXT
    };

    let _ = write!(
        program,
        "BARCODE {},{},\"128\",{},1,0,{},{},{}\r\nPRINT 1,1\r\n",
        TEXT_ORIGIN.0,
        barcode_y,
        settings.barcode_height,
        settings.barcode_width,
        settings.barcode_width,
        quoted(content.as_bytes())
    );

    Ok(program.into_bytes())
}
