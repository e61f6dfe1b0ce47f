// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label settings decoded from job metadata.
//
// The queue stores metadata as an opaque JSON object.  Only the output side
// reads it, through `LabelSettings::from_metadata`, right before a job is
// rendered.  A malformed value is therefore a dispatch failure of that job,
// not an intake error.

use serde::Deserialize;

use crate::error::{EtikettError, Result};
use crate::types::Metadata;

/// Upper bound on copies per job.
pub const MAX_QUANTITY: u32 = 1000;

/// Default ESC/POS barcode module width.
pub const DEFAULT_BARCODE_WIDTH: u8 = 3;

/// Default barcode height in dots.
pub const DEFAULT_BARCODE_HEIGHT: u16 = 100;

/// Default label height (feed length) in millimetres.
pub const DEFAULT_LABEL_HEIGHT_MM: f32 = 40.0;

/// Default label stock width in millimetres (TSPL `SIZE`).
pub const DEFAULT_LABEL_WIDTH_MM: f32 = 45.0;

/// Rendering parameters for a single job.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSettings {
    /// Number of physical copies, 1..=`MAX_QUANTITY`.
    pub quantity: u32,
    /// Barcode narrow-bar module width (2..=6).
    pub barcode_width: u8,
    /// Barcode height in dots.
    pub barcode_height: u16,
    pub label_height_mm: f32,
    pub label_width_mm: f32,
    /// TSPL print direction (0 or 1).
    pub direction: u8,
    /// Target printer: `host:port` for network output, a device path for
    /// local output.  `None` means the output's configured default.
    pub device_address: Option<String>,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            quantity: 1,
            barcode_width: DEFAULT_BARCODE_WIDTH,
            barcode_height: DEFAULT_BARCODE_HEIGHT,
            label_height_mm: DEFAULT_LABEL_HEIGHT_MM,
            label_width_mm: DEFAULT_LABEL_WIDTH_MM,
            direction: 1,
            device_address: None,
        }
    }
}

/// Wire shape of the metadata object.  Unknown keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    quantity: Option<i64>,
    #[serde(alias = "barcode_width")]
    barcode_width: Option<u8>,
    #[serde(alias = "barcode_height")]
    barcode_height: Option<u16>,
    #[serde(alias = "height", alias = "label_height_mm")]
    label_height_mm: Option<f32>,
    #[serde(alias = "width", alias = "label_width_mm")]
    label_width_mm: Option<f32>,
    direction: Option<u8>,
    #[serde(alias = "device_address")]
    device_address: Option<String>,
    // Older network clients split the address in two.
    #[serde(rename = "printer_ip")]
    printer_ip: Option<String>,
    #[serde(rename = "printer_port")]
    printer_port: Option<u16>,
}

impl LabelSettings {
    /// Decode settings from job metadata, applying defaults for absent keys.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self> {
        let raw: RawSettings = serde_json::from_value(serde_json::Value::Object(metadata.clone()))
            .map_err(|e| EtikettError::Dispatch(format!("malformed metadata: {e}")))?;

        let defaults = Self::default();

        let quantity = raw
            .quantity
            .map(|q| q.clamp(1, MAX_QUANTITY as i64) as u32)
            .unwrap_or(defaults.quantity);

        let barcode_width = raw.barcode_width.unwrap_or(defaults.barcode_width);
        if !(2..=6).contains(&barcode_width) {
            return Err(EtikettError::Dispatch(format!(
                "barcodeWidth must be between 2 and 6, got {barcode_width}"
            )));
        }

        let barcode_height = raw.barcode_height.unwrap_or(defaults.barcode_height);
        if barcode_height == 0 {
            return Err(EtikettError::Dispatch("barcodeHeight must be positive".into()));
        }

        let label_height_mm = raw.label_height_mm.unwrap_or(defaults.label_height_mm);
        let label_width_mm = raw.label_width_mm.unwrap_or(defaults.label_width_mm);
        for (name, value) in [("labelHeightMm", label_height_mm), ("labelWidthMm", label_width_mm)] {
            if !value.is_finite() || value < 0.0 {
                return Err(EtikettError::Dispatch(format!("{name} must be a non-negative number")));
            }
        }

        let direction = raw.direction.unwrap_or(defaults.direction);
        if direction > 1 {
            return Err(EtikettError::Dispatch(format!("direction must be 0 or 1, got {direction}")));
        }

        let device_address = match (raw.device_address, raw.printer_ip) {
            (Some(addr), _) => Some(addr),
            (None, Some(ip)) => Some(match raw.printer_port {
                Some(port) => format!("{ip}:{port}"),
                None => ip,
            }),
            (None, None) => None,
        };

        Ok(Self {
            quantity,
            barcode_width,
            barcode_height,
            label_height_mm,
            label_width_mm,
            direction,
            device_address,
        })
    }
}
