// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label outputs: the printer side of the dispatch engine.
//
// A worker hands each claimed job to one `LabelOutput`, once per requested
// copy.  Two transports are provided and picked by configuration:
//
//   - network: ESC/POS over raw TCP (JetDirect, port 9100)
//   - device:  TSPL written to a local printer device node (USB class)

pub mod device;
pub mod escpos;
pub mod network;
pub mod tspl;

use std::sync::Arc;

use async_trait::async_trait;

use etikett_core::config::OutputConfig;
use etikett_core::error::Result;
use etikett_core::settings::LabelSettings;

pub use device::DevicePrinter;
pub use network::NetworkPrinter;

/// Renders a label and delivers one physical copy to a printer.
///
/// Implementations bound their own I/O with a timeout and report every
/// failure (timeout, I/O, unrenderable input) as `EtikettError::Dispatch`.
#[async_trait]
pub trait LabelOutput: Send + Sync {
    /// Short transport name for logs.
    fn name(&self) -> &'static str;

    /// Render `content` (with `label` above it) and send a single copy.
    async fn render_and_send(&self, label: &str, content: &str, settings: &LabelSettings) -> Result<()>;
}

/// Build the output selected by the service configuration.
pub fn output_from_config(config: &OutputConfig) -> Arc<dyn LabelOutput> {
    match config {
        OutputConfig::Network { host, port, .. } => {
            Arc::new(NetworkPrinter::new(format!("{host}:{port}"), config.timeout()))
        }
        OutputConfig::Device { path, .. } => Arc::new(DevicePrinter::new(path.clone(), config.timeout())),
    }
}

/// Longest barcode payload any output accepts.
pub const MAX_CONTENT_BYTES: usize = 255;

/// Printable-ASCII view of a label line: control characters are rejected,
/// anything outside ASCII becomes `?`.
pub(crate) fn label_bytes(label: &str) -> Result<Vec<u8>> {
    if label.chars().any(char::is_control) {
        return Err(etikett_core::EtikettError::Dispatch(
            "label contains control characters".into(),
        ));
    }
    Ok(label
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_selects_transport() {
        let network = output_from_config(&OutputConfig::default());
        assert_eq!(network.name(), "network");

        let device = output_from_config(&OutputConfig::Device {
            path: PathBuf::from("/dev/usb/lp0"),
            timeout_secs: 10,
        });
        assert_eq!(device.name(), "device");
    }

    #[test]
    fn label_bytes_replaces_non_ascii() {
        assert_eq!(label_bytes("Preis 5€").unwrap(), b"Preis 5?".to_vec());
    }

    #[test]
    fn label_bytes_rejects_control_characters() {
        assert!(label_bytes("line\nbreak").is_err());
    }
}
