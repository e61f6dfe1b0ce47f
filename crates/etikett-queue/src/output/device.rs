// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local label printer written through its device node (e.g. /dev/usb/lp0).

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::info;

use etikett_core::error::{EtikettError, Result};
use etikett_core::settings::LabelSettings;

use super::{LabelOutput, tspl};

/// TSPL printer attached as a character device.
#[derive(Debug, Clone)]
pub struct DevicePrinter {
    default_path: PathBuf,
    timeout: Duration,
}

impl DevicePrinter {
    pub fn new(default_path: PathBuf, timeout: Duration) -> Self {
        Self {
            default_path,
            timeout,
        }
    }

    fn resolve<'a>(&'a self, settings: &'a LabelSettings) -> &'a Path {
        settings
            .device_address
            .as_deref()
            .map(Path::new)
            .unwrap_or(&self.default_path)
    }

    async fn write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        // Never create: a missing node means the printer is unplugged.
        let mut device = tokio::fs::OpenOptions::new().append(true).open(path).await?;
        device.write_all(bytes).await?;
        device.flush().await
    }
}

#[async_trait]
impl LabelOutput for DevicePrinter {
    fn name(&self) -> &'static str {
        "device"
    }

    async fn render_and_send(&self, label: &str, content: &str, settings: &LabelSettings) -> Result<()> {
        let bytes = tspl::render(label, content, settings)?;
        let path = self.resolve(settings);

        tokio::time::timeout(self.timeout, Self::write(path, &bytes))
            .await
            .map_err(|_| {
                EtikettError::Dispatch(format!(
                    "write to {} timed out after {}s",
                    path.display(),
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| EtikettError::Dispatch(format!("write to {}: {e}", path.display())))?;

        info!(path = %path.display(), total = bytes.len(), "label written to device");
        Ok(())
    }
}
