// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Network label printer over raw TCP (JetDirect, port 9100).
//
// Open a socket, write the rendered ESC/POS bytes, close it.  The printer
// gives no feedback, so a clean shutdown is the only success signal.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use etikett_core::error::{EtikettError, Result};
use etikett_core::settings::LabelSettings;

use super::{LabelOutput, escpos};

/// Default raw TCP port (HP JetDirect).
pub const RAW_PORT: u16 = 9100;

/// ESC/POS printer reachable over raw TCP.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    default_addr: String,
    timeout: Duration,
}

impl NetworkPrinter {
    /// `default_addr` is used unless a job names its own `device_address`.
    pub fn new(default_addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            default_addr: default_addr.into(),
            timeout,
        }
    }

    /// Address a job is sent to: its own override, or the configured printer.
    /// A bare host gets the raw port appended.
    fn resolve(&self, settings: &LabelSettings) -> String {
        let addr = settings.device_address.as_deref().unwrap_or(&self.default_addr);
        if addr.contains(':') {
            addr.to_string()
        } else {
            format!("{addr}:{RAW_PORT}")
        }
    }

    /// Send bytes to `addr`, bounding each step by the configured timeout.
    pub async fn send_raw(&self, addr: &str, bytes: &[u8]) -> Result<()> {
        debug!(addr = %addr, total = bytes.len(), "connecting via raw TCP");

        let mut stream = self
            .step(addr, "connect", TcpStream::connect(addr))
            .await?;
        self.step(addr, "send", stream.write_all(bytes)).await?;
        self.step(addr, "flush", stream.flush()).await?;
        self.step(addr, "shutdown", stream.shutdown()).await?;

        info!(addr = %addr, total = bytes.len(), "label sent via raw TCP");
        Ok(())
    }

    async fn step<T>(
        &self,
        addr: &str,
        what: &str,
        fut: impl std::future::Future<Output = std::io::Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| {
                EtikettError::Dispatch(format!(
                    "raw TCP {what} to {addr} timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| EtikettError::Dispatch(format!("raw TCP {what} to {addr}: {e}")))
    }
}

#[async_trait]
impl LabelOutput for NetworkPrinter {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn render_and_send(&self, label: &str, content: &str, settings: &LabelSettings) -> Result<()> {
        let bytes = escpos::render(label, content, settings)?;
        let addr = self.resolve(settings);
        self.send_raw(&addr, &bytes).await
    }
}
