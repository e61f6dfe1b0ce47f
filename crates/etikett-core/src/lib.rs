// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Etikett: core types and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod settings;
pub mod types;

pub use config::{OutputConfig, ServiceConfig};
pub use error::EtikettError;
pub use settings::LabelSettings;
pub use types::*;
