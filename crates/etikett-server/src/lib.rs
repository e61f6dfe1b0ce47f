// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Etikett Server: HTTP interface and process bootstrap for the print queue.

pub mod app;
pub mod bootstrap;
pub mod errors;
