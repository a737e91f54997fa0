// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ChatShell — Core types, errors and page scripts shared across all crates.

pub mod config;
pub mod error;
pub mod script;
pub mod types;

pub use config::ShellConfig;
pub use error::ShellError;
pub use types::*;
