// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ChatShell.

use thiserror::Error;

/// Top-level error type for all ChatShell operations.
///
/// None of these reach the embedded page. The bridge logs them and carries on.
#[derive(Debug, Error)]
pub enum ShellError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Web view --
    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("web view error: {0}")]
    WebView(String),

    // -- Notifications --
    #[error("notification delivery failed: {0}")]
    Notification(String),

    #[error("notification authorization failed: {0}")]
    Authorization(String),

    #[error("remote notification registration failed: {0}")]
    RemoteRegistration(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ShellError>;
