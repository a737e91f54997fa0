// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic seams between the bridge, the OS and the web view.

use chatshell_core::error::Result;
use chatshell_core::types::{
    AppVisibility, DeviceToken, NotificationOptions, NotificationRequest, PermissionOrigin,
};
use serde_json::{Map, Value};

/// Single-shot completion for an authorization request. `Ok(granted)` or the
/// error the OS reported.
pub type AuthorizationCallback = Box<dyn FnOnce(Result<bool>) + Send + 'static>;

/// The OS notification subsystem.
///
/// Implementations report asynchronous outcomes that are not tied to a call
/// (device tokens, registration failures, taps) through the [`EventSink`]
/// they were built with.
pub trait NotificationCenter: Send + Sync {
    /// Human-readable platform name (e.g. "iOS", "Desktop").
    fn platform_name(&self) -> &str;

    /// Ask the user for permission. `completion` runs exactly once, on an
    /// arbitrary thread.
    fn request_authorization(&self, options: NotificationOptions, completion: AuthorizationCallback);

    /// Start remote (push) registration. The token or the failure arrives
    /// later as [`ShellEvent::DeviceTokenRegistered`] /
    /// [`ShellEvent::DeviceTokenFailed`]. UI thread only.
    fn register_for_remote_notifications(&self);

    /// Hand a local notification to the OS for immediate display.
    fn submit(&self, request: NotificationRequest) -> Result<()>;
}

/// Script context of the embedded page.
pub trait ScriptHost {
    /// Evaluate `script` in the page. No result is read back.
    fn evaluate_script(&self, script: &str) -> Result<()>;
}

/// Where off-thread completions are posted so the UI thread can pick them up.
pub trait EventSink: Send + Sync {
    fn post(&self, event: ShellEvent);
}

/// Work the UI thread must do on behalf of the OS or the web view.
#[derive(Debug)]
pub enum ShellEvent {
    /// An authorization request finished.
    PermissionResolved {
        granted: bool,
        origin: PermissionOrigin,
    },
    /// Remote registration produced a device token.
    DeviceTokenRegistered(DeviceToken),
    /// Remote registration failed.
    DeviceTokenFailed(String),
    /// The user tapped a notification. `completion` must be signalled once
    /// handling is done.
    NotificationTapped {
        user_info: Map<String, Value>,
        completion: Completion,
    },
    /// The shell's view appeared or disappeared.
    VisibilityChanged(AppVisibility),
    /// A navigation in the web view finished loading.
    PageLoaded { url: String },
}

/// Completion signal owed to the OS after handling an event.
///
/// Signalled at most once, either explicitly or when dropped.
pub struct Completion(Option<Box<dyn FnOnce() + Send + 'static>>);

impl Completion {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// A completion with nobody waiting on it.
    pub fn noop() -> Self {
        Self(None)
    }

    pub fn complete(mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Completion")
            .field(&if self.0.is_some() { "pending" } else { "done" })
            .finish()
    }
}
