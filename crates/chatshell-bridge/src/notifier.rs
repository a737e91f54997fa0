// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host -> page direction. Runs on the UI thread only.
//
// Every call into the page is best-effort: the page may not define the entry
// point, and a failed evaluation is logged and forgotten.

use std::sync::Arc;

use chatshell_core::script;
use chatshell_core::types::{
    AppVisibility, DeviceToken, NotificationOptions, PermissionOrigin, conversation_target,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::traits::{Completion, NotificationCenter, ScriptHost, ShellEvent};

/// How a notification is presented while the app is in the foreground.
/// Always fully, there is no suppression.
pub fn foreground_presentation() -> NotificationOptions {
    NotificationOptions::ALL
}

/// Forwards OS and lifecycle events into the embedded page.
pub struct NativeNotifier {
    center: Arc<dyn NotificationCenter>,
    platform_tag: String,
    visibility: AppVisibility,
}

impl NativeNotifier {
    pub fn new(center: Arc<dyn NotificationCenter>, platform_tag: impl Into<String>) -> Self {
        Self {
            center,
            platform_tag: platform_tag.into(),
            visibility: AppVisibility::Foreground,
        }
    }

    #[cfg(test)]
    fn visibility(&self) -> AppVisibility {
        self.visibility
    }

    /// Dispatch one event taken off the UI queue.
    pub fn handle(&mut self, event: ShellEvent, host: &dyn ScriptHost) {
        match event {
            ShellEvent::PermissionResolved { granted, origin } => {
                self.permission_resolved(granted, origin, host)
            }
            ShellEvent::DeviceTokenRegistered(token) => self.device_token_registered(&token, host),
            ShellEvent::DeviceTokenFailed(error) => self.device_token_failed(&error),
            ShellEvent::NotificationTapped {
                user_info,
                completion,
            } => self.notification_tapped(&user_info, completion, host),
            ShellEvent::VisibilityChanged(visibility) => self.set_visibility(visibility, host),
            ShellEvent::PageLoaded { url } => self.page_loaded(&url, host),
        }
    }

    /// An authorization request finished. Registers for remote notifications
    /// when granted; tells the page only if the page asked.
    pub fn permission_resolved(&self, granted: bool, origin: PermissionOrigin, host: &dyn ScriptHost) {
        if granted {
            self.center.register_for_remote_notifications();
        }
        if origin == PermissionOrigin::Page {
            evaluate(host, &script::permission_result(granted), "onPermissionResult");
        }
    }

    pub fn device_token_registered(&self, token: &DeviceToken, host: &dyn ScriptHost) {
        info!(bytes = token.0.len(), "registered for remote notifications");
        evaluate(
            host,
            &script::device_token_received(token, &self.platform_tag),
            "onDeviceTokenReceived",
        );
    }

    pub fn device_token_failed(&self, error: &str) {
        warn!(error, "failed to register for remote notifications");
    }

    /// Navigate to the tapped notification's conversation, if it names one,
    /// then signal `completion` either way.
    pub fn notification_tapped(
        &self,
        user_info: &Map<String, Value>,
        completion: Completion,
        host: &dyn ScriptHost,
    ) {
        match conversation_target(user_info) {
            Some(id) => {
                info!(conversation = %id, "notification tapped; opening conversation");
                evaluate(host, &script::navigate_to_conversation(&id), "navigate");
            }
            None => debug!("notification tapped without a conversation id"),
        }
        completion.complete();
    }

    /// Mirror view appear/disappear into `window.appState`.
    pub fn set_visibility(&mut self, visibility: AppVisibility, host: &dyn ScriptHost) {
        self.visibility = visibility;
        debug!(?visibility, "app visibility changed");
        evaluate(host, &script::app_state(visibility), "appState");
    }

    /// A navigation finished: install the visibility listener and replay the
    /// current app state for the new document.
    pub fn page_loaded(&self, url: &str, host: &dyn ScriptHost) {
        debug!(url, "page loaded; injecting app state tracking");
        evaluate(host, script::VISIBILITY_LISTENER, "visibility listener");
        evaluate(host, &script::app_state(self.visibility), "appState");
    }
}

fn evaluate(host: &dyn ScriptHost, js: &str, what: &str) {
    if let Err(e) = host.evaluate_script(js) {
        warn!(target_fn = what, error = %e, "page script evaluation failed");
    }
}
