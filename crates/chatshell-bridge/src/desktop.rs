// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop notification center backed by notify-rust.
//
// Desktop platforms have no permission prompt and no push service: the
// authorization request is always granted and remote registration reports a
// failure. Notifications are shown from a worker thread so the UI thread never
// waits on D-Bus / WinRT. On freedesktop systems a click on the notification
// body comes back as a tap.

use std::sync::Arc;

use chatshell_core::error::{Result, ShellError};
use chatshell_core::types::{NotificationOptions, NotificationRequest};
use notify_rust::{Notification, Timeout};
use tracing::{debug, warn};

use crate::notifier::foreground_presentation;
use crate::traits::{AuthorizationCallback, EventSink, NotificationCenter, ShellEvent};

/// Sound hint used when the presentation options ask for one.
const SOUND_NAME: &str = "message-new-instant";

/// Expiry handed to the notification server. The close signal it sends on
/// expiry ends the worker thread's wait for a click.
const EXPIRY_MS: u32 = 5000;

pub struct DesktopNotificationCenter {
    sink: Arc<dyn EventSink>,
    app_name: String,
}

impl DesktopNotificationCenter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            app_name: "ChatApp".into(),
        }
    }

    fn build(&self, request: &NotificationRequest) -> Notification {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(&request.title)
            .body(&request.body)
            .timeout(Timeout::Milliseconds(EXPIRY_MS));
        if foreground_presentation().sound {
            notification.sound_name(SOUND_NAME);
        }
        if let Some(badge) = request.badge {
            debug!(badge, "badge counts are not shown on desktop");
        }
        notification
    }
}

impl NotificationCenter for DesktopNotificationCenter {
    fn platform_name(&self) -> &str {
        "Desktop"
    }

    fn request_authorization(&self, options: NotificationOptions, completion: AuthorizationCallback) {
        debug!(?options, "desktop notifications need no authorization");
        completion(Ok(true));
    }

    fn register_for_remote_notifications(&self) {
        self.sink.post(ShellEvent::DeviceTokenFailed(
            ShellError::PlatformUnavailable.to_string(),
        ));
    }

    fn submit(&self, request: NotificationRequest) -> Result<()> {
        let notification = self.build(&request);
        let sink = self.sink.clone();
        std::thread::Builder::new()
            .name("chatshell-notify".into())
            .spawn(move || show(notification, request, sink))
            .map_err(|e| ShellError::Notification(e.to_string()))?;
        Ok(())
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn show(mut notification: Notification, request: NotificationRequest, sink: Arc<dyn EventSink>) {
    use crate::traits::Completion;

    notification.action("default", "Open");
    let handle = match notification.show() {
        Ok(handle) => handle,
        Err(e) => {
            warn!(id = %request.id, error = %e, "desktop notification failed");
            return;
        }
    };
    let id = request.id;
    handle.wait_for_action(move |action| {
        if action == "default" {
            sink.post(ShellEvent::NotificationTapped {
                user_info: request.metadata.to_user_info(),
                completion: Completion::new(move || debug!(%id, "notification tap handled")),
            });
        }
    });
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn show(notification: Notification, request: NotificationRequest, _sink: Arc<dyn EventSink>) {
    if let Err(e) = notification.show() {
        warn!(id = %request.id, error = %e, "desktop notification failed");
    }
}
