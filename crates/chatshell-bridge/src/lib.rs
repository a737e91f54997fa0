// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! ChatShell — bridge between the embedded chat page and native notifications.
//!
//! Two halves:
//!
//! * [`receiver`] takes messages the page posts on the bridge channel and turns
//!   them into notification-center calls.
//! * [`notifier`] runs on the UI thread and turns OS events (permission results,
//!   device tokens, notification taps, lifecycle changes) into script calls on
//!   the page.
//!
//! OS completions may fire on any thread. They never touch the page directly:
//! they post a [`traits::ShellEvent`] to an [`traits::EventSink`] and the UI
//! thread hands it to the notifier.

use std::sync::Arc;

pub mod notifier;
pub mod receiver;
pub mod traits;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod desktop;

#[cfg(test)]
mod testing;

pub use notifier::NativeNotifier;
pub use receiver::{BridgeReceiver, ChannelRouter, Routed};
pub use traits::{Completion, EventSink, NotificationCenter, ScriptHost, ShellEvent};

/// Build the notification center for the target operating system.
///
/// `sink` receives every asynchronous outcome (registration results, taps).
/// On iOS this must be called on the main thread so the notification-center
/// delegate can be installed.
pub fn platform_notification_center(
    sink: Arc<dyn EventSink>,
) -> chatshell_core::error::Result<Arc<dyn NotificationCenter>> {
    #[cfg(target_os = "ios")]
    {
        Ok(Arc::new(ios::IosNotificationCenter::new(sink)?))
    }
    #[cfg(target_os = "android")]
    {
        let _ = sink;
        Err(chatshell_core::ShellError::PlatformUnavailable)
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        Ok(Arc::new(desktop::DesktopNotificationCenter::new(sink)))
    }
}
