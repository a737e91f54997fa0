// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page -> host direction: decode messages posted by the embedded page and
// dispatch them to the notification center.
//
// Nothing here ever reports an error to the page. A message that is not for
// us, not an object, or names an unknown action is dropped with a debug line.

use std::sync::Arc;

use chatshell_core::types::{
    BridgeAction, BridgeMessage, InboundEnvelope, NotificationOptions, NotificationRequest,
    PermissionOrigin,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::traits::{EventSink, NotificationCenter, ShellEvent};

/// Handles messages on the bridge channel.
#[derive(Clone)]
pub struct BridgeReceiver {
    channel: String,
    center: Arc<dyn NotificationCenter>,
    sink: Arc<dyn EventSink>,
}

impl BridgeReceiver {
    pub fn new(
        channel: impl Into<String>,
        center: Arc<dyn NotificationCenter>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            channel: channel.into(),
            center,
            sink,
        }
    }

    /// Name of the registered bridge channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Handle one message. Returns the action that was dispatched, or `None`
    /// if the message was dropped.
    pub fn receive(&self, name: &str, body: &Value) -> Option<BridgeAction> {
        if name != self.channel {
            debug!(channel = name, "message for another channel; ignoring");
            return None;
        }
        let Some(message) = BridgeMessage::from_body(body) else {
            debug!(channel = name, "unrecognised bridge message; ignoring");
            return None;
        };

        debug!(action = %message.action, "bridge message received");
        match message.action {
            BridgeAction::RequestPermissions => {
                request_authorization(self.center.as_ref(), self.sink.clone(), PermissionOrigin::Page);
            }
            BridgeAction::ShowNotification => self.show_notification(&message),
        }
        Some(message.action)
    }

    fn show_notification(&self, message: &BridgeMessage) {
        let request = NotificationRequest::from_payload(&message.payload);
        let id = request.id;
        match self.center.submit(request) {
            Ok(()) => debug!(%id, "local notification submitted"),
            Err(e) => warn!(%id, error = %e, "local notification not delivered"),
        }
    }
}

/// Ask for alert/badge/sound permission and post the outcome to `sink`.
///
/// An authorization error counts as "not granted".
pub fn request_authorization(
    center: &dyn NotificationCenter,
    sink: Arc<dyn EventSink>,
    origin: PermissionOrigin,
) {
    center.request_authorization(
        NotificationOptions::ALL,
        Box::new(move |result| {
            let granted = result.unwrap_or_else(|e| {
                warn!(error = %e, "notification authorization failed");
                false
            });
            info!(granted, ?origin, "notification authorization resolved");
            sink.post(ShellEvent::PermissionResolved { granted, origin });
        }),
    );
}

/// What the router did with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Handled by the bridge receiver.
    Dispatched(BridgeAction),
    /// Arrived on the debug channel and was logged.
    Logged,
    /// Discarded.
    Dropped,
}

/// Fans page messages out by channel name: the bridge channel goes to the
/// [`BridgeReceiver`], the optional debug channel is logged, anything else is
/// dropped.
#[derive(Clone)]
pub struct ChannelRouter {
    receiver: BridgeReceiver,
    debug_channel: Option<String>,
}

impl ChannelRouter {
    pub fn new(receiver: BridgeReceiver, debug_channel: Option<String>) -> Self {
        Self {
            receiver,
            debug_channel,
        }
    }

    /// Route a raw IPC string carrying an [`InboundEnvelope`].
    pub fn route_raw(&self, raw: &str) -> Routed {
        match InboundEnvelope::parse(raw) {
            Some(envelope) => self.route(&envelope.name, &envelope.body),
            None => {
                debug!("malformed IPC envelope; ignoring");
                Routed::Dropped
            }
        }
    }

    pub fn route(&self, name: &str, body: &Value) -> Routed {
        if self.debug_channel.as_deref() == Some(name) {
            info!(channel = name, %body, "message from page");
            return Routed::Logged;
        }
        match self.receiver.receive(name, body) {
            Some(action) => Routed::Dispatched(action),
            None => Routed::Dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AuthOutcome, CenterCall, RecordingCenter, RecordingSink};
    use serde_json::json;

    const CHANNEL: &str = "pushNotificationBridge";

    fn setup(outcome: AuthOutcome) -> (BridgeReceiver, Arc<RecordingCenter>, Arc<RecordingSink>) {
        let center = Arc::new(RecordingCenter::new(outcome));
        let sink = Arc::new(RecordingSink::default());
        let receiver = BridgeReceiver::new(CHANNEL, center.clone(), sink.clone());
        (receiver, center, sink)
    }

    #[test]
    fn other_channel_does_nothing() {
        let (receiver, center, sink) = setup(AuthOutcome::Grant);
        let body = json!({ "action": "requestPermissions" });
        assert_eq!(receiver.receive("iosHandler", &body), None);
        assert_eq!(receiver.receive("pushnotificationbridge", &body), None);
        assert!(center.calls().is_empty());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn unknown_action_does_nothing() {
        let (receiver, center, sink) = setup(AuthOutcome::Grant);
        assert_eq!(
            receiver.receive(CHANNEL, &json!({ "action": "requestNotification" })),
            None
        );
        assert!(center.calls().is_empty());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn non_object_or_missing_action_does_nothing() {
        let (receiver, center, _) = setup(AuthOutcome::Grant);
        assert_eq!(receiver.receive(CHANNEL, &json!("showNotification")), None);
        assert_eq!(receiver.receive(CHANNEL, &json!({ "title": "Hi" })), None);
        assert_eq!(receiver.receive(CHANNEL, &json!({ "action": null })), None);
        assert!(center.calls().is_empty());
    }

    #[test]
    fn request_permissions_posts_page_result() {
        let (receiver, center, sink) = setup(AuthOutcome::Grant);
        assert_eq!(
            receiver.receive(CHANNEL, &json!({ "action": "requestPermissions" })),
            Some(BridgeAction::RequestPermissions)
        );
        assert_eq!(center.calls(), vec![CenterCall::Authorize(NotificationOptions::ALL)]);

        let events = sink.take();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            ShellEvent::PermissionResolved { granted: true, origin: PermissionOrigin::Page }
        ));
    }

    #[test]
    fn authorization_error_becomes_denial() {
        let (receiver, _, sink) = setup(AuthOutcome::Fail);
        receiver.receive(CHANNEL, &json!({ "action": "requestPermissions" }));
        let events = sink.take();
        assert!(matches!(
            events.as_slice(),
            [ShellEvent::PermissionResolved { granted: false, origin: PermissionOrigin::Page }]
        ));
    }

    #[test]
    fn show_notification_submits_one_request() {
        let (receiver, center, sink) = setup(AuthOutcome::Grant);
        let body = json!({ "action": "showNotification", "title": "Hi", "body": "there", "badge": 3 });
        assert_eq!(receiver.receive(CHANNEL, &body), Some(BridgeAction::ShowNotification));

        let submitted = center.submitted();
        assert_eq!(submitted.len(), 1);
        let req = &submitted[0];
        assert_eq!(req.title, "Hi");
        assert_eq!(req.body, "there");
        assert_eq!(req.badge, Some(3));
        assert_eq!(
            serde_json::Value::Object(req.metadata.to_user_info()),
            json!({ "conversationId": "", "senderId": "", "timestamp": "" })
        );
        assert!(sink.take().is_empty());
    }

    #[test]
    fn repeated_show_notification_gets_distinct_ids() {
        let (receiver, center, _) = setup(AuthOutcome::Grant);
        let body = json!({ "action": "showNotification" });
        receiver.receive(CHANNEL, &body);
        receiver.receive(CHANNEL, &body);
        let submitted = center.submitted();
        assert_eq!(submitted.len(), 2);
        assert_ne!(submitted[0].id, submitted[1].id);
        assert_eq!(submitted[0].title, "New Message");
    }

    #[test]
    fn submit_failure_is_swallowed() {
        let (receiver, center, _) = setup(AuthOutcome::Grant);
        center.fail_submissions();
        assert_eq!(
            receiver.receive(CHANNEL, &json!({ "action": "showNotification" })),
            Some(BridgeAction::ShowNotification)
        );
    }

    #[test]
    fn router_splits_by_channel() {
        let (receiver, center, _) = setup(AuthOutcome::Grant);
        let router = ChannelRouter::new(receiver, Some("iosHandler".into()));

        assert_eq!(
            router.route("iosHandler", &json!({ "action": "showNotification" })),
            Routed::Logged
        );
        assert_eq!(router.route("elsewhere", &json!({ "action": "showNotification" })), Routed::Dropped);
        assert!(center.calls().is_empty());

        assert_eq!(
            router.route(CHANNEL, &json!({ "action": "showNotification" })),
            Routed::Dispatched(BridgeAction::ShowNotification)
        );
        assert_eq!(center.submitted().len(), 1);
    }

    #[test]
    fn router_decodes_ipc_envelopes() {
        let (receiver, center, _) = setup(AuthOutcome::Deny);
        let router = ChannelRouter::new(receiver, None);

        assert_eq!(router.route_raw("{ not json"), Routed::Dropped);
        assert_eq!(router.route_raw(r#"{"name":"iosHandler","body":"hello"}"#), Routed::Dropped);
        assert_eq!(
            router.route_raw(r#"{"name":"pushNotificationBridge","body":{"action":"requestPermissions"}}"#),
            Routed::Dispatched(BridgeAction::RequestPermissions)
        );
        assert_eq!(center.calls().len(), 1);
    }
}
