// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ChatShell notification bridge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Title used when a `showNotification` payload carries none.
pub const DEFAULT_TITLE: &str = "New Message";

/// Metadata keys attached to every local notification.
pub const META_CONVERSATION_ID: &str = "conversationId";
pub const META_SENDER_ID: &str = "senderId";
pub const META_TIMESTAMP: &str = "timestamp";

// ---------------------------------------------------------------------------
// Inbound messages
// ---------------------------------------------------------------------------

/// Actions the embedded page may ask the host to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeAction {
    /// Ask the OS for alert/badge/sound permission.
    RequestPermissions,
    /// Display a local notification immediately.
    ShowNotification,
}

impl BridgeAction {
    /// Parse the wire tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "requestPermissions" => Some(Self::RequestPermissions),
            "showNotification" => Some(Self::ShowNotification),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestPermissions => "requestPermissions",
            Self::ShowNotification => "showNotification",
        }
    }
}

impl std::fmt::Display for BridgeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport wrapper for a page message: the channel it was posted to and its
/// raw body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub name: String,
    #[serde(default)]
    pub body: Value,
}

impl InboundEnvelope {
    /// Decode an envelope from the IPC string. Returns `None` for anything
    /// that is not `{ "name": string, "body": any }`.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// A decoded bridge message. Lives only for one handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeMessage {
    pub action: BridgeAction,
    /// The whole body, `action` key included.
    pub payload: Map<String, Value>,
}

impl BridgeMessage {
    /// Decode a message body.
    ///
    /// The body must be a JSON object with a string `action` naming a known
    /// action; anything else is `None` and the caller drops it.
    pub fn from_body(body: &Value) -> Option<Self> {
        let payload = body.as_object()?;
        let action = payload.get("action")?.as_str()?;
        let action = BridgeAction::from_tag(action)?;
        Some(Self {
            action,
            payload: payload.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Local notifications
// ---------------------------------------------------------------------------

/// Unique identifier for a local notification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data attached to a notification so a later tap can route the user.
///
/// Values keep whatever JSON type the page sent; a missing or `null` value
/// becomes `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMetadata {
    pub conversation_id: Value,
    pub sender_id: Value,
    pub timestamp: Value,
}

impl NotificationMetadata {
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let field = |key: &str| match payload.get(key) {
            None | Some(Value::Null) => Value::String(String::new()),
            Some(v) => v.clone(),
        };
        Self {
            conversation_id: field(META_CONVERSATION_ID),
            sender_id: field(META_SENDER_ID),
            timestamp: field(META_TIMESTAMP),
        }
    }

    /// Flatten into the key/value map handed to the OS.
    pub fn to_user_info(&self) -> Map<String, Value> {
        let mut info = Map::new();
        info.insert(META_CONVERSATION_ID.into(), self.conversation_id.clone());
        info.insert(META_SENDER_ID.into(), self.sender_id.clone());
        info.insert(META_TIMESTAMP.into(), self.timestamp.clone());
        info
    }

    /// The entries a typed OS user-info store can hold. Strings and integers
    /// survive; any other shape is left out so it can never come back as a
    /// navigable conversation id.
    pub fn storable_entries(&self) -> Vec<(&'static str, UserInfoValue)> {
        [
            (META_CONVERSATION_ID, &self.conversation_id),
            (META_SENDER_ID, &self.sender_id),
            (META_TIMESTAMP, &self.timestamp),
        ]
        .into_iter()
        .filter_map(|(key, value)| UserInfoValue::from_json(value).map(|v| (key, v)))
        .collect()
    }
}

/// A metadata value as stored by a platform that only keeps strings and
/// numbers in a notification's user info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInfoValue {
    Text(String),
    Integer(i64),
}

impl UserInfoValue {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Integer),
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            Self::Text(s) => Value::String(s),
            Self::Integer(n) => Value::from(n),
        }
    }
}

/// Extract the conversation to open from a tapped notification's user info.
///
/// Strings are used as-is and integers are rendered in decimal. Any other
/// shape means there is nowhere to navigate.
pub fn conversation_target(user_info: &Map<String, Value>) -> Option<String> {
    match user_info.get(META_CONVERSATION_ID)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// A local notification ready to hand to the OS for immediate display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub badge: Option<i64>,
    pub metadata: NotificationMetadata,
}

impl NotificationRequest {
    /// Build a request from a `showNotification` payload, falling back to the
    /// defaults wherever a field is absent or of the wrong type.
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            id: NotificationId::new(),
            title: text("title").unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            body: text("body").unwrap_or_default(),
            badge: payload.get("badge").and_then(Value::as_i64),
            metadata: NotificationMetadata::from_payload(payload),
        }
    }
}

// ---------------------------------------------------------------------------
// Push registration
// ---------------------------------------------------------------------------

/// Opaque device token issued by the platform push service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceToken(pub Vec<u8>);

impl DeviceToken {
    /// Two lowercase hex digits per byte, no separators.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Permissions / presentation / lifecycle
// ---------------------------------------------------------------------------

/// Alert/badge/sound flags, used for authorization requests and for how a
/// notification is presented while the app is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub alert: bool,
    pub badge: bool,
    pub sound: bool,
}

impl NotificationOptions {
    pub const ALL: Self = Self {
        alert: true,
        badge: true,
        sound: true,
    };
}

/// Who asked for notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOrigin {
    /// The shell itself, once at launch. The page is not told the result.
    Launch,
    /// The page, via `requestPermissions`. The page gets `onPermissionResult`.
    Page,
}

/// Whether the shell's view is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppVisibility {
    #[default]
    Foreground,
    Background,
}

impl AppVisibility {
    pub fn is_background(&self) -> bool {
        matches!(self, Self::Background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test payload must be an object")
    }

    #[test]
    fn known_actions_decode() {
        let msg = BridgeMessage::from_body(&json!({ "action": "requestPermissions" }))
            .expect("requestPermissions should decode");
        assert_eq!(msg.action, BridgeAction::RequestPermissions);

        let msg = BridgeMessage::from_body(&json!({ "action": "showNotification", "title": "Hi" }))
            .expect("showNotification should decode");
        assert_eq!(msg.action, BridgeAction::ShowNotification);
        assert_eq!(msg.payload.get("title"), Some(&json!("Hi")));
    }

    #[test]
    fn unknown_or_malformed_bodies_are_rejected() {
        assert!(BridgeMessage::from_body(&json!({ "action": "requestNotification" })).is_none());
        assert!(BridgeMessage::from_body(&json!({ "title": "no action" })).is_none());
        assert!(BridgeMessage::from_body(&json!({ "action": 7 })).is_none());
        assert!(BridgeMessage::from_body(&json!("requestPermissions")).is_none());
        assert!(BridgeMessage::from_body(&json!(["showNotification"])).is_none());
        assert!(BridgeMessage::from_body(&Value::Null).is_none());
    }

    #[test]
    fn envelope_parses_name_and_body() {
        let env = InboundEnvelope::parse(r#"{"name":"pushNotificationBridge","body":{"action":"requestPermissions"}}"#)
            .expect("valid envelope");
        assert_eq!(env.name, "pushNotificationBridge");
        assert_eq!(env.body, json!({ "action": "requestPermissions" }));

        let env = InboundEnvelope::parse(r#"{"name":"iosHandler"}"#).expect("body is optional");
        assert_eq!(env.body, Value::Null);
    }

    #[test]
    fn envelope_rejects_garbage() {
        assert!(InboundEnvelope::parse("not json").is_none());
        assert!(InboundEnvelope::parse(r#"{"body":{}}"#).is_none());
        assert!(InboundEnvelope::parse(r#"{"name":42,"body":{}}"#).is_none());
    }

    #[test]
    fn notification_defaults_when_fields_absent() {
        let req = NotificationRequest::from_payload(&object(json!({ "action": "showNotification" })));
        assert_eq!(req.title, "New Message");
        assert_eq!(req.body, "");
        assert_eq!(req.badge, None);
        assert_eq!(req.metadata.conversation_id, json!(""));
        assert_eq!(req.metadata.sender_id, json!(""));
        assert_eq!(req.metadata.timestamp, json!(""));
    }

    #[test]
    fn notification_uses_payload_fields() {
        let req = NotificationRequest::from_payload(&object(json!({
            "action": "showNotification",
            "title": "Hi",
            "body": "there",
            "badge": 3
        })));
        assert_eq!(req.title, "Hi");
        assert_eq!(req.body, "there");
        assert_eq!(req.badge, Some(3));

        let info = req.metadata.to_user_info();
        assert_eq!(info.len(), 3);
        assert_eq!(info.get("conversationId"), Some(&json!("")));
        assert_eq!(info.get("senderId"), Some(&json!("")));
        assert_eq!(info.get("timestamp"), Some(&json!("")));
    }

    #[test]
    fn wrong_typed_fields_fall_back() {
        let req = NotificationRequest::from_payload(&object(json!({
            "title": 12,
            "body": null,
            "badge": "3"
        })));
        assert_eq!(req.title, "New Message");
        assert_eq!(req.body, "");
        assert_eq!(req.badge, None);
    }

    #[test]
    fn metadata_keeps_value_types() {
        let meta = NotificationMetadata::from_payload(&object(json!({
            "conversationId": "42",
            "senderId": 7,
            "timestamp": null
        })));
        assert_eq!(meta.conversation_id, json!("42"));
        assert_eq!(meta.sender_id, json!(7));
        assert_eq!(meta.timestamp, json!(""));
    }

    #[test]
    fn each_request_gets_a_fresh_id() {
        let payload = object(json!({ "title": "same" }));
        let a = NotificationRequest::from_payload(&payload);
        let b = NotificationRequest::from_payload(&payload);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn device_token_hex() {
        assert_eq!(DeviceToken(vec![0x1f, 0xA0]).to_hex(), "1fa0");
        assert_eq!(DeviceToken(vec![]).to_hex(), "");
        assert_eq!(DeviceToken(vec![0x00, 0x0A, 0xFF]).to_hex(), "000aff");

        let bytes: Vec<u8> = (0..=255).collect();
        let hex = DeviceToken(bytes.clone()).to_hex();
        assert_eq!(hex.len(), bytes.len() * 2);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn conversation_target_shapes() {
        assert_eq!(
            conversation_target(&object(json!({ "conversationId": "42" }))),
            Some("42".into())
        );
        assert_eq!(
            conversation_target(&object(json!({ "conversationId": 42 }))),
            Some("42".into())
        );
        assert_eq!(conversation_target(&object(json!({ "conversationId": 4.2 }))), None);
        assert_eq!(conversation_target(&object(json!({ "senderId": "1" }))), None);
    }

    fn stored_and_read_back(meta: &NotificationMetadata) -> Map<String, Value> {
        meta.storable_entries()
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value.into_json()))
            .collect()
    }

    #[test]
    fn storable_entries_keep_strings_and_integers() {
        let meta = NotificationMetadata::from_payload(&object(json!({
            "conversationId": 42,
            "senderId": "u-1"
        })));
        assert_eq!(
            meta.storable_entries(),
            vec![
                ("conversationId", UserInfoValue::Integer(42)),
                ("senderId", UserInfoValue::Text("u-1".into())),
                ("timestamp", UserInfoValue::Text(String::new())),
            ]
        );
        let info = stored_and_read_back(&meta);
        assert_eq!(conversation_target(&info), Some("42".into()));
    }

    #[test]
    fn unstorable_conversation_ids_never_navigate() {
        for id in [json!(true), json!(4.2), json!({ "id": 1 }), json!([1])] {
            let meta = NotificationMetadata::from_payload(&object(json!({ "conversationId": id })));
            let info = stored_and_read_back(&meta);
            assert!(!info.contains_key("conversationId"), "{id} should not be stored");
            assert_eq!(conversation_target(&info), None);
            assert_eq!(conversation_target(&meta.to_user_info()), None);
        }
    }
}
