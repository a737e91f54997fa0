// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JavaScript snippets evaluated in the embedded page.
//
// The page exposes a handful of optional globals. Every call is guarded so a
// page that does not implement an entry point simply ignores it.

use crate::types::{AppVisibility, DeviceToken};

/// Listener installed after each navigation so the page's own visibility
/// changes also reach the bridge object.
pub const VISIBILITY_LISTENER: &str = r#"document.addEventListener('visibilitychange', function () {
  if (window.PushNotificationBridge) {
    window.PushNotificationBridge.updateAppState({
      isBackground: document.hidden
    });
  }
});"#;

/// Quote `s` as a single-quoted JavaScript string literal.
pub fn js_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            // `</script>` must not close an enclosing tag if this ends up inline.
            '<' => out.push_str("\\x3c"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Report the outcome of a page-initiated permission request.
pub fn permission_result(granted: bool) -> String {
    format!(
        "if (window.PushNotificationBridge) {{\n  window.PushNotificationBridge.onPermissionResult({granted});\n}}"
    )
}

/// Hand the hex device token and platform tag to the page.
pub fn device_token_received(token: &DeviceToken, platform_tag: &str) -> String {
    format!(
        "if (window.onDeviceTokenReceived) {{\n  window.onDeviceTokenReceived({}, {});\n}}",
        js_string_literal(&token.to_hex()),
        js_string_literal(platform_tag),
    )
}

/// Path the page navigates to when a notification for `conversation_id` is
/// tapped.
pub fn conversation_path(conversation_id: &str) -> String {
    format!("/conversations/{conversation_id}")
}

pub fn navigate_to_conversation(conversation_id: &str) -> String {
    format!(
        "window.location.href = {};",
        js_string_literal(&conversation_path(conversation_id))
    )
}

/// Mirror the host's foreground/background state into `window.appState`.
pub fn app_state(visibility: AppVisibility) -> String {
    format!(
        "window.appState = {{ isBackground: {} }};\nif (window.chatNotifications) {{\n  window.chatNotifications.updateAppState();\n}}",
        visibility.is_background()
    )
}

/// Initialization script that gives every channel in `channels` a
/// `window.webkit.messageHandlers.<name>.postMessage` entry point backed by
/// the web view IPC, unless the platform already provides one.
pub fn message_handler_shim<S: AsRef<str>>(channels: &[S]) -> String {
    let names = channels
        .iter()
        .map(|c| js_string_literal(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"(function () {{
  window.webkit = window.webkit || {{}};
  window.webkit.messageHandlers = window.webkit.messageHandlers || {{}};
  [{names}].forEach(function (name) {{
    if (window.webkit.messageHandlers[name]) {{
      return;
    }}
    window.webkit.messageHandlers[name] = {{
      postMessage: function (body) {{
        window.ipc.postMessage(JSON.stringify({{ name: name, body: body === undefined ? null : body }}));
      }}
    }};
  }});
}})();"#
    )
}
