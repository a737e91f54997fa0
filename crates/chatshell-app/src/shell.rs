// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Window, web view and the UI event loop.
//
// The event loop thread is the only place that touches the web view. Page
// messages arrive through the wry IPC handler (already on this thread) and go
// straight to the channel router; OS completions arrive on other threads and
// are posted back here as `ShellEvent` user events.

use std::sync::{Arc, Mutex};

use chatshell_bridge::receiver::request_authorization;
use chatshell_bridge::{
    BridgeReceiver, ChannelRouter, EventSink, NativeNotifier, ScriptHost, ShellEvent,
};
use chatshell_core::error::{Result, ShellError};
use chatshell_core::script;
use chatshell_core::types::{AppVisibility, PermissionOrigin};
use chatshell_core::ShellConfig;
use dioxus::desktop::tao::event::{Event, WindowEvent};
use dioxus::desktop::tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use dioxus::desktop::tao::window::{Window, WindowBuilder};
use dioxus::desktop::wry::{PageLoadEvent, WebView, WebViewBuilder};
use tracing::{debug, info};

/// Posts events onto the tao event loop from any thread.
struct ProxySink(Mutex<EventLoopProxy<ShellEvent>>);

impl EventSink for ProxySink {
    fn post(&self, event: ShellEvent) {
        let proxy = match self.0.lock() {
            Ok(proxy) => proxy,
            Err(poisoned) => poisoned.into_inner(),
        };
        if proxy.send_event(event).is_err() {
            debug!("event loop closed; dropping shell event");
        }
    }
}

/// The web view's script context.
struct WebViewHost<'a>(&'a WebView);

impl ScriptHost for WebViewHost<'_> {
    fn evaluate_script(&self, js: &str) -> Result<()> {
        self.0
            .evaluate_script(js)
            .map_err(|e| ShellError::Script(e.to_string()))
    }
}

/// Open the window, load the chat app and run until the window closes.
pub fn run(config: ShellConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::<ShellEvent>::with_user_event().build();
    let sink: Arc<dyn EventSink> = Arc::new(ProxySink(Mutex::new(event_loop.create_proxy())));

    let center = chatshell_bridge::platform_notification_center(sink.clone())?;
    info!(platform = center.platform_name(), "notification center ready");

    let receiver = BridgeReceiver::new(config.bridge_channel.clone(), center.clone(), sink.clone());
    let router = ChannelRouter::new(receiver, config.debug_channel.clone());
    let mut notifier = NativeNotifier::new(center.clone(), config.platform_tag.clone());

    let window = WindowBuilder::new()
        .with_title(config.window_title.as_str())
        .build(&event_loop)
        .map_err(|e| ShellError::WebView(e.to_string()))?;

    let page_sink = sink.clone();
    let shim = script::message_handler_shim(&config.channels());
    let builder = WebViewBuilder::new()
        .with_url(config.app_url.as_str())
        .with_devtools(config.devtools)
        .with_initialization_script(shim.as_str())
        .with_ipc_handler(move |request| {
            router.route_raw(request.body());
        })
        .with_on_page_load_handler(move |event, url| {
            if let PageLoadEvent::Finished = event {
                page_sink.post(ShellEvent::PageLoaded { url });
            }
        });
    let webview = build_webview(builder, &window)?;
    info!(url = %config.app_url, channel = %config.bridge_channel, "web view loading");

    if config.request_permissions_on_launch {
        request_authorization(center.as_ref(), sink.clone(), PermissionOrigin::Launch);
    }

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;
        let host = WebViewHost(&webview);

        match event {
            Event::UserEvent(event) => notifier.handle(event, &host),
            Event::WindowEvent {
                window_id, event, ..
            } if window_id == window.id() => {
                if let WindowEvent::CloseRequested = event {
                    info!("window closed; shutting down");
                    *control_flow = ControlFlow::Exit;
                } else if let Some(visibility) = focus_visibility(&event) {
                    notifier.set_visibility(visibility, &host);
                }
            }
            other => {
                if let Some(visibility) = lifecycle_visibility(&other) {
                    notifier.set_visibility(visibility, &host);
                }
            }
        }
    })
}

/// Resume/suspend of the whole app.
fn lifecycle_visibility(event: &Event<'_, ShellEvent>) -> Option<AppVisibility> {
    match event {
        Event::Resumed => Some(AppVisibility::Foreground),
        Event::Suspended => Some(AppVisibility::Background),
        _ => None,
    }
}

/// Focus changes of the shell window.
fn focus_visibility(event: &WindowEvent<'_>) -> Option<AppVisibility> {
    match event {
        WindowEvent::Focused(true) => Some(AppVisibility::Foreground),
        WindowEvent::Focused(false) => Some(AppVisibility::Background),
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn build_webview(builder: WebViewBuilder<'_>, window: &Window) -> Result<WebView> {
    use dioxus::desktop::tao::platform::unix::WindowExtUnix;
    use dioxus::desktop::wry::WebViewBuilderExtUnix;

    let vbox = window
        .default_vbox()
        .ok_or_else(|| ShellError::WebView("window has no GTK container".into()))?;
    builder
        .build_gtk(vbox)
        .map_err(|e| ShellError::WebView(e.to_string()))
}

#[cfg(not(target_os = "linux"))]
fn build_webview(builder: WebViewBuilder<'_>, window: &Window) -> Result<WebView> {
    builder
        .build(window)
        .map_err(|e| ShellError::WebView(e.to_string()))
}
