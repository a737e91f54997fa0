// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};

/// Environment variable that overrides [`ShellConfig::app_url`].
pub const APP_URL_ENV: &str = "CHATSHELL_APP_URL";

/// Persistent shell settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// URL of the remote chat web application.
    pub app_url: String,
    /// Window title on desktop platforms.
    pub window_title: String,
    /// Channel the page posts bridge messages to.
    pub bridge_channel: String,
    /// Secondary channel whose messages are only logged.
    pub debug_channel: Option<String>,
    /// Platform tag passed along with the device token.
    pub platform_tag: String,
    /// Ask for notification permission once at launch.
    pub request_permissions_on_launch: bool,
    /// Enable the web inspector.
    pub devtools: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".into(),
            window_title: "ChatApp".into(),
            bridge_channel: "pushNotificationBridge".into(),
            debug_channel: Some("iosHandler".into()),
            platform_tag: default_platform_tag().into(),
            request_permissions_on_launch: true,
            devtools: cfg!(debug_assertions),
        }
    }
}

impl ShellConfig {
    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_app_url_override(std::env::var(APP_URL_ENV).ok())
    }

    fn with_app_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.app_url = url;
        }
        self
    }

    /// Every channel the page may post to, bridge channel first.
    pub fn channels(&self) -> Vec<&str> {
        let mut channels = vec![self.bridge_channel.as_str()];
        if let Some(debug) = self.debug_channel.as_deref() {
            channels.push(debug);
        }
        channels
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_url.trim().is_empty() {
            return Err(ShellError::Config("app_url must not be empty".into()));
        }
        if self.bridge_channel.is_empty() {
            return Err(ShellError::Config("bridge_channel must not be empty".into()));
        }
        match self.debug_channel.as_deref() {
            Some("") => {
                return Err(ShellError::Config("debug_channel must not be empty".into()));
            }
            Some(debug) if debug == self.bridge_channel => {
                return Err(ShellError::Config(
                    "debug_channel must differ from bridge_channel".into(),
                ));
            }
            _ => {}
        }
        if self.platform_tag.is_empty() {
            return Err(ShellError::Config("platform_tag must not be empty".into()));
        }
        Ok(())
    }
}

/// Tag reported to the page alongside the device token.
pub fn default_platform_tag() -> &'static str {
    if cfg!(target_os = "ios") {
        "ios"
    } else if cfg!(target_os = "android") {
        "android"
    } else {
        std::env::consts::OS
    }
}
