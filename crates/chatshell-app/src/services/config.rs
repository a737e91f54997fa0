// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading and persisting `ShellConfig` in the data directory.

use std::path::Path;

use chatshell_core::ShellConfig;
use chatshell_core::error::Result;
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";

/// Load the config from `data_dir`, writing the defaults there on first run,
/// then apply environment overrides.
pub fn load_or_init(data_dir: &Path) -> ShellConfig {
    let config = match load_config(data_dir) {
        Some(config) => config,
        None => {
            let config = ShellConfig::default();
            // A broken file is left alone for the user to fix.
            if !data_dir.join(CONFIG_FILE).exists() {
                match persist_config(data_dir, &config) {
                    Ok(()) => info!(path = %data_dir.join(CONFIG_FILE).display(), "wrote default config"),
                    Err(e) => warn!(error = %e, "could not write default config"),
                }
            }
            config
        }
    };
    config.with_env_overrides()
}

fn load_config(data_dir: &Path) -> Option<ShellConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config unreadable; using defaults");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &ShellConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_config(dir.path()).is_none());
    }

    #[test]
    fn persisted_config_is_reloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ShellConfig {
            app_url: "https://chat.example.org".into(),
            debug_channel: None,
            ..Default::default()
        };
        persist_config(dir.path(), &config).expect("persist");
        assert_eq!(load_config(dir.path()), Some(config));
    }

    #[test]
    fn first_run_writes_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        load_or_init(dir.path());
        assert!(dir.path().join(CONFIG_FILE).exists());
        assert_eq!(load_config(dir.path()), Some(ShellConfig::default()));
    }

    #[test]
    fn corrupt_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "{ nope").expect("write");
        assert!(load_config(dir.path()).is_none());

        load_or_init(dir.path());
        let kept = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).expect("read");
        assert_eq!(kept, "{ nope");
    }
}
