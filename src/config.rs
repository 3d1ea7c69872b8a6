/*
 * This file is part of Pulseboard.
 *
 * Copyright (C) 2025 Pulseboard contributors
 *
 * Pulseboard is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pulseboard is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pulseboard. If not, see <https://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_BASE_URL;

pub const API_URL_ENV: &str = "PULSEBOARD_API_URL";

fn default_api_base_url() -> String { DEFAULT_API_BASE_URL.to_string() }
fn default_tick_rate_ms() -> u64 { 100 }
fn default_min_card_width() -> u16 { 30 }
fn default_card_height() -> u16 { 9 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// UI loop poll interval
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_min_card_width")]
    pub min_card_width: u16,
    #[serde(default = "default_card_height")]
    pub card_height: u16,
    /// Render `↓` for negative deltas instead of always `↑`.
    #[serde(default)]
    pub signed_delta_arrow: bool,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            tick_rate_ms: default_tick_rate_ms(),
            min_card_width: default_min_card_width(),
            card_height: default_card_height(),
            signed_delta_arrow: false,
            log_path: None,
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("pulseboard").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("pulseboard")
            .join("config.json");
    }
    PathBuf::from("/etc/pulseboard/config.json")
}

pub fn validate_config(cfg: &Config) -> Result<(), String> {
    let url = cfg.api_base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err("api_base_url must start with http:// or https://".to_string());
    }
    if url.len() > 2048 {
        return Err("api_base_url too long".to_string());
    }
    if !(10..=5000).contains(&cfg.tick_rate_ms) {
        return Err("tick_rate_ms out of range (10..5000)".to_string());
    }
    if !(12..=200).contains(&cfg.min_card_width) {
        return Err("min_card_width out of range (12..200)".to_string());
    }
    if !(5..=40).contains(&cfg.card_height) {
        return Err("card_height out of range (5..40)".to_string());
    }
    Ok(())
}

pub fn try_load_config(path: &Path) -> Result<Config, String> {
    let data = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let cfg: Config = serde_json::from_str(&data).map_err(|e| format!("parse error: {}", e))?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Config from `path` (or the default location), with the environment
/// override applied. Falls back to defaults when the file is missing or
/// invalid; the second value carries the reason in that case.
pub fn load_config(path: Option<&Path>) -> (Config, Option<String>) {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    let (mut cfg, problem) = match try_load_config(&path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (Config::default(), Some(format!("{}: {}", path.display(), e))),
    };
    if let Ok(url) = env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            cfg.api_base_url = url.trim().to_string();
        }
    }
    (cfg, problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert!(!cfg.signed_delta_arrow);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let f = write_config(r#"{"api_base_url":"http://localhost:3000","signed_delta_arrow":true}"#);
        let cfg = try_load_config(f.path()).unwrap();
        assert_eq!(cfg.api_base_url, "http://localhost:3000");
        assert!(cfg.signed_delta_arrow);
        assert_eq!(cfg.tick_rate_ms, 100);
        assert_eq!(cfg.card_height, 9);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let f = write_config(r#"{"api_base_url":"http://x","refresh":5}"#);
        assert!(try_load_config(f.path()).unwrap_err().contains("parse error"));
    }

    #[test]
    fn test_validate_config_ranges() {
        let mut cfg = Config::default();
        cfg.api_base_url = "ftp://x".to_string();
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.tick_rate_ms = 1;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.min_card_width = 5;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.card_height = 100;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    #[serial]
    fn test_config_path_with_xdg() {
        env::set_var("XDG_CONFIG_HOME", "/custom/config");
        let path = config_path();
        assert_eq!(path, PathBuf::from("/custom/config/pulseboard/config.json"));
        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_load_config_missing_file_falls_back() {
        env::remove_var(API_URL_ENV);
        let dir = tempfile::tempdir().unwrap();
        let (cfg, problem) = load_config(Some(&dir.path().join("nope.json")));
        assert_eq!(cfg, Config::default());
        assert!(problem.is_some());
    }

    #[test]
    #[serial]
    fn test_env_overrides_api_url() {
        let f = write_config(r#"{"api_base_url":"http://from-file"}"#);
        env::set_var(API_URL_ENV, "http://from-env:8080");
        let (cfg, problem) = load_config(Some(f.path()));
        env::remove_var(API_URL_ENV);
        assert!(problem.is_none());
        assert_eq!(cfg.api_base_url, "http://from-env:8080");
    }
}
