/*
 * This file is part of Nitroctl.
 *
 * Copyright (C) 2025 Nitroctl contributors
 *
 * Nitroctl is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Nitroctl is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Nitroctl. If not, see <https://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Optional user configuration. Everything defaults so a missing or empty
/// file behaves like no file at all.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedConfig {
    /// Require every register write of a mutating operation to succeed
    /// instead of trusting the write gate alone.
    #[serde(default)]
    pub verify_writes: bool,
    /// Enable the JSON event log.
    #[serde(default)]
    pub logging: bool,
    /// Override the EC node path on systems exposing it somewhere unusual.
    #[serde(default)]
    pub ec_path: Option<PathBuf>,
}

impl Default for SavedConfig {
    fn default() -> Self {
        SavedConfig {
            verify_writes: false,
            logging: false,
            ec_path: None,
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("nitroctl").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("nitroctl")
            .join("config.json");
    }
    PathBuf::from("/etc/nitroctl/config.json")
}

/// Load the config, silently falling back to defaults when the file is
/// missing or unparsable.
pub fn load_saved_config() -> SavedConfig {
    let path = config_path();
    let Ok(data) = fs::read_to_string(&path) else {
        return SavedConfig::default();
    };
    match serde_json::from_str::<SavedConfig>(&data) {
        Ok(cfg) if validate_saved_config(&cfg).is_ok() => cfg,
        _ => SavedConfig::default(),
    }
}

pub fn save_config(cfg: &SavedConfig) -> io::Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(cfg).unwrap_or_else(|_| "{}".to_string());
    fs::write(path, json)
}

pub fn validate_saved_config(cfg: &SavedConfig) -> Result<(), String> {
    if let Some(path) = &cfg.ec_path {
        if !path.is_absolute() {
            return Err("ec_path must be absolute".to_string());
        }
    }
    Ok(())
}
