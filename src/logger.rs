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

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

const DEFAULT_LOG_PATH: &str = "/etc/nitroctl/logs.json";
const FALLBACK_LOG_PATH: &str = "/tmp/nitroctl_logs.json";

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

pub fn init_logging() {
    // Ensure directory exists
    if let Some(parent) = Path::new(DEFAULT_LOG_PATH).parent() {
        let _ = fs::create_dir_all(parent);
    }
    // Open file append
    match OpenOptions::new().create(true).append(true).open(DEFAULT_LOG_PATH) {
        Ok(f) => {
            if let Ok(mut guard) = LOG_FILE.lock() {
                *guard = Some(f);
            }
        }
        Err(_e) => {
            // Last resort: fall back to /tmp if /etc is unavailable (silent)
            if let Ok(f) = OpenOptions::new().create(true).append(true).open(FALLBACK_LOG_PATH) {
                if let Ok(mut guard) = LOG_FILE.lock() {
                    *guard = Some(f);
                }
            }
        }
    }
}

/// Emit one JSON event line. No-op unless the logger was initialized or the
/// /tmp fallback is writable.
pub fn log_event(event: &str, data: Value) {
    let line = json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string();

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(f) = guard.as_mut() {
            let _ = writeln!(f, "{}", line);
            return;
        }
    }
    // If logger not initialized, write to /tmp silently
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(FALLBACK_LOG_PATH) {
        let _ = writeln!(f, "{}", line);
    }
}
