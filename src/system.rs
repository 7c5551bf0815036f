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

use std::fs;
use std::process::Command;

use serde_json::json;

use crate::logger;

/// Kernel parameter that makes the debugfs EC node writable at boot.
pub const EC_SYS_BOOT_PARAM: &str = "ec_sys.write_support=1";

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// One-shot remediation: load ec_sys with write support enabled.
/// Returns whether modprobe itself succeeded; the caller re-probes the
/// interface afterwards.
pub fn modprobe_ec_sys() -> bool {
    let ok = match Command::new("modprobe")
        .args(["ec_sys", "write_support=1"])
        .output()
    {
        Ok(out) => out.status.success(),
        Err(_) => false,
    };
    logger::log_event("modprobe_ec_sys", json!({ "ok": ok }));
    ok
}

/// Whether write support is already persisted in the kernel command line.
pub fn cmdline_has_ec_write_support() -> bool {
    fs::read_to_string("/proc/cmdline")
        .map(|s| s.contains(EC_SYS_BOOT_PARAM))
        .unwrap_or(false)
}

/// DMI product name, e.g. "Nitro AN515-58". Advisory only; used in logs and
/// status output so users can tell whether their machine is in the supported
/// family.
pub fn read_product_name() -> String {
    let read_trim = |p: &str| -> Option<String> {
        fs::read_to_string(p)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    read_trim("/sys/devices/virtual/dmi/id/product_name")
        .or_else(|| read_trim("/sys/devices/virtual/dmi/id/board_name"))
        .unwrap_or_default()
}
