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

//! Discovery of the EC register interface.
//!
//! The EC register space is reachable through exactly one of two kernel
//! nodes: the ec_sys debugfs file or the acpi_ec character device. Both are
//! read and written identically; which one was picked is kept only as
//! bookkeeping. Existence alone selects a candidate — readability and
//! writability surface at access time, not here.

use std::path::PathBuf;

use serde_json::json;
use thiserror::Error;

use crate::logger;

/// ec_sys debugfs node, preferred when present.
pub const EC_SYS_PATH: &str = "/sys/kernel/debug/ec/ec0/io";
/// acpi_ec character device, the fallback.
pub const EC_DEV_PATH: &str = "/dev/ec";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// ec_sys debugfs I/O node.
    DebugFs,
    /// acpi_ec character device.
    CharDev,
}

/// Resolved register-access resource. Cached by the controller for its
/// lifetime and re-resolved only after an access finds the path gone.
#[derive(Debug, Clone)]
pub struct EcInterface {
    pub path: PathBuf,
    pub kind: InterfaceKind,
}

#[derive(Error, Debug)]
pub enum EcError {
    #[error("root privileges are required (run with sudo)")]
    PrivilegeRequired,
    #[error(
        "EC interface not found.\n\n\
         Configure the kernel:\n\
         1. Edit /etc/default/grub\n\
         2. Add ec_sys.write_support=1 to GRUB_CMDLINE_LINUX_DEFAULT\n\
         3. Run: sudo update-grub\n\
         4. Reboot the system"
    )]
    InterfaceMissing,
    #[error(
        "EC interface not found, although ec_sys.write_support=1 is already \
         in the kernel command line. Ensure debugfs is mounted and the ec_sys \
         module is not blacklisted."
    )]
    InterfaceMissingConfigured,
}

pub fn default_candidates() -> Vec<(PathBuf, InterfaceKind)> {
    vec![
        (PathBuf::from(EC_SYS_PATH), InterfaceKind::DebugFs),
        (PathBuf::from(EC_DEV_PATH), InterfaceKind::CharDev),
    ]
}

/// Probe the candidates in order and select the first that exists.
pub fn detect(candidates: &[(PathBuf, InterfaceKind)]) -> Option<EcInterface> {
    for (path, kind) in candidates {
        if path.exists() {
            logger::log_event(
                "ec_interface",
                json!({ "path": path.display().to_string(), "debugfs": *kind == InterfaceKind::DebugFs }),
            );
            return Some(EcInterface {
                path: path.clone(),
                kind: *kind,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_candidates_order() {
        let candidates = default_candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].0, PathBuf::from("/sys/kernel/debug/ec/ec0/io"));
        assert_eq!(candidates[0].1, InterfaceKind::DebugFs);
        assert_eq!(candidates[1].0, PathBuf::from("/dev/ec"));
        assert_eq!(candidates[1].1, InterfaceKind::CharDev);
    }

    #[test]
    fn test_detect_prefers_first_candidate() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("io");
        let second = dir.path().join("ec");
        fs::write(&first, [0u8; 4]).unwrap();
        fs::write(&second, [0u8; 4]).unwrap();

        let iface = detect(&[
            (first.clone(), InterfaceKind::DebugFs),
            (second, InterfaceKind::CharDev),
        ])
        .unwrap();
        assert_eq!(iface.path, first);
        assert_eq!(iface.kind, InterfaceKind::DebugFs);
    }

    #[test]
    fn test_detect_falls_back_to_second_candidate() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("io");
        let second = dir.path().join("ec");
        fs::write(&second, [0u8; 4]).unwrap();

        let iface = detect(&[
            (first, InterfaceKind::DebugFs),
            (second.clone(), InterfaceKind::CharDev),
        ])
        .unwrap();
        assert_eq!(iface.path, second);
        assert_eq!(iface.kind, InterfaceKind::CharDev);
    }

    #[test]
    fn test_detect_none_when_nothing_exists() {
        let dir = TempDir::new().unwrap();
        let result = detect(&[
            (dir.path().join("io"), InterfaceKind::DebugFs),
            (dir.path().join("ec"), InterfaceKind::CharDev),
        ]);
        assert!(result.is_none());
    }

    #[test]
    fn test_error_messages() {
        assert!(EcError::PrivilegeRequired.to_string().contains("sudo"));
        assert!(EcError::InterfaceMissing
            .to_string()
            .contains("ec_sys.write_support=1"));
        assert!(EcError::InterfaceMissingConfigured
            .to_string()
            .contains("debugfs"));
    }
}
