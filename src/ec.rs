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

//! EC register access and the fan mode controller.
//!
//! Register state is owned by the hardware; every read re-queries it and no
//! write result is cached. All I/O failures are absorbed at the accessor
//! boundary and surface to callers only as `None`/`false` — nothing past
//! this layer returns an `Err` for a register access.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::config::SavedConfig;
use crate::interface::{self, EcError, EcInterface, InterfaceKind};
use crate::logger;
use crate::registers::{
    FanDomain, FanMode, REG_CPU_FAN_MODE, REG_GPU_FAN_MODE, REG_WRITE_ENABLE, WRITE_ENABLE_CODE,
};
use crate::status::{self, FanInfo};
use crate::system;

/// Read one byte at `offset`. Fresh open/seek/read/close per call; no
/// persistent handle is kept, trading per-call overhead for robustness
/// against interface resets or revocation.
pub fn read_byte(path: &Path, offset: u64) -> Option<u8> {
    let attempt = || -> io::Result<Option<u8>> {
        let mut f = File::open(path)?;
        f.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; 1];
        let n = f.read(&mut buf)?;
        Ok(if n == 1 { Some(buf[0]) } else { None })
    };
    match attempt() {
        Ok(b) => b,
        Err(e) => {
            logger::log_event(
                "ec_read_failed",
                json!({ "offset": offset, "error": e.to_string() }),
            );
            None
        }
    }
}

/// Write one byte at `offset`. Same open/seek/transfer/close cycle as
/// [`read_byte`]; permission, absence, and generic I/O errors all collapse
/// to `false`.
pub fn write_byte(path: &Path, offset: u64, value: u8) -> bool {
    let attempt = || -> io::Result<()> {
        let mut f = OpenOptions::new().read(true).write(true).open(path)?;
        f.seek(SeekFrom::Start(offset))?;
        f.write_all(&[value])?;
        Ok(())
    };
    match attempt() {
        Ok(()) => true,
        Err(e) => {
            logger::log_event(
                "ec_write_failed",
                json!({ "offset": offset, "value": value, "error": e.to_string() }),
            );
            false
        }
    }
}

/// Fan controller for the Nitro 5 EC.
///
/// Owns the lazily resolved interface handle. Every mutating operation
/// re-arms the write gate; the EC may require re-arming between operations,
/// so the gate result is never cached.
pub struct EcController {
    candidates: Vec<(PathBuf, InterfaceKind)>,
    iface: Option<EcInterface>,
    verify_writes: bool,
}

impl Default for EcController {
    fn default() -> Self {
        Self::new()
    }
}

impl EcController {
    pub fn new() -> Self {
        Self::with_candidates(interface::default_candidates())
    }

    /// Controller probing the given candidate nodes instead of the system
    /// defaults. Also the seam the tests use to point at a simulated
    /// register store.
    pub fn with_candidates(candidates: Vec<(PathBuf, InterfaceKind)>) -> Self {
        EcController {
            candidates,
            iface: None,
            verify_writes: false,
        }
    }

    pub fn from_config(cfg: &SavedConfig) -> Self {
        let mut ctl = match &cfg.ec_path {
            Some(path) => Self::with_candidates(vec![(path.clone(), InterfaceKind::DebugFs)]),
            None => Self::new(),
        };
        ctl.verify_writes = cfg.verify_writes;
        ctl
    }

    /// When on, mutating operations require every individual register write
    /// to succeed instead of reporting success from the gate alone.
    pub fn set_verify_writes(&mut self, on: bool) {
        self.verify_writes = on;
    }

    /// Resolved interface path. Cached after the first probe; invalidated
    /// and re-resolved when the cached path no longer exists.
    fn interface_path(&mut self) -> Option<PathBuf> {
        if self.iface.as_ref().map_or(false, |i| !i.path.exists()) {
            self.iface = None;
        }
        if self.iface.is_none() {
            self.iface = interface::detect(&self.candidates);
        }
        self.iface.as_ref().map(|i| i.path.clone())
    }

    pub fn read_register(&mut self, offset: u64) -> Option<u8> {
        let path = self.interface_path()?;
        read_byte(&path, offset)
    }

    pub fn write_register(&mut self, offset: u64, value: u8) -> bool {
        let Some(path) = self.interface_path() else {
            return false;
        };
        write_byte(&path, offset, value)
    }

    /// Arm the EC for mutating writes. Must succeed before any other
    /// register write of the same operation; on failure the operation
    /// aborts without touching further registers.
    fn enable_write(&mut self) -> bool {
        self.write_register(REG_WRITE_ENABLE, WRITE_ENABLE_CODE)
    }

    /// Availability check for the surrounding application: root first, one
    /// modprobe remediation attempt, then a final probe. The message is the
    /// user-facing diagnostic.
    pub fn is_available(&mut self) -> (bool, String) {
        match self.check_available() {
            Ok(()) => (true, "OK".to_string()),
            Err(e) => (false, e.to_string()),
        }
    }

    fn check_available(&mut self) -> Result<(), EcError> {
        if !system::is_root() {
            return Err(EcError::PrivilegeRequired);
        }

        if system::modprobe_ec_sys() {
            // A freshly loaded module can expose the debugfs node; drop any
            // stale handle so the probe below sees it.
            self.iface = None;
        }

        if self.interface_path().is_none() {
            if system::cmdline_has_ec_write_support() {
                return Err(EcError::InterfaceMissingConfigured);
            }
            return Err(EcError::InterfaceMissing);
        }
        Ok(())
    }

    /// Set Cooler Boost (max fan speed) for both domains together.
    pub fn set_cooler_boost(&mut self, enabled: bool) -> bool {
        self.set_cooler_boost_individual(enabled, enabled)
    }

    /// Set Cooler Boost per domain. Non-boosted domains fall back to auto.
    ///
    /// Reports success from the write gate alone unless `verify_writes` is
    /// on; a partial application (CPU written, GPU failed) counts as
    /// success in the default mode.
    pub fn set_cooler_boost_individual(&mut self, cpu_max: bool, gpu_max: bool) -> bool {
        if !self.enable_write() {
            return false;
        }

        // Current modes read as a hook for future partial-preserve logic;
        // the values are deliberately unused.
        let _ = self.read_register(REG_CPU_FAN_MODE);
        let _ = self.read_register(REG_GPU_FAN_MODE);

        let cpu_mode = if cpu_max { FanMode::Max } else { FanMode::Auto };
        let gpu_mode = if gpu_max { FanMode::Max } else { FanMode::Auto };

        let cpu_ok = self.write_register(REG_CPU_FAN_MODE, cpu_mode.code(FanDomain::Cpu));
        let gpu_ok = self.write_register(REG_GPU_FAN_MODE, gpu_mode.code(FanDomain::Gpu));
        logger::log_event(
            "cooler_boost",
            json!({ "cpu_max": cpu_max, "gpu_max": gpu_max, "cpu_ok": cpu_ok, "gpu_ok": gpu_ok }),
        );

        if self.verify_writes {
            cpu_ok && gpu_ok
        } else {
            true
        }
    }

    /// Set the same custom duty for both domains.
    pub fn set_custom_fan(&mut self, percent: u8) -> bool {
        self.set_custom_fans(percent, percent)
    }

    /// Switch both domains to custom mode with independent duties.
    /// Percentages above 100 are rejected before any register is touched.
    /// No rollback is performed on partial failure.
    pub fn set_custom_fans(&mut self, cpu_percent: u8, gpu_percent: u8) -> bool {
        if cpu_percent > 100 || gpu_percent > 100 {
            return false;
        }
        if !self.enable_write() {
            return false;
        }

        let gpu_mode_ok =
            self.write_register(REG_GPU_FAN_MODE, FanMode::Custom.code(FanDomain::Gpu));
        let cpu_mode_ok =
            self.write_register(REG_CPU_FAN_MODE, FanMode::Custom.code(FanDomain::Cpu));
        let cpu_pct_ok = self.write_register(FanDomain::Cpu.percent_register(), cpu_percent);
        let gpu_pct_ok = self.write_register(FanDomain::Gpu.percent_register(), gpu_percent);
        logger::log_event(
            "custom_fans",
            json!({
                "cpu_percent": cpu_percent,
                "gpu_percent": gpu_percent,
                "writes_ok": cpu_mode_ok && gpu_mode_ok && cpu_pct_ok && gpu_pct_ok,
            }),
        );

        if self.verify_writes {
            gpu_mode_ok && cpu_mode_ok && cpu_pct_ok && gpu_pct_ok
        } else {
            true
        }
    }

    /// `Some(true)` iff both domains read exactly their max codes; `None`
    /// when either mode register is unreadable.
    pub fn get_cooler_boost_status(&mut self) -> Option<bool> {
        let cpu = self.read_register(REG_CPU_FAN_MODE)?;
        let gpu = self.read_register(REG_GPU_FAN_MODE)?;
        Some(
            cpu == FanMode::Max.code(FanDomain::Cpu) && gpu == FanMode::Max.code(FanDomain::Gpu),
        )
    }

    /// Rebuild the logical fan snapshot from the current register values.
    pub fn get_fan_info(&mut self) -> FanInfo {
        let cpu_mode_raw = self.read_register(REG_CPU_FAN_MODE);
        let gpu_mode_raw = self.read_register(REG_GPU_FAN_MODE);
        let cpu_percent = self.read_register(FanDomain::Cpu.percent_register());
        let gpu_percent = self.read_register(FanDomain::Gpu.percent_register());

        let cpu_mode = cpu_mode_raw.and_then(|c| FanMode::from_code(FanDomain::Cpu, c));
        let gpu_mode = gpu_mode_raw.and_then(|c| FanMode::from_code(FanDomain::Gpu, c));

        let cpu_boost = cpu_mode_raw.map(|c| c == FanMode::Max.code(FanDomain::Cpu));
        let gpu_boost = gpu_mode_raw.map(|c| c == FanMode::Max.code(FanDomain::Gpu));
        let cooler_boost = match (cpu_boost, gpu_boost) {
            (Some(c), Some(g)) => Some(c && g),
            _ => None,
        };

        // Direct RPM when the registers respond plausibly, else estimate
        // from the duty percentage.
        let cpu_rpm = self
            .read_fan_rpm(FanDomain::Cpu)
            .or_else(|| cpu_percent.map(status::estimate_rpm));
        let gpu_rpm = self
            .read_fan_rpm(FanDomain::Gpu)
            .or_else(|| gpu_percent.map(status::estimate_rpm));

        FanInfo {
            mode: status::aggregate_mode(cpu_mode, gpu_mode),
            cpu_percent,
            gpu_percent,
            cpu_rpm,
            gpu_rpm,
            cooler_boost,
            cpu_cooler_boost: cpu_boost,
            gpu_cooler_boost: gpu_boost,
        }
    }

    fn read_fan_rpm(&mut self, domain: FanDomain) -> Option<u16> {
        let (lo_reg, hi_reg) = domain.rpm_registers();
        let lo = self.read_register(lo_reg)?;
        let hi = hi_reg.and_then(|r| self.read_register(r));
        status::plausible_rpm(status::combine_rpm(lo, hi))
    }
}
