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

//! EC register map for the Acer Nitro 5 family (AN515-44/46/56/57/58).
//!
//! The map is fixed for this controller family and never discovered at
//! runtime. All offsets address single bytes in the EC register space.

use serde::Serialize;

/// Write 0x11 here before any mutating register access.
pub const REG_WRITE_ENABLE: u64 = 0x03;
pub const WRITE_ENABLE_CODE: u8 = 0x11;

/// GPU fan mode: 0x10 auto, 0x20 max, 0x30 custom.
pub const REG_GPU_FAN_MODE: u64 = 0x21;
/// CPU fan mode: 0x04 auto, 0x08 max, 0x0c custom.
pub const REG_CPU_FAN_MODE: u64 = 0x22;

/// Fan duty in percent, 0-100.
pub const REG_CPU_FAN_PCT: u64 = 0x37;
pub const REG_GPU_FAN_PCT: u64 = 0x3a;

// RPM registers are 8- or 16-bit depending on the model; the high byte is
// combined when present and plausible.
pub const REG_CPU_FAN_RPM_LO: u64 = 0x13;
pub const REG_CPU_FAN_RPM_HI: u64 = 0x14;
pub const REG_GPU_FAN_RPM_LO: u64 = 0x15;
pub const REG_GPU_FAN_RPM_HI: u64 = 0x16;

/// One of the two independently controlled fan subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDomain {
    Cpu,
    Gpu,
}

impl FanDomain {
    pub fn mode_register(self) -> u64 {
        match self {
            FanDomain::Cpu => REG_CPU_FAN_MODE,
            FanDomain::Gpu => REG_GPU_FAN_MODE,
        }
    }

    pub fn percent_register(self) -> u64 {
        match self {
            FanDomain::Cpu => REG_CPU_FAN_PCT,
            FanDomain::Gpu => REG_GPU_FAN_PCT,
        }
    }

    /// RPM low register and the optional high register for 16-bit models.
    pub fn rpm_registers(self) -> (u64, Option<u64>) {
        match self {
            FanDomain::Cpu => (REG_CPU_FAN_RPM_LO, Some(REG_CPU_FAN_RPM_HI)),
            FanDomain::Gpu => (REG_GPU_FAN_RPM_LO, Some(REG_GPU_FAN_RPM_HI)),
        }
    }
}

/// Fan control mode as encoded in the per-domain mode registers.
///
/// The byte codes differ between domains; the codes are never compared
/// across domains except when deriving the aggregate mode label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    Auto,
    Max,
    Custom,
}

impl FanMode {
    /// Register byte for this mode in the given domain.
    pub fn code(self, domain: FanDomain) -> u8 {
        match (domain, self) {
            (FanDomain::Cpu, FanMode::Auto) => 0x04,
            (FanDomain::Cpu, FanMode::Max) => 0x08,
            (FanDomain::Cpu, FanMode::Custom) => 0x0c,
            (FanDomain::Gpu, FanMode::Auto) => 0x10,
            (FanDomain::Gpu, FanMode::Max) => 0x20,
            (FanDomain::Gpu, FanMode::Custom) => 0x30,
        }
    }

    /// Decode a mode register byte for the given domain. Unknown bytes
    /// (including the other domain's codes) yield `None`.
    pub fn from_code(domain: FanDomain, code: u8) -> Option<FanMode> {
        match (domain, code) {
            (FanDomain::Cpu, 0x04) | (FanDomain::Gpu, 0x10) => Some(FanMode::Auto),
            (FanDomain::Cpu, 0x08) | (FanDomain::Gpu, 0x20) => Some(FanMode::Max),
            (FanDomain::Cpu, 0x0c) | (FanDomain::Gpu, 0x30) => Some(FanMode::Custom),
            _ => None,
        }
    }
}
