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

//! Derivation of a logical fan-status snapshot from raw register bytes.
//!
//! Everything here is pure so the rules can be tested without hardware.
//! The controller in `ec` performs the reads and feeds them through these
//! functions.

use std::fmt;

use serde::Serialize;

use crate::registers::FanMode;

/// RPM readings of 0 or above this are sensor noise or absent hardware.
pub const RPM_PLAUSIBLE_MAX: u16 = 65000;

/// Heuristic: assume ~5500 RPM at 100% duty when no RPM register responds.
/// Placeholder constant with no calibration basis; estimated values are not
/// distinguished from measured ones in the snapshot.
pub const RPM_PER_PERCENT: u16 = 55;

/// Aggregate mode label across both fan domains.
///
/// Well-defined only when both domains encode the same mode family;
/// disagreement and partial reads collapse to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FanModeLabel {
    Auto,
    Max,
    Custom,
    Unknown,
}

impl fmt::Display for FanModeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FanModeLabel::Auto => "auto",
            FanModeLabel::Max => "max",
            FanModeLabel::Custom => "custom",
            FanModeLabel::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of the logical fan state, rebuilt from registers on every call.
#[derive(Debug, Clone, Serialize)]
pub struct FanInfo {
    pub mode: FanModeLabel,
    pub cpu_percent: Option<u8>,
    pub gpu_percent: Option<u8>,
    pub cpu_rpm: Option<u16>,
    pub gpu_rpm: Option<u16>,
    pub cooler_boost: Option<bool>,
    pub cpu_cooler_boost: Option<bool>,
    pub gpu_cooler_boost: Option<bool>,
}

/// Combine both domains' decoded modes into the aggregate label.
pub fn aggregate_mode(cpu: Option<FanMode>, gpu: Option<FanMode>) -> FanModeLabel {
    match (cpu, gpu) {
        (Some(c), Some(g)) if c == g => match c {
            FanMode::Auto => FanModeLabel::Auto,
            FanMode::Max => FanModeLabel::Max,
            FanMode::Custom => FanModeLabel::Custom,
        },
        _ => FanModeLabel::Unknown,
    }
}

/// Combine a low byte with an optional high byte into a 16-bit RPM value.
pub fn combine_rpm(lo: u8, hi: Option<u8>) -> u16 {
    match hi {
        Some(h) => ((h as u16) << 8) | lo as u16,
        None => lo as u16,
    }
}

/// Filter out implausible raw RPM readings.
pub fn plausible_rpm(raw: u16) -> Option<u16> {
    if raw == 0 || raw > RPM_PLAUSIBLE_MAX {
        None
    } else {
        Some(raw)
    }
}

/// Estimate RPM from a duty percentage when no direct reading is available.
pub fn estimate_rpm(percent: u8) -> u16 {
    percent as u16 * RPM_PER_PERCENT
}
