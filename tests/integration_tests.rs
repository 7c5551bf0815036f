/*
 * Integration tests for Nitroctl
 *
 * These tests drive the public controller API end-to-end against a
 * simulated EC register store (a plain file standing in for the kernel
 * node) and verify the interaction between modules.
 */

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use tempfile::{NamedTempFile, TempDir};

use nitroctl::config::{validate_saved_config, SavedConfig};
use nitroctl::ec::EcController;
use nitroctl::interface::{detect, InterfaceKind};
use nitroctl::registers::{
    REG_CPU_FAN_MODE, REG_CPU_FAN_PCT, REG_GPU_FAN_MODE, REG_GPU_FAN_PCT, REG_WRITE_ENABLE,
    WRITE_ENABLE_CODE,
};
use nitroctl::status::FanModeLabel;

// Test utilities

fn make_register_store() -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(&[0u8; 256]).unwrap();
    f.flush().unwrap();
    f
}

fn controller_for(store: &NamedTempFile) -> EcController {
    EcController::with_candidates(vec![(
        store.path().to_path_buf(),
        InterfaceKind::DebugFs,
    )])
}

fn poke(store: &NamedTempFile, offset: u64, value: u8) {
    let mut f = OpenOptions::new().write(true).open(store.path()).unwrap();
    f.seek(SeekFrom::Start(offset)).unwrap();
    f.write_all(&[value]).unwrap();
}

#[test]
fn test_custom_fans_roundtrip_for_every_percent() {
    let store = make_register_store();
    let mut ctl = controller_for(&store);

    for p in 0..=100u8 {
        assert!(ctl.set_custom_fans(p, p), "set_custom_fans({p},{p}) failed");
        let info = ctl.get_fan_info();
        assert_eq!(info.mode, FanModeLabel::Custom);
        assert_eq!(info.cpu_percent, Some(p));
        assert_eq!(info.gpu_percent, Some(p));
    }
}

#[test]
fn test_out_of_range_percent_leaves_store_untouched() {
    let store = make_register_store();
    let before = fs::read(store.path()).unwrap();
    let mut ctl = controller_for(&store);

    for p in [101u8, 150, 255] {
        assert!(!ctl.set_custom_fans(p, 50));
        assert!(!ctl.set_custom_fans(50, p));
    }
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn test_boost_roundtrip_reads_back_max_codes() {
    let store = make_register_store();
    let mut ctl = controller_for(&store);

    assert!(ctl.set_cooler_boost(true));
    assert_eq!(ctl.read_register(REG_CPU_FAN_MODE), Some(0x08));
    assert_eq!(ctl.read_register(REG_GPU_FAN_MODE), Some(0x20));
    assert_eq!(ctl.get_cooler_boost_status(), Some(true));

    let info = ctl.get_fan_info();
    assert_eq!(info.mode, FanModeLabel::Max);
    assert_eq!(info.cooler_boost, Some(true));
    assert_eq!(info.cpu_cooler_boost, Some(true));
    assert_eq!(info.gpu_cooler_boost, Some(true));
}

#[test]
fn test_boost_status_false_for_mixed_modes() {
    let store = make_register_store();
    let mut ctl = controller_for(&store);

    // CPU maxed, GPU auto: readable, so false rather than unknown
    poke(&store, REG_CPU_FAN_MODE, 0x08);
    poke(&store, REG_GPU_FAN_MODE, 0x10);
    assert_eq!(ctl.get_cooler_boost_status(), Some(false));
}

#[test]
fn test_aggregate_mode_unknown_for_disagreeing_domains() {
    let store = make_register_store();
    let mut ctl = controller_for(&store);

    poke(&store, REG_CPU_FAN_MODE, 0x04); // auto
    poke(&store, REG_GPU_FAN_MODE, 0x20); // max

    let info = ctl.get_fan_info();
    assert_eq!(info.mode, FanModeLabel::Unknown);
}

#[test]
fn test_estimated_rpm_from_percent_when_no_direct_reading() {
    let store = make_register_store();
    let mut ctl = controller_for(&store);

    // RPM registers are zero (implausible); percent 50 estimates 2750
    poke(&store, REG_CPU_FAN_PCT, 50);
    poke(&store, REG_GPU_FAN_PCT, 50);

    let info = ctl.get_fan_info();
    assert_eq!(info.cpu_rpm, Some(2750));
    assert_eq!(info.gpu_rpm, Some(2750));
}

#[test]
fn test_implausible_raw_rpm_is_absent() {
    // Store truncated right after the RPM registers: mode and percent reads
    // hit EOF, so no estimate can stand in for the discarded raw values.
    let mut store = NamedTempFile::new().unwrap();
    store.write_all(&[0u8; 0x17]).unwrap();
    store.flush().unwrap();
    let mut ctl = controller_for(&store);

    // CPU raw RPM = 65001 (0xfde9), GPU raw RPM = 0: both discarded
    poke(&store, 0x13, 0xe9);
    poke(&store, 0x14, 0xfd);

    let info = ctl.get_fan_info();
    assert_eq!(info.cpu_rpm, None);
    assert_eq!(info.gpu_rpm, None);
    assert_eq!(info.cpu_percent, None);
    assert_eq!(info.mode, FanModeLabel::Unknown);
}

#[test]
fn test_detect_unavailable_when_no_candidate_exists() {
    let dir = TempDir::new().unwrap();
    let result = detect(&[
        (dir.path().join("io"), InterfaceKind::DebugFs),
        (dir.path().join("ec"), InterfaceKind::CharDev),
    ]);
    assert!(result.is_none());
}

#[test]
fn test_every_mutating_operation_rearms_the_gate() {
    let store = make_register_store();
    let mut ctl = controller_for(&store);

    assert!(ctl.set_cooler_boost(true));
    // Clear the gate byte behind the controller's back
    poke(&store, REG_WRITE_ENABLE, 0x00);

    assert!(ctl.set_custom_fans(25, 25));
    let bytes = fs::read(store.path()).unwrap();
    assert_eq!(bytes[REG_WRITE_ENABLE as usize], WRITE_ENABLE_CODE);
}

#[test]
fn test_snapshot_serializes_for_the_cli() {
    let store = make_register_store();
    let mut ctl = controller_for(&store);
    assert!(ctl.set_custom_fans(42, 58));

    let info = ctl.get_fan_info();
    let json = serde_json::to_string(&info).unwrap();
    assert!(json.contains("\"mode\":\"custom\""));
    assert!(json.contains("\"cpu_percent\":42"));
    assert!(json.contains("\"gpu_percent\":58"));
}

#[test]
fn test_controller_from_config_with_ec_path_override() {
    let store = make_register_store();
    let cfg = SavedConfig {
        verify_writes: true,
        logging: false,
        ec_path: Some(PathBuf::from(store.path())),
    };
    assert!(validate_saved_config(&cfg).is_ok());

    let mut ctl = EcController::from_config(&cfg);
    assert!(ctl.set_custom_fans(10, 20));
    let bytes = fs::read(store.path()).unwrap();
    assert_eq!(bytes[REG_CPU_FAN_PCT as usize], 10);
    assert_eq!(bytes[REG_GPU_FAN_PCT as usize], 20);
}

#[test]
fn test_interface_revocation_degrades_and_recovers() {
    let dir = TempDir::new().unwrap();
    let node = dir.path().join("io");
    fs::write(&node, [0u8; 256]).unwrap();

    let mut ctl = EcController::with_candidates(vec![(node.clone(), InterfaceKind::DebugFs)]);
    assert!(ctl.set_cooler_boost(true));
    assert_eq!(ctl.get_cooler_boost_status(), Some(true));

    fs::remove_file(&node).unwrap();
    assert_eq!(ctl.get_cooler_boost_status(), None);
    assert!(!ctl.set_custom_fans(50, 50));

    fs::write(&node, [0u8; 256]).unwrap();
    assert!(ctl.set_custom_fans(50, 50));
    assert_eq!(ctl.get_fan_info().mode, FanModeLabel::Custom);
}
