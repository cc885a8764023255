// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Startup sequencing tests against a scripted device.

mod common;

use common::{calls, MockDevice};
use edgefirst_tofpub::{
    config::{Config, TimingBudget},
    device::{DeviceStatus, DistanceMode, CONTROL_INTERFACE},
    error::Error,
    session::Session,
};

#[test]
fn test_default_config_skips_writes() {
    let device = MockDevice::new();
    let log = device.log();

    let session = Session::open(device, &Config::default()).unwrap();

    assert_eq!(
        calls(&log),
        vec!["wait_booted", "data_init", "read_identity", "start_measurement"]
    );
    assert_eq!(session.address(), 0x29);
    assert_eq!(session.distance_mode(), DistanceMode::Medium);
    assert!(session.timing_budget().is_default());
}

#[test]
fn test_configured_sequence() {
    let device = MockDevice::new();
    let log = device.log();
    let config = Config {
        address: 0x30,
        distance_mode: DistanceMode::Long,
        timing_budget: TimingBudget::new(200).unwrap(),
        ..Default::default()
    };

    let session = Session::open(device, &config).unwrap();

    assert_eq!(
        calls(&log),
        vec![
            "wait_booted",
            "data_init",
            "read_identity",
            "set_address",
            "set_distance_mode",
            "set_timing_budget_us",
            "start_measurement",
        ]
    );
    assert_eq!(session.address(), 0x30);
    assert_eq!(session.distance_mode(), DistanceMode::Long);
    assert_eq!(session.timing_budget().ms(), 200);
}

#[test]
fn test_unsupported_device() {
    let device = MockDevice::new().with_identity(0xAA, 0xCC);
    let log = device.log();
    let config = Config {
        distance_mode: DistanceMode::Short,
        ..Default::default()
    };

    let err = Session::open(device, &config).err().unwrap();

    assert!(matches!(
        err,
        Error::UnsupportedDevice {
            module_type: 0xAA,
            model_id: 0xCC
        }
    ));
    assert_eq!(calls(&log), vec!["wait_booted", "data_init", "read_identity"]);
}

#[test]
fn test_address_change_rejected() {
    let device = MockDevice::new().failing("set_address", CONTROL_INTERFACE);
    let log = device.log();
    let config = Config {
        address: 0x31,
        distance_mode: DistanceMode::Short,
        ..Default::default()
    };

    let err = Session::open(device, &config).err().unwrap();

    assert!(matches!(err, Error::Device(status) if status == CONTROL_INTERFACE));
    // Nothing is configured after the failed address change.
    assert_eq!(calls(&log).last(), Some(&"set_address"));
    assert!(!calls(&log).contains(&"start_measurement"));
}

#[test]
fn test_boot_failure() {
    let device = MockDevice::new().failing("wait_booted", DeviceStatus(-7));
    let log = device.log();

    let err = Session::open(device, &Config::default()).err().unwrap();

    assert_eq!(err.to_string(), "device error: ERROR: TIME OUT");
    assert_eq!(calls(&log), vec!["wait_booted"]);
}

#[test]
fn test_start_failure_is_fatal() {
    let device = MockDevice::new().failing("start_measurement", DeviceStatus(-5));
    assert!(matches!(
        Session::open(device, &Config::default()),
        Err(Error::Device(DeviceStatus(-5)))
    ));
}
