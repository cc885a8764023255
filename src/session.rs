// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Device session startup.
//!
//! A [`Session`] owns the ranging device for the lifetime of the process. It
//! is only constructed through [`Session::open`], which boots the sensor,
//! checks its identity and applies the configuration before starting
//! continuous measurement. Any failure during this sequence is fatal.

use crate::{
    config::{Config, TimingBudget},
    device::{DistanceMode, RangingDevice, DEFAULT_ADDRESS},
    error::Error,
};
use tracing::{debug, info};

pub struct Session<D: RangingDevice> {
    device: D,
    address: u8,
    distance_mode: DistanceMode,
    timing_budget: TimingBudget,
}

impl<D: RangingDevice> Session<D> {
    /// Bring up the sensor and start continuous ranging.
    ///
    /// `device` must be connected at [`DEFAULT_ADDRESS`].
    pub fn open(mut device: D, config: &Config) -> Result<Self, Error> {
        device.wait_booted()?;
        device.data_init()?;

        let identity = device.read_identity()?;
        info!(
            "device info: module type 0x{:02X}, model id 0x{:02X}",
            identity.module_type, identity.model_id
        );
        if !identity.is_supported() {
            return Err(Error::UnsupportedDevice {
                module_type: identity.module_type,
                model_id: identity.model_id,
            });
        }
        info!("model name: VL53L3CX");

        let mut address = DEFAULT_ADDRESS;
        if config.address != DEFAULT_ADDRESS {
            info!("switching to I2C address 0x{:02X}", config.address);
            device.set_address(config.address)?;
            address = config.address;
        } else {
            debug!("using default I2C address 0x{:02X}", DEFAULT_ADDRESS);
        }

        if config.distance_mode != DistanceMode::default() {
            info!("setting distance mode to {}", config.distance_mode);
            device.set_distance_mode(config.distance_mode)?;
        }

        if !config.timing_budget.is_default() {
            info!("setting timing budget to {}", config.timing_budget);
            device.set_timing_budget_us(config.timing_budget.us())?;
        }

        device.start_measurement()?;

        Ok(Self {
            device,
            address,
            distance_mode: config.distance_mode,
            timing_budget: config.timing_budget,
        })
    }

    /// Address the device currently answers on.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn distance_mode(&self) -> DistanceMode {
        self.distance_mode
    }

    pub fn timing_budget(&self) -> TimingBudget {
        self.timing_budget
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
