// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! VL53LX bare driver backend.
//!
//! Wraps the ST VL53LX C driver compiled by `build.rs` with its Linux I2C
//! platform layer. Every driver call maps its status through
//! [`DeviceStatus::check`].

use crate::{
    device::{
        DeviceStatus, DistanceMode, HistogramBins, Identity, MeasurementFrame, RangeObject,
        RangingDevice, HISTOGRAM_BUFFER_SIZE, MAX_OBJECTS,
    },
    error::Error,
};
use std::{ffi::CString, os::unix::ffi::OsStrExt as _, path::Path};
use tracing::debug;

#[allow(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    dead_code,
    clippy::all
)]
mod ffi {
    include!(concat!(env!("OUT_DIR"), "/vl53lx_bindings.rs"));
}

// VL53LX_DistanceModes values, defined through casts bindgen cannot evaluate.
const DISTANCEMODE_SHORT: u8 = 1;
const DISTANCEMODE_MEDIUM: u8 = 2;
const DISTANCEMODE_LONG: u8 = 3;

pub struct Vl53lx {
    dev: Box<ffi::VL53LX_Dev_t>,
}

// The device struct is only reachable through this owner.
unsafe impl Send for Vl53lx {}

impl Vl53lx {
    /// Open `bus` and address the sensor at `address`.
    pub fn open(bus: &Path, address: u8) -> Result<Self, Error> {
        let path = CString::new(bus.as_os_str().as_bytes())
            .map_err(|_| Error::Bus(format!("invalid bus path {}", bus.display())))?;

        let mut dev: Box<ffi::VL53LX_Dev_t> = Box::default();
        dev.i2c_slave_address = address;
        // SAFETY: path outlives the call, the platform layer copies nothing.
        let fd = unsafe { ffi::VL53LX_i2c_init(path.as_ptr() as *mut _, address as _) };
        if fd < 0 {
            return Err(Error::Bus(format!(
                "cannot open {} at 0x{:02X}",
                bus.display(),
                address
            )));
        }
        dev.fd = fd;
        debug!("opened {} fd {} at 0x{:02X}", bus.display(), fd, address);

        Ok(Self { dev })
    }

    fn handle(&mut self) -> ffi::VL53LX_DEV {
        &mut *self.dev
    }
}

impl Drop for Vl53lx {
    fn drop(&mut self) {
        if self.dev.fd >= 0 {
            // SAFETY: fd was returned by the platform layer and is owned here.
            unsafe { libc::close(self.dev.fd) };
        }
    }
}

impl RangingDevice for Vl53lx {
    fn wait_booted(&mut self) -> Result<(), DeviceStatus> {
        DeviceStatus::check(unsafe { ffi::VL53LX_WaitDeviceBooted(self.handle()) })
    }

    fn data_init(&mut self) -> Result<(), DeviceStatus> {
        DeviceStatus::check(unsafe { ffi::VL53LX_DataInit(self.handle()) })
    }

    fn read_identity(&mut self) -> Result<Identity, DeviceStatus> {
        // Populated from NVM by DataInit.
        let nvm = &self.dev.Data.LLData.nvm_copy_data;
        Ok(Identity {
            module_type: nvm.identification__module_type,
            model_id: nvm.identification__model_id,
        })
    }

    fn set_address(&mut self, address: u8) -> Result<(), DeviceStatus> {
        // The driver takes the 8-bit form of the address.
        DeviceStatus::check(unsafe { ffi::VL53LX_SetDeviceAddress(self.handle(), address << 1) })?;
        self.dev.i2c_slave_address = address;
        Ok(())
    }

    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), DeviceStatus> {
        let mode = match mode {
            DistanceMode::Short => DISTANCEMODE_SHORT,
            DistanceMode::Medium => DISTANCEMODE_MEDIUM,
            DistanceMode::Long => DISTANCEMODE_LONG,
        };
        DeviceStatus::check(unsafe { ffi::VL53LX_SetDistanceMode(self.handle(), mode) })
    }

    fn set_timing_budget_us(&mut self, us: u32) -> Result<(), DeviceStatus> {
        DeviceStatus::check(unsafe {
            ffi::VL53LX_SetMeasurementTimingBudgetMicroSeconds(self.handle(), us)
        })
    }

    fn start_measurement(&mut self) -> Result<(), DeviceStatus> {
        DeviceStatus::check(unsafe { ffi::VL53LX_StartMeasurement(self.handle()) })
    }

    fn data_ready(&mut self) -> Result<bool, DeviceStatus> {
        let mut ready = 0u8;
        DeviceStatus::check(unsafe {
            ffi::VL53LX_GetMeasurementDataReady(self.handle(), &mut ready)
        })?;
        Ok(ready != 0)
    }

    fn get_frame(&mut self) -> Result<MeasurementFrame, DeviceStatus> {
        let mut data = ffi::VL53LX_MultiRangingData_t::default();
        DeviceStatus::check(unsafe { ffi::VL53LX_GetMultiRangingData(self.handle(), &mut data) })?;

        let count = (data.NumberOfObjectsFound as usize).min(MAX_OBJECTS);
        let objects = data.RangeData[..count]
            .iter()
            .map(|r| RangeObject {
                status: r.RangeStatus,
                min_mm: r.RangeMinMilliMeter,
                distance_mm: r.RangeMilliMeter,
                max_mm: r.RangeMaxMilliMeter,
                sigma_mm: r.SigmaMilliMeter,
                signal_rate_mcps: r.SignalRateRtnMegaCps,
                ambient_rate_mcps: r.AmbientRateRtnMegaCps,
            })
            .collect();

        Ok(MeasurementFrame {
            stream_count: data.StreamCount,
            objects,
            histogram: None,
        })
    }

    fn get_additional_data(&mut self) -> Result<HistogramBins, DeviceStatus> {
        let mut data = ffi::VL53LX_AdditionalData_t::default();
        DeviceStatus::check(unsafe { ffi::VL53LX_GetAdditionalData(self.handle(), &mut data) })?;

        let mut bins = [0; HISTOGRAM_BUFFER_SIZE];
        for (bin, raw) in bins.iter_mut().zip(data.VL53LX_p_006.bin_data.iter()) {
            *bin = *raw;
        }
        Ok(bins)
    }

    fn clear_and_rearm(&mut self) -> Result<(), DeviceStatus> {
        DeviceStatus::check(unsafe {
            ffi::VL53LX_ClearInterruptAndStartMeasurement(self.handle())
        })
    }
}
