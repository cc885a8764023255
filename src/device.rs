// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Ranging device abstraction.
//!
//! The [`RangingDevice`] trait is the capability boundary to the sensor's
//! vendor driver. Implementations own the bus handle; the
//! [`crate::session::Session`] drives the startup sequence and the
//! [`crate::polling::PollingLoop`] drives steady-state ranging.
//!
//! Available backends:
//!
//! - [`crate::simulated::SimulatedDevice`]: deterministic synthetic frames for
//!   testing and bench runs without hardware.
//! - `crate::vl53lx::Vl53lx` (feature `vl53lx`): the ST VL53LX bare driver on a
//!   Linux I2C bus.

use clap::ValueEnum;
use std::fmt;

/// Default 7-bit I2C address of the sensor after power-on.
pub const DEFAULT_ADDRESS: u8 = 0x29;

/// Expected `IDENTIFICATION__MODULE_TYPE` register value.
pub const MODULE_TYPE: u8 = 0xAA;

/// Expected `IDENTIFICATION__MODEL_ID` register value.
pub const MODEL_ID: u8 = 0xEA;

/// Number of bins in the device histogram buffer.
pub const HISTOGRAM_BUFFER_SIZE: usize = 24;

/// Maximum number of objects reported in a single frame.
pub const MAX_OBJECTS: usize = 4;

/// Scale of the device's FixPoint1616 values.
pub const FIXED_POINT_SCALE: f64 = 65536.0;

/// Device status code as returned by every vendor driver call.
///
/// Zero is success and is never wrapped in this type by the device backends;
/// negative values are errors or warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus(pub i8);

/// Status code reported when the bus transaction itself failed.
pub const CONTROL_INTERFACE: DeviceStatus = DeviceStatus(-13);

static STATUS_TEXT: &[(i8, &str)] = &[
    (0, "ERROR: NONE"),
    (-1, "ERROR: CALIBRATION WARNING"),
    (-2, "ERROR: MIN CLIPPED"),
    (-3, "ERROR: UNDEFINED"),
    (-4, "ERROR: INVALID PARAMS"),
    (-5, "ERROR: NOT SUPPORTED"),
    (-6, "ERROR: RANGE ERROR"),
    (-7, "ERROR: TIME OUT"),
    (-8, "ERROR: MODE NOT SUPPORTED"),
    (-9, "ERROR: BUFFER TOO SMALL"),
    (-10, "ERROR: COMMS BUFFER TOO SMALL"),
    (-11, "ERROR: GPIO NOT EXISTING"),
    (-12, "ERROR: GPIO FUNCTIONALITY NOT SUPPORTED"),
    (-13, "ERROR: CONTROL INTERFACE"),
    (-14, "ERROR: INVALID COMMAND"),
    (-15, "ERROR: DIVISION BY ZERO"),
    (-16, "ERROR: REF SPAD INIT"),
    (-17, "ERROR: GPH SYNC CHECK FAIL"),
    (-18, "ERROR: STREAM COUNT CHECK FAIL"),
    (-19, "ERROR: GPH ID CHECK FAIL"),
    (-20, "ERROR: ZONE STREAM COUNT CHECK FAIL"),
    (-21, "ERROR: ZONE GPH ID CHECK FAIL"),
    (-22, "ERROR: XTALK EXTRACTION NO SAMPLE FAIL"),
    (-23, "ERROR: XTALK EXTRACTION SIGMA LIMIT FAIL"),
    (-24, "ERROR: OFFSET CAL NO SAMPLE FAIL"),
    (-25, "ERROR: OFFSET CAL NO SPADS ENABLED FAIL"),
    (-26, "ERROR: ZONE CAL NO SAMPLE FAIL"),
    (-27, "ERROR: TUNING PARM KEY MISMATCH"),
    (-28, "WARNING: REF SPAD CHAR NOT ENOUGH SPADS"),
    (-29, "WARNING: REF SPAD CHAR RATE TOO HIGH"),
    (-30, "WARNING: REF SPAD CHAR RATE TOO LOW"),
    (-31, "WARNING: OFFSET CAL MISSING SAMPLES"),
    (-32, "WARNING: OFFSET CAL SIGMA TOO HIGH"),
    (-33, "WARNING: OFFSET CAL RATE TOO HIGH"),
    (-34, "WARNING: OFFSET CAL SPAD COUNT TOO LOW"),
    (-35, "WARNING: ZONE CAL MISSING SAMPLES"),
    (-36, "WARNING: ZONE CAL SIGMA TOO HIGH"),
    (-37, "WARNING: ZONE CAL RATE TOO HIGH"),
    (-38, "WARNING: XTALK MISSING SAMPLES"),
    (-39, "WARNING: XTALK NO SAMPLES FOR GRADIENT"),
    (-40, "WARNING: XTALK SIGMA LIMIT FOR GRADIENT"),
    (-41, "ERROR: NOT IMPLEMENTED"),
    (-60, "ERROR: PLATFORM SPECIFIC START"),
];

impl DeviceStatus {
    /// Human readable text for the status code, if the code is known.
    pub fn text(&self) -> Option<&'static str> {
        STATUS_TEXT
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, text)| *text)
    }

    /// Convert a raw driver return value into a `Result`.
    pub fn check(code: i8) -> Result<(), DeviceStatus> {
        match code {
            0 => Ok(()),
            code => Err(DeviceStatus(code)),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "UNKNOWN STATUS {}", self.0),
        }
    }
}

impl std::error::Error for DeviceStatus {}

/// Ranging distance mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum DistanceMode {
    Short,
    #[default]
    Medium,
    Long,
}

impl fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DistanceMode::Short => write!(f, "SHORT"),
            DistanceMode::Medium => write!(f, "MEDIUM"),
            DistanceMode::Long => write!(f, "LONG"),
        }
    }
}

/// Identification registers read from the device NVM copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub module_type: u8,
    pub model_id: u8,
}

impl Identity {
    pub fn is_supported(&self) -> bool {
        self.module_type == MODULE_TYPE && self.model_id == MODEL_ID
    }
}

/// One detected object of a multi-object ranging result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeObject {
    pub status: u8,
    pub min_mm: i16,
    pub distance_mm: i16,
    pub max_mm: i16,
    /// FixPoint1616
    pub sigma_mm: u32,
    /// FixPoint1616
    pub signal_rate_mcps: u32,
    /// FixPoint1616
    pub ambient_rate_mcps: u32,
}

impl RangeObject {
    pub fn sigma(&self) -> f64 {
        self.sigma_mm as f64 / FIXED_POINT_SCALE
    }

    pub fn signal_rate(&self) -> f64 {
        self.signal_rate_mcps as f64 / FIXED_POINT_SCALE
    }

    pub fn ambient_rate(&self) -> f64 {
        self.ambient_rate_mcps as f64 / FIXED_POINT_SCALE
    }
}

/// One ranging result.
///
/// The histogram is attached by the polling loop after decoding, the device
/// backends always return frames without one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeasurementFrame {
    pub stream_count: u8,
    pub objects: Vec<RangeObject>,
    pub histogram: Option<Vec<i32>>,
}

/// Raw histogram buffer as returned by the additional data call.
pub type HistogramBins = [i32; HISTOGRAM_BUFFER_SIZE];

/// Capability interface of a multi-object ranging sensor.
///
/// All calls are blocking bus transactions. A non-zero driver status is
/// returned as `Err(DeviceStatus)`.
pub trait RangingDevice {
    /// Block until the device firmware reports boot completion.
    fn wait_booted(&mut self) -> Result<(), DeviceStatus>;

    /// One-time device initialization after boot.
    fn data_init(&mut self) -> Result<(), DeviceStatus>;

    /// Read the module type and model id registers.
    fn read_identity(&mut self) -> Result<Identity, DeviceStatus>;

    /// Change the 7-bit bus address. Subsequent calls use the new address.
    fn set_address(&mut self, address: u8) -> Result<(), DeviceStatus>;

    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), DeviceStatus>;

    fn set_timing_budget_us(&mut self, us: u32) -> Result<(), DeviceStatus>;

    /// Start continuous ranging.
    fn start_measurement(&mut self) -> Result<(), DeviceStatus>;

    /// Non-blocking query whether a new result is available.
    fn data_ready(&mut self) -> Result<bool, DeviceStatus>;

    /// Fetch the current multi-object ranging result.
    fn get_frame(&mut self) -> Result<MeasurementFrame, DeviceStatus>;

    /// Fetch the raw histogram of the current result.
    fn get_additional_data(&mut self) -> Result<HistogramBins, DeviceStatus>;

    /// Acknowledge the current result and arm the next measurement.
    fn clear_and_rearm(&mut self) -> Result<(), DeviceStatus>;
}

impl<D: RangingDevice + ?Sized> RangingDevice for Box<D> {
    fn wait_booted(&mut self) -> Result<(), DeviceStatus> {
        (**self).wait_booted()
    }

    fn data_init(&mut self) -> Result<(), DeviceStatus> {
        (**self).data_init()
    }

    fn read_identity(&mut self) -> Result<Identity, DeviceStatus> {
        (**self).read_identity()
    }

    fn set_address(&mut self, address: u8) -> Result<(), DeviceStatus> {
        (**self).set_address(address)
    }

    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), DeviceStatus> {
        (**self).set_distance_mode(mode)
    }

    fn set_timing_budget_us(&mut self, us: u32) -> Result<(), DeviceStatus> {
        (**self).set_timing_budget_us(us)
    }

    fn start_measurement(&mut self) -> Result<(), DeviceStatus> {
        (**self).start_measurement()
    }

    fn data_ready(&mut self) -> Result<bool, DeviceStatus> {
        (**self).data_ready()
    }

    fn get_frame(&mut self) -> Result<MeasurementFrame, DeviceStatus> {
        (**self).get_frame()
    }

    fn get_additional_data(&mut self) -> Result<HistogramBins, DeviceStatus> {
        (**self).get_additional_data()
    }

    fn clear_and_rearm(&mut self) -> Result<(), DeviceStatus> {
        (**self).clear_and_rearm()
    }
}
