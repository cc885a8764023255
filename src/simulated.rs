// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Simulated ranging device.
//!
//! [`SimulatedDevice`] behaves like a VL53L3CX looking at a slowly moving
//! target: a result becomes ready one timing budget after the previous one was
//! acknowledged, the stream count wraps at 255, and the histogram carries a
//! single return peak on top of a flat ambient floor. It allows running the
//! full publisher without hardware.

use crate::{
    config::DEFAULT_TIMING_BUDGET_MS,
    device::{
        DeviceStatus, DistanceMode, HistogramBins, Identity, MeasurementFrame, RangeObject,
        RangingDevice, DEFAULT_ADDRESS, HISTOGRAM_BUFFER_SIZE, MODEL_ID, MODULE_TYPE,
    },
};
use std::time::{Duration, Instant};

/// Invalid parameter status, returned for calls made in the wrong state.
const INVALID_PARAMS: DeviceStatus = DeviceStatus(-4);

/// Approximate distance covered by one histogram bin.
const BIN_WIDTH_MM: i32 = 200;

const AMBIENT_LEVEL: i32 = 1200;

pub struct SimulatedDevice {
    identity: Identity,
    address: u8,
    distance_mode: DistanceMode,
    timing_budget: Duration,
    initialized: bool,
    measuring: bool,
    stream_count: u8,
    armed_at: Instant,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            identity: Identity {
                module_type: MODULE_TYPE,
                model_id: MODEL_ID,
            },
            address: DEFAULT_ADDRESS,
            distance_mode: DistanceMode::default(),
            timing_budget: Duration::from_millis(DEFAULT_TIMING_BUDGET_MS as u64),
            initialized: false,
            measuring: false,
            stream_count: 0,
            armed_at: Instant::now(),
        }
    }

    /// Report a different identity, e.g. to exercise the unsupported path.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn distance_mode(&self) -> DistanceMode {
        self.distance_mode
    }

    pub fn timing_budget(&self) -> Duration {
        self.timing_budget
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    /// Target distance for the current stream count, a triangle wave between
    /// 300 mm and the mode's maximum range.
    fn target_distance(&self) -> i32 {
        let max_mm = match self.distance_mode {
            DistanceMode::Short => 1300,
            DistanceMode::Medium => 2900,
            DistanceMode::Long => 4900,
        };
        let span = max_mm - 300;
        let phase = (self.stream_count as i32 * 37) % (2 * span);
        300 + if phase < span { phase } else { 2 * span - phase }
    }

    fn object(&self, distance_mm: i32) -> RangeObject {
        // Signal falls off with the square of the distance.
        let signal = 40.0 * (300.0 / distance_mm as f64).powi(2);
        let sigma = 1.0 + distance_mm as f64 / 1000.0;
        RangeObject {
            status: 0,
            min_mm: (distance_mm - 15) as i16,
            distance_mm: distance_mm as i16,
            max_mm: (distance_mm + 15) as i16,
            sigma_mm: (sigma * 65536.0) as u32,
            signal_rate_mcps: (signal * 65536.0) as u32,
            ambient_rate_mcps: (0.35 * 65536.0) as u32,
        }
    }
}

impl RangingDevice for SimulatedDevice {
    fn wait_booted(&mut self) -> Result<(), DeviceStatus> {
        Ok(())
    }

    fn data_init(&mut self) -> Result<(), DeviceStatus> {
        self.initialized = true;
        Ok(())
    }

    fn read_identity(&mut self) -> Result<Identity, DeviceStatus> {
        Ok(self.identity)
    }

    fn set_address(&mut self, address: u8) -> Result<(), DeviceStatus> {
        if address > 0x7F {
            return Err(INVALID_PARAMS);
        }
        self.address = address;
        Ok(())
    }

    fn set_distance_mode(&mut self, mode: DistanceMode) -> Result<(), DeviceStatus> {
        self.distance_mode = mode;
        Ok(())
    }

    fn set_timing_budget_us(&mut self, us: u32) -> Result<(), DeviceStatus> {
        self.timing_budget = Duration::from_micros(us as u64);
        Ok(())
    }

    fn start_measurement(&mut self) -> Result<(), DeviceStatus> {
        if !self.initialized {
            return Err(INVALID_PARAMS);
        }
        self.measuring = true;
        self.armed_at = Instant::now();
        Ok(())
    }

    fn data_ready(&mut self) -> Result<bool, DeviceStatus> {
        Ok(self.measuring && self.armed_at.elapsed() >= self.timing_budget)
    }

    fn get_frame(&mut self) -> Result<MeasurementFrame, DeviceStatus> {
        if !self.measuring {
            return Err(INVALID_PARAMS);
        }

        let distance = self.target_distance();
        // A second, weaker return appears every fourth frame.
        let mut objects = vec![self.object(distance)];
        if self.stream_count % 4 == 3 {
            objects.push(self.object(distance + 600));
        }

        Ok(MeasurementFrame {
            stream_count: self.stream_count,
            objects,
            histogram: None,
        })
    }

    fn get_additional_data(&mut self) -> Result<HistogramBins, DeviceStatus> {
        if !self.measuring {
            return Err(INVALID_PARAMS);
        }

        let peak = (self.target_distance() / BIN_WIDTH_MM) as usize + 1;
        let mut bins = [AMBIENT_LEVEL; HISTOGRAM_BUFFER_SIZE];
        bins[0] = 0;
        for (i, bin) in bins.iter_mut().enumerate().skip(1) {
            let d = i.abs_diff(peak) as i32;
            if d <= 2 {
                *bin += 8000 >> (2 * d);
            }
        }
        Ok(bins)
    }

    fn clear_and_rearm(&mut self) -> Result<(), DeviceStatus> {
        if !self.measuring {
            return Err(INVALID_PARAMS);
        }
        self.stream_count = self.stream_count.wrapping_add(1);
        self.armed_at = Instant::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> SimulatedDevice {
        let mut dev = SimulatedDevice::new();
        dev.data_init().unwrap();
        dev.set_timing_budget_us(0).unwrap();
        dev.start_measurement().unwrap();
        dev
    }

    #[test]
    fn test_requires_init() {
        let mut dev = SimulatedDevice::new();
        assert_eq!(dev.start_measurement(), Err(INVALID_PARAMS));
        assert_eq!(dev.data_ready(), Ok(false));
        assert!(dev.get_frame().is_err());
    }

    #[test]
    fn test_ready_after_budget() {
        let mut dev = SimulatedDevice::new();
        dev.data_init().unwrap();
        dev.set_timing_budget_us(20_000).unwrap();
        dev.start_measurement().unwrap();
        assert_eq!(dev.data_ready(), Ok(false));
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(dev.data_ready(), Ok(true));
    }

    #[test]
    fn test_stream_count_wraps() {
        let mut dev = started();
        for _ in 0..256 {
            dev.clear_and_rearm().unwrap();
        }
        assert_eq!(dev.get_frame().unwrap().stream_count, 0);
    }

    #[test]
    fn test_frames_stay_in_range() {
        let mut dev = started();
        dev.set_distance_mode(DistanceMode::Short).unwrap();
        for _ in 0..300 {
            let frame = dev.get_frame().unwrap();
            assert!(!frame.objects.is_empty());
            let d = frame.objects[0].distance_mm;
            assert!((300..=1300).contains(&d), "distance {}", d);
            dev.clear_and_rearm().unwrap();
        }
    }

    #[test]
    fn test_histogram_peak() {
        let mut dev = started();
        let bins = dev.get_additional_data().unwrap();
        let peak = (dev.target_distance() / BIN_WIDTH_MM) as usize + 1;
        let max = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(max, peak);
        assert_eq!(bins[0], 0);
    }
}
