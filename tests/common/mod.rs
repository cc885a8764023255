// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Scripted ranging device and GPIO shared by the integration tests.

#![allow(dead_code)]

use edgefirst_tofpub::{
    device::{
        DeviceStatus, DistanceMode, HistogramBins, Identity, MeasurementFrame, RangeObject,
        RangingDevice, HISTOGRAM_BUFFER_SIZE, MODEL_ID, MODULE_TYPE,
    },
    error::Error,
    power::{Direction, GpioControl, Level},
    shutdown::Shutdown,
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

/// Bins with `bins[i] == i * 10`, which makes decoded windows easy to check.
pub fn ramp_bins() -> HistogramBins {
    let mut bins = [0; HISTOGRAM_BUFFER_SIZE];
    for (i, bin) in bins.iter_mut().enumerate() {
        *bin = i as i32 * 10;
    }
    bins
}

pub fn object(distance_mm: i16) -> RangeObject {
    RangeObject {
        status: 0,
        min_mm: distance_mm - 10,
        distance_mm,
        max_mm: distance_mm + 10,
        sigma_mm: 2 * 65536,
        signal_rate_mcps: 10 * 65536,
        ambient_rate_mcps: 65536 / 4,
    }
}

pub fn frame(stream_count: u8, objects: usize) -> MeasurementFrame {
    MeasurementFrame {
        stream_count,
        objects: (0..objects).map(|i| object(500 + 100 * i as i16)).collect(),
        histogram: None,
    }
}

/// Ranging device following a script.
///
/// Readiness and frames are popped from queues. Once the ready queue runs
/// dry every check reports ready, and once the frame queue runs dry frames
/// with one object and an incrementing stream count are produced. Every call
/// is appended to a log shared with the test.
pub struct MockDevice {
    log: Arc<Mutex<Vec<&'static str>>>,
    identity: Identity,
    failures: HashMap<&'static str, DeviceStatus>,
    ready: VecDeque<Result<bool, DeviceStatus>>,
    frames: VecDeque<Result<MeasurementFrame, DeviceStatus>>,
    histogram: HistogramBins,
    stream_count: u8,
    stop: Option<(usize, Shutdown)>,
    checks: usize,
    stop_on_rearm: bool,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            log: Arc::default(),
            identity: Identity {
                module_type: MODULE_TYPE,
                model_id: MODEL_ID,
            },
            failures: HashMap::new(),
            ready: VecDeque::new(),
            frames: VecDeque::new(),
            histogram: ramp_bins(),
            stream_count: 0,
            stop: None,
            checks: 0,
            stop_on_rearm: false,
        }
    }

    /// Handle on the call log, valid after the device was moved.
    pub fn log(&self) -> Arc<Mutex<Vec<&'static str>>> {
        self.log.clone()
    }

    pub fn with_identity(mut self, module_type: u8, model_id: u8) -> Self {
        self.identity = Identity {
            module_type,
            model_id,
        };
        self
    }

    /// Make every call to `call` fail with `status`.
    pub fn failing(mut self, call: &'static str, status: DeviceStatus) -> Self {
        self.failures.insert(call, status);
        self
    }

    pub fn with_ready(
        mut self,
        ready: impl IntoIterator<Item = Result<bool, DeviceStatus>>,
    ) -> Self {
        self.ready.extend(ready);
        self
    }

    pub fn with_frames(
        mut self,
        frames: impl IntoIterator<Item = Result<MeasurementFrame, DeviceStatus>>,
    ) -> Self {
        self.frames.extend(frames);
        self
    }

    /// Start the stream count of generated frames at `count`.
    pub fn with_stream_count(mut self, count: u8) -> Self {
        self.stream_count = count;
        self
    }

    /// Stop the loop after exactly `checks` cycles.
    ///
    /// When the `checks`-th readiness check reports a frame, `shutdown` is
    /// triggered once that frame was acknowledged, so the last cycle runs to
    /// completion. Otherwise it is triggered during the check.
    pub fn stop_after(mut self, checks: usize, shutdown: Shutdown) -> Self {
        self.stop = Some((checks, shutdown));
        self
    }

    fn call(&mut self, name: &'static str) -> Result<(), DeviceStatus> {
        if let Ok(mut log) = self.log.lock() {
            log.push(name);
        }
        match self.failures.get(name) {
            Some(status) => Err(*status),
            None => Ok(()),
        }
    }
}

pub fn calls(log: &Arc<Mutex<Vec<&'static str>>>) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

pub fn count(log: &Arc<Mutex<Vec<&'static str>>>, name: &str) -> usize {
    log.lock().unwrap().iter().filter(|c| **c == name).count()
}

impl RangingDevice for MockDevice {
    fn wait_booted(&mut self) -> Result<(), DeviceStatus> {
        self.call("wait_booted")
    }

    fn data_init(&mut self) -> Result<(), DeviceStatus> {
        self.call("data_init")
    }

    fn read_identity(&mut self) -> Result<Identity, DeviceStatus> {
        self.call("read_identity")?;
        Ok(self.identity)
    }

    fn set_address(&mut self, _address: u8) -> Result<(), DeviceStatus> {
        self.call("set_address")
    }

    fn set_distance_mode(&mut self, _mode: DistanceMode) -> Result<(), DeviceStatus> {
        self.call("set_distance_mode")
    }

    fn set_timing_budget_us(&mut self, _us: u32) -> Result<(), DeviceStatus> {
        self.call("set_timing_budget_us")
    }

    fn start_measurement(&mut self) -> Result<(), DeviceStatus> {
        self.call("start_measurement")
    }

    fn data_ready(&mut self) -> Result<bool, DeviceStatus> {
        let res = self
            .call("data_ready")
            .and_then(|_| self.ready.pop_front().unwrap_or(Ok(true)));
        self.checks += 1;
        if let Some((checks, shutdown)) = &self.stop {
            if self.checks >= *checks {
                match res {
                    Ok(true) => self.stop_on_rearm = true,
                    _ => shutdown.trigger(),
                }
            }
        }
        res
    }

    fn get_frame(&mut self) -> Result<MeasurementFrame, DeviceStatus> {
        self.call("get_frame")?;
        match self.frames.pop_front() {
            Some(frame) => frame,
            None => {
                let count = self.stream_count;
                self.stream_count = self.stream_count.wrapping_add(1);
                Ok(frame(count, 1))
            }
        }
    }

    fn get_additional_data(&mut self) -> Result<HistogramBins, DeviceStatus> {
        self.call("get_additional_data")?;
        Ok(self.histogram)
    }

    fn clear_and_rearm(&mut self) -> Result<(), DeviceStatus> {
        let res = self.call("clear_and_rearm");
        if self.stop_on_rearm {
            if let Some((_, shutdown)) = &self.stop {
                shutdown.trigger();
            }
        }
        res
    }
}

/// GPIO surface that records every call instead of touching sysfs.
#[derive(Debug, Clone, Default)]
pub struct RecordingGpio {
    log: Arc<Mutex<Vec<String>>>,
    exported: HashSet<u32>,
}

impl RecordingGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the call log, valid after the GPIO was moved.
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }

    fn record(&self, call: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(call);
        }
    }
}

impl GpioControl for RecordingGpio {
    fn export(&mut self, pin: u32) -> Result<(), Error> {
        self.record(format!("export {}", pin));
        self.exported.insert(pin);
        Ok(())
    }

    fn set_direction(&mut self, pin: u32, direction: Direction) -> Result<(), Error> {
        self.record(format!("direction {} {:?}", pin, direction));
        Ok(())
    }

    fn set_value(&mut self, pin: u32, level: Level) -> Result<(), Error> {
        self.record(format!("value {} {:?}", pin, level));
        Ok(())
    }

    fn unexport(&mut self, pin: u32) -> Result<(), Error> {
        self.record(format!("unexport {}", pin));
        self.exported.remove(&pin);
        Ok(())
    }

    fn is_exported(&self, pin: u32) -> bool {
        self.exported.contains(&pin)
    }
}

pub fn gpio_calls(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}
