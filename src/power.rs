// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! XSHUT power sequencing.
//!
//! The sensor is held in hardware standby while its XSHUT pin is low. The
//! [`PowerSequencer`] walks the pin through
//!
//! ```text
//! power_on:  Unexported ─► Exported ─► ConfiguredOutput ─► Driven(High)
//! power_off: Driven(Low) ─► Unexported
//! ```
//!
//! on top of a [`GpioControl`] surface. [`SysfsGpio`] implements the surface
//! with the legacy `/sys/class/gpio` interface.

use crate::error::Error;
use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
    thread::sleep,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// Default sysfs GPIO class directory.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Time the sensor needs after XSHUT is released before it accepts bus traffic.
pub const SETTLE_DELAY: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }
}

/// General-purpose I/O control surface.
pub trait GpioControl {
    /// Hand the pin over to user-space control.
    fn export(&mut self, pin: u32) -> Result<(), Error>;

    fn set_direction(&mut self, pin: u32, direction: Direction) -> Result<(), Error>;

    fn set_value(&mut self, pin: u32, level: Level) -> Result<(), Error>;

    /// Return the pin to kernel control.
    fn unexport(&mut self, pin: u32) -> Result<(), Error>;

    fn is_exported(&self, pin: u32) -> bool;
}

/// [`GpioControl`] over the sysfs GPIO class.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
    export_timeout: Duration,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new(SYSFS_GPIO_ROOT)
    }
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            export_timeout: Duration::from_secs(1),
        }
    }

    /// How long to wait for the pin directory to appear after an export.
    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    fn write(path: &Path, value: &str) -> Result<(), Error> {
        fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .and_then(|mut file| file.write_all(value.as_bytes()))
            .map_err(|err| Error::gpio(path, err))
    }

    // udev applies permissions to the new pin directory asynchronously.
    fn wait_for_pin(&self, pin: u32) {
        let dir = self.pin_dir(pin);
        let deadline = Instant::now() + self.export_timeout;
        while !dir.join("direction").exists() && Instant::now() < deadline {
            sleep(Duration::from_millis(10));
        }
    }
}

impl GpioControl for SysfsGpio {
    fn export(&mut self, pin: u32) -> Result<(), Error> {
        let path = self.root.join("export");
        match Self::write(&path, &pin.to_string()) {
            Ok(()) => {}
            // Already exported, e.g. by a previous run that was killed.
            Err(Error::Gpio { source, .. }) if source.raw_os_error() == Some(libc::EBUSY) => {
                debug!("gpio{} already exported", pin);
            }
            Err(err) => return Err(err),
        }
        self.wait_for_pin(pin);
        Ok(())
    }

    fn set_direction(&mut self, pin: u32, direction: Direction) -> Result<(), Error> {
        Self::write(&self.pin_dir(pin).join("direction"), direction.as_str())
    }

    fn set_value(&mut self, pin: u32, level: Level) -> Result<(), Error> {
        Self::write(&self.pin_dir(pin).join("value"), level.as_str())
    }

    fn unexport(&mut self, pin: u32) -> Result<(), Error> {
        let path = self.root.join("unexport");
        match Self::write(&path, &pin.to_string()) {
            Err(Error::Gpio { source, .. }) if source.raw_os_error() == Some(libc::EINVAL) => {
                debug!("gpio{} was not exported", pin);
                Ok(())
            }
            res => res,
        }
    }

    fn is_exported(&self, pin: u32) -> bool {
        self.pin_dir(pin).exists()
    }
}

/// Drives the sensor's XSHUT pin.
pub struct PowerSequencer<G: GpioControl> {
    gpio: G,
    pin: u32,
    settle: Duration,
}

impl<G: GpioControl> PowerSequencer<G> {
    pub fn new(gpio: G, pin: u32) -> Self {
        Self {
            gpio,
            pin,
            settle: SETTLE_DELAY,
        }
    }

    /// Override the settle delay, never below [`SETTLE_DELAY`].
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle.max(SETTLE_DELAY);
        self
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Release the sensor from standby and wait for it to settle.
    pub fn power_on(&mut self) -> Result<(), Error> {
        self.gpio.export(self.pin)?;
        self.gpio.set_direction(self.pin, Direction::Out)?;
        self.gpio.set_value(self.pin, Level::High)?;
        sleep(self.settle);
        debug!("xshut gpio{} driven high", self.pin);
        Ok(())
    }

    /// Put the sensor back into standby and release the pin.
    ///
    /// Both steps are always attempted; the first failure is returned after
    /// the second step ran. A pin that is not exported is already off.
    pub fn power_off(&mut self) -> Result<(), Error> {
        if !self.gpio.is_exported(self.pin) {
            debug!("xshut gpio{} not exported, nothing to do", self.pin);
            return Ok(());
        }

        let low = self.gpio.set_value(self.pin, Level::Low);
        if let Err(err) = &low {
            warn!("failed to drive xshut low: {}", err);
        }

        let unexport = self.gpio.unexport(self.pin);
        if let Err(err) = &unexport {
            warn!("failed to unexport xshut: {}", err);
        }

        low.and(unexport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, io};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PinState {
        Exported,
        ConfiguredOutput,
        Driven(Level),
    }

    /// In-memory pin model following the kernel's rules.
    #[derive(Default)]
    struct FakeGpio {
        pins: HashMap<u32, PinState>,
        fail_set_value: bool,
        calls: Vec<String>,
    }

    fn not_exported(pin: u32) -> Error {
        Error::gpio(
            format!("/fake/gpio{}", pin),
            io::Error::from(io::ErrorKind::NotFound),
        )
    }

    impl GpioControl for FakeGpio {
        fn export(&mut self, pin: u32) -> Result<(), Error> {
            self.calls.push(format!("export {}", pin));
            self.pins.entry(pin).or_insert(PinState::Exported);
            Ok(())
        }

        fn set_direction(&mut self, pin: u32, direction: Direction) -> Result<(), Error> {
            self.calls.push(format!("direction {} {}", pin, direction.as_str()));
            let state = self.pins.get_mut(&pin).ok_or_else(|| not_exported(pin))?;
            if direction == Direction::Out && *state == PinState::Exported {
                *state = PinState::ConfiguredOutput;
            }
            Ok(())
        }

        fn set_value(&mut self, pin: u32, level: Level) -> Result<(), Error> {
            self.calls.push(format!("value {} {}", pin, level.as_str()));
            if self.fail_set_value {
                return Err(Error::gpio(
                    "/fake/value",
                    io::Error::from(io::ErrorKind::PermissionDenied),
                ));
            }
            let state = self.pins.get_mut(&pin).ok_or_else(|| not_exported(pin))?;
            *state = PinState::Driven(level);
            Ok(())
        }

        fn unexport(&mut self, pin: u32) -> Result<(), Error> {
            self.calls.push(format!("unexport {}", pin));
            self.pins.remove(&pin);
            Ok(())
        }

        fn is_exported(&self, pin: u32) -> bool {
            self.pins.contains_key(&pin)
        }
    }

    #[test]
    fn test_power_on_sequence() {
        let mut power = PowerSequencer::new(FakeGpio::default(), 4);
        power.power_on().unwrap();

        assert_eq!(
            power.gpio().calls,
            vec!["export 4", "direction 4 out", "value 4 1"]
        );
        assert_eq!(
            power.gpio().pins.get(&4),
            Some(&PinState::Driven(Level::High))
        );
    }

    #[test]
    fn test_power_on_settles() {
        let mut power = PowerSequencer::new(FakeGpio::default(), 4);
        let start = Instant::now();
        power.power_on().unwrap();
        assert!(start.elapsed() >= SETTLE_DELAY);
    }

    #[test]
    fn test_settle_delay_floor() {
        let power = PowerSequencer::new(FakeGpio::default(), 4)
            .with_settle_delay(Duration::from_millis(1));
        assert_eq!(power.settle, SETTLE_DELAY);
    }

    #[test]
    fn test_power_on_is_reentrant() {
        let mut power = PowerSequencer::new(FakeGpio::default(), 4);
        power.power_on().unwrap();
        power.power_on().unwrap();
        assert_eq!(
            power.gpio().pins.get(&4),
            Some(&PinState::Driven(Level::High))
        );
    }

    #[test]
    fn test_power_on_then_off_unexports() {
        let mut power = PowerSequencer::new(FakeGpio::default(), 17);
        power.power_on().unwrap();
        power.power_off().unwrap();

        assert!(!power.gpio().is_exported(17));
        assert_eq!(
            &power.gpio().calls[3..],
            &["value 17 0".to_string(), "unexport 17".to_string()]
        );
    }

    #[test]
    fn test_power_off_twice() {
        let mut power = PowerSequencer::new(FakeGpio::default(), 4);
        power.power_on().unwrap();
        assert!(power.power_off().is_ok());
        assert!(power.power_off().is_ok());
        assert!(!power.gpio().is_exported(4));
    }

    #[test]
    fn test_power_off_continues_after_failure() {
        let mut power = PowerSequencer::new(FakeGpio::default(), 4);
        power.power_on().unwrap();
        power.gpio.fail_set_value = true;

        let res = power.power_off();
        assert!(matches!(res, Err(Error::Gpio { .. })));
        // The unexport step still ran.
        assert_eq!(power.gpio().calls.last().unwrap(), "unexport 4");
        assert!(!power.gpio().is_exported(4));
    }

    fn fake_sysfs(pin: u32) -> (tempfile::TempDir, SysfsGpio) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        let pin_dir = dir.path().join(format!("gpio{}", pin));
        fs::create_dir(&pin_dir).unwrap();
        fs::write(pin_dir.join("direction"), "in").unwrap();
        fs::write(pin_dir.join("value"), "0").unwrap();
        let gpio = SysfsGpio::new(dir.path()).with_export_timeout(Duration::from_millis(50));
        (dir, gpio)
    }

    #[test]
    fn test_sysfs_writes() {
        let (dir, gpio) = fake_sysfs(4);
        let mut power = PowerSequencer::new(gpio, 4);
        power.power_on().unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("export"), "4");
        assert_eq!(read("gpio4/direction"), "out");
        assert_eq!(read("gpio4/value"), "1");

        power.power_off().unwrap();
        assert_eq!(read("gpio4/value"), "0");
        assert_eq!(read("unexport"), "4");
    }

    #[test]
    fn test_sysfs_missing_pin_reports_path() {
        let (dir, mut gpio) = fake_sysfs(4);
        let err = gpio.set_value(5, Level::High).unwrap_err();
        match err {
            Error::Gpio { path, .. } => assert_eq!(path, dir.path().join("gpio5/value")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_sysfs_power_off_unexported() {
        let dir = tempfile::tempdir().unwrap();
        let mut power = PowerSequencer::new(SysfsGpio::new(dir.path()), 4);
        assert!(power.power_off().is_ok());
    }

    #[test]
    fn test_sysfs_direction() {
        let (dir, mut gpio) = fake_sysfs(4);
        let read = || fs::read_to_string(dir.path().join("gpio4/direction")).unwrap();

        gpio.set_direction(4, Direction::Out).unwrap();
        assert_eq!(read(), "out");
        gpio.set_direction(4, Direction::In).unwrap();
        assert_eq!(read(), "in");
    }
}
