// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Validated runtime configuration.
//!
//! [`Config`] is built once from the command line (see [`crate::args`]) and
//! passed by reference to every component. All invariants are checked while
//! building it, so nothing downstream needs to re-validate.

use crate::{
    device::{DistanceMode, DEFAULT_ADDRESS},
    error::Error,
    histogram::{HistogramMode, ParityConvention},
};
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

/// Timing budget the device uses when it is not configured explicitly.
pub const DEFAULT_TIMING_BUDGET_MS: u32 = 33;

/// Poll period used when none is given on the command line.
pub const DEFAULT_POLL_PERIOD_MS: u64 = 33;

/// Port the telemetry endpoint listens on by default.
pub const DEFAULT_PORT: u16 = 5556;

/// Measurement timing budget in milliseconds, always within [8, 500].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimingBudget(u32);

impl TimingBudget {
    pub const MIN_MS: u32 = 8;
    pub const MAX_MS: u32 = 500;

    pub fn new(ms: u32) -> Result<Self, Error> {
        if (Self::MIN_MS..=Self::MAX_MS).contains(&ms) {
            Ok(Self(ms))
        } else {
            Err(Error::Config(format!(
                "invalid timing budget: {} ms. Range [{} - {}ms]",
                ms,
                Self::MIN_MS,
                Self::MAX_MS
            )))
        }
    }

    pub fn ms(&self) -> u32 {
        self.0
    }

    pub fn us(&self) -> u32 {
        self.0 * 1000
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_TIMING_BUDGET_MS
    }
}

impl Default for TimingBudget {
    fn default() -> Self {
        Self(DEFAULT_TIMING_BUDGET_MS)
    }
}

impl FromStr for TimingBudget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::Config(format!("invalid timing budget: {}", s)))?;
        Self::new(ms)
    }
}

impl fmt::Display for TimingBudget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ms", self.0)
    }
}

/// Parse a 7-bit bus address given in hexadecimal, with or without `0x`.
pub fn parse_address(s: &str) -> Result<u8, Error> {
    let digits = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    let address = u8::from_str_radix(digits, 16)
        .map_err(|_| Error::Config(format!("invalid address: {}", s)))?;
    if address > 0x7F {
        return Err(Error::Config(format!(
            "invalid address: 0x{:02X} is not a 7-bit address",
            address
        )));
    }
    Ok(address)
}

/// How much human-readable output the ranging loop writes to stdout.
///
/// Never affects what is published.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Echo {
    /// Per-field description of every frame
    #[default]
    Verbose,
    /// The wire record of every frame
    Compact,
    /// Nothing
    Quiet,
}

impl Echo {
    pub fn from_flags(compact: bool, quiet: bool) -> Self {
        match (compact, quiet) {
            (_, true) => Echo::Quiet,
            (true, false) => Echo::Compact,
            (false, false) => Echo::Verbose,
        }
    }

    pub fn is_quiet(&self) -> bool {
        *self == Echo::Quiet
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub histogram: HistogramMode,
    pub parity: ParityConvention,
    pub echo: Echo,
    pub distance_mode: DistanceMode,
    pub poll_period: Duration,
    pub timing_budget: TimingBudget,
    pub xshut_pin: u32,
    pub bus: PathBuf,
    pub address: u8,
    pub port: u16,
    pub topic: String,
    /// Range against [`crate::simulated::SimulatedDevice`], leaving GPIO alone
    pub simulate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            histogram: HistogramMode::None,
            parity: ParityConvention::EvenIsA,
            echo: Echo::Verbose,
            distance_mode: DistanceMode::Medium,
            poll_period: Duration::from_millis(DEFAULT_POLL_PERIOD_MS),
            timing_budget: TimingBudget::default(),
            xshut_pin: 4,
            bus: PathBuf::from("/dev/i2c-1"),
            address: DEFAULT_ADDRESS,
            port: DEFAULT_PORT,
            topic: String::from("rt/tof/ranging"),
            simulate: false,
        }
    }
}

impl Config {
    /// Reject combinations that cannot be expressed by the field types alone.
    pub fn validate(&self) -> Result<(), Error> {
        if self.poll_period.is_zero() {
            return Err(Error::Config("poll period must be greater than 0".into()));
        }
        if self.address > 0x7F {
            return Err(Error::Config(format!(
                "invalid address: 0x{:02X} is not a 7-bit address",
                self.address
            )));
        }
        if self.topic.is_empty() {
            return Err(Error::Config("topic must not be empty".into()));
        }
        Ok(())
    }
}
