// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    config::{parse_address, Config, Echo, TimingBudget, DEFAULT_PORT},
    device::DistanceMode,
    error::Error,
    histogram::{HistogramMode, ParityConvention},
};
use clap::Parser;
use serde_json::json;
use std::{path::PathBuf, time::Duration};
use tracing::level_filters::LevelFilter;
use zenoh::config::WhatAmI;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture histogram data with each frame.  A frames carry bins 5-23,
    /// B frames bins 1-23, AB captures both kinds.  Without this option no
    /// histogram is captured.
    #[arg(short = 'g', long, env, ignore_case = true)]
    pub histogram: Option<HistogramMode>,

    /// Which stream count parity marks an A frame.
    #[arg(long, env, default_value = "even-a")]
    pub parity: ParityConvention,

    /// Echo the published record instead of the per-field description.
    #[arg(short, long, env)]
    pub compact: bool,

    /// Do not echo anything to stdout.
    #[arg(short, long, env)]
    pub quiet: bool,

    /// Ranging distance mode.
    #[arg(short, long, env, default_value = "MEDIUM", ignore_case = true)]
    pub distance_mode: DistanceMode,

    /// Telemetry listen port.
    #[arg(short, long, env, default_value_t = DEFAULT_PORT,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Delay between data ready checks, in milliseconds.
    #[arg(short = 'm', long, env, default_value = "33",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_period: u64,

    /// Measurement timing budget in milliseconds [8 - 500].
    #[arg(short, long, env, default_value = "33",
          value_parser = clap::value_parser!(u32).range(8..=500))]
    pub timing_budget: u32,

    /// GPIO number of the sensor's XSHUT pin.
    #[arg(short = 'x', long, env, default_value = "4")]
    pub xshut: u32,

    /// I2C address of the sensor in hex.
    #[arg(short, long, env, default_value = "29", value_parser = parse_address)]
    pub address: u8,

    /// I2C bus device.
    #[arg(long, env, default_value = "/dev/i2c-1")]
    pub bus: PathBuf,

    /// Ranging telemetry topic
    #[arg(long, env, default_value = "rt/tof/ranging")]
    pub topic: String,

    /// Use a simulated sensor instead of the hardware.
    #[arg(long, env)]
    pub simulate: bool,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,

    /// zenoh connection mode
    #[arg(long, env, default_value = "peer")]
    pub mode: WhatAmI,

    /// connect to zenoh endpoints
    #[arg(long, env)]
    pub connect: Vec<String>,

    /// additional zenoh listen endpoints
    #[arg(long, env)]
    pub listen: Vec<String>,

    /// disable zenoh multicast scouting
    #[arg(long, env)]
    pub no_multicast_scouting: bool,
}

impl Args {
    /// Build the validated runtime configuration.
    ///
    /// Fails before any hardware is touched when the values are invalid or
    /// when no sensor backend was compiled in and `--simulate` is not given.
    pub fn to_config(&self) -> Result<Config, Error> {
        let config = Config {
            histogram: self.histogram.unwrap_or(HistogramMode::None),
            parity: self.parity,
            echo: Echo::from_flags(self.compact, self.quiet),
            distance_mode: self.distance_mode,
            poll_period: Duration::from_millis(self.poll_period),
            timing_budget: TimingBudget::new(self.timing_budget)?,
            xshut_pin: self.xshut,
            bus: self.bus.clone(),
            address: self.address,
            port: self.port,
            topic: self.topic.clone(),
            simulate: self.simulate,
        };
        config.validate()?;

        if !config.simulate && !cfg!(feature = "vl53lx") {
            return Err(Error::Config(format!(
                "cannot range on {}: built without the vl53lx feature, use --simulate",
                config.bus.display()
            )));
        }
        Ok(config)
    }

    /// Log level, clamped to errors when quiet.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            self.rust_log.min(LevelFilter::ERROR)
        } else {
            self.rust_log
        }
    }

    /// Endpoints the session listens on, the telemetry port first.
    pub fn listen_endpoints(&self) -> Vec<String> {
        let mut endpoints = vec![format!("tcp/0.0.0.0:{}", self.port)];
        endpoints.extend(self.listen.iter().cloned());
        endpoints
    }
}

impl TryFrom<&Args> for zenoh::Config {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let mut config = zenoh::Config::default();

        config.insert_json5("mode", &json!(args.mode).to_string())?;

        if !args.connect.is_empty() {
            config.insert_json5("connect/endpoints", &json!(args.connect).to_string())?;
        }

        config.insert_json5(
            "listen/endpoints",
            &json!(args.listen_endpoints()).to_string(),
        )?;

        if args.no_multicast_scouting {
            config.insert_json5("scouting/multicast/enabled", &json!(false).to_string())?;
        }

        Ok(config)
    }
}
