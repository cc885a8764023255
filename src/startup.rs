// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Application bring-up.
//!
//! [`launch`] turns the command line into a running [`Session`]:
//!
//! ```text
//! Args ─► Config ─► power_on ─► open device ─► Session::open
//! ```
//!
//! Invalid arguments are rejected before the GPIO or the bus is touched. A
//! simulated run never drives the XSHUT pin. When any step after power-on
//! fails the sensor is put back into standby before the error is returned.

use crate::{
    args::Args,
    config::Config,
    device::RangingDevice,
    error::Error,
    power::{GpioControl, PowerSequencer},
    session::Session,
};
use tracing::{debug, warn};

/// A sensor that is powered, configured and ranging.
pub struct Sensor<D: RangingDevice, G: GpioControl> {
    pub config: Config,
    /// `None` when the sensor is not powered through GPIO.
    pub power: Option<PowerSequencer<G>>,
    pub session: Session<D>,
}

/// Validate `args` and bring up the sensor.
///
/// `open_device` connects to the sensor once it is powered.
pub fn launch<D, G, F>(args: &Args, gpio: G, open_device: F) -> Result<Sensor<D, G>, Error>
where
    D: RangingDevice,
    G: GpioControl,
    F: FnOnce(&Config) -> Result<D, Error>,
{
    let config = args.to_config()?;
    start(config, gpio, open_device)
}

/// Bring up the sensor described by an already validated `config`.
pub fn start<D, G, F>(config: Config, gpio: G, open_device: F) -> Result<Sensor<D, G>, Error>
where
    D: RangingDevice,
    G: GpioControl,
    F: FnOnce(&Config) -> Result<D, Error>,
{
    let mut power = if config.simulate {
        debug!("simulated sensor, xshut gpio{} left alone", config.xshut_pin);
        None
    } else {
        Some(PowerSequencer::new(gpio, config.xshut_pin))
    };

    match bring_up(&config, power.as_mut(), open_device) {
        Ok(session) => Ok(Sensor {
            config,
            power,
            session,
        }),
        Err(err) => {
            if let Some(power) = power.as_mut() {
                if let Err(off) = power.power_off() {
                    warn!("power off after failed startup: {}", off);
                }
            }
            Err(err)
        }
    }
}

fn bring_up<D, G, F>(
    config: &Config,
    power: Option<&mut PowerSequencer<G>>,
    open_device: F,
) -> Result<Session<D>, Error>
where
    D: RangingDevice,
    G: GpioControl,
    F: FnOnce(&Config) -> Result<D, Error>,
{
    if let Some(power) = power {
        power.power_on()?;
    }
    let device = open_device(config)?;
    Session::open(device, config)
}
