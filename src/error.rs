// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Crate error type.
//!
//! Errors fall into four classes which decide how the application reacts:
//!
//! - **Configuration**: bad command line values, reported before any hardware
//!   is touched.
//! - **Device I/O**: GPIO, bus and identity failures during startup. These are
//!   fatal and send the application down the power-off path.
//! - **Protocol**: non-zero device status codes. Fatal during startup, logged
//!   and ignored by the polling loop.
//! - **Transport**: the publisher could not be bound. Individual sends are
//!   fire-and-forget and never produce an error.
//!
//! [`Error::Signal`] is fatal at startup, and [`Error::Record`] is only
//! produced on the receiving side by [`crate::telemetry::parse_record`].

use crate::device::DeviceStatus;
use std::{fmt, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    /// Invalid configuration value
    Config(String),
    /// GPIO control surface failure on the given sysfs path
    Gpio {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The bus channel to the sensor could not be opened
    Bus(String),
    /// The device reported an identity other than the supported sensor
    UnsupportedDevice { module_type: u8, model_id: u8 },
    /// The device returned a non-zero status code
    Device(DeviceStatus),
    /// Publish endpoint could not be created
    Transport(String),
    /// Process signal handlers could not be installed
    Signal(std::io::Error),
    /// A received telemetry record is malformed
    Record(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Gpio { source, .. } => Some(source),
            Error::Device(status) => Some(status),
            Error::Signal(source) => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::Gpio { path, source } => {
                write!(f, "gpio error on {}: {}", path.display(), source)
            }
            Error::Bus(msg) => write!(f, "bus error: {}", msg),
            Error::UnsupportedDevice {
                module_type,
                model_id,
            } => write!(
                f,
                "unsupported device: module type 0x{:02X}, model id 0x{:02X}",
                module_type, model_id
            ),
            Error::Device(status) => write!(f, "device error: {}", status),
            Error::Transport(msg) => write!(f, "transport error: {}", msg),
            Error::Signal(source) => write!(f, "cannot install signal handler: {}", source),
            Error::Record(msg) => write!(f, "malformed record: {}", msg),
        }
    }
}

impl From<DeviceStatus> for Error {
    fn from(status: DeviceStatus) -> Self {
        Error::Device(status)
    }
}

impl From<zenoh::Error> for Error {
    fn from(err: zenoh::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl Error {
    /// Shorthand for wrapping an I/O error with the GPIO path it occurred on.
    pub fn gpio(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Gpio {
            path: path.into(),
            source,
        }
    }
}
