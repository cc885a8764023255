// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! EdgeFirst Time-of-Flight Publisher Library
//!
//! This library drives a VL53L3CX multi-object ranging sensor and publishes
//! one text record per measurement over zenoh.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────┐     ┌─────────────────┐
//! │ PowerSequencer  │ ──► │    Session    │ ──► │   PollingLoop   │
//! │ (XSHUT / GPIO)  │     │ (boot+config) │     │ (ready/fetch)   │
//! └─────────────────┘     └───────────────┘     └─────────────────┘
//!                                                       │
//!                               ┌───────────────────────┴─────────────┐
//!                               ▼                                     ▼
//!                    ┌─────────────────────┐              ┌─────────────────────┐
//!                    │ histogram::decode   │ ──────────►  │ telemetry + Publish │
//!                    │ (A/B bin windows)   │              │ (record / zenoh)    │
//!                    └─────────────────────┘              └─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`args`]: Command line and environment configuration
//! - [`config`]: Validated runtime configuration
//! - [`device`]: Ranging device trait, frame types and status codes
//! - [`histogram`]: A/B frame classification and histogram windows
//! - [`polling`]: Steady-state ranging loop
//! - [`power`]: XSHUT power sequencing over GPIO
//! - [`publisher`]: Telemetry transport
//! - [`session`]: Device startup sequence
//! - [`shutdown`]: Signal handling and teardown
//! - [`simulated`]: Hardware-free device backend
//! - [`startup`]: Argument validation, power-on and session bring-up
//! - [`telemetry`]: Record serialization, parsing and console echo
//! - `vl53lx` (feature `vl53lx`): ST bare driver backend
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_tofpub::{
//!     config::Config, polling::PollingLoop, publisher::RecordingPublisher,
//!     session::Session, shutdown::Shutdown, simulated::SimulatedDevice,
//! };
//!
//! let config = Config::default();
//! let session = Session::open(SimulatedDevice::new(), &config)?;
//! let mut ranging = PollingLoop::new(session, RecordingPublisher::new(), &config);
//! let stats = ranging.run(&Shutdown::new()).await;
//! ```

pub mod args;
pub mod config;
pub mod device;
pub mod error;
pub mod histogram;
pub mod polling;
pub mod power;
pub mod publisher;
pub mod session;
pub mod shutdown;
pub mod simulated;
pub mod startup;
pub mod telemetry;
#[cfg(feature = "vl53lx")]
pub mod vl53lx;

// Re-exports for convenience
pub use config::Config;
pub use device::{DeviceStatus, MeasurementFrame, RangeObject, RangingDevice};
pub use error::Error;
pub use histogram::{FrameKind, HistogramMode, ParityConvention};
pub use polling::{LoopStats, PollingLoop};
pub use publisher::{Publish, ZenohPublisher};
pub use session::Session;
pub use shutdown::Shutdown;
pub use startup::{launch, Sensor};
#[cfg(feature = "vl53lx")]
pub use vl53lx::Vl53lx;
