// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Ranging telemetry loop.
//!
//! Each cycle runs the following state machine:
//!
//! ```text
//!  ┌──────┐   ┌────────────┐  not ready   ┌───────┐
//!  │ Idle │──►│ CheckReady │─────────────►│ Delay │──► Idle
//!  └──────┘   └────────────┘              └───────┘
//!                   │ ready                   │
//!                   ▼                         ▼
//!               ┌───────┐                 ┌───────┐   ┌────────┐   ┌─────────┐   ┌───────────────┐
//!               │ Delay │────────────────►│ Fetch │──►│ Decode │──►│ Publish │──►│ ClearAndRearm │──► Idle
//!               └───────┘                 └───────┘   └────────┘   └─────────┘   └───────────────┘
//! ```
//!
//! The poll delay runs every cycle regardless of readiness, which bounds the
//! bus query rate. Device errors during a cycle are logged and never stop the
//! loop, and a ready frame is always acknowledged exactly once. The loop
//! returns once shutdown is observed at the top of a cycle or during the poll
//! delay. A shutdown during the delay cuts the cycle short: a ready frame is
//! acknowledged but neither fetched nor published.

use crate::{
    config::{Config, Echo},
    device::{MeasurementFrame, RangingDevice},
    histogram::{self, FrameKind, HistogramMode, ParityConvention},
    publisher::Publish,
    session::Session,
    shutdown::Shutdown,
    telemetry,
};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Counters kept across the lifetime of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Readiness checks performed
    pub cycles: u64,
    /// Cycles where a result was ready
    pub ready: u64,
    /// Ready frames reporting no objects
    pub empty: u64,
    /// Frames not matching the selected histogram mode
    pub skipped: u64,
    /// Records handed to the publisher
    pub published: u64,
    /// Device calls that returned an error status
    pub device_errors: u64,
}

/// What happened to a ready frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Published,
    Empty,
    Skipped,
    Failed,
}

pub struct PollingLoop<D: RangingDevice, P: Publish> {
    session: Session<D>,
    publisher: P,
    histogram: HistogramMode,
    parity: ParityConvention,
    echo: Echo,
    poll_period: Duration,
    record: String,
    stats: LoopStats,
}

impl<D: RangingDevice, P: Publish> PollingLoop<D, P> {
    pub fn new(session: Session<D>, publisher: P, config: &Config) -> Self {
        Self {
            session,
            publisher,
            histogram: config.histogram,
            parity: config.parity,
            echo: config.echo,
            poll_period: config.poll_period,
            record: String::with_capacity(512),
            stats: LoopStats::default(),
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Poll the device until `shutdown` is triggered.
    pub async fn run(&mut self, shutdown: &Shutdown) -> LoopStats {
        info!("ranging started");

        while !shutdown.is_triggered() {
            self.cycle(shutdown).await;
        }

        debug!("ranging loop stopped: {:?}", self.stats);
        self.stats
    }

    /// One pass of the state machine.
    pub async fn cycle(&mut self, shutdown: &Shutdown) {
        self.stats.cycles += 1;

        let ready = match self.session.device_mut().data_ready() {
            Ok(ready) => ready,
            Err(status) => {
                self.stats.device_errors += 1;
                warn!("data ready check failed: {}", status);
                false
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(self.poll_period) => {}
            _ = shutdown.wait() => {}
        }

        if !ready {
            return;
        }
        self.stats.ready += 1;

        if shutdown.is_triggered() {
            debug!("shutdown during poll delay, frame not fetched");
            self.rearm();
            return;
        }

        let outcome = self.process_frame().await;
        match outcome {
            Outcome::Published => self.stats.published += 1,
            Outcome::Empty => self.stats.empty += 1,
            Outcome::Skipped => self.stats.skipped += 1,
            Outcome::Failed => self.stats.device_errors += 1,
        }

        self.rearm();
    }

    fn rearm(&mut self) {
        if let Err(status) = self.session.device_mut().clear_and_rearm() {
            self.stats.device_errors += 1;
            warn!("clear and rearm failed: {}", status);
        }
    }

    async fn process_frame(&mut self) -> Outcome {
        let mut frame = match self.session.device_mut().get_frame() {
            Ok(frame) => frame,
            Err(status) => {
                warn!("ranging data fetch failed: {}", status);
                return Outcome::Failed;
            }
        };

        if frame.objects.is_empty() {
            trace!("frame {} has no objects", frame.stream_count);
            return Outcome::Empty;
        }

        if self.histogram != HistogramMode::None {
            let kind = FrameKind::of(frame.stream_count, self.parity);
            if !self.histogram.selects(kind) {
                trace!("frame {} is {:?}, skipped", frame.stream_count, kind);
                return Outcome::Skipped;
            }

            match self.session.device_mut().get_additional_data() {
                Ok(raw) => frame.histogram = Some(histogram::decode(&raw, kind)),
                Err(status) => {
                    warn!("histogram fetch failed: {}", status);
                    return Outcome::Failed;
                }
            }
        }

        self.publish(&frame).await;
        Outcome::Published
    }

    async fn publish(&mut self, frame: &MeasurementFrame) {
        telemetry::format_record_into(frame, &mut self.record);
        self.publisher.publish(&self.record).await;
        debug!("published frame {}", frame.stream_count);

        if let Some(text) = telemetry::echo_text(self.echo, frame, &self.record) {
            println!("{}", text);
        }
    }
}
