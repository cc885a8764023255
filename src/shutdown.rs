// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Cooperative shutdown.
//!
//! Signal handlers only set a flag and wake whoever waits on it. The ranging
//! loop observes the flag at the top of each cycle and while it sleeps out the
//! poll delay, after which [`teardown`] puts the sensor back into standby from
//! the main task.

use crate::{
    config::Echo,
    error::Error,
    power::{GpioControl, PowerSequencer},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::{sync::Notify, task::JoinHandle};
use tracing::{debug, info, warn};

/// Shared stop flag, clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop. Calling it again has no further effect.
    pub fn trigger(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            debug!("shutdown requested");
        }
        self.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolve once the shutdown was triggered.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent trigger is not lost.
        notified.as_mut().enable();
        if self.is_triggered() {
            return;
        }
        notified.await;
    }

    /// Trigger on SIGINT or SIGTERM.
    ///
    /// The returned task keeps listening after the first signal, so repeated
    /// interrupts while the loop winds down are absorbed.
    pub fn install(&self) -> Result<JoinHandle<()>, Error> {
        let shutdown = self.clone();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut interrupt = signal(SignalKind::interrupt()).map_err(Error::Signal)?;
            let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;

            Ok(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(()) = interrupt.recv() => info!("received SIGINT"),
                        Some(()) = terminate.recv() => info!("received SIGTERM"),
                        else => break,
                    }
                    shutdown.trigger();
                }
            }))
        }

        #[cfg(not(unix))]
        {
            Ok(tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    info!("received ctrl-c");
                    shutdown.trigger();
                }
            }))
        }
    }
}

/// Line printed once the application stops, unless quiet.
pub fn farewell(echo: Echo) -> Option<&'static str> {
    (!echo.is_quiet()).then_some("Exiting...")
}

/// Release the sensor and say goodbye.
///
/// `power` is `None` when the sensor was never powered through GPIO, as in a
/// simulated run. Safe to call on a sequencer that never powered the sensor
/// on.
pub fn teardown<G: GpioControl>(
    power: Option<&mut PowerSequencer<G>>,
    echo: Echo,
) -> Result<(), Error> {
    let res = match power {
        Some(power) => power.power_off(),
        None => Ok(()),
    };
    if let Err(err) = &res {
        warn!("teardown incomplete: {}", err);
    }

    if let Some(text) = farewell(echo) {
        println!("{}", text);
    }
    res
}
