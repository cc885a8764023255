// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser as _;
use edgefirst_tofpub::{
    args::Args,
    config::Config,
    device::RangingDevice,
    error::Error,
    polling::PollingLoop,
    power::SysfsGpio,
    publisher::ZenohPublisher,
    shutdown::{self, Shutdown},
    simulated::SimulatedDevice,
    startup::{self, Sensor},
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .init();

    let shutdown = Shutdown::new();
    let _signals = shutdown.install()?;

    let Sensor {
        config,
        mut power,
        session,
    } = startup::launch(&args, SysfsGpio::default(), open_device).inspect_err(|err| {
        error!("{}", err);
    })?;

    let publisher = match bind(&args, &config).await {
        Ok(publisher) => publisher,
        Err(err) => {
            error!("{}", err);
            if let Some(power) = power.as_mut() {
                let _ = power.power_off();
            }
            return Err(err.into());
        }
    };

    let mut ranging = PollingLoop::new(session, publisher, &config);
    let stats = ranging.run(&shutdown).await;
    info!(
        "published {} of {} ready frames ({} empty, {} skipped, {} device errors)",
        stats.published, stats.ready, stats.empty, stats.skipped, stats.device_errors
    );

    // Teardown failures are already logged, exit cleanly regardless.
    let _ = shutdown::teardown(power.as_mut(), config.echo);
    Ok(())
}

async fn bind(args: &Args, config: &Config) -> Result<ZenohPublisher, Error> {
    ZenohPublisher::bind(zenoh::Config::try_from(args)?, &config.topic).await
}

fn open_device(config: &Config) -> Result<Box<dyn RangingDevice>, Error> {
    if config.simulate {
        info!("using simulated sensor");
        return Ok(Box::new(SimulatedDevice::new()));
    }

    #[cfg(feature = "vl53lx")]
    {
        let device = edgefirst_tofpub::vl53lx::Vl53lx::open(
            &config.bus,
            edgefirst_tofpub::device::DEFAULT_ADDRESS,
        )?;
        Ok(Box::new(device))
    }

    #[cfg(not(feature = "vl53lx"))]
    {
        Err(Error::Config(format!(
            "cannot open {}: built without the vl53lx feature",
            config.bus.display()
        )))
    }
}
