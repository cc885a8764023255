// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Ranging telemetry subscriber
//!
//! This example connects to a running `tofpub` and prints a summary of every
//! record published on the ranging topic.
//!
//! # Usage
//!
//! ```bash
//! # Publisher on this machine, default port
//! cargo run --example tof_subscriber
//!
//! # Publisher on a target board
//! cargo run --example tof_subscriber -- --connect tcp/10.10.40.12:5556
//! ```

use clap::Parser;
use edgefirst_tofpub::{error::Error, telemetry};
use serde_json::json;
use zenoh::config::WhatAmI;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ranging telemetry subscriber")]
struct Args {
    /// Ranging telemetry topic
    #[arg(long, default_value = "rt/tof/ranging")]
    topic: String,

    /// Endpoint of the publisher
    #[arg(long, default_value = "tcp/127.0.0.1:5556")]
    connect: Vec<String>,

    /// zenoh connection mode
    #[arg(long, default_value = "client")]
    mode: WhatAmI,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let mut config = zenoh::Config::default();
    config.insert_json5("mode", &json!(args.mode).to_string())?;
    config.insert_json5("connect/endpoints", &json!(args.connect).to_string())?;
    config.insert_json5("scouting/multicast/enabled", &json!(false).to_string())?;

    let session = zenoh::open(config).await?;
    let subscriber = session.declare_subscriber(args.topic.as_str()).await?;
    println!("Listening for ranging records on {}", args.topic);

    while let Ok(sample) = subscriber.recv_async().await {
        let line = match sample.payload().try_to_string() {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Non-text payload: {}", e);
                continue;
            }
        };

        match telemetry::parse_record(&line) {
            Ok(record) => {
                let nearest = record.objects.iter().map(|o| o.distance_mm).min();
                println!(
                    "Frame {}: {} objects, nearest {} mm{}",
                    record.stream_count,
                    record.objects.len(),
                    nearest.unwrap_or_default(),
                    match &record.histogram {
                        Some(bins) => format!(", {} histogram bins", bins.len()),
                        None => String::new(),
                    }
                );
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}
