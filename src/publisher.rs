// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Telemetry publisher abstraction.
//!
//! The [`Publish`] trait decouples the polling loop from the transport:
//!
//! - [`ZenohPublisher`]: live operation, one zenoh publisher on the telemetry
//!   key expression.
//! - [`RecordingPublisher`]: keeps every record in memory for testing.
//!
//! Publishing is fire-and-forget. Records are dropped under congestion or when
//! no subscriber is connected, and send failures are only traced.

use crate::error::Error;
use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};
use tracing::{debug, info};
use zenoh::{
    bytes::Encoding,
    pubsub::Publisher,
    qos::{CongestionControl, Priority},
    Session,
};

pub trait Publish: Send {
    /// Send one record without waiting for any subscriber.
    fn publish<'a>(&'a self, record: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Publisher bound to a zenoh session.
pub struct ZenohPublisher {
    // Keeps the session and its listeners alive for the publisher's lifetime.
    _session: Session,
    publisher: Publisher<'static>,
    topic: String,
}

impl ZenohPublisher {
    /// Open the zenoh session described by `config` and declare the
    /// publisher. Fails when a listen endpoint cannot be bound.
    pub async fn bind(config: zenoh::Config, topic: &str) -> Result<Self, Error> {
        let session = zenoh::open(config).await?;
        debug!("opened zenoh session {}", session.zid());

        let publisher = session
            .declare_publisher(topic.to_owned())
            .priority(Priority::DataHigh)
            .congestion_control(CongestionControl::Drop)
            .encoding(Encoding::TEXT_PLAIN)
            .await?;
        info!("publishing ranging telemetry on {}", topic);

        Ok(Self {
            _session: session,
            publisher,
            topic: topic.to_owned(),
        })
    }
}

impl Publish for ZenohPublisher {
    fn publish<'a>(&'a self, record: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if let Err(e) = self.publisher.put(record).await {
                debug!("{} message dropped: {:?}", self.topic, e);
            }
        })
    }
}

/// In-memory publisher, clones share the same record list.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    records: Arc<Mutex<Vec<(tokio::time::Instant, String)>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records published so far.
    pub fn records(&self) -> Vec<String> {
        self.timed_records().into_iter().map(|(_, r)| r).collect()
    }

    /// Records together with the (tokio) time they were published at.
    pub fn timed_records(&self) -> Vec<(tokio::time::Instant, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.timed_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Publish for RecordingPublisher {
    fn publish<'a>(&'a self, record: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let entry = (tokio::time::Instant::now(), record.to_owned());
            match self.records.lock() {
                Ok(mut records) => records.push(entry),
                Err(poisoned) => poisoned.into_inner().push(entry),
            }
        })
    }
}
