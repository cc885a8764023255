// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Histogram decoding.
//!
//! The sensor alternates between two range timings. Each result is either an
//! "A" frame or a "B" frame, and the raw additional-data buffer has a
//! different layout for each:
//!
//! ```text
//!          ┌───┬──────────────┬─────────────────────────┐
//! A frame  │ 0 │ 1..=4 unused │ 5..=23 valid (19 bins)  │
//!          ├───┼──────────────┴─────────────────────────┤
//! B frame  │ 0 │ 1..=23 valid (23 bins)                 │
//!          └───┴────────────────────────────────────────┘
//! ```
//!
//! Which parity of `stream_count` is an A frame is not settled for every
//! firmware, so it is carried as a [`ParityConvention`].

use crate::device::HISTOGRAM_BUFFER_SIZE;
use clap::ValueEnum;
use std::fmt;

/// First valid bin of an A frame.
pub const A_FIRST_BIN: usize = 5;

/// First valid bin of a B frame.
pub const B_FIRST_BIN: usize = 1;

/// Which frames carry a histogram in the published record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum HistogramMode {
    /// No histogram; every frame is published without bins
    #[default]
    #[value(skip)]
    None,
    /// Publish A frames only
    #[value(name = "A")]
    A,
    /// Publish B frames only
    #[value(name = "B")]
    B,
    /// Publish both frame kinds
    #[value(name = "AB")]
    Both,
}

impl fmt::Display for HistogramMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HistogramMode::None => write!(f, "none"),
            HistogramMode::A => write!(f, "A"),
            HistogramMode::B => write!(f, "B"),
            HistogramMode::Both => write!(f, "AB"),
        }
    }
}

/// Mapping from `stream_count` parity to frame kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ParityConvention {
    /// Even stream counts are A frames
    #[default]
    #[value(name = "even-a")]
    EvenIsA,
    /// Odd stream counts are A frames
    #[value(name = "odd-a")]
    OddIsA,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    A,
    B,
}

impl FrameKind {
    pub fn of(stream_count: u8, convention: ParityConvention) -> Self {
        let even = stream_count % 2 == 0;
        match (convention, even) {
            (ParityConvention::EvenIsA, true) | (ParityConvention::OddIsA, false) => FrameKind::A,
            _ => FrameKind::B,
        }
    }

    /// Index of the first bin holding ranging data.
    pub fn first_valid_bin(&self) -> usize {
        match self {
            FrameKind::A => A_FIRST_BIN,
            FrameKind::B => B_FIRST_BIN,
        }
    }
}

impl HistogramMode {
    /// Whether a histogram should be decoded for a frame of this kind.
    pub fn selects(&self, kind: FrameKind) -> bool {
        matches!(
            (self, kind),
            (HistogramMode::A, FrameKind::A)
                | (HistogramMode::B, FrameKind::B)
                | (HistogramMode::Both, _)
        )
    }
}

/// Return the valid bins of a raw histogram buffer in index order.
///
/// Buffers shorter than the first valid bin decode to an empty histogram.
pub fn decode(raw: &[i32], kind: FrameKind) -> Vec<i32> {
    let end = raw.len().min(HISTOGRAM_BUFFER_SIZE);
    raw.get(kind.first_valid_bin()..end)
        .map(|bins| bins.to_vec())
        .unwrap_or_default()
}
