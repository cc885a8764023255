// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Telemetry record formatting.
//!
//! # Wire record
//!
//! One line per published frame, whitespace separated:
//!
//! ```text
//! <stream_count> [<bin>,<bin>,...] <object> <object> ...
//!
//! object = status,min_mm,distance_mm,max_mm,sigma_mm,signal_rate,ambient_rate
//! ```
//!
//! The histogram block is only present when the frame carries one. The three
//! fixed-point fields are printed with exactly two decimals, which is also how
//! [`parse_record`] tells an object from a histogram block.
//!
//! # Echo
//!
//! [`render_verbose`] produces the human-readable description printed in
//! [`Echo::Verbose`] mode. It is independent of the wire record.

use crate::{config::Echo, device::MeasurementFrame, error::Error};
use std::{fmt::Write as _, str::FromStr};

/// Fields of a wire record object.
const OBJECT_FIELDS: usize = 7;

/// A wire record read back by a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub stream_count: u8,
    pub histogram: Option<Vec<i32>>,
    pub objects: Vec<ObjectRecord>,
}

/// One object of a [`Record`], fixed-point values already scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectRecord {
    pub status: u8,
    pub min_mm: i16,
    pub distance_mm: i16,
    pub max_mm: i16,
    pub sigma_mm: f64,
    pub signal_rate_mcps: f64,
    pub ambient_rate_mcps: f64,
}

/// Render a frame into its wire record.
pub fn format_record(frame: &MeasurementFrame) -> String {
    let mut record = String::with_capacity(64 + 48 * frame.objects.len());
    format_record_into(frame, &mut record);
    record
}

/// Render a frame into an existing buffer, replacing its contents.
pub fn format_record_into(frame: &MeasurementFrame, out: &mut String) {
    out.clear();
    // Writing into a String cannot fail.
    let _ = write!(out, "{}", frame.stream_count);

    if let Some(histogram) = &frame.histogram {
        out.push(' ');
        push_bins(out, histogram);
    }

    for obj in &frame.objects {
        let _ = write!(
            out,
            " {},{},{},{},{:.2},{:.2},{:.2}",
            obj.status,
            obj.min_mm,
            obj.distance_mm,
            obj.max_mm,
            obj.sigma(),
            obj.signal_rate(),
            obj.ambient_rate()
        );
    }
}

fn push_bins(out: &mut String, bins: &[i32]) {
    for (i, bin) in bins.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", bin);
    }
}

/// Parse a wire record as produced by [`format_record`].
pub fn parse_record(line: &str) -> Result<Record, Error> {
    let mut tokens = line.split_whitespace().peekable();

    let stream_count = match tokens.next() {
        Some(token) => field(token, "stream count")?,
        None => return Err(Error::Record("empty record".into())),
    };

    // Objects always carry decimals, histogram bins never do.
    let histogram = match tokens.next_if(|token| !token.contains('.')) {
        Some(token) => Some(
            token
                .split(',')
                .map(|bin| field(bin, "histogram bin"))
                .collect::<Result<Vec<i32>, Error>>()?,
        ),
        None => None,
    };

    let objects = tokens.map(parse_object).collect::<Result<Vec<_>, _>>()?;
    if objects.is_empty() {
        return Err(Error::Record(format!("frame {} has no objects", stream_count)));
    }

    Ok(Record {
        stream_count,
        histogram,
        objects,
    })
}

fn parse_object(token: &str) -> Result<ObjectRecord, Error> {
    let fields: Vec<&str> = token.split(',').collect();
    if fields.len() != OBJECT_FIELDS {
        return Err(Error::Record(format!(
            "object {:?} has {} fields, expected {}",
            token,
            fields.len(),
            OBJECT_FIELDS
        )));
    }

    Ok(ObjectRecord {
        status: field(fields[0], "status")?,
        min_mm: field(fields[1], "min distance")?,
        distance_mm: field(fields[2], "distance")?,
        max_mm: field(fields[3], "max distance")?,
        sigma_mm: field(fields[4], "sigma")?,
        signal_rate_mcps: field(fields[5], "signal rate")?,
        ambient_rate_mcps: field(fields[6], "ambient rate")?,
    })
}

fn field<T: FromStr>(value: &str, name: &str) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| Error::Record(format!("invalid {}: {:?}", name, value)))
}

/// Human-readable, multi-line description of a frame.
pub fn render_verbose(frame: &MeasurementFrame) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Count:     {},", frame.stream_count);
    let _ = writeln!(text, "# Objs:    {}", frame.objects.len());

    if let Some(histogram) = &frame.histogram {
        text.push_str("Histogram: ");
        push_bins(&mut text, histogram);
        text.push('\n');
    }

    for obj in &frame.objects {
        let _ = writeln!(
            text,
            "Status={}, Min Dist={} mm, Dist={} mm, Max dist={} mm, Sigma={:.2} mm, \
             Signal Rate={:.2} Mcps, Ambient Rate={:.2} Mcps",
            obj.status,
            obj.min_mm,
            obj.distance_mm,
            obj.max_mm,
            obj.sigma(),
            obj.signal_rate(),
            obj.ambient_rate()
        );
    }

    text
}

/// Text to print on stdout for a published frame, if any.
pub fn echo_text(echo: Echo, frame: &MeasurementFrame, record: &str) -> Option<String> {
    match echo {
        Echo::Verbose => Some(render_verbose(frame)),
        Echo::Compact => Some(record.to_owned()),
        Echo::Quiet => None,
    }
}
