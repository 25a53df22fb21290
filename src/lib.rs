//! Decoders of BMS-family rhythm game charts into a time-resolved [`Chart`](chart::Chart).
//!
//! Two encodings are supported:
//!
//! - The line-oriented measure/channel text format (`.bms`, `.bme`, `.bml`, `.pms`), decoded
//!   by [`bms::decode_bms`].
//! - The JSON format bmson, decoded by [`bmson::decode::decode_bmson`].
//!
//! Both produce the same model: an ordered list of time points with absolute microsecond
//! times, an arena of notes where long notes are linked pairs, and the resource lists the notes
//! refer to. Problems found on the way are collected into a
//! [`DecodeLog`](decode_log::DecodeLog) instead of aborting the decode.
//!
//! ```rust
//! use bms_chart::prelude::*;
//!
//! let source = "#TITLE Example\n#BPM 150\n#WAV01 a.wav\n#00111:01\n";
//! let output = decode_bms_str(source, &DecodeConfig::default(), RngMock([1]));
//! let chart = output.chart.unwrap();
//! assert_eq!(chart.mode, Mode::Beat5K);
//! assert_eq!(chart.timelines[0].bpm, 150.0);
//! ```
//!
//! # Features
//!
//! - `bmson`: JSON reading of bmson charts. The [`bmson`] schema types exist without it.
//! - `serde`: serialization of the schema and the decoded model.
//! - `rand`: [`rng::RandRng`], an adapter for generators of the `rand` crate.
//! - `diagnostics`: rendering of decode logs with `ariadne`.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bms;
pub mod bmson;
pub mod chart;
pub mod config;
pub mod decode_log;
#[cfg(feature = "diagnostics")]
pub mod diagnostics;
pub mod prelude;
pub mod rng;
