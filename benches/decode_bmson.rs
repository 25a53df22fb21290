//! Benchmark for decoding synthetic `BMSON` charts.

use bms_chart::{
    bmson::{BpmEvent, Note, SoundChannel, StopEvent, pulse::PulseNumber},
    prelude::*,
};
use criterion::{Criterion, Throughput};

const PULSES_PER_MEASURE: u64 = 960;

/// A 7-key chart of `measures` measures spread over eight sound channels.
fn synthetic_chart(measures: u64) -> Bmson {
    let mut bmson = Bmson::default();
    bmson.info.title = "synthetic".into();
    bmson.info.init_bpm = 150.0;
    bmson.sound_channels = (0..8)
        .map(|channel| SoundChannel {
            name: format!("key{channel}.wav"),
            notes: (0..measures * 4)
                .map(|beat| Note {
                    x: channel + 1,
                    y: PulseNumber(beat * PULSES_PER_MEASURE / 4),
                    l: if beat % 4 == 3 { 120 } else { 0 },
                    c: beat % 2 == 1,
                    ..Note::default()
                })
                .collect(),
        })
        .collect();
    bmson.bpm_events = (0..measures / 8)
        .map(|index| BpmEvent {
            y: PulseNumber(index * 8 * PULSES_PER_MEASURE),
            bpm: if index % 2 == 0 { 150.0 } else { 180.0 },
        })
        .collect();
    bmson.stop_events = (0..measures / 16)
        .map(|index| StopEvent {
            y: PulseNumber(index * 16 * PULSES_PER_MEASURE + 480),
            duration: 240,
        })
        .collect();
    bmson
}

fn bench_decode_bmson(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_bmson");
    for measures in [16, 128, 512] {
        let bmson = synthetic_chart(measures);
        let json = serde_json::to_vec(&bmson).expect("bmson serializes");

        group.throughput(Throughput::Elements(measures));
        group.bench_function(format!("{measures}_measures"), |b| {
            b.iter(|| decode_bmson(std::hint::black_box(&bmson), &DecodeConfig::default()));
        });
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_function(format!("{measures}_measures_json"), |b| {
            b.iter(|| decode_bmson_json(std::hint::black_box(&json), &DecodeConfig::default()));
        });
    }
    group.finish();
}

fn main() {
    let mut criterion = Criterion::default();
    bench_decode_bmson(&mut criterion);
}
