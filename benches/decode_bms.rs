//! Benchmark for decoding synthetic `BMS` charts.

use std::fmt::Write as _;

use bms_chart::prelude::*;
use criterion::{Criterion, Throughput};

/// A 7-key chart of `measures` measures with notes, long notes, tempo changes and a branch.
fn synthetic_chart(measures: usize) -> String {
    let mut source = String::from(
        "#PLAYER 1\n#TITLE synthetic\n#BPM 150\n#TOTAL 300\n#LNOBJ ZZ\n#BPM01 75\n#STOP01 48\n",
    );
    for id in 1..=8 {
        let _ = writeln!(source, "#WAV{id:02} key{id}.wav");
    }
    source.push_str("#RANDOM 2\n#IF 1\n#00011:01\n#ENDIF\n#IF 2\n#00012:02\n#ENDIF\n#ENDRANDOM\n");
    for measure in 1..=measures {
        let _ = writeln!(source, "#{measure:03}01:0102030405060708");
        for channel in ["11", "13", "15", "18"] {
            let _ = writeln!(source, "#{measure:03}{channel}:0100020003000400");
        }
        let _ = writeln!(source, "#{measure:03}12:01ZZ0000");
        let _ = writeln!(source, "#{measure:03}56:01000000000000000100000000000000");
        if measure % 8 == 0 {
            let _ = writeln!(source, "#{measure:03}08:0001");
            let _ = writeln!(source, "#{measure:03}09:01");
        }
    }
    source
}

fn bench_decode_bms(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_bms");
    for measures in [16, 128, 512] {
        let source = synthetic_chart(measures);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(format!("{measures}_measures"), |b| {
            b.iter(|| {
                decode_bms(
                    std::hint::black_box(source.as_bytes()),
                    std::hint::black_box(&DecodeConfig::default()),
                    RngMock([1]),
                )
            });
        });
    }
    group.finish();
}

fn main() {
    let mut criterion = Criterion::default();
    bench_decode_bms(&mut criterion);
}
