use bms_chart::{bms::numeral::parse_base36, prelude::*};
use pretty_assertions::assert_eq;

use super::{decode, warnings};

#[test]
fn base36_pairs_ignore_case() {
    assert_eq!(parse_base36("1Z"), Ok(71));
    assert_eq!(parse_base36("1z"), parse_base36("1Z"));
    assert!(parse_base36("#!").is_err());
}

#[test]
fn player_mismatch_warns() {
    let (chart, log) = decode(
        r"
        #PLAYER 3
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #00111:01
        ",
    );
    assert_eq!(chart.mode, Mode::Beat5K);
    assert_eq!(
        warnings(&log),
        vec![DecodeWarning::PlayerWithoutSecondSide {
            player: 3,
            mode: Mode::Beat5K
        }]
    );
}

#[test]
fn missing_total_warns() {
    let (_, log) = decode("#BPM 120");
    assert_eq!(
        warnings(&log),
        vec![DecodeWarning::TotalTooLow { total: 0.0 }]
    );
}

#[test]
fn modes_upgrade_with_used_lanes() {
    let mode_of = |notes: &str| {
        let source = format!("#BPM 120\n#WAV01 a.wav\n{notes}");
        decode(&source).0.mode
    };
    assert_eq!(mode_of("#00111:01"), Mode::Beat5K);
    assert_eq!(mode_of("#00118:01"), Mode::Beat7K);
    assert_eq!(mode_of("#00121:01"), Mode::Beat10K);
    assert_eq!(mode_of("#00119:01\n#00226:01"), Mode::Beat14K);
}

#[test]
fn repeated_poor_picture_is_one_frame() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #BMP01 miss.bmp
        #BMP02 other.bmp
        #00106:01010001
        #00206:0102
        ",
    );
    assert_eq!(warnings(&log), vec![]);
    let layers: Vec<_> = chart
        .timelines
        .iter()
        .filter_map(|timeline| timeline.miss_layer.as_ref())
        .collect();
    assert_eq!(layers.len(), 2);
    assert_eq!(
        layers[0].frames,
        vec![MissFrame {
            time_ms: 0,
            bga: Some(0)
        }]
    );
    assert_eq!(layers[1].frames.len(), 2);
    assert_eq!(layers[1].duration_ms, MissLayer::DURATION_MS);
}
