use bms_chart::prelude::*;
use pretty_assertions::assert_eq;

use super::{decode, lane_sounds, warnings};

/// Every long note has a mutual pair with exactly one end.
fn assert_pairs_closed(chart: &Chart) {
    for (id, note) in chart.notes.iter() {
        let Some(long) = note.as_long() else {
            continue;
        };
        let pair = long.pair.expect("long notes in a chart are paired");
        let other = chart
            .note(pair)
            .and_then(Note::as_long)
            .expect("pair is a long note");
        assert_eq!(other.pair, Some(id));
        assert_ne!(long.end, other.end);
        assert_eq!(long.ln_type, other.ln_type);
    }
}

#[test]
fn channel_pairs_are_mutual() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #WAV02 b.wav
        #00151:01000100
        #00152:0102
        ",
    );
    assert_eq!(warnings(&log), vec![]);
    assert_pairs_closed(&chart);
    assert!(chart.contains_long_note());
    // an end with the start's sound is silent
    assert_eq!(
        lane_sounds(&chart, 0),
        vec![(2_000_000, Some(0)), (3_000_000, None)]
    );
    assert_eq!(
        lane_sounds(&chart, 1),
        vec![(2_000_000, Some(0)), (3_000_000, Some(1))]
    );
}

#[test]
fn unterminated_start_is_dropped() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #00111:01
        #00151:0001
        ",
    );
    let unterminated: Vec<_> = warnings(&log)
        .into_iter()
        .filter(|warning| matches!(warning, DecodeWarning::UnterminatedLongNote { .. }))
        .collect();
    assert_eq!(
        unterminated,
        vec![DecodeWarning::UnterminatedLongNote { lane: 0 }]
    );
    // the normal note of the visible channel stays
    assert_eq!(lane_sounds(&chart, 0), vec![(2_000_000, Some(0))]);
    assert!(!chart.contains_long_note());
    assert_pairs_closed(&chart);
}

#[test]
fn lnobj_converts_previous_note() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #WAV02 end.wav
        #LNOBJ 02
        #00111:0102
        ",
    );
    assert_eq!(warnings(&log), vec![]);
    assert_pairs_closed(&chart);
    assert_eq!(
        lane_sounds(&chart, 0),
        vec![(2_000_000, Some(0)), (3_000_000, None)]
    );
    assert!(chart.timelines.iter().all(|timeline| timeline.background_notes.is_empty()));
    assert_eq!(chart.total_notes(), 1);
}

#[test]
fn lnobj_without_note_is_unmatched() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV02 end.wav
        #LNOBJ 02
        #00111:02
        ",
    );
    assert_eq!(
        warnings(&log),
        vec![DecodeWarning::LnObjUnmatched {
            lane: 0,
            time: 2_000_000
        }]
    );
    assert_eq!(chart.total_notes(), 0);
}

#[test]
fn charge_note_policy_counts_ends() {
    let source = r"
        #BPM 120
        #WAV01 a.wav
        #00151:0101
    ";
    let long = decode_bms_str(source, &DecodeConfig::default(), RngMock([1]))
        .chart
        .unwrap();
    let charge = decode_bms_str(
        source,
        &DecodeConfig::default().with_ln_type(LnType::ChargeNote),
        RngMock([1]),
    )
    .chart
    .unwrap();
    assert_eq!(long.total_notes(), 1);
    assert_eq!(charge.total_notes(), 2);
    assert!(charge.contains_undefined_long_note());
}
