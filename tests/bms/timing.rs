use bms_chart::prelude::*;
use itertools::Itertools;
use pretty_assertions::assert_eq;

use super::{decode, lane_sounds, warnings};

#[test]
fn tempo_change_mid_measure() {
    let (chart, _) = decode(
        r"
        #BPM 120
        #00003:00F0
        ",
    );
    let half = chart
        .timelines
        .iter()
        .find(|timeline| timeline.section.as_f64() == 0.5)
        .unwrap();
    assert_eq!(half.bpm, 240.0);
    assert_eq!(half.time - chart.timelines[0].time, 240_000_000 / 2 / 120);
}

#[test]
fn stop_and_rate_shift_later_notes() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #STOP01 192
        #00009:01
        #00111:01
        #00102:0.5
        #00211:01
        ",
    );
    assert_eq!(warnings(&log), vec![]);
    // one measure of stop, then 2s per measure, measure 1 lasting half of it
    assert_eq!(
        lane_sounds(&chart, 0),
        vec![(4_000_000, Some(0)), (5_000_000, Some(0))]
    );
    assert_eq!(chart.timelines[0].stop, 2_000_000);
}

#[test]
fn scroll_and_extended_bpm_tables() {
    let (chart, log) = decode(
        r"
        #BPM 150
        #TOTAL 300
        #SCROLL01 0.5
        #EXBPM02 300.5
        #000SC:01
        #00108:0002
        ",
    );
    assert_eq!(warnings(&log), vec![]);
    assert_eq!(chart.timelines[0].scroll, 0.5);
    assert_eq!(chart.max_bpm(), 300.5);
    // scroll carries over to the later time point
    assert_eq!(chart.timelines[1].scroll, 0.5);
}

#[test]
fn undefined_tempo_reference_changes_nothing() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #00108:01
        ",
    );
    assert_eq!(
        warnings(&log),
        vec![DecodeWarning::UndefinedBpm {
            id: ObjId::from_base36(1)
        }]
    );
    assert!(chart.timelines.iter().all(|timeline| timeline.bpm == 120.0));
}

#[test]
fn times_never_decrease() {
    let (chart, _) = decode(
        r"
        #BPM 180
        #WAV01 a.wav
        #BPM01 90
        #STOP01 48
        #00002:0.75
        #00011:01010101
        #00008:0001
        #00109:0100
        #00111:0101
        #00203:0078
        #00211:010101
        ",
    );
    for (prev, next) in chart.timelines.iter().tuple_windows() {
        assert!(prev.section < next.section);
        assert!(prev.time <= next.time);
    }
}

#[test]
fn same_choices_decode_identically() {
    let source = br"
        #BPM 133
        #WAV01 a.wav
        #WAV02 b.wav
        #RANDOM 3
        #IF 2
        #00111:0102
        #ENDIF
        #ENDRANDOM
        #00151:0100
        #00251:0001
    ";
    let config = DecodeConfig::default().with_random(vec![2]);
    let first = decode_bms(source, &config, RngMock([1]));
    let second = decode_bms(source, &config, RngMock([3]));
    assert_eq!(first, second);
    assert_eq!(first.chart.unwrap().random, vec![2]);
}

#[test]
fn mixed_line_lengths_share_a_timeline() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #WAV02 b.wav
        #00002:0.1
        #00011:000100
        #00012:000000020000000000
        ",
    );
    assert_eq!(warnings(&log), vec![]);
    let with_notes: Vec<_> = chart
        .timelines
        .iter()
        .filter(|timeline| timeline.has_note())
        .collect();
    assert_eq!(with_notes.len(), 1);
    assert!(with_notes[0].note(0).is_some());
    assert!(with_notes[0].note(1).is_some());
    assert_eq!(lane_sounds(&chart, 0)[0].0, lane_sounds(&chart, 1)[0].0);
}

#[test]
fn mixed_line_lengths_collide_on_one_lane() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #WAV02 b.wav
        #00002:0.1
        #00011:000100
        #00011:000000020000000000
        ",
    );
    let sounds = lane_sounds(&chart, 0);
    assert_eq!(sounds.len(), 1);
    let (time, wav) = sounds[0];
    // the later line replaces the earlier note
    assert_eq!(wav, Some(1));
    assert_eq!(
        warnings(&log),
        vec![DecodeWarning::NoteCollision { lane: 0, time }]
    );
}

#[test]
fn long_note_end_shares_a_timeline_with_finer_line() {
    let (chart, log) = decode(
        r"
        #BPM 120
        #TOTAL 300
        #WAV01 a.wav
        #WAV02 b.wav
        #00002:0.1
        #00151:010100
        #00012:000000020000000000
        ",
    );
    assert_eq!(warnings(&log), vec![]);
    assert!(chart.contains_long_note());
    let start = chart.lane(0).notes()[0];
    let long = chart.note(start.id).and_then(Note::as_long).unwrap();
    let end = chart.note(long.pair.unwrap()).and_then(Note::as_long).unwrap();
    assert_eq!(end.pair, Some(start.id));

    let lane_0 = lane_sounds(&chart, 0);
    let lane_1 = lane_sounds(&chart, 1);
    assert_eq!(lane_0.len(), 2);
    assert_eq!(lane_0[1].0, lane_1[0].0);
    let shared = chart
        .timelines
        .iter()
        .filter(|timeline| timeline.note(0).is_some() && timeline.note(1).is_some())
        .count();
    assert_eq!(shared, 1);
}
