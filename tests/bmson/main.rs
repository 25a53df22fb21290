//! Tests for `bms_chart::bmson`.

use bms_chart::prelude::*;
use pretty_assertions::assert_eq;

fn decode(json: &str) -> (Chart, Vec<DecodeWarning>) {
    let DecodeOutput { chart, log } = decode_bmson_json(json.as_bytes(), &DecodeConfig::default());
    let chart = chart.unwrap_or_else(|| panic!("expected a chart, got {log:?}"));
    (chart, log.warnings().cloned().collect())
}

#[test]
fn decodes_a_small_chart() {
    let (chart, warnings) = decode(
        r#"{
            "version": "1.0.0",
            "info": {
                "title": "Song",
                "subtitle": "remix",
                "chart_name": "ANOTHER",
                "artist": "someone",
                "mode_hint": "beat-7k",
                "init_bpm": 150,
                "level": 12,
                "total": 300
            },
            "lines": [{ "y": 0 }, { "y": 960 }],
            "sound_channels": [
                { "name": "kick.wav", "notes": [{ "x": 1, "y": 0 }, { "x": 8, "y": 480 }] },
                { "name": "bgm.ogg", "notes": [{ "x": 0, "y": 0 }] }
            ]
        }"#,
    );
    assert_eq!(warnings, vec![]);
    assert_eq!(chart.full_title(), "Song remix [ANOTHER]");
    assert_eq!(chart.header.playlevel, "12");
    assert_eq!(chart.mode, Mode::Beat7K);
    assert_eq!(chart.wav_list, vec!["kick.wav", "bgm.ogg"]);
    assert_eq!(chart.total_notes(), 2);
    assert_eq!(chart.timelines[0].background_notes.len(), 1);
    // half a measure at 150 bpm
    assert_eq!(chart.lane(7).notes()[0].time, 800_000);
}

#[test]
fn quarter_note_stop_at_120() {
    let (chart, _) = decode(
        r#"{
            "info": { "init_bpm": 120, "resolution": 240 },
            "stop_events": [{ "y": 0, "duration": 240 }],
            "sound_channels": [{ "name": "a.wav", "notes": [{ "x": 1, "y": 960 }] }]
        }"#,
    );
    assert_eq!(chart.timelines[0].stop, 500_000);
    assert_eq!(chart.lane(0).notes()[0].time, 2_500_000);
}

#[test]
fn bpm_applies_before_stop_on_the_same_pulse() {
    let (chart, _) = decode(
        r#"{
            "info": { "init_bpm": 120 },
            "bpm_events": [{ "y": 0, "bpm": 240 }],
            "stop_events": [{ "y": 0, "duration": 960 }]
        }"#,
    );
    assert_eq!(chart.timelines[0].bpm, 240.0);
    assert_eq!(chart.timelines[0].stop, 1_000_000);
}

#[test]
fn note_inside_long_note_goes_to_background() {
    let (chart, warnings) = decode(
        r#"{
            "info": { "init_bpm": 120, "mode_hint": "beat-5k" },
            "sound_channels": [
                { "name": "long.wav", "notes": [{ "x": 8, "y": 0, "l": 960 }] },
                { "name": "inner.wav", "notes": [{ "x": 8, "y": 480 }] }
            ]
        }"#,
    );
    assert_eq!(
        warnings,
        vec![DecodeWarning::NoteInsideLn {
            lane: 5,
            time: 1_000_000
        }]
    );
    assert_eq!(chart.lane(5).notes().len(), 2);
    let background: usize = chart
        .timelines
        .iter()
        .map(|timeline| timeline.background_notes.len())
        .sum();
    assert_eq!(background, 1);
}

#[test]
fn long_note_type_per_note_wins() {
    let (chart, _) = decode(
        r#"{
            "info": { "init_bpm": 120, "ln_type": 1 },
            "sound_channels": [
                { "name": "a.wav", "notes": [
                    { "x": 1, "y": 0, "l": 240, "t": 3 },
                    { "x": 2, "y": 0, "l": 240 }
                ] }
            ]
        }"#,
    );
    let type_of = |lane: usize| {
        let placed = chart.lane(lane).notes()[0];
        chart
            .note(placed.id)
            .and_then(Note::as_long)
            .map(|long| long.ln_type)
    };
    assert_eq!(type_of(0), Some(LongNoteType::HellChargeNote));
    assert_eq!(type_of(1), Some(LongNoteType::LongNote));
    assert_eq!(chart.header.ln_mode, LongNoteType::LongNote);
}

#[test]
fn duplicate_shapes_warn() {
    let (chart, warnings) = decode(
        r#"{
            "info": { "init_bpm": 120 },
            "sound_channels": [
                { "name": "a.wav", "notes": [{ "x": 3, "y": 0, "l": 480 }] },
                { "name": "b.wav", "notes": [{ "x": 3, "y": 0 }] }
            ]
        }"#,
    );
    assert_eq!(
        warnings,
        vec![DecodeWarning::DuplicateNote { lane: 2, time: 0 }]
    );
    let start = chart.lane(2).notes()[0];
    assert_eq!(chart.note(start.id).unwrap().layered, vec![]);
}

#[test]
fn malformed_json_is_unreadable() {
    let output = decode_bmson_json(br#"{"info": {"init_bpm": "fast"}}"#, &DecodeConfig::default());
    assert_eq!(output.chart, None);
    let errors: Vec<_> = output.log.errors().collect();
    assert!(matches!(
        errors.as_slice(),
        [DecodeError::Unreadable { reason }] if reason.contains("info.init_bpm")
    ));
}

#[test]
fn content_hashes_are_attached() {
    let config = DecodeConfig::default().with_hashes("d41d8cd9", "e3b0c442");
    let output = decode_bmson(
        &Bmson::from_json(br#"{"info": {"init_bpm": 100}}"#).unwrap(),
        &config,
    );
    let chart = output.chart.unwrap();
    assert_eq!(chart.hashes.md5, "d41d8cd9");
    assert_eq!(chart.hashes.sha256, "e3b0c442");
}
