//! Tests for `bms_chart::bms`.

mod lint;
mod long_note;
mod random;
mod timing;

use bms_chart::prelude::*;

/// Decodes `source` choosing branch 1 everywhere, expecting a chart.
pub fn decode(source: &str) -> (Chart, DecodeLog) {
    let BmsDecodeOutput { chart, log, .. } =
        decode_bms_str(source, &DecodeConfig::default(), RngMock([1]));
    let chart = chart.unwrap_or_else(|| panic!("expected a chart, got {log:?}"));
    (chart, log)
}

/// Warnings of `log`, in order.
pub fn warnings(log: &DecodeLog) -> Vec<DecodeWarning> {
    log.warnings().cloned().collect()
}

/// `(time, wav)` of each playable note on `lane`.
pub fn lane_sounds(chart: &Chart, lane: usize) -> Vec<(i64, Option<usize>)> {
    chart
        .lane(lane)
        .notes()
        .iter()
        .map(|placed| {
            let wav = chart.note(placed.id).and_then(|note| note.sound.wav);
            (placed.time, wav)
        })
        .collect()
}
