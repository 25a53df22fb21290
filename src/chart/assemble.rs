//! Final assembly of a [`Chart`] and its consistency checks.

use crate::{
    config::{ContentHashes, LnType},
    decode_log::{DecodeError, DecodeLog, DecodeWarning},
};

use super::{
    Chart, ChartHeader, builder::TimelineCache, mode::Mode, note::NoteArena, timeline::TimeLine,
};

/// Lowest `#TOTAL` that is not reported as too small.
pub const MIN_SANE_TOTAL: f64 = 60.0;

/// Silence after the last audible event that is reported as suspicious.
pub const TRAILING_SILENCE_US: i64 = 30_000_000;

/// Rejects a starting tempo that cannot define a time axis.
///
/// # Errors
///
/// Returns [`DecodeError::ZeroStartBpm`] if `bpm` is zero, negative or not finite.
pub fn check_start_bpm(bpm: f64) -> Result<(), DecodeError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(DecodeError::ZeroStartBpm { bpm })
    }
}

/// Everything a decoder produced, before assembly.
#[derive(Debug, Clone)]
pub struct ChartParts {
    /// Metadata.
    pub header: ChartHeader,
    /// Detected mode.
    pub mode: Mode,
    /// Materialized time points.
    pub cache: TimelineCache,
    /// Notes referenced by the time points, and possibly orphans.
    pub notes: NoteArena,
    /// Sound file names.
    pub wav_list: Vec<String>,
    /// Picture file names.
    pub bga_list: Vec<String>,
    /// Chosen `#RANDOM` values.
    pub random: Vec<u64>,
}

/// Builds the final chart: orders time points, compacts the note arena, runs the lint checks
/// and attaches the caller's hashes and policy.
#[must_use]
pub fn assemble(
    parts: ChartParts,
    ln_type: LnType,
    hashes: ContentHashes,
    log: &mut DecodeLog,
) -> Chart {
    let ChartParts {
        header,
        mode,
        cache,
        mut notes,
        wav_list,
        bga_list,
        random,
    } = parts;

    let mut timelines = cache.into_timelines();
    let lanes = mode.lane_count();
    for timeline in &mut timelines {
        timeline.set_lane_count(lanes);
    }
    compact_notes(&mut timelines, &mut notes);

    let chart = Chart {
        header,
        mode,
        ln_type,
        timelines,
        notes,
        wav_list,
        bga_list,
        hashes,
        random,
    };
    lint(&chart, log);
    ::log::debug!(
        "assembled {:?} chart with {} timelines and {} notes",
        chart.mode,
        chart.timelines.len(),
        chart.notes.len()
    );
    chart
}

fn compact_notes(timelines: &mut [TimeLine], notes: &mut NoteArena) {
    let order: Vec<_> = timelines.iter().flat_map(TimeLine::note_ids).collect();
    let mapping = notes.compact(order);
    let remap = |id: super::note::NoteId| mapping.get(id.0).copied().flatten();
    for timeline in timelines {
        for slot in timeline
            .notes
            .iter_mut()
            .chain(timeline.hidden_notes.iter_mut())
        {
            *slot = slot.and_then(remap);
        }
        timeline.background_notes = timeline
            .background_notes
            .iter()
            .filter_map(|&id| remap(id))
            .collect();
    }
}

/// Appends a warning for each suspicious property of `chart`.
pub fn lint(chart: &Chart, log: &mut DecodeLog) {
    if chart.header.total <= MIN_SANE_TOTAL {
        log.push(DecodeWarning::TotalTooLow {
            total: chart.header.total,
        });
    }

    if let Some(last) = chart.timelines.last() {
        let last_audible = chart.last_time();
        if last.time >= last_audible + TRAILING_SILENCE_US {
            log.push(DecodeWarning::TrailingSilence {
                silence: last.time - last_audible,
            });
        }
    }

    match chart.header.player {
        Some(player) if player > 1 && matches!(chart.mode, Mode::Beat5K | Mode::Beat7K) => {
            log.push(DecodeWarning::PlayerWithoutSecondSide {
                player,
                mode: chart.mode,
            });
        }
        Some(1) if matches!(chart.mode, Mode::Beat10K | Mode::Beat14K) => {
            log.push(DecodeWarning::SecondSideWithSinglePlayer { mode: chart.mode });
        }
        _ => {}
    }
}
