//! Time points of a chart.

use std::cmp::Ordering;

use super::note::NoteId;

/// A logical position in measures from the chart start.
///
/// A measure of rate 1.0 spans 1.0. Positions are always finite, so they are totally ordered
/// and can key the timeline cache.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct MeasurePosition(f64);

impl Eq for MeasurePosition {}

impl PartialOrd for MeasurePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MeasurePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl MeasurePosition {
    /// The chart start.
    pub const ZERO: Self = Self(0.0);

    /// Makes a position, or `None` if `value` is not finite.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        // -0.0 and 0.0 must key the same timeline
        value.is_finite().then_some(Self(value + 0.0))
    }

    /// Raw measure count.
    #[must_use]
    pub const fn as_f64(self) -> f64 {
        self.0
    }
}

/// One frame of a miss-layer animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MissFrame {
    /// Offset from the miss in milliseconds.
    pub time_ms: i64,
    /// Index into [`crate::chart::Chart::bga_list`], `None` for a blank frame.
    pub bga: Option<usize>,
}

/// The picture sequence shown when the player misses (the POOR layer).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MissLayer {
    /// Frames in time order.
    pub frames: Vec<MissFrame>,
    /// Length of the whole sequence in milliseconds.
    pub duration_ms: i64,
}

impl MissLayer {
    /// Length of the miss animation of the text encoding.
    pub const DURATION_MS: i64 = 500;

    /// Spreads `bgas` evenly over [`Self::DURATION_MS`].
    #[must_use]
    pub fn evenly(bgas: &[Option<usize>]) -> Self {
        let count = bgas.len().max(1) as i64;
        let frames = bgas
            .iter()
            .enumerate()
            .map(|(index, &bga)| MissFrame {
                time_ms: index as i64 * Self::DURATION_MS / count,
                bga,
            })
            .collect();
        Self {
            frames,
            duration_ms: Self::DURATION_MS,
        }
    }
}

/// A time point: everything that happens at one logical position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeLine {
    /// Logical position.
    pub section: MeasurePosition,
    /// Absolute time in microseconds.
    pub time: i64,
    /// Playable note per lane.
    pub notes: Vec<Option<NoteId>>,
    /// Invisible note per lane.
    pub hidden_notes: Vec<Option<NoteId>>,
    /// Sounds played automatically.
    pub background_notes: Vec<NoteId>,
    /// Whether a bar line is drawn here.
    pub section_line: bool,
    /// Tempo from here on.
    pub bpm: f64,
    /// Scroll pause starting here, in microseconds.
    pub stop: i64,
    /// Scroll speed multiplier from here on.
    pub scroll: f64,
    /// BGA picture switched to here.
    pub bga: Option<usize>,
    /// Layer picture switched to here.
    pub layer: Option<usize>,
    /// Miss animation switched to here.
    pub miss_layer: Option<MissLayer>,
}

impl TimeLine {
    /// An empty time point.
    #[must_use]
    pub fn new(section: MeasurePosition, time: i64, lanes: usize, bpm: f64) -> Self {
        Self {
            section,
            time,
            notes: vec![None; lanes],
            hidden_notes: vec![None; lanes],
            background_notes: Vec::new(),
            section_line: false,
            bpm,
            stop: 0,
            scroll: 1.0,
            bga: None,
            layer: None,
            miss_layer: None,
        }
    }

    /// Playable note on `lane`.
    #[must_use]
    pub fn note(&self, lane: usize) -> Option<NoteId> {
        self.notes.get(lane).copied().flatten()
    }

    /// Invisible note on `lane`.
    #[must_use]
    pub fn hidden_note(&self, lane: usize) -> Option<NoteId> {
        self.hidden_notes.get(lane).copied().flatten()
    }

    /// Whether any lane has a playable note.
    #[must_use]
    pub fn has_note(&self) -> bool {
        self.notes.iter().any(Option::is_some)
    }

    /// Whether anything audible or visible happens here.
    #[must_use]
    pub fn has_event(&self) -> bool {
        self.has_note()
            || self.hidden_notes.iter().any(Option::is_some)
            || !self.background_notes.is_empty()
            || self.bga.is_some()
            || self.layer.is_some()
    }

    /// Resizes the lane slots, dropping notes on removed lanes.
    pub fn set_lane_count(&mut self, lanes: usize) {
        self.notes.resize(lanes, None);
        self.hidden_notes.resize(lanes, None);
    }

    /// Every note handle on this time point.
    pub fn note_ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.notes
            .iter()
            .chain(&self.hidden_notes)
            .filter_map(|slot| *slot)
            .chain(self.background_notes.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn positions_order_totally() {
        let a = MeasurePosition::new(0.5).unwrap();
        let b = MeasurePosition::new(1.25).unwrap();
        assert!(a < b);
        assert_eq!(MeasurePosition::new(-0.0), Some(MeasurePosition::ZERO));
        assert_eq!(MeasurePosition::new(f64::NAN), None);
        assert_eq!(MeasurePosition::new(f64::INFINITY), None);
    }

    #[test]
    fn miss_layer_spreads_frames() {
        let layer = MissLayer::evenly(&[Some(0), None, Some(2), Some(3)]);
        let times: Vec<_> = layer.frames.iter().map(|frame| frame.time_ms).collect();
        assert_eq!(times, vec![0, 125, 250, 375]);
        assert_eq!(layer.duration_ms, 500);
    }
}
