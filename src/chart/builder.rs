//! Lazy timeline cache shared by both decoders.
//!
//! Events can arrive in any position order. [`TimelineCache::resolve`] materializes the time
//! point at a position on first use by interpolating from the nearest lower time point, so a
//! tempo change only affects positions resolved after it, which is why decoders apply tempo
//! events of a measure before placing its notes.

use std::{collections::BTreeMap, ops::RangeBounds};

use super::{
    note::NoteId,
    timeline::{MeasurePosition, TimeLine},
};

/// Microseconds in one minute, times the four beats of a standard measure.
pub const MICROS_PER_MEASURE_MINUTE: f64 = 240_000_000.0;

#[derive(Debug, Clone)]
struct CachedTimeLine {
    /// Unrounded time, so that rounding does not accumulate along the chart.
    time: f64,
    timeline: TimeLine,
}

/// Position-indexed cache of time points plus a per-lane note index.
#[derive(Debug, Clone)]
pub struct TimelineCache {
    entries: BTreeMap<MeasurePosition, CachedTimeLine>,
    lanes: Vec<BTreeMap<MeasurePosition, NoteId>>,
    lane_count: usize,
}

impl TimelineCache {
    /// Seeds the cache with the chart start at `start_bpm`.
    ///
    /// The caller must reject a non-positive start tempo beforehand. The cache only keeps the
    /// arithmetic finite.
    #[must_use]
    pub fn new(start_bpm: f64, lane_count: usize) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            MeasurePosition::ZERO,
            CachedTimeLine {
                time: 0.0,
                timeline: TimeLine::new(MeasurePosition::ZERO, 0, lane_count, start_bpm),
            },
        );
        Self {
            entries,
            lanes: vec![BTreeMap::new(); lane_count],
            lane_count,
        }
    }

    /// Number of lanes of each time point.
    #[must_use]
    pub const fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Number of materialized time points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, the chart start is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn interpolate(&self, position: MeasurePosition) -> CachedTimeLine {
        let lower = self
            .entries
            .range(..position)
            .next_back()
            .or_else(|| self.entries.iter().next());
        let Some((&prev_position, prev)) = lower else {
            return CachedTimeLine {
                time: 0.0,
                timeline: TimeLine::new(position, 0, self.lane_count, 0.0),
            };
        };
        let bpm = prev.timeline.bpm;
        let delta = position.as_f64() - prev_position.as_f64();
        let mut time = prev.time + MICROS_PER_MEASURE_MINUTE * delta / bpm;
        if delta > 0.0 {
            time += prev.timeline.stop as f64;
        }
        let mut timeline = TimeLine::new(position, time as i64, self.lane_count, bpm);
        timeline.scroll = prev.timeline.scroll;
        CachedTimeLine { time, timeline }
    }

    /// Returns the time point at `position`, creating it from the nearest lower one if needed.
    ///
    /// A new time point inherits the tempo and scroll of its predecessor and is placed at
    /// `prev.time + prev.stop + 240_000_000 * (position - prev.position) / prev.bpm`.
    pub fn resolve(&mut self, position: MeasurePosition) -> &mut TimeLine {
        if !self.entries.contains_key(&position) {
            let cached = self.interpolate(position);
            ::log::trace!("timeline at {} -> {}us", position.as_f64(), cached.timeline.time);
            self.entries.insert(position, cached);
        }
        let lane_count = self.lane_count;
        &mut self
            .entries
            .entry(position)
            .or_insert_with(|| CachedTimeLine {
                time: 0.0,
                timeline: TimeLine::new(position, 0, lane_count, 0.0),
            })
            .timeline
    }

    /// The time point at `position`, if materialized.
    #[must_use]
    pub fn get(&self, position: MeasurePosition) -> Option<&TimeLine> {
        self.entries.get(&position).map(|cached| &cached.timeline)
    }

    /// The time point at `position`, mutably, if materialized.
    pub fn get_mut(&mut self, position: MeasurePosition) -> Option<&mut TimeLine> {
        self.entries
            .get_mut(&position)
            .map(|cached| &mut cached.timeline)
    }

    /// Time of the point at `position`, or 0 if it is not materialized.
    #[must_use]
    pub fn time_of(&self, position: MeasurePosition) -> i64 {
        self.get(position).map_or(0, |timeline| timeline.time)
    }

    /// Playable note on `lane` at `position`.
    #[must_use]
    pub fn note_at(&self, position: MeasurePosition, lane: usize) -> Option<NoteId> {
        self.lanes.get(lane)?.get(&position).copied()
    }

    /// Places `note` on `lane` at `position`, returning the note it replaces.
    pub fn set_note(
        &mut self,
        position: MeasurePosition,
        lane: usize,
        note: NoteId,
    ) -> Option<NoteId> {
        let timeline = self.resolve(position);
        let slot = timeline.notes.get_mut(lane)?;
        let previous = slot.replace(note);
        if let Some(index) = self.lanes.get_mut(lane) {
            index.insert(position, note);
        }
        previous
    }

    /// Removes and returns the playable note on `lane` at `position`.
    pub fn take_note(&mut self, position: MeasurePosition, lane: usize) -> Option<NoteId> {
        let taken = self
            .get_mut(position)
            .and_then(|timeline| timeline.notes.get_mut(lane))
            .and_then(Option::take);
        if let Some(index) = self.lanes.get_mut(lane) {
            index.remove(&position);
        }
        taken
    }

    /// The latest playable note on `lane` strictly before `position`.
    #[must_use]
    pub fn last_note_before(
        &self,
        lane: usize,
        position: MeasurePosition,
    ) -> Option<(MeasurePosition, NoteId)> {
        self.lanes
            .get(lane)?
            .range(..position)
            .next_back()
            .map(|(&position, &note)| (position, note))
    }

    /// Playable notes on `lane` within `range`, in position order.
    #[must_use]
    pub fn notes_in(
        &self,
        lane: usize,
        range: impl RangeBounds<MeasurePosition>,
    ) -> Vec<(MeasurePosition, NoteId)> {
        self.lanes.get(lane).map_or_else(Vec::new, |index| {
            index
                .range(range)
                .map(|(&position, &note)| (position, note))
                .collect()
        })
    }

    /// All time points in position order.
    pub fn iter(&self) -> impl Iterator<Item = &TimeLine> {
        self.entries.values().map(|cached| &cached.timeline)
    }

    /// Consumes the cache into time points in position order.
    #[must_use]
    pub fn into_timelines(self) -> Vec<TimeLine> {
        self.entries
            .into_values()
            .map(|cached| cached.timeline)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pos(value: f64) -> MeasurePosition {
        MeasurePosition::new(value).unwrap()
    }

    #[test]
    fn interpolates_from_lower_entry() {
        let mut cache = TimelineCache::new(120.0, 8);
        assert_eq!(cache.resolve(pos(1.0)).time, 2_000_000);
        assert_eq!(cache.resolve(pos(0.5)).time, 1_000_000);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn tempo_and_stop_affect_later_points_only() {
        let mut cache = TimelineCache::new(120.0, 8);
        let half = cache.resolve(pos(0.5));
        half.bpm = 240.0;
        half.stop = 250_000;
        assert_eq!(cache.resolve(pos(0.5)).time, 1_000_000);
        // 1_000_000 + 250_000 stop + 0.5 measure at 240 bpm
        assert_eq!(cache.resolve(pos(1.0)).time, 1_750_000);
        assert_eq!(cache.resolve(pos(1.0)).bpm, 240.0);
    }

    #[test]
    fn scroll_is_inherited() {
        let mut cache = TimelineCache::new(150.0, 8);
        cache.resolve(pos(0.25)).scroll = 0.5;
        assert_eq!(cache.resolve(pos(0.75)).scroll, 0.5);
    }

    #[test]
    fn lane_index_tracks_slots() {
        let mut cache = TimelineCache::new(120.0, 8);
        assert_eq!(cache.set_note(pos(0.25), 3, NoteId(0)), None);
        assert_eq!(cache.set_note(pos(0.75), 3, NoteId(1)), None);
        assert_eq!(cache.set_note(pos(0.75), 3, NoteId(2)), Some(NoteId(1)));

        assert_eq!(
            cache.last_note_before(3, pos(1.0)),
            Some((pos(0.75), NoteId(2)))
        );
        assert_eq!(cache.last_note_before(3, pos(0.25)), None);
        assert_eq!(cache.take_note(pos(0.75), 3), Some(NoteId(2)));
        assert_eq!(
            cache.last_note_before(3, pos(1.0)),
            Some((pos(0.25), NoteId(0)))
        );
        assert_eq!(cache.notes_in(3, pos(0.0)..pos(1.0)).len(), 1);
        assert_eq!(cache.set_note(pos(0.5), 8, NoteId(3)), None);
        assert_eq!(cache.note_at(pos(0.5), 8), None);
    }

    #[test]
    fn into_timelines_is_ordered() {
        let mut cache = TimelineCache::new(120.0, 6);
        cache.resolve(pos(2.0));
        cache.resolve(pos(1.0));
        let sections: Vec<_> = cache
            .into_timelines()
            .iter()
            .map(|timeline| timeline.section.as_f64())
            .collect();
        assert_eq!(sections, vec![0.0, 1.0, 2.0]);
    }
}
