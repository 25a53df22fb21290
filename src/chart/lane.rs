//! Per-lane and event views of a chart, with a seekable cursor for playback.

use super::{Chart, note::NoteId, timeline::TimeLine};

/// A note placed on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacedNote {
    /// Time of the note in microseconds.
    pub time: i64,
    /// Handle into [`Chart::notes`].
    pub id: NoteId,
}

/// Cursor over a time-ordered list. `mark` moves the base, `next` reads from the seek point.
#[derive(Debug, Clone, Default)]
struct Cursor {
    base: usize,
    seek: usize,
}

impl Cursor {
    fn next<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let item = items.get(self.seek)?;
        self.seek += 1;
        Some(item)
    }

    fn mark<T>(&mut self, items: &[T], time: i64, time_of: impl Fn(&T) -> i64) {
        self.base = items.partition_point(|item| time_of(item) < time);
        self.seek = self.base;
    }

    const fn reset(&mut self) {
        self.seek = self.base;
    }
}

/// Notes of one lane.
#[derive(Debug, Clone)]
pub struct Lane<'a> {
    chart: &'a Chart,
    notes: Vec<PlacedNote>,
    hidden_notes: Vec<PlacedNote>,
    note_cursor: Cursor,
    hidden_cursor: Cursor,
}

impl<'a> Lane<'a> {
    pub(crate) fn new(chart: &'a Chart, lane: usize) -> Self {
        let placed = |slot: fn(&TimeLine, usize) -> Option<NoteId>| {
            chart
                .timelines
                .iter()
                .filter_map(|timeline| {
                    slot(timeline, lane).map(|id| PlacedNote {
                        time: timeline.time,
                        id,
                    })
                })
                .collect::<Vec<_>>()
        };
        Self {
            chart,
            notes: placed(TimeLine::note),
            hidden_notes: placed(TimeLine::hidden_note),
            note_cursor: Cursor::default(),
            hidden_cursor: Cursor::default(),
        }
    }

    /// Playable notes in time order.
    #[must_use]
    pub fn notes(&self) -> &[PlacedNote] {
        &self.notes
    }

    /// Invisible notes in time order.
    #[must_use]
    pub fn hidden_notes(&self) -> &[PlacedNote] {
        &self.hidden_notes
    }

    /// The chart this view reads from.
    #[must_use]
    pub const fn chart(&self) -> &'a Chart {
        self.chart
    }

    /// Next playable note from the cursor.
    pub fn next_note(&mut self) -> Option<PlacedNote> {
        self.note_cursor.next(&self.notes).copied()
    }

    /// Next invisible note from the cursor.
    pub fn next_hidden_note(&mut self) -> Option<PlacedNote> {
        self.hidden_cursor.next(&self.hidden_notes).copied()
    }

    /// Moves both cursors to the first note at or after `time`.
    pub fn mark(&mut self, time: i64) {
        self.note_cursor.mark(&self.notes, time, |note| note.time);
        self.hidden_cursor
            .mark(&self.hidden_notes, time, |note| note.time);
    }

    /// Rewinds both cursors to the last mark.
    pub const fn reset(&mut self) {
        self.note_cursor.reset();
        self.hidden_cursor.reset();
    }
}

/// Bar lines, tempo changes and stops of a chart.
#[derive(Debug, Clone)]
pub struct EventLane<'a> {
    sections: Vec<&'a TimeLine>,
    bpm_changes: Vec<&'a TimeLine>,
    stops: Vec<&'a TimeLine>,
    cursors: [Cursor; 3],
}

impl<'a> EventLane<'a> {
    pub(crate) fn new(chart: &'a Chart) -> Self {
        let mut sections = Vec::new();
        let mut bpm_changes = Vec::new();
        let mut stops = Vec::new();
        let mut previous_bpm = chart.header.bpm;
        for timeline in &chart.timelines {
            if timeline.section_line {
                sections.push(timeline);
            }
            if timeline.bpm.total_cmp(&previous_bpm).is_ne() {
                bpm_changes.push(timeline);
            }
            if timeline.stop != 0 {
                stops.push(timeline);
            }
            previous_bpm = timeline.bpm;
        }
        Self {
            sections,
            bpm_changes,
            stops,
            cursors: Default::default(),
        }
    }

    /// Time points with a bar line.
    #[must_use]
    pub fn sections(&self) -> &[&'a TimeLine] {
        &self.sections
    }

    /// Time points whose tempo differs from the previous one.
    #[must_use]
    pub fn bpm_changes(&self) -> &[&'a TimeLine] {
        &self.bpm_changes
    }

    /// Time points with a stop.
    #[must_use]
    pub fn stops(&self) -> &[&'a TimeLine] {
        &self.stops
    }

    /// Next bar line from the cursor.
    pub fn next_section(&mut self) -> Option<&'a TimeLine> {
        let [cursor, _, _] = &mut self.cursors;
        cursor.next(&self.sections).copied()
    }

    /// Next tempo change from the cursor.
    pub fn next_bpm_change(&mut self) -> Option<&'a TimeLine> {
        let [_, cursor, _] = &mut self.cursors;
        cursor.next(&self.bpm_changes).copied()
    }

    /// Next stop from the cursor.
    pub fn next_stop(&mut self) -> Option<&'a TimeLine> {
        let [_, _, cursor] = &mut self.cursors;
        cursor.next(&self.stops).copied()
    }

    /// Moves all cursors to the first event at or after `time`.
    pub fn mark(&mut self, time: i64) {
        let [sections, bpm_changes, stops] = &mut self.cursors;
        let time_of = |timeline: &&TimeLine| timeline.time;
        sections.mark(&self.sections, time, time_of);
        bpm_changes.mark(&self.bpm_changes, time, time_of);
        stops.mark(&self.stops, time, time_of);
    }

    /// Rewinds all cursors to the last mark.
    pub const fn reset(&mut self) {
        let [sections, bpm_changes, stops] = &mut self.cursors;
        sections.reset();
        bpm_changes.reset();
        stops.reset();
    }
}
