//! Long-note pairing.
//!
//! Each lane runs a small state machine over long-note channel tokens:
//!
//! ```text
//! Closed --token--> Open(start) --token--> Closed (paired)
//! Closed --token inside a paired range--> OpenInvalid --token--> Closed
//! ```
//!
//! `#LNOBJ` markers on visible channels pair with the previous note of the lane instead. Ranges
//! of every paired long note are remembered per lane so that later tokens and mines landing
//! inside them are rejected.

use std::ops::{Bound, Range};

use crate::{
    chart::{
        builder::TimelineCache,
        note::{LongNote, LongNoteType, Note, NoteArena, NoteId, NoteKind, NoteSound},
        timeline::MeasurePosition,
    },
    decode_log::{DecodeLog, DecodeWarning},
};

/// Mutable chart state shared by the placement steps of one line.
#[derive(Debug)]
pub struct NoteBoard<'a> {
    /// Timeline cache with its lane index.
    pub cache: &'a mut TimelineCache,
    /// Note storage.
    pub notes: &'a mut NoteArena,
    /// Log receiving warnings.
    pub log: &'a mut DecodeLog,
    /// Byte range of the line being placed.
    pub range: Range<usize>,
}

impl NoteBoard<'_> {
    /// Pushes `warning` at the current line.
    pub fn warn(&mut self, warning: DecodeWarning) {
        self.log.push_at(warning, self.range.clone());
    }

    /// Time of the point at `position`, materializing it if needed.
    pub fn time_at(&mut self, position: MeasurePosition) -> i64 {
        self.cache.resolve(position).time
    }

    /// Moves `note` to the background sounds at `position`.
    pub fn to_background(&mut self, position: MeasurePosition, note: NoteId) {
        self.cache.resolve(position).background_notes.push(note);
    }

    fn is_normal(&self, note: NoteId) -> bool {
        self.notes.get(note).is_some_and(Note::is_normal)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum LaneState {
    #[default]
    Closed,
    Open {
        start: NoteId,
        position: MeasurePosition,
    },
    /// A start token met inside a paired range. The next token only closes it.
    OpenInvalid,
}

/// Per-lane pairing state of one decode.
#[derive(Debug, Clone, Default)]
pub struct LongNoteTracker {
    states: Vec<LaneState>,
    paired: Vec<Vec<(MeasurePosition, MeasurePosition)>>,
    ln_mode: LongNoteType,
}

impl LongNoteTracker {
    /// A tracker for `lanes` lanes classifying pairs with `ln_mode`.
    #[must_use]
    pub fn new(lanes: usize, ln_mode: LongNoteType) -> Self {
        Self {
            states: vec![LaneState::Closed; lanes],
            paired: vec![Vec::new(); lanes],
            ln_mode,
        }
    }

    /// Whether `position` lies within a paired long note of `lane`, both ends included.
    #[must_use]
    pub fn inside_paired(&self, lane: usize, position: MeasurePosition) -> bool {
        self.paired.get(lane).is_some_and(|ranges| {
            ranges
                .iter()
                .any(|&(start, end)| start <= position && position <= end)
        })
    }

    fn set_state(&mut self, lane: usize, state: LaneState) {
        if let Some(slot) = self.states.get_mut(lane) {
            *slot = state;
        }
    }

    fn pair(
        &mut self,
        board: &mut NoteBoard<'_>,
        lane: usize,
        (start, start_position): (NoteId, MeasurePosition),
        (end, end_position): (NoteId, MeasurePosition),
    ) {
        if board.cache.set_note(end_position, lane, end).is_some() {
            let time = board.time_at(end_position);
            board.warn(DecodeWarning::NoteCollision { lane, time });
        }
        board.notes.link(start, end, self.ln_mode);
        if let Some(ranges) = self.paired.get_mut(lane) {
            ranges.push((start_position, end_position));
        }
    }

    /// Handles a long-note channel token with sound `wav` on `lane` at `position`.
    pub fn token(
        &mut self,
        board: &mut NoteBoard<'_>,
        lane: usize,
        position: MeasurePosition,
        wav: Option<usize>,
    ) {
        let Some(&state) = self.states.get(lane) else {
            return;
        };
        let time = board.time_at(position);

        if self.inside_paired(lane, position) {
            match state {
                LaneState::Closed => {
                    board.warn(DecodeWarning::LnStartInsideLn { lane, time });
                    self.set_state(lane, LaneState::OpenInvalid);
                }
                LaneState::Open {
                    start,
                    position: start_position,
                } => {
                    if board.cache.note_at(start_position, lane) == Some(start) {
                        board.cache.take_note(start_position, lane);
                    }
                    board.warn(DecodeWarning::LnEndInsideLn { lane, time });
                    self.set_state(lane, LaneState::Closed);
                }
                LaneState::OpenInvalid => {
                    board.warn(DecodeWarning::LnEndInsideLn { lane, time });
                    self.set_state(lane, LaneState::Closed);
                }
            }
            return;
        }

        match state {
            LaneState::Closed => {
                if let Some(existing) = board.cache.note_at(position, lane) {
                    board.warn(DecodeWarning::LnStartOverNote { lane, time });
                    let keeps_sound = board
                        .notes
                        .get(existing)
                        .is_some_and(|note| note.is_normal() && note.sound.wav != wav);
                    if keeps_sound {
                        board.to_background(position, existing);
                    }
                }
                let start = board.notes.alloc(Note::long(NoteSound::new(wav)));
                board.cache.set_note(position, lane, start);
                self.set_state(lane, LaneState::Open { start, position });
            }
            LaneState::OpenInvalid => self.set_state(lane, LaneState::Closed),
            LaneState::Open {
                start,
                position: start_position,
            } => {
                let inner = board.cache.notes_in(
                    lane,
                    (
                        Bound::Excluded(start_position),
                        Bound::Excluded(position),
                    ),
                );
                for (inner_position, note) in inner {
                    board.cache.take_note(inner_position, lane);
                    let time = board.time_at(inner_position);
                    board.warn(DecodeWarning::NoteInsideLn { lane, time });
                    if board.is_normal(note) {
                        board.to_background(inner_position, note);
                    }
                }
                let start_wav = board.notes.get(start).and_then(|note| note.sound.wav);
                let end_wav = if start_wav == wav { None } else { wav };
                let end = board.notes.alloc(Note::long(NoteSound::new(end_wav)));
                self.pair(board, lane, (start, start_position), (end, position));
                self.set_state(lane, LaneState::Closed);
            }
        }
    }

    /// Handles an `#LNOBJ` marker on `lane` at `position`: the previous note of the lane becomes
    /// a long-note start ending here.
    pub fn end_marker(&mut self, board: &mut NoteBoard<'_>, lane: usize, position: MeasurePosition) {
        let Some((start_position, start)) = board.cache.last_note_before(lane, position) else {
            let time = board.time_at(position);
            board.warn(DecodeWarning::LnObjUnmatched { lane, time });
            return;
        };
        let time = board.time_at(start_position);
        let kind = board.notes.get(start).map(|note| note.kind);
        match kind {
            Some(NoteKind::Normal) => {
                if let Some(note) = board.notes.get_mut(start) {
                    note.kind = NoteKind::Long(LongNote::default());
                }
                let end = board.notes.alloc(Note::long(NoteSound::new(None)));
                self.pair(board, lane, (start, start_position), (end, position));
            }
            Some(NoteKind::Long(long)) if long.pair.is_none() => {
                board.warn(DecodeWarning::LnObjOnLnChannel { lane, time });
            }
            _ => board.warn(DecodeWarning::LnObjUnmatched { lane, time }),
        }
    }

    /// Closes the decode: every lane still open loses its start note and is reported.
    pub fn finish(&mut self, board: &mut NoteBoard<'_>) {
        for (lane, state) in self.states.iter_mut().enumerate() {
            if let LaneState::Open { start, position } = *state {
                board.warn(DecodeWarning::UnterminatedLongNote { lane });
                if board.cache.note_at(position, lane) == Some(start) {
                    board.cache.take_note(position, lane);
                }
            }
            *state = LaneState::Closed;
        }
    }
}
