//! The decoded chart model, shared by both encodings.
//!
//! A [`Chart`] owns an ordered array of [`TimeLine`]s and a [`NoteArena`]. Time points refer to
//! notes through [`NoteId`] handles. Everything is built during one decode call and is
//! read-only afterwards.

pub mod assemble;
pub mod builder;
pub mod lane;
pub mod mode;
pub mod note;
pub mod timeline;

use crate::{
    bms::numeral::ObjId,
    config::{ContentHashes, LnType},
};

use self::{
    lane::{EventLane, Lane},
    mode::Mode,
    note::{LongNote, LongNoteType, Note, NoteArena, NoteId, NoteKind},
    timeline::TimeLine,
};

/// Metadata of a chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartHeader {
    /// `#PLAYER`, if declared.
    pub player: Option<i32>,
    /// Title.
    pub title: String,
    /// Subtitle.
    pub subtitle: String,
    /// Genre.
    pub genre: String,
    /// Artist.
    pub artist: String,
    /// Secondary artists.
    pub subartist: String,
    /// Banner image path.
    pub banner: String,
    /// Image shown while loading.
    pub stagefile: String,
    /// Background image path.
    pub backbmp: String,
    /// Preview music path.
    pub preview: String,
    /// Starting tempo, 0 when undeclared.
    pub bpm: f64,
    /// Level label as written.
    pub playlevel: String,
    /// Difficulty category.
    pub difficulty: i32,
    /// Judge rank: `0..=4` for the text encoding, a percentage for bmson.
    pub judge_rank: i32,
    /// Gauge total.
    pub total: f64,
    /// Volume percentage.
    pub volwav: i32,
    /// Chart-wide long-note classification (`#LNMODE`).
    pub ln_mode: LongNoteType,
    /// `#LNOBJ` end marker id.
    pub ln_obj: Option<ObjId>,
}

impl Default for ChartHeader {
    fn default() -> Self {
        Self {
            player: None,
            title: String::new(),
            subtitle: String::new(),
            genre: String::new(),
            artist: String::new(),
            subartist: String::new(),
            banner: String::new(),
            stagefile: String::new(),
            backbmp: String::new(),
            preview: String::new(),
            bpm: 0.0,
            playlevel: String::new(),
            difficulty: 0,
            judge_rank: 2,
            total: 0.0,
            volwav: 0,
            ln_mode: LongNoteType::Undefined,
            ln_obj: None,
        }
    }
}

/// Note groups counted by [`Chart::total_notes_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteCategory {
    /// Normal notes on key lanes.
    Key,
    /// Judged long-note ends on key lanes.
    LongKey,
    /// Normal notes on scratch lanes.
    Scratch,
    /// Judged long-note ends on scratch lanes.
    LongScratch,
    /// Mines on any lane.
    Mine,
}

/// A decoded chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chart {
    /// Metadata.
    pub header: ChartHeader,
    /// Detected play mode.
    pub mode: Mode,
    /// Interpretation of undefined long notes.
    pub ln_type: LnType,
    /// Time points in position order.
    pub timelines: Vec<TimeLine>,
    /// Every note referenced by the time points.
    pub notes: NoteArena,
    /// Sound file names.
    pub wav_list: Vec<String>,
    /// Picture file names.
    pub bga_list: Vec<String>,
    /// Digests of the source.
    pub hashes: ContentHashes,
    /// `#RANDOM` values chosen in this decode, in declaration order.
    pub random: Vec<u64>,
}

impl Chart {
    /// The note behind `id`.
    #[must_use]
    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    /// The note on `lane` of `timeline`.
    #[must_use]
    pub fn note_at(&self, timeline: &TimeLine, lane: usize) -> Option<&Note> {
        timeline.note(lane).and_then(|id| self.note(id))
    }

    /// Title and subtitle joined by a space.
    #[must_use]
    pub fn full_title(&self) -> String {
        join_non_empty(&self.header.title, &self.header.subtitle)
    }

    /// Artist and subartist joined by a space.
    #[must_use]
    pub fn full_artist(&self) -> String {
        join_non_empty(&self.header.artist, &self.header.subartist)
    }

    /// Lowest tempo, the starting one included.
    #[must_use]
    pub fn min_bpm(&self) -> f64 {
        self.timelines
            .iter()
            .map(|timeline| timeline.bpm)
            .fold(self.header.bpm, f64::min)
    }

    /// Highest tempo, the starting one included.
    #[must_use]
    pub fn max_bpm(&self) -> f64 {
        self.timelines
            .iter()
            .map(|timeline| timeline.bpm)
            .fold(self.header.bpm, f64::max)
    }

    /// Times of all time points.
    #[must_use]
    pub fn all_times(&self) -> Vec<i64> {
        self.timelines.iter().map(|timeline| timeline.time).collect()
    }

    /// Time of the last audible or visible event, 0 if there is none.
    #[must_use]
    pub fn last_time(&self) -> i64 {
        self.timelines
            .iter()
            .rev()
            .find(|timeline| timeline.has_event())
            .map_or(0, |timeline| timeline.time)
    }

    /// Time of the last playable note, 0 if there is none.
    #[must_use]
    pub fn last_note_time(&self) -> i64 {
        self.timelines
            .iter()
            .rev()
            .find(|timeline| timeline.has_note())
            .map_or(0, |timeline| timeline.time)
    }

    fn counts_long(&self, long: &LongNote) -> bool {
        match long.ln_type {
            LongNoteType::ChargeNote | LongNoteType::HellChargeNote => true,
            LongNoteType::Undefined if self.ln_type != LnType::LongNote => true,
            _ => !long.end,
        }
    }

    fn counts(&self, note: &Note) -> bool {
        match &note.kind {
            NoteKind::Normal => true,
            NoteKind::Long(long) => self.counts_long(long),
            NoteKind::Mine { .. } => false,
        }
    }

    /// Number of judged notes.
    ///
    /// Normal notes and long-note starts count. Long-note ends count too when their pair is a
    /// charge or hell-charge note, or undefined under a non-[`LnType::LongNote`] policy.
    #[must_use]
    pub fn total_notes(&self) -> usize {
        self.timelines
            .iter()
            .flat_map(|timeline| timeline.notes.iter().flatten())
            .filter_map(|&id| self.note(id))
            .filter(|note| self.counts(note))
            .count()
    }

    /// Number of notes in one [`NoteCategory`].
    #[must_use]
    pub fn total_notes_by(&self, category: NoteCategory) -> usize {
        let scratch = |lane: usize| self.mode.is_scratch(lane);
        self.timelines
            .iter()
            .flat_map(|timeline| timeline.notes.iter().enumerate())
            .filter_map(|(lane, slot)| Some((lane, self.note((*slot)?)?)))
            .filter(|(lane, note)| match (category, &note.kind) {
                (NoteCategory::Key, NoteKind::Normal) => !scratch(*lane),
                (NoteCategory::Scratch, NoteKind::Normal) => scratch(*lane),
                (NoteCategory::LongKey, NoteKind::Long(long)) => {
                    !scratch(*lane) && self.counts_long(long)
                }
                (NoteCategory::LongScratch, NoteKind::Long(long)) => {
                    scratch(*lane) && self.counts_long(long)
                }
                (NoteCategory::Mine, NoteKind::Mine { .. }) => true,
                _ => false,
            })
            .count()
    }

    fn any_note(&self, predicate: impl Fn(&Note) -> bool) -> bool {
        self.timelines
            .iter()
            .flat_map(|timeline| timeline.notes.iter().flatten())
            .filter_map(|&id| self.note(id))
            .any(predicate)
    }

    /// Whether any lane has a long note.
    #[must_use]
    pub fn contains_long_note(&self) -> bool {
        self.any_note(|note| note.as_long().is_some())
    }

    /// Whether any long note leaves its classification to the global policy.
    #[must_use]
    pub fn contains_undefined_long_note(&self) -> bool {
        self.any_note(|note| {
            note.as_long()
                .is_some_and(|long| long.ln_type == LongNoteType::Undefined)
        })
    }

    /// Whether any lane has a mine.
    #[must_use]
    pub fn contains_mine_note(&self) -> bool {
        self.any_note(Note::is_mine)
    }

    /// Notes of one lane in time order.
    #[must_use]
    pub fn lane(&self, lane: usize) -> Lane<'_> {
        Lane::new(self, lane)
    }

    /// Bar lines, tempo changes and stops in time order.
    #[must_use]
    pub fn event_lane(&self) -> EventLane<'_> {
        EventLane::new(self)
    }
}

fn join_non_empty(main: &str, sub: &str) -> String {
    if sub.is_empty() {
        main.to_string()
    } else {
        format!("{main} {sub}")
    }
}
