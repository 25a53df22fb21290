//! Measures of the channel encoding.
//!
//! A [`Section`] gathers the message lines of one measure. Once every measure is known, the
//! decoder walks them in order and each one places its events on the shared timeline cache
//! through a [`SectionContext`].

use std::ops::Range;

use itertools::Itertools;
use num::Integer;

use crate::{
    chart::{
        builder::MICROS_PER_MEASURE_MINUTE,
        mode::Mode,
        note::{Note, NoteSound},
        timeline::{MeasurePosition, MissLayer},
    },
    decode_log::{DecodeLog, DecodeWarning},
};

use super::{
    channel::{self, Channel, ModeFlags, NoteChannelKind},
    header::Definitions,
    lex::{MessageLine, Pair},
    long_note::{LongNoteTracker, NoteBoard},
    numeral::ObjId,
};

/// A message line with the byte range it came from.
pub type RangedLine<'a> = (MessageLine<'a>, Range<usize>);

/// One measure: its position, its length and its lines in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    start: f64,
    rate: f64,
    lines: Vec<RangedLine<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TempoEvent {
    Scroll(f64),
    Bpm(f64),
    Stop(f64),
}

impl TempoEvent {
    /// Application order at an equal position.
    const fn rank(self) -> u8 {
        match self {
            Self::Scroll(_) => 0,
            Self::Bpm(_) => 1,
            Self::Stop(_) => 2,
        }
    }
}

/// Chart state shared by every section of one decode.
#[derive(Debug)]
pub struct SectionContext<'a> {
    /// Timelines and notes being built.
    pub board: NoteBoard<'a>,
    /// Definition tables from the header.
    pub definitions: &'a Definitions,
    /// Long-note pairing state, carried across measures.
    pub long_notes: LongNoteTracker,
    /// Detected mode, deciding the lane tables.
    pub mode: Mode,
    /// Base-36 value of `#LNOBJ`.
    pub ln_obj: Option<u16>,
}

impl SectionContext<'_> {
    fn wav(&mut self, id: u16) -> Option<usize> {
        let wav = self.definitions.wav(id);
        if wav.is_none() {
            self.board.warn(DecodeWarning::UndefinedWav {
                id: ObjId::from_base36(id),
            });
        }
        wav
    }

    fn bmp(&mut self, id: u16) -> Option<usize> {
        let bmp = self.definitions.bmp(id);
        if bmp.is_none() {
            self.board.warn(DecodeWarning::UndefinedBmp {
                id: ObjId::from_base36(id),
            });
        }
        bmp
    }

    fn place_note(
        &mut self,
        kind: NoteChannelKind,
        lane: usize,
        position: MeasurePosition,
        value: u16,
    ) {
        match kind {
            NoteChannelKind::Visible if self.ln_obj == Some(value) => {
                self.long_notes.end_marker(&mut self.board, lane, position);
            }
            NoteChannelKind::Visible => {
                let wav = self.wav(value);
                let note = self.board.notes.alloc(Note::normal(NoteSound::new(wav)));
                if self.board.cache.set_note(position, lane, note).is_some() {
                    let time = self.board.time_at(position);
                    self.board.warn(DecodeWarning::NoteCollision { lane, time });
                }
            }
            NoteChannelKind::Invisible => {
                let wav = self.wav(value);
                let note = self.board.notes.alloc(Note::normal(NoteSound::new(wav)));
                if let Some(slot) = self.board.cache.resolve(position).hidden_notes.get_mut(lane) {
                    *slot = Some(note);
                }
            }
            NoteChannelKind::Long => {
                let wav = self.wav(value);
                self.long_notes.token(&mut self.board, lane, position, wav);
            }
            NoteChannelKind::Landmine => {
                let time = self.board.time_at(position);
                if self.board.cache.note_at(position, lane).is_some()
                    || self.long_notes.inside_paired(lane, position)
                {
                    self.board.warn(DecodeWarning::MineCollision { lane, time });
                    return;
                }
                let sound = NoteSound::new(self.definitions.wav(0));
                let note = self.board.notes.alloc(Note::mine(sound, f64::from(value)));
                self.board.cache.set_note(position, lane, note);
            }
        }
    }
}

impl<'a> Section<'a> {
    /// A measure starting at `start` with `lines`, reading its rate from the `02` channel.
    ///
    /// A rate that is not a positive decimal is reported and the measure keeps the rate 1.0.
    #[must_use]
    pub fn new(start: f64, lines: Vec<RangedLine<'a>>, log: &mut DecodeLog) -> Self {
        let mut rate = 1.0;
        for (line, range) in &lines {
            if Channel::from_id(line.channel) != Some(Channel::SectionRate) {
                continue;
            }
            let value = line.data.trim();
            match value.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() && parsed > 0.0 => rate = parsed,
                _ => log.push_at(
                    DecodeWarning::InvalidSectionRate {
                        value: value.to_string(),
                    },
                    range.clone(),
                ),
            }
        }
        Self { start, rate, lines }
    }

    /// Position of the measure start.
    #[must_use]
    pub const fn start(&self) -> f64 {
        self.start
    }

    /// Length multiplier.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Start of the following measure.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.rate
    }

    fn position(&self, index: usize, count: usize) -> Option<MeasurePosition> {
        MeasurePosition::new(self.start + self.rate * (index as f64 / count as f64))
    }

    /// Records the note ranges this measure uses.
    pub fn touch_modes(&self, flags: &mut ModeFlags) {
        for (line, _) in &self.lines {
            let Some(Channel::Note { side, offset, .. }) = Channel::from_id(line.channel) else {
                continue;
            };
            let used = line
                .pairs()
                .iter()
                .any(|pair| matches!(pair, Pair::Value(value) if *value != 0));
            if used {
                flags.touch(side, offset);
            }
        }
    }

    /// Nonzero events of `line` with their positions. Malformed pairs are reported and skipped.
    fn events(
        &self,
        line: &MessageLine<'_>,
        range: &Range<usize>,
        log: &mut DecodeLog,
    ) -> Vec<(MeasurePosition, u16)> {
        let pairs = line.pairs();
        let count = pairs.len();
        pairs
            .into_iter()
            .enumerate()
            .filter_map(|(index, pair)| match pair {
                Pair::Value(0) => None,
                Pair::Value(value) => self.position(index, count).map(|at| (at, value)),
                Pair::Malformed(pair) => {
                    log.push_at(DecodeWarning::MalformedNumeral { pair }, range.clone());
                    None
                }
            })
            .collect()
    }

    /// Places everything of this measure.
    ///
    /// The bar line and miss layer come first, then tempo events, then the remaining channels
    /// line by line, so that notes are timed with the tempo of their own measure.
    pub fn build(&self, ctx: &mut SectionContext<'_>) {
        let Some(start) = MeasurePosition::new(self.start) else {
            return;
        };
        ctx.board.cache.resolve(start).section_line = true;
        self.place_miss_layer(start, ctx);
        self.apply_tempo(ctx);

        for (line, range) in &self.lines {
            ctx.board.range = range.clone();
            match Channel::from_id(line.channel) {
                Some(Channel::Bgm) => {
                    for (position, value) in self.events(line, range, ctx.board.log) {
                        let Some(wav) = ctx.wav(value) else {
                            continue;
                        };
                        let note = ctx.board.notes.alloc(Note::normal(NoteSound::new(Some(wav))));
                        ctx.board.to_background(position, note);
                    }
                }
                Some(Channel::Bga) => {
                    for (position, value) in self.events(line, range, ctx.board.log) {
                        if let Some(bga) = ctx.bmp(value) {
                            ctx.board.cache.resolve(position).bga = Some(bga);
                        }
                    }
                }
                Some(Channel::Layer) => {
                    for (position, value) in self.events(line, range, ctx.board.log) {
                        if let Some(layer) = ctx.bmp(value) {
                            ctx.board.cache.resolve(position).layer = Some(layer);
                        }
                    }
                }
                Some(Channel::Note { kind, side, offset }) => {
                    let Some(lane) = channel::lane_of(ctx.mode, side, offset) else {
                        continue;
                    };
                    for (position, value) in self.events(line, range, ctx.board.log) {
                        ctx.place_note(kind, lane, position, value);
                    }
                }
                _ => {}
            }
        }
    }

    fn place_miss_layer(&self, start: MeasurePosition, ctx: &mut SectionContext<'_>) {
        let Some((line, range)) = self
            .lines
            .iter()
            .rev()
            .find(|(line, _)| Channel::from_id(line.channel) == Some(Channel::Poor))
        else {
            return;
        };
        ctx.board.range = range.clone();
        let mut ids: Vec<u16> = line
            .pairs()
            .into_iter()
            .map(|pair| match pair {
                Pair::Value(value) => value,
                Pair::Malformed(pair) => {
                    ctx.board.warn(DecodeWarning::MalformedNumeral { pair });
                    0
                }
            })
            .collect();
        if ids.is_empty() {
            return;
        }
        match ids.iter().copied().filter(|&id| id != 0).all_equal_value() {
            Ok(single) => ids = vec![single],
            Err(None) => ids = vec![0],
            Err(Some(_)) => {}
        }
        let frames: Vec<Option<usize>> = ids
            .into_iter()
            .map(|id| {
                if id == 0 {
                    ctx.definitions.bmp(id)
                } else {
                    ctx.bmp(id)
                }
            })
            .collect();
        ctx.board.cache.resolve(start).miss_layer = Some(MissLayer::evenly(&frames));
    }

    fn tempo_events(&self, ctx: &mut SectionContext<'_>) -> Vec<(MeasurePosition, TempoEvent, Range<usize>)> {
        let mut events = Vec::new();
        for (line, range) in &self.lines {
            let channel = Channel::from_id(line.channel);
            if !matches!(
                channel,
                Some(Channel::BpmHex | Channel::BpmExtended | Channel::Stop | Channel::Scroll)
            ) {
                continue;
            }
            ctx.board.range = range.clone();
            for (position, value) in self.events(line, range, ctx.board.log) {
                let id = ObjId::from_base36(value);
                let event = match channel {
                    Some(Channel::BpmHex) => {
                        let (high, low) = value.div_rem(&36);
                        if high < 16 && low < 16 {
                            Some(TempoEvent::Bpm(f64::from(high * 16 + low)))
                        } else {
                            ctx.board.warn(DecodeWarning::MalformedNumeral {
                                pair: id.to_string(),
                            });
                            None
                        }
                    }
                    Some(Channel::BpmExtended) => {
                        let bpm = ctx.definitions.bpm(value).map(TempoEvent::Bpm);
                        if bpm.is_none() {
                            ctx.board.warn(DecodeWarning::UndefinedBpm { id });
                        }
                        bpm
                    }
                    Some(Channel::Stop) => {
                        let stop = ctx.definitions.stop(value).map(TempoEvent::Stop);
                        if stop.is_none() {
                            ctx.board.warn(DecodeWarning::UndefinedStop { id });
                        }
                        stop
                    }
                    _ => {
                        let scroll = ctx.definitions.scroll(value).map(TempoEvent::Scroll);
                        if scroll.is_none() {
                            ctx.board.warn(DecodeWarning::UndefinedScroll { id });
                        }
                        scroll
                    }
                };
                if let Some(event) = event {
                    events.push((position, event, range.clone()));
                }
            }
        }
        // stable, so a later line wins at the same position
        events.sort_by_key(|(position, event, _)| (*position, event.rank()));
        events
    }

    fn apply_tempo(&self, ctx: &mut SectionContext<'_>) {
        for (position, event, range) in self.tempo_events(ctx) {
            ctx.board.range = range;
            match event {
                TempoEvent::Scroll(scroll) => ctx.board.cache.resolve(position).scroll = scroll,
                TempoEvent::Bpm(bpm) if !(bpm.is_finite() && bpm > 0.0) => {
                    ctx.board.warn(DecodeWarning::InvalidBpmChange { bpm });
                }
                TempoEvent::Bpm(bpm) => ctx.board.cache.resolve(position).bpm = bpm,
                TempoEvent::Stop(measures) if measures < 0.0 => {
                    ctx.board.warn(DecodeWarning::NegativeStop { measures });
                }
                TempoEvent::Stop(measures) => {
                    let timeline = ctx.board.cache.resolve(position);
                    timeline.stop = (MICROS_PER_MEASURE_MINUTE * measures / timeline.bpm) as i64;
                }
            }
        }
    }
}
