//! Decoding of a [`Bmson`] object into a [`Chart`].
//!
//! Pulses are converted into measure positions of 4 quarter notes and resolved on the same
//! timeline cache as the text encoding. Tempo events go first, then bar lines, then sound
//! channels one by one, then BGA events.

use std::{collections::HashMap, ops::Bound};

use itertools::Itertools;

use crate::{
    chart::{
        Chart, ChartHeader,
        assemble::{ChartParts, assemble, check_start_bpm},
        builder::{MICROS_PER_MEASURE_MINUTE, TimelineCache},
        mode::Mode,
        note::{LongNoteType, Note, NoteArena, NoteId, NoteKind, NoteSound},
        timeline::{MeasurePosition, MissLayer},
    },
    config::DecodeConfig,
    decode_log::{DecodeLog, DecodeWarning},
};

use super::{
    Bmson, BmsonInfo, SoundChannel,
    pulse::{PulseNumber, PulseScale},
};

/// Result of decoding a bmson chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    /// The chart, `None` if the log holds a fatal error.
    pub chart: Option<Chart>,
    /// Everything reported while decoding.
    pub log: DecodeLog,
}

/// Lowest `judge_rank` that looks like a percentage.
const MIN_PERCENTAGE_JUDGE_RANK: f64 = 5.0;

const BEAT5_LANES: [Option<usize>; 8] = [
    Some(0),
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    None,
    None,
    Some(5),
];

const BEAT10_LANES: [Option<usize>; 16] = [
    Some(0),
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    None,
    None,
    Some(5),
    Some(6),
    Some(7),
    Some(8),
    Some(9),
    Some(10),
    None,
    None,
    Some(11),
];

/// Lane of a bmson `x` under `mode`, `None` for a background note.
#[must_use]
pub fn lane_of(mode: Mode, x: u32) -> Option<usize> {
    let index = usize::try_from(x).ok()?.checked_sub(1)?;
    match mode {
        Mode::Beat5K => BEAT5_LANES.get(index).copied().flatten(),
        Mode::Beat10K => BEAT10_LANES.get(index).copied().flatten(),
        _ => (index < mode.lane_count()).then_some(index),
    }
}

fn header_of(info: &BmsonInfo) -> ChartHeader {
    let subtitle = match (info.subtitle.is_empty(), info.chart_name.is_empty()) {
        (_, true) => info.subtitle.clone(),
        (true, false) => format!("[{}]", info.chart_name),
        (false, false) => format!("{} [{}]", info.subtitle, info.chart_name),
    };
    ChartHeader {
        title: info.title.clone(),
        subtitle,
        genre: info.genre.clone(),
        artist: info.artist.clone(),
        subartist: info.subartists.join(","),
        banner: info.banner_image.clone(),
        stagefile: info.eyecatch_image.clone(),
        backbmp: info.back_image.clone(),
        preview: info.preview_music.clone(),
        bpm: info.init_bpm,
        playlevel: info.level.to_string(),
        judge_rank: info.judge_rank as i32,
        total: info.total,
        ln_mode: LongNoteType::from_number(info.ln_type).unwrap_or_default(),
        ..ChartHeader::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TempoEvent {
    Scroll(f64),
    Bpm(f64),
    Stop(u64),
}

/// A long note placed by a sound channel, kept to resolve later `up` notes and inner notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlacedLongNote {
    start: MeasurePosition,
    end: MeasurePosition,
    end_note: NoteId,
}

/// One decode call.
#[derive(Debug)]
struct BmsonDecoder<'a> {
    bmson: &'a Bmson,
    header: ChartHeader,
    mode: Mode,
    scale: PulseScale,
    cache: TimelineCache,
    notes: NoteArena,
    long_notes: Vec<Vec<PlacedLongNote>>,
    /// End sounds of `up` notes met before their long note, keyed by `(x, y)`.
    pending_ends: HashMap<(u32, PulseNumber), NoteSound>,
    log: DecodeLog,
}

/// Decodes a bmson object.
///
/// ```rust
/// use bms_chart::{bmson::{Bmson, decode::decode_bmson}, config::DecodeConfig};
///
/// let mut bmson = Bmson::default();
/// bmson.info.init_bpm = 120.0;
/// let output = decode_bmson(&bmson, &DecodeConfig::default());
/// assert_eq!(output.chart.map(|chart| chart.header.bpm), Some(120.0));
/// ```
#[must_use]
pub fn decode_bmson(bmson: &Bmson, config: &DecodeConfig) -> DecodeOutput {
    let mut log = DecodeLog::new();
    let header = header_of(&bmson.info);
    if let Err(error) = check_start_bpm(header.bpm) {
        log.push(error);
        return DecodeOutput { chart: None, log };
    }
    if bmson.info.judge_rank < MIN_PERCENTAGE_JUDGE_RANK {
        log.push(DecodeWarning::SuspiciousJudgeRank {
            judge_rank: bmson.info.judge_rank,
        });
    }
    let mode = Mode::from_hint(&bmson.info.mode_hint).unwrap_or(Mode::Beat7K);
    ::log::debug!(
        "decoding bmson {:?} as {mode:?}, {} sound channels",
        bmson.info.title,
        bmson.sound_channels.len()
    );

    let mut decoder = BmsonDecoder {
        bmson,
        mode,
        scale: PulseScale::new(bmson.info.resolution),
        cache: TimelineCache::new(header.bpm, mode.lane_count()),
        notes: NoteArena::default(),
        long_notes: vec![Vec::new(); mode.lane_count()],
        pending_ends: HashMap::new(),
        header,
        log,
    };
    decoder.apply_tempo();
    decoder.place_bar_lines();
    for (wav, channel) in bmson.sound_channels.iter().enumerate() {
        decoder.place_channel(wav, channel);
    }
    let bga_list = decoder.place_bga();
    decoder.finish(config, bga_list)
}

/// Reads bmson JSON bytes and decodes them.
///
/// A text that is not a bmson object is the fatal [`DecodeError::Unreadable`].
///
/// [`DecodeError::Unreadable`]: crate::decode_log::DecodeError::Unreadable
#[cfg(feature = "bmson")]
#[must_use]
pub fn decode_bmson_json(json: &[u8], config: &DecodeConfig) -> DecodeOutput {
    match Bmson::from_json(json) {
        Ok(bmson) => decode_bmson(&bmson, config),
        Err(error) => {
            let mut log = DecodeLog::new();
            log.push(crate::decode_log::DecodeError::Unreadable {
                reason: error.to_string(),
            });
            DecodeOutput { chart: None, log }
        }
    }
}

impl BmsonDecoder<'_> {
    fn position(&self, pulse: PulseNumber) -> MeasurePosition {
        self.scale.position(pulse)
    }

    fn time_at(&mut self, position: MeasurePosition) -> i64 {
        self.cache.resolve(position).time
    }

    fn apply_tempo(&mut self) {
        let scrolls = self
            .bmson
            .scroll_events
            .iter()
            .map(|event| (event.y, TempoEvent::Scroll(event.rate)))
            .sorted_by_key(|(y, _)| *y);
        let bpms = self
            .bmson
            .bpm_events
            .iter()
            .map(|event| (event.y, TempoEvent::Bpm(event.bpm)))
            .sorted_by_key(|(y, _)| *y);
        let stops = self
            .bmson
            .stop_events
            .iter()
            .map(|event| (event.y, TempoEvent::Stop(event.duration)))
            .sorted_by_key(|(y, _)| *y);
        let events = scrolls
            .merge_by(bpms, |a, b| a.0 <= b.0)
            .merge_by(stops, |a, b| a.0 <= b.0);

        let pulses_per_measure = self.scale.pulses_per_measure() as f64;
        for (y, event) in events {
            let position = self.position(y);
            match event {
                TempoEvent::Scroll(rate) => self.cache.resolve(position).scroll = rate,
                TempoEvent::Bpm(bpm) if !(bpm.is_finite() && bpm > 0.0) => {
                    self.log.push(DecodeWarning::InvalidBpmChange { bpm });
                }
                TempoEvent::Bpm(bpm) => self.cache.resolve(position).bpm = bpm,
                TempoEvent::Stop(duration) => {
                    let timeline = self.cache.resolve(position);
                    timeline.stop = (MICROS_PER_MEASURE_MINUTE * duration as f64
                        / (timeline.bpm * pulses_per_measure)) as i64;
                }
            }
        }
    }

    /// Last pulse any event of the chart touches.
    fn last_pulse(&self) -> PulseNumber {
        let bmson = self.bmson;
        let notes = bmson
            .sound_channels
            .iter()
            .flat_map(|channel| &channel.notes)
            .map(|note| note.y.offset(note.l));
        let tempo = bmson
            .bpm_events
            .iter()
            .map(|event| event.y)
            .chain(bmson.stop_events.iter().map(|event| event.y))
            .chain(bmson.scroll_events.iter().map(|event| event.y));
        let bga = bmson
            .bga
            .bga_events
            .iter()
            .chain(&bmson.bga.layer_events)
            .chain(&bmson.bga.poor_events)
            .map(|event| event.y);
        notes.chain(tempo).chain(bga).max().unwrap_or_default()
    }

    fn place_bar_lines(&mut self) {
        let pulses: Vec<PulseNumber> = match &self.bmson.lines {
            Some(lines) => lines.iter().map(|line| line.y).collect(),
            None => {
                let last = self.last_pulse().0;
                let step = self.scale.pulses_per_measure();
                (0..=last / step).map(|measure| PulseNumber(measure * step)).collect()
            }
        };
        for y in pulses {
            let position = self.position(y);
            self.cache.resolve(position).section_line = true;
        }
    }

    fn inside_long_note(&self, lane: usize, position: MeasurePosition) -> bool {
        self.long_notes.get(lane).is_some_and(|placed| {
            placed
                .iter()
                .any(|long| long.start < position && position <= long.end)
        })
    }

    fn place_channel(&mut self, wav: usize, channel: &SoundChannel) {
        let notes: Vec<_> = channel.notes.iter().sorted_by_key(|note| note.y).collect();
        let mut start_us = 0;
        for (index, note) in notes.iter().enumerate() {
            if !note.c {
                start_us = 0;
            }
            let position = self.position(note.y);
            let time = self.time_at(position);
            let next = notes
                .get(index + 1..)
                .and_then(|rest| rest.iter().find(|next| next.y > note.y));
            let duration_us = match next {
                Some(next) if next.c => {
                    let next_position = self.position(next.y);
                    self.time_at(next_position) - time
                }
                _ => 0,
            };
            let sound = NoteSound::sliced(Some(wav), start_us, duration_us);

            match lane_of(self.mode, note.x) {
                None => self.to_background(position, sound),
                Some(lane) if note.up => self.place_end_sound(lane, note.x, note.y, sound),
                Some(lane) if self.inside_long_note(lane, position) => {
                    self.log.push(DecodeWarning::NoteInsideLn { lane, time });
                    self.to_background(position, sound);
                }
                Some(lane) if note.l > 0 => self.place_long_note(lane, note, sound, time),
                Some(lane) => self.place_normal_note(lane, position, sound, time),
            }
            start_us += duration_us;
        }
    }

    fn to_background(&mut self, position: MeasurePosition, sound: NoteSound) {
        let note = self.notes.alloc(Note::normal(sound));
        self.cache.resolve(position).background_notes.push(note);
    }

    fn place_end_sound(&mut self, lane: usize, x: u32, y: PulseNumber, sound: NoteSound) {
        let position = self.position(y);
        let placed = self
            .long_notes
            .get(lane)
            .and_then(|placed| placed.iter().find(|long| long.end == position))
            .map(|long| long.end_note);
        match placed.and_then(|end| self.notes.get_mut(end)) {
            Some(end) => end.sound = sound,
            None => {
                self.pending_ends.insert((x, y), sound);
            }
        }
    }

    fn place_long_note(
        &mut self,
        lane: usize,
        note: &super::Note,
        sound: NoteSound,
        time: i64,
    ) {
        let position = self.position(note.y);
        let end_y = note.y.offset(note.l);
        let end_position = self.position(end_y);
        if let Some(existing) = self.cache.note_at(position, lane) {
            let pair = self
                .notes
                .get(existing)
                .and_then(Note::as_long)
                .and_then(|long| long.pair);
            let same_end = pair.is_some() && pair == self.cache.note_at(end_position, lane);
            match self.notes.get_mut(existing) {
                Some(existing) if same_end => existing.layered.push(sound),
                _ => self.log.push(DecodeWarning::DuplicateNote { lane, time }),
            }
            return;
        }
        let covered = self.cache.notes_in(
            lane,
            (Bound::Excluded(position), Bound::Included(end_position)),
        );
        if !covered.is_empty() {
            self.log.push(DecodeWarning::NoteInsideLn { lane, time });
            self.to_background(position, sound);
            return;
        }

        let start = self.notes.alloc(Note::long(sound));
        self.cache.set_note(position, lane, start);
        let end_sound = self
            .pending_ends
            .remove(&(note.x, end_y))
            .unwrap_or_default();
        let end = self.notes.alloc(Note::long(end_sound));
        self.cache.set_note(end_position, lane, end);
        let ln_type = LongNoteType::from_number(note.t).unwrap_or(self.header.ln_mode);
        self.notes.link(start, end, ln_type);
        if let Some(placed) = self.long_notes.get_mut(lane) {
            placed.push(PlacedLongNote {
                start: position,
                end: end_position,
                end_note: end,
            });
        }
    }

    fn place_normal_note(
        &mut self,
        lane: usize,
        position: MeasurePosition,
        sound: NoteSound,
        time: i64,
    ) {
        let Some(existing) = self.cache.note_at(position, lane) else {
            let note = self.notes.alloc(Note::normal(sound));
            self.cache.set_note(position, lane, note);
            return;
        };
        match self.notes.get_mut(existing) {
            Some(existing) if existing.kind == NoteKind::Normal => existing.layered.push(sound),
            _ => self.log.push(DecodeWarning::DuplicateNote { lane, time }),
        }
    }

    /// Places BGA events and returns the picture list.
    fn place_bga(&mut self) -> Vec<String> {
        let bga = &self.bmson.bga;
        let mut ids = HashMap::new();
        let mut bga_list = Vec::with_capacity(bga.bga_header.len());
        for header in &bga.bga_header {
            ids.insert(header.id, bga_list.len());
            bga_list.push(header.name.clone());
        }

        let layers = [
            (&bga.bga_events, BgaTarget::Base),
            (&bga.layer_events, BgaTarget::Layer),
            (&bga.poor_events, BgaTarget::Poor),
        ];
        for (events, target) in layers {
            for event in events {
                let Some(&index) = ids.get(&event.id) else {
                    self.log
                        .push(DecodeWarning::UndefinedBgaId { id: event.id.0 });
                    continue;
                };
                let position = self.position(event.y);
                let timeline = self.cache.resolve(position);
                match target {
                    BgaTarget::Base => timeline.bga = Some(index),
                    BgaTarget::Layer => timeline.layer = Some(index),
                    BgaTarget::Poor => timeline.miss_layer = Some(MissLayer::evenly(&[Some(index)])),
                }
            }
        }
        bga_list
    }

    fn finish(self, config: &DecodeConfig, bga_list: Vec<String>) -> DecodeOutput {
        let Self {
            bmson,
            header,
            mode,
            cache,
            notes,
            mut log,
            ..
        } = self;
        let parts = ChartParts {
            header,
            mode,
            cache,
            notes,
            wav_list: bmson
                .sound_channels
                .iter()
                .map(|channel| channel.name.clone())
                .collect(),
            bga_list,
            random: Vec::new(),
        };
        let chart = assemble(parts, config.ln_type, config.hashes.clone(), &mut log);
        DecodeOutput {
            chart: Some(chart),
            log,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BgaTarget {
    Base,
    Layer,
    Poor,
}
