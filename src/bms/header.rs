//! Header commands: chart metadata and definition tables.
//!
//! Header lines are applied in source order during the collect pass, so a later definition of
//! the same id wins. Resource files keep every declaration in their list, only the id mapping
//! is overwritten.

use std::{collections::HashMap, ops::Range, str::FromStr};

use crate::{
    chart::{ChartHeader, note::LongNoteType},
    decode_log::{DecodeLog, DecodeWarning},
};

use super::numeral::{ObjId, parse_base36};

/// Beats of a `#STOPxx` value per measure.
pub const STOP_UNITS_PER_MEASURE: f64 = 192.0;

/// Tables filled by `#WAVxx`, `#BMPxx`, `#BPMxx`, `#STOPxx` and `#SCROLLxx`.
///
/// Ids are keyed by their base-36 value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    wav_ids: HashMap<u16, usize>,
    /// Sound file names in declaration order.
    pub wav_list: Vec<String>,
    bmp_ids: HashMap<u16, usize>,
    /// Picture file names in declaration order.
    pub bga_list: Vec<String>,
    bpm: HashMap<u16, f64>,
    /// Stop lengths in measures.
    stop: HashMap<u16, f64>,
    scroll: HashMap<u16, f64>,
}

impl Definitions {
    /// Index into [`Self::wav_list`] of a sound id.
    #[must_use]
    pub fn wav(&self, id: u16) -> Option<usize> {
        self.wav_ids.get(&id).copied()
    }

    /// Index into [`Self::bga_list`] of a picture id.
    #[must_use]
    pub fn bmp(&self, id: u16) -> Option<usize> {
        self.bmp_ids.get(&id).copied()
    }

    /// Tempo of a `#BPMxx` id.
    #[must_use]
    pub fn bpm(&self, id: u16) -> Option<f64> {
        self.bpm.get(&id).copied()
    }

    /// Length in measures of a `#STOPxx` id.
    #[must_use]
    pub fn stop(&self, id: u16) -> Option<f64> {
        self.stop.get(&id).copied()
    }

    /// Multiplier of a `#SCROLLxx` id.
    #[must_use]
    pub fn scroll(&self, id: u16) -> Option<f64> {
        self.scroll.get(&id).copied()
    }
}

/// Indexed definition commands, longest prefix first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefinitionKind {
    ExBpm,
    Bpm,
    Wav,
    Bmp,
    Stop,
    Scroll,
}

impl DefinitionKind {
    const ALL: [(&'static str, Self); 6] = [
        ("EXBPM", Self::ExBpm),
        ("SCROLL", Self::Scroll),
        ("STOP", Self::Stop),
        ("BPM", Self::Bpm),
        ("WAV", Self::Wav),
        ("BMP", Self::Bmp),
    ];
}

/// Applies header commands to a [`ChartHeader`] and a [`Definitions`] table.
#[derive(Debug)]
pub struct HeaderSink<'a> {
    /// Metadata being filled.
    pub header: &'a mut ChartHeader,
    /// Tables being filled.
    pub definitions: &'a mut Definitions,
    /// Log receiving warnings.
    pub log: &'a mut DecodeLog,
}

fn finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn path(value: &str) -> String {
    value.replace('\\', "/")
}

impl HeaderSink<'_> {
    /// Applies `command`, the header line without its leading `#`, found at `range`.
    ///
    /// Names match case-insensitively. Unknown commands are ignored.
    pub fn apply(&mut self, command: &str, range: Range<usize>) {
        let (name, value) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, value)| (name, value.trim()));
        let upper = name.to_ascii_uppercase();

        if self.apply_definition(&upper, value, range.clone()) {
            return;
        }
        if value.is_empty() {
            return;
        }
        match upper.as_str() {
            "PLAYER" => {
                if let Some(player) = self.number(&upper, value, range) {
                    self.header.player = Some(player);
                }
            }
            "GENRE" => self.header.genre = value.to_string(),
            "TITLE" => self.header.title = value.to_string(),
            "SUBTITLE" => self.header.subtitle = value.to_string(),
            "ARTIST" => self.header.artist = value.to_string(),
            "SUBARTIST" => self.header.subartist = value.to_string(),
            "PLAYLEVEL" => self.header.playlevel = value.to_string(),
            "STAGEFILE" => self.header.stagefile = path(value),
            "BACKBMP" => self.header.backbmp = path(value),
            "BANNER" => self.header.banner = path(value),
            "PREVIEW" => self.header.preview = path(value),
            "RANK" => {
                if let Some(rank) = self.number::<i64>(&upper, value, range.clone()) {
                    if (0..=4).contains(&rank) {
                        self.header.judge_rank = rank as i32;
                    } else {
                        self.log
                            .push_at(DecodeWarning::RankOutOfRange { rank }, range);
                    }
                }
            }
            "TOTAL" => {
                if let Some(total) = self.decimal(&upper, value, range) {
                    self.header.total = total;
                }
            }
            "VOLWAV" => {
                if let Some(volwav) = self.number(&upper, value, range) {
                    self.header.volwav = volwav;
                }
            }
            "DIFFICULTY" => {
                if let Some(difficulty) = self.number(&upper, value, range) {
                    self.header.difficulty = difficulty;
                }
            }
            "BPM" => {
                if let Some(bpm) = self.decimal(&upper, value, range) {
                    self.header.bpm = bpm;
                }
            }
            "LNOBJ" => match ObjId::try_from(value) {
                Ok(id) if parse_base36(value).is_ok() => self.header.ln_obj = Some(id),
                _ => self.log.push_at(
                    DecodeWarning::InvalidDefinitionId {
                        command: upper.clone(),
                    },
                    range,
                ),
            },
            "LNMODE" => {
                let mode = value.parse().ok().and_then(LongNoteType::from_number);
                match mode {
                    Some(mode) => self.header.ln_mode = mode,
                    None => self.invalid_number(&upper, value, range),
                }
            }
            _ => {}
        }
    }

    /// Handles `#BPMxx`, `#EXBPMxx`, `#WAVxx`, `#BMPxx`, `#STOPxx` and `#SCROLLxx`.
    ///
    /// Returns whether `name` was one of them.
    fn apply_definition(&mut self, name: &str, value: &str, range: Range<usize>) -> bool {
        let Some((kind, id_text)) = DefinitionKind::ALL
            .iter()
            .find_map(|&(prefix, kind)| Some((kind, name.strip_prefix(prefix)?)))
            .filter(|(_, id_text)| !id_text.is_empty())
        else {
            return false;
        };
        let Ok(id) = parse_base36(id_text) else {
            self.log.push_at(
                DecodeWarning::InvalidDefinitionId {
                    command: name.to_string(),
                },
                range,
            );
            return true;
        };
        if value.is_empty() {
            self.log.push_at(
                DecodeWarning::IncompleteDefinition {
                    command: name.to_string(),
                },
                range,
            );
            return true;
        }

        match kind {
            DefinitionKind::Wav => {
                let definitions = &mut *self.definitions;
                definitions.wav_ids.insert(id, definitions.wav_list.len());
                definitions.wav_list.push(path(value));
            }
            DefinitionKind::Bmp => {
                let definitions = &mut *self.definitions;
                definitions.bmp_ids.insert(id, definitions.bga_list.len());
                definitions.bga_list.push(path(value));
            }
            DefinitionKind::Bpm | DefinitionKind::ExBpm => {
                if let Some(bpm) = self.decimal(name, value, range) {
                    self.definitions.bpm.insert(id, bpm);
                }
            }
            DefinitionKind::Stop => {
                if let Some(stop) = self.decimal(name, value, range) {
                    self.definitions
                        .stop
                        .insert(id, stop / STOP_UNITS_PER_MEASURE);
                }
            }
            DefinitionKind::Scroll => {
                if let Some(scroll) = self.decimal(name, value, range) {
                    self.definitions.scroll.insert(id, scroll);
                }
            }
        }
        true
    }

    fn invalid_number(&mut self, command: &str, value: &str, range: Range<usize>) {
        self.log.push_at(
            DecodeWarning::InvalidHeaderNumber {
                command: command.to_string(),
                value: value.to_string(),
            },
            range,
        );
    }

    fn number<T: FromStr>(&mut self, command: &str, value: &str, range: Range<usize>) -> Option<T> {
        let parsed = value.parse().ok();
        if parsed.is_none() {
            self.invalid_number(command, value, range);
        }
        parsed
    }

    fn decimal(&mut self, command: &str, value: &str, range: Range<usize>) -> Option<f64> {
        let parsed = finite(value);
        if parsed.is_none() {
            self.invalid_number(command, value, range);
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn apply_all(lines: &[&str]) -> (ChartHeader, Definitions, DecodeLog) {
        let mut header = ChartHeader::default();
        let mut definitions = Definitions::default();
        let mut log = DecodeLog::new();
        let mut sink = HeaderSink {
            header: &mut header,
            definitions: &mut definitions,
            log: &mut log,
        };
        for line in lines {
            sink.apply(line, 0..line.len());
        }
        (header, definitions, log)
    }

    #[test]
    fn metadata() {
        let (header, _, log) = apply_all(&[
            "TITLE Foo Bar",
            "subtitle [ANOTHER]",
            "ARTIST someone",
            "PLAYER 1",
            "RANK 3",
            "TOTAL 300.5",
            "BPM 150",
            "STAGEFILE img\\stage.png",
            "LNMODE 2",
            "LNOBJ zz",
        ]);
        assert!(log.is_empty());
        assert_eq!(header.title, "Foo Bar");
        assert_eq!(header.subtitle, "[ANOTHER]");
        assert_eq!(header.player, Some(1));
        assert_eq!(header.judge_rank, 3);
        assert_eq!(header.total, 300.5);
        assert_eq!(header.bpm, 150.0);
        assert_eq!(header.stagefile, "img/stage.png");
        assert_eq!(header.ln_mode, LongNoteType::ChargeNote);
        assert_eq!(header.ln_obj.map(ObjId::as_base36), Some(1295));
    }

    #[test]
    fn definitions() {
        let (_, definitions, log) = apply_all(&[
            "WAV01 kick.wav",
            "wav02 snare.wav",
            "WAV01 kick2.wav",
            "BMP0A back.bmp",
            "BPM01 180.5",
            "EXBPM02 90",
            "STOP01 96",
            "SCROLL01 0.5",
        ]);
        assert!(log.is_empty());
        assert_eq!(
            definitions.wav_list,
            vec!["kick.wav", "snare.wav", "kick2.wav"]
        );
        assert_eq!(definitions.wav(1), Some(2));
        assert_eq!(definitions.wav(2), Some(1));
        assert_eq!(definitions.bmp(10), Some(0));
        assert_eq!(definitions.bpm(1), Some(180.5));
        assert_eq!(definitions.bpm(2), Some(90.0));
        assert_eq!(definitions.stop(1), Some(0.5));
        assert_eq!(definitions.scroll(1), Some(0.5));
    }

    #[test]
    fn malformed_headers_warn() {
        let (header, _, log) = apply_all(&[
            "RANK 7",
            "TOTAL lots",
            "WAV01",
            "BMP-1 x.bmp",
            "BPM02 fast",
            "UNKNOWN 1",
        ]);
        assert_eq!(header.judge_rank, 2);
        assert_eq!(
            log.warnings().cloned().collect::<Vec<_>>(),
            vec![
                DecodeWarning::RankOutOfRange { rank: 7 },
                DecodeWarning::InvalidHeaderNumber {
                    command: "TOTAL".to_string(),
                    value: "lots".to_string(),
                },
                DecodeWarning::IncompleteDefinition {
                    command: "WAV01".to_string(),
                },
                DecodeWarning::InvalidDefinitionId {
                    command: "BMP-1".to_string(),
                },
                DecodeWarning::InvalidHeaderNumber {
                    command: "BPM02".to_string(),
                    value: "fast".to_string(),
                },
            ]
        );
    }
}
