//! Decode log: the diagnostic taxonomy of both decoders.
//!
//! Decoding never panics on malformed charts. Each recoverable problem becomes a
//! [`DecodeWarning`] and the offending line or event is ignored. Conditions that leave no
//! meaningful chart become a [`DecodeError`] and short-circuit the remaining stages. Both kinds,
//! together with informational [`DecodeInfo`] entries, are accumulated in order into a
//! [`DecodeLog`].
//!
//! Every pushed entry is also mirrored to the [`log`] facade, so applications that install a
//! logger see decode problems without inspecting the returned log.

use std::ops::Range;

use thiserror::Error;

use crate::{bms::numeral::ObjId, chart::mode::Mode};

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogKind {
    /// Informational message.
    Info,
    /// Recoverable problem. The decode continues.
    Warning,
    /// Fatal problem. The decode yields no chart.
    Error,
}

/// Informational messages.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeInfo {
    /// A `#RANDOM` value was drawn from the injected generator.
    #[error("sampled random branch {value} of 1..={max}")]
    BranchSampled {
        /// Declared upper bound.
        max: u64,
        /// Chosen value.
        value: u64,
    },
    /// The source was not valid UTF-8 and was decoded as Shift_JIS.
    #[error("source decoded as Shift_JIS")]
    ShiftJisFallback,
}

/// Recoverable problems found while decoding.
///
/// Lane numbers are 0-based lane indices of the detected mode, and times are microseconds.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeWarning {
    /// A digit pair in channel data is not alphanumeric. It is treated as `00`.
    #[error("malformed numeral {pair:?} in channel data")]
    MalformedNumeral {
        /// The offending two characters.
        pair: String,
    },
    /// The channel identifier of a message line could not be parsed.
    #[error("invalid channel {channel:?}")]
    InvalidChannel {
        /// The offending channel text.
        channel: String,
    },
    /// The measure number of a message line is not decimal.
    #[error("invalid measure number {measure:?}")]
    InvalidMeasure {
        /// The offending measure text.
        measure: String,
    },
    /// A measure length rate could not be parsed.
    #[error("invalid measure rate {value:?}")]
    InvalidSectionRate {
        /// The offending value.
        value: String,
    },
    /// A tempo change is zero or negative. The change is ignored.
    #[error("invalid BPM change {bpm}")]
    InvalidBpmChange {
        /// The offending tempo.
        bpm: f64,
    },
    /// A stop has a negative length. The stop is ignored.
    #[error("negative stop of {measures} measures")]
    NegativeStop {
        /// The offending length in measures.
        measures: f64,
    },
    /// `#RANDOM` has a missing, zero or non-numeric bound.
    #[error("invalid #RANDOM argument {argument:?}")]
    InvalidRandom {
        /// The offending argument.
        argument: String,
    },
    /// `#IF` has a non-numeric argument.
    #[error("invalid #IF argument {argument:?}")]
    InvalidIf {
        /// The offending argument.
        argument: String,
    },
    /// `#IF` appeared without an enclosing `#RANDOM`.
    #[error("#IF without enclosing #RANDOM")]
    IfWithoutRandom,
    /// `#ENDIF` appeared without an open `#IF`.
    #[error("#ENDIF without matching #IF")]
    UnbalancedEndIf,
    /// `#ENDRANDOM` appeared without an open `#RANDOM`.
    #[error("#ENDRANDOM without matching #RANDOM")]
    UnbalancedEndRandom,
    /// A numeric header has a value that is not a number.
    #[error("#{command} expects a number, found {value:?}")]
    InvalidHeaderNumber {
        /// Header command name.
        command: String,
        /// The offending value.
        value: String,
    },
    /// `#RANK` is outside `0..=4`.
    #[error("#RANK {rank} is out of range 0..=4")]
    RankOutOfRange {
        /// The declared rank.
        rank: i64,
    },
    /// A definition command lacks its value.
    #[error("#{command} definition is incomplete")]
    IncompleteDefinition {
        /// Header command name.
        command: String,
    },
    /// A definition command has a malformed object id.
    #[error("#{command} has an invalid object id")]
    InvalidDefinitionId {
        /// Header command name.
        command: String,
    },
    /// A channel event references an undefined `#BPMxx`.
    #[error("undefined BPM reference {id}")]
    UndefinedBpm {
        /// Referenced id.
        id: ObjId,
    },
    /// A channel event references an undefined `#STOPxx`.
    #[error("undefined STOP reference {id}")]
    UndefinedStop {
        /// Referenced id.
        id: ObjId,
    },
    /// A channel event references an undefined `#SCROLLxx`.
    #[error("undefined SCROLL reference {id}")]
    UndefinedScroll {
        /// Referenced id.
        id: ObjId,
    },
    /// A channel event references an undefined `#WAVxx`.
    #[error("undefined WAV reference {id}")]
    UndefinedWav {
        /// Referenced id.
        id: ObjId,
    },
    /// A channel event references an undefined `#BMPxx`.
    #[error("undefined BMP reference {id}")]
    UndefinedBmp {
        /// Referenced id.
        id: ObjId,
    },
    /// A bmson BGA event references an id missing from `bga_header`.
    #[error("undefined BGA id {id}")]
    UndefinedBgaId {
        /// Referenced id.
        id: u32,
    },
    /// Two notes were placed on the same lane and position.
    #[error("note collision on lane {lane} at {time}us")]
    NoteCollision {
        /// Lane index.
        lane: usize,
        /// Time of the slot.
        time: i64,
    },
    /// A mine could not be placed because the slot is occupied or inside a long note.
    #[error("mine collision on lane {lane} at {time}us")]
    MineCollision {
        /// Lane index.
        lane: usize,
        /// Time of the slot.
        time: i64,
    },
    /// A long note starts where a note already exists.
    #[error("long note starts over an existing note on lane {lane} at {time}us")]
    LnStartOverNote {
        /// Lane index.
        lane: usize,
        /// Time of the slot.
        time: i64,
    },
    /// A note lies inside a long note of the same lane.
    #[error("note inside long note on lane {lane} at {time}us")]
    NoteInsideLn {
        /// Lane index.
        lane: usize,
        /// Time of the note.
        time: i64,
    },
    /// A long-note start lies inside an already closed long note.
    #[error("long note start inside long note on lane {lane} at {time}us")]
    LnStartInsideLn {
        /// Lane index.
        lane: usize,
        /// Time of the token.
        time: i64,
    },
    /// A long-note end lies inside an already closed long note.
    #[error("long note end inside long note on lane {lane} at {time}us")]
    LnEndInsideLn {
        /// Lane index.
        lane: usize,
        /// Time of the token.
        time: i64,
    },
    /// An `#LNOBJ` end marker follows a long note opened on a long-note channel.
    #[error("#LNOBJ end follows a long-note channel start on lane {lane} at {time}us")]
    LnObjOnLnChannel {
        /// Lane index.
        lane: usize,
        /// Time of the start.
        time: i64,
    },
    /// An `#LNOBJ` end marker has no normal note to convert.
    #[error("#LNOBJ end without a start note on lane {lane} at {time}us")]
    LnObjUnmatched {
        /// Lane index.
        lane: usize,
        /// Time of the marker.
        time: i64,
    },
    /// A long note is still open at the end of the chart. Its start note is removed.
    #[error("unterminated long note on lane {lane}")]
    UnterminatedLongNote {
        /// Lane index.
        lane: usize,
    },
    /// Two bmson notes with different shapes share a lane and position.
    #[error("duplicate note on lane {lane} at {time}us")]
    DuplicateNote {
        /// Lane index.
        lane: usize,
        /// Time of the slot.
        time: i64,
    },
    /// bmson `judge_rank` looks like a BMS rank rather than a percentage.
    #[error("judge_rank {judge_rank} may not follow the bmson definition")]
    SuspiciousJudgeRank {
        /// Declared value.
        judge_rank: f64,
    },
    /// `#TOTAL` is missing or too small.
    #[error("total {total} is missing or too small")]
    TotalTooLow {
        /// Declared total, 0 if missing.
        total: f64,
    },
    /// The chart keeps running for 30 seconds or more after the last audible event.
    #[error("{silence}us of silence after the last audible event")]
    TrailingSilence {
        /// Length of the silence.
        silence: i64,
    },
    /// `#PLAYER` declares more than one player but no 2P-side lane is used.
    #[error("#PLAYER {player} but the chart is {mode:?}")]
    PlayerWithoutSecondSide {
        /// Declared player value.
        player: i32,
        /// Detected mode.
        mode: Mode,
    },
    /// `#PLAYER 1` but 2P-side lanes are used.
    #[error("#PLAYER 1 but the chart is {mode:?}")]
    SecondSideWithSinglePlayer {
        /// Detected mode.
        mode: Mode,
    },
}

/// Fatal problems. A decode reporting one of these yields no chart.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeError {
    /// The starting tempo is zero, negative or not finite.
    #[error("starting BPM {bpm} is not positive")]
    ZeroStartBpm {
        /// The declared starting BPM.
        bpm: f64,
    },
    /// The source could not be read as a chart at all.
    #[error("unreadable source: {reason}")]
    Unreadable {
        /// Description of the failure.
        reason: String,
    },
}

/// Payload of a [`LogEntry`].
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogMessage {
    /// An informational message.
    #[error("Info: {0}")]
    Info(#[from] DecodeInfo),
    /// A recoverable problem.
    #[error("Warn: {0}")]
    Warning(#[from] DecodeWarning),
    /// A fatal problem.
    #[error("Error: {0}")]
    Error(#[from] DecodeError),
}

impl LogMessage {
    /// Severity of this message.
    #[must_use]
    pub const fn kind(&self) -> LogKind {
        match self {
            Self::Info(_) => LogKind::Info,
            Self::Warning(_) => LogKind::Warning,
            Self::Error(_) => LogKind::Error,
        }
    }
}

/// One diagnostic entry, optionally pointing at a byte range of the source text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEntry {
    /// What happened.
    pub message: LogMessage,
    /// Byte range of the offending source line, if known.
    pub range: Option<Range<usize>>,
}

impl LogEntry {
    /// Severity of this entry.
    #[must_use]
    pub const fn kind(&self) -> LogKind {
        self.message.kind()
    }

    /// The warning of this entry, if it is one.
    #[must_use]
    pub const fn as_warning(&self) -> Option<&DecodeWarning> {
        match &self.message {
            LogMessage::Warning(warning) => Some(warning),
            _ => None,
        }
    }

    /// The error of this entry, if it is one.
    #[must_use]
    pub const fn as_error(&self) -> Option<&DecodeError> {
        match &self.message {
            LogMessage::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{} at [{}, {})", self.message, range.start, range.end),
            None => self.message.fmt(f),
        }
    }
}

/// Ordered list of diagnostics produced by one decode.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeLog {
    entries: Vec<LogEntry>,
}

impl DecodeLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a message without source range.
    pub fn push(&mut self, message: impl Into<LogMessage>) {
        self.push_entry(message.into(), None);
    }

    /// Appends a message attached to a byte range of the source.
    pub fn push_at(&mut self, message: impl Into<LogMessage>, range: Range<usize>) {
        self.push_entry(message.into(), Some(range));
    }

    fn push_entry(&mut self, message: LogMessage, range: Option<Range<usize>>) {
        match &message {
            LogMessage::Info(info) => ::log::debug!("{info}"),
            LogMessage::Warning(warning) => ::log::warn!("{warning}"),
            LogMessage::Error(error) => ::log::error!("{error}"),
        }
        self.entries.push(LogEntry { message, range });
    }

    /// All entries in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// All warnings in the order they were reported.
    pub fn warnings(&self) -> impl Iterator<Item = &DecodeWarning> {
        self.entries.iter().filter_map(LogEntry::as_warning)
    }

    /// All errors in the order they were reported.
    pub fn errors(&self) -> impl Iterator<Item = &DecodeError> {
        self.entries.iter().filter_map(LogEntry::as_error)
    }

    /// Whether a fatal error was reported.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[LogEntry] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a DecodeLog {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for DecodeLog {
    type Item = LogEntry;
    type IntoIter = std::vec::IntoIter<LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
