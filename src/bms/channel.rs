//! Channels of message lines and their mapping onto lanes.
//!
//! A channel is the 2-character base-36 field of `#MMMCC:data`. Only the fixed set below has a
//! meaning, anything else is ignored by the decoder.

use crate::chart::mode::Mode;

const BGM: u16 = 1;
const SECTION_RATE: u16 = 2;
const BPM_HEX: u16 = 3;
const BGA: u16 = 4;
const POOR: u16 = 6;
const LAYER: u16 = 7;
const BPM_EXTENDED: u16 = 8;
const STOP: u16 = 9;
const SCROLL: u16 = 1020;

/// Base channels of the note ranges, each covering `base..=base + 8`.
const NOTE_BASES: [(u16, NoteChannelKind, PlayerSide); 8] = [
    (37, NoteChannelKind::Visible, PlayerSide::Player1),
    (73, NoteChannelKind::Visible, PlayerSide::Player2),
    (109, NoteChannelKind::Invisible, PlayerSide::Player1),
    (145, NoteChannelKind::Invisible, PlayerSide::Player2),
    (181, NoteChannelKind::Long, PlayerSide::Player1),
    (217, NoteChannelKind::Long, PlayerSide::Player2),
    (469, NoteChannelKind::Landmine, PlayerSide::Player1),
    (505, NoteChannelKind::Landmine, PlayerSide::Player2),
];

/// Number of offsets in one note range.
pub const NOTE_RANGE_WIDTH: usize = 9;

/// A kind of note channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteChannelKind {
    /// A note the player hits.
    Visible,
    /// A note that is never shown nor judged.
    Invisible,
    /// A long-note start or end token.
    Long,
    /// A landmine note.
    Landmine,
}

/// A side of the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerSide {
    /// The player 1 side.
    #[default]
    Player1,
    /// The player 2 side.
    Player2,
}

/// A channel with a meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// `01`: sounds played automatically.
    Bgm,
    /// `02`: length multiplier of the measure, a decimal rather than pairs.
    SectionRate,
    /// `03`: tempo change written as a hexadecimal byte.
    BpmHex,
    /// `04`: BGA picture.
    Bga,
    /// `06`: picture shown on a miss.
    Poor,
    /// `07`: layer picture over the BGA.
    Layer,
    /// `08`: tempo change through `#BPMxx`.
    BpmExtended,
    /// `09`: stop through `#STOPxx`.
    Stop,
    /// `SC`: scroll speed change through `#SCROLLxx`.
    Scroll,
    /// A note range.
    Note {
        /// Kind of the range.
        kind: NoteChannelKind,
        /// Side of the range.
        side: PlayerSide,
        /// Offset within the range, `0..=8`.
        offset: usize,
    },
}

impl Channel {
    /// Interprets a base-36 channel value, `None` for a channel without a meaning.
    #[must_use]
    pub fn from_id(id: u16) -> Option<Self> {
        let channel = match id {
            BGM => Self::Bgm,
            SECTION_RATE => Self::SectionRate,
            BPM_HEX => Self::BpmHex,
            BGA => Self::Bga,
            POOR => Self::Poor,
            LAYER => Self::Layer,
            BPM_EXTENDED => Self::BpmExtended,
            STOP => Self::Stop,
            SCROLL => Self::Scroll,
            _ => {
                return NOTE_BASES.iter().find_map(|&(base, kind, side)| {
                    let offset = usize::from(id.checked_sub(base)?);
                    (offset < NOTE_RANGE_WIDTH).then_some(Self::Note { kind, side, offset })
                });
            }
        };
        Some(channel)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Channel: ")?;
        match self {
            Self::Bgm => write!(f, "BGM"),
            Self::SectionRate => write!(f, "SECTION_RATE"),
            Self::BpmHex => write!(f, "BPM_HEX"),
            Self::Bga => write!(f, "BGA"),
            Self::Poor => write!(f, "BGA_POOR"),
            Self::Layer => write!(f, "BGA_LAYER"),
            Self::BpmExtended => write!(f, "BPM_EXTENDED"),
            Self::Stop => write!(f, "STOP"),
            Self::Scroll => write!(f, "SCROLL"),
            Self::Note { kind, side, offset } => write!(f, "{kind:?} {side:?} +{offset}"),
        }
    }
}

/// Lane per range offset: 1P offsets `0..=8`, then 2P offsets `0..=8`.
type LaneTable = [Option<usize>; NOTE_RANGE_WIDTH * 2];

const BEAT5: LaneTable = [
    Some(0),
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    Some(5),
    None,
    None,
    None,
    Some(6),
    Some(7),
    Some(8),
    Some(9),
    Some(10),
    Some(11),
    None,
    None,
    None,
];

const BEAT7: LaneTable = [
    Some(0),
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    Some(7),
    None,
    Some(5),
    Some(6),
    Some(8),
    Some(9),
    Some(10),
    Some(11),
    Some(12),
    Some(15),
    None,
    Some(13),
    Some(14),
];

const POPN: LaneTable = [
    Some(0),
    Some(1),
    Some(2),
    Some(3),
    Some(4),
    None,
    None,
    None,
    None,
    None,
    Some(5),
    Some(6),
    Some(7),
    Some(8),
    None,
    None,
    None,
    None,
];

/// Lane of a note channel offset under `mode`, `None` if the offset is unused.
#[must_use]
pub fn lane_of(mode: Mode, side: PlayerSide, offset: usize) -> Option<usize> {
    let table = match mode {
        Mode::Popn5K | Mode::Popn9K => &POPN,
        Mode::Beat7K | Mode::Beat14K => &BEAT7,
        _ => &BEAT5,
    };
    let index = match side {
        PlayerSide::Player1 => offset,
        PlayerSide::Player2 => offset + NOTE_RANGE_WIDTH,
    };
    table.get(index).copied().flatten()
}

/// Lane ranges touched by a chart, from which its mode follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModeFlags {
    /// A 1P or 2P offset 7 or 8 carries a note.
    pub seven_keys: bool,
    /// A 2P range carries a note.
    pub double: bool,
}

impl ModeFlags {
    /// Records a nonzero value on a note channel.
    pub fn touch(&mut self, side: PlayerSide, offset: usize) {
        if offset == 7 || offset == 8 {
            self.seven_keys = true;
        }
        if side == PlayerSide::Player2 {
            self.double = true;
        }
    }

    /// The mode starting from `initial` and upgraded by the recorded flags.
    ///
    /// Only beat modes upgrade. A pop'n chart keeps its mode whatever it touches.
    #[must_use]
    pub const fn resolve(self, initial: Mode) -> Mode {
        if !initial.is_beat() {
            return initial;
        }
        match (self.seven_keys, self.double) {
            (false, false) => initial,
            (true, false) => match initial {
                Mode::Beat5K => Mode::Beat7K,
                Mode::Beat10K => Mode::Beat14K,
                other => other,
            },
            (false, true) => match initial {
                Mode::Beat5K => Mode::Beat10K,
                Mode::Beat7K => Mode::Beat14K,
                other => other,
            },
            (true, true) => Mode::Beat14K,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::bms::numeral::parse_base36;

    fn channel(text: &str) -> Option<Channel> {
        Channel::from_id(parse_base36(text).unwrap())
    }

    #[test]
    fn fixed_channels() {
        assert_eq!(channel("01"), Some(Channel::Bgm));
        assert_eq!(channel("02"), Some(Channel::SectionRate));
        assert_eq!(channel("SC"), Some(Channel::Scroll));
        assert_eq!(channel("sc"), Some(Channel::Scroll));
        assert_eq!(channel("05"), None);
        assert_eq!(channel("ZZ"), None);
    }

    #[test]
    fn note_ranges() {
        assert_eq!(
            channel("16"),
            Some(Channel::Note {
                kind: NoteChannelKind::Visible,
                side: PlayerSide::Player1,
                offset: 5,
            })
        );
        assert_eq!(
            channel("69"),
            Some(Channel::Note {
                kind: NoteChannelKind::Long,
                side: PlayerSide::Player2,
                offset: 8,
            })
        );
        assert_eq!(
            channel("D1"),
            Some(Channel::Note {
                kind: NoteChannelKind::Landmine,
                side: PlayerSide::Player1,
                offset: 0,
            })
        );
        // 1Z is past the 9-wide visible range
        assert_eq!(channel("1Z"), None);
    }

    #[test]
    fn lane_tables() {
        assert_eq!(lane_of(Mode::Beat7K, PlayerSide::Player1, 5), Some(7));
        assert_eq!(lane_of(Mode::Beat7K, PlayerSide::Player1, 7), Some(5));
        assert_eq!(lane_of(Mode::Beat5K, PlayerSide::Player1, 7), None);
        assert_eq!(lane_of(Mode::Beat14K, PlayerSide::Player2, 5), Some(15));
        assert_eq!(lane_of(Mode::Popn9K, PlayerSide::Player2, 1), Some(5));
        assert_eq!(lane_of(Mode::Popn9K, PlayerSide::Player1, 5), None);
    }

    #[test]
    fn mode_upgrades_only() {
        let mut flags = ModeFlags::default();
        assert_eq!(flags.resolve(Mode::Beat5K), Mode::Beat5K);
        flags.touch(PlayerSide::Player1, 8);
        assert_eq!(flags.resolve(Mode::Beat5K), Mode::Beat7K);
        flags.touch(PlayerSide::Player2, 0);
        assert_eq!(flags.resolve(Mode::Beat5K), Mode::Beat14K);
        assert_eq!(flags.resolve(Mode::Popn9K), Mode::Popn9K);

        let mut double_only = ModeFlags::default();
        double_only.touch(PlayerSide::Player2, 3);
        assert_eq!(double_only.resolve(Mode::Beat5K), Mode::Beat10K);
    }
}
