//! Play modes.

/// A play configuration: lane count, player count and scratch lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// beatmania 5 keys and a scratch.
    Beat5K,
    /// beatmania 7 keys and a scratch.
    Beat7K,
    /// beatmania 5 keys and a scratch on both sides.
    Beat10K,
    /// beatmania 7 keys and a scratch on both sides.
    Beat14K,
    /// pop'n music 5 buttons.
    Popn5K,
    /// pop'n music 9 buttons.
    Popn9K,
    /// 24 keys and 2 wheel directions.
    Keyboard24K,
    /// [`Mode::Keyboard24K`] on both sides.
    Keyboard24KDouble,
}

impl Mode {
    /// All modes, narrowest family member first.
    pub const ALL: [Self; 8] = [
        Self::Beat5K,
        Self::Beat7K,
        Self::Beat10K,
        Self::Beat14K,
        Self::Popn5K,
        Self::Popn9K,
        Self::Keyboard24K,
        Self::Keyboard24KDouble,
    ];

    /// Number of lanes, scratch lanes included.
    #[must_use]
    pub const fn lane_count(self) -> usize {
        match self {
            Self::Beat5K => 6,
            Self::Beat7K => 8,
            Self::Beat10K => 12,
            Self::Beat14K => 16,
            Self::Popn5K => 5,
            Self::Popn9K => 9,
            Self::Keyboard24K => 26,
            Self::Keyboard24KDouble => 52,
        }
    }

    /// Number of players (sides).
    #[must_use]
    pub const fn player(self) -> usize {
        match self {
            Self::Beat10K | Self::Beat14K | Self::Keyboard24KDouble => 2,
            _ => 1,
        }
    }

    /// Lane indices played with a scratch or wheel.
    #[must_use]
    pub const fn scratch_lanes(self) -> &'static [usize] {
        match self {
            Self::Beat5K => &[5],
            Self::Beat7K => &[7],
            Self::Beat10K => &[5, 11],
            Self::Beat14K => &[7, 15],
            Self::Popn5K | Self::Popn9K => &[],
            Self::Keyboard24K => &[24, 25],
            Self::Keyboard24KDouble => &[24, 25, 50, 51],
        }
    }

    /// Whether `lane` is a scratch lane.
    #[must_use]
    pub fn is_scratch(self, lane: usize) -> bool {
        self.scratch_lanes().contains(&lane)
    }

    /// Name used by the bmson `mode_hint` field.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Beat5K => "beat-5k",
            Self::Beat7K => "beat-7k",
            Self::Beat10K => "beat-10k",
            Self::Beat14K => "beat-14k",
            Self::Popn5K => "popn-5k",
            Self::Popn9K => "popn-9k",
            Self::Keyboard24K => "keyboard-24k",
            Self::Keyboard24KDouble => "keyboard-24k-double",
        }
    }

    /// Looks up a mode by its bmson `mode_hint`.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.hint() == hint)
    }

    /// Whether the mode uses the beatmania lane layout.
    #[must_use]
    pub const fn is_beat(self) -> bool {
        matches!(
            self,
            Self::Beat5K | Self::Beat7K | Self::Beat10K | Self::Beat14K
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn hints_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_hint(mode.hint()), Some(mode));
        }
        assert_eq!(Mode::from_hint("generic-nkeys"), None);
    }

    #[test]
    fn scratch_lanes_are_within_lane_count() {
        for mode in Mode::ALL {
            assert!(
                mode.scratch_lanes()
                    .iter()
                    .all(|&lane| lane < mode.lane_count())
            );
        }
        assert!(Mode::Beat14K.is_scratch(15));
        assert!(!Mode::Popn9K.is_scratch(0));
    }
}
