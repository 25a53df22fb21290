//! Pulse definition for bmson format. It represents only beat on the score, so you need to know previous BPMs for finding happening seconds of a note.

use crate::chart::timeline::MeasurePosition;

/// Note position for the chart [`super::Bmson`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PulseNumber(pub u64);

impl PulseNumber {
    /// Calculates an absolute difference of two pulses.
    #[must_use]
    pub const fn abs_diff(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// The position `pulses` later.
    #[must_use]
    pub const fn offset(self, pulses: u64) -> Self {
        Self(self.0.saturating_add(pulses))
    }
}

/// Converter from pulses into measure positions, which split one quarter note evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseScale {
    pulses_per_measure: u64,
}

impl PulseScale {
    /// Pulses of a measure when the chart does not declare a usable resolution.
    pub const DEFAULT_PULSES_PER_MEASURE: u64 = 960;

    /// A scale for `resolution` pulses per quarter note.
    #[must_use]
    pub fn new(resolution: i64) -> Self {
        let pulses_per_measure = u64::try_from(resolution)
            .ok()
            .filter(|&resolution| resolution > 0)
            .map_or(Self::DEFAULT_PULSES_PER_MEASURE, |resolution| {
                resolution.saturating_mul(4)
            });
        Self { pulses_per_measure }
    }

    /// Pulses of a 4/4 measure.
    #[must_use]
    pub const fn pulses_per_measure(self) -> u64 {
        self.pulses_per_measure
    }

    /// Measure position of `pulse`.
    #[must_use]
    pub fn position(self, pulse: PulseNumber) -> MeasurePosition {
        MeasurePosition::new(pulse.0 as f64 / self.pulses_per_measure as f64)
            .unwrap_or(MeasurePosition::ZERO)
    }
}
