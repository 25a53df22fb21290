//! Resolution of `#RANDOM` / `#IF` branches.
//!
//! The resolver is a pair of stacks: the chosen value of each open `#RANDOM`, and the skip flag
//! of each open `#IF`. Only lines seen while [`BranchResolver::is_active`] reach the later
//! stages.

use std::ops::Range;

use crate::{
    decode_log::{DecodeInfo, DecodeLog, DecodeWarning},
    rng::Rng,
};

use super::lex::ControlWord;

/// Values met while resolving branches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BranchRecord {
    /// Declared bound of each valid `#RANDOM`, in order.
    pub ranges: Vec<u64>,
    /// Chosen value of each valid `#RANDOM`, in order.
    pub chosen: Vec<u64>,
    /// Values drawn from the generator, a suffix of `chosen`.
    pub sampled: Vec<u64>,
}

/// Stack machine over branch directives.
#[derive(Debug)]
pub struct BranchResolver<'a, R> {
    values: Vec<u64>,
    skips: Vec<bool>,
    replay: &'a [u64],
    rng: R,
    record: BranchRecord,
}

impl<'a, R: Rng> BranchResolver<'a, R> {
    /// A resolver replaying `replay` first, then sampling from `rng`.
    pub const fn new(replay: &'a [u64], rng: R) -> Self {
        Self {
            values: Vec::new(),
            skips: Vec::new(),
            replay,
            rng,
            record: BranchRecord {
                ranges: Vec::new(),
                chosen: Vec::new(),
                sampled: Vec::new(),
            },
        }
    }

    /// Whether lines are currently forwarded.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.skips.last().is_none_or(|skip| !skip)
    }

    /// Applies a directive found on the line at `range`.
    pub fn apply(&mut self, word: ControlWord<'_>, log: &mut DecodeLog, range: Range<usize>) {
        match word {
            ControlWord::Random(argument) => self.random(argument, log, range),
            ControlWord::If(argument) => {
                let Some(&top) = self.values.last() else {
                    log.push_at(DecodeWarning::IfWithoutRandom, range);
                    return;
                };
                match argument.parse::<u64>() {
                    Ok(value) => self.skips.push(top != value),
                    Err(_) => {
                        log.push_at(
                            DecodeWarning::InvalidIf {
                                argument: argument.to_string(),
                            },
                            range,
                        );
                        // an unreadable branch is never taken, and its ENDIF stays balanced
                        self.skips.push(true);
                    }
                }
            }
            ControlWord::EndIf => {
                if self.skips.pop().is_none() {
                    log.push_at(DecodeWarning::UnbalancedEndIf, range);
                }
            }
            ControlWord::EndRandom => {
                if self.values.pop().is_none() {
                    log.push_at(DecodeWarning::UnbalancedEndRandom, range);
                }
            }
        }
    }

    fn random(&mut self, argument: &str, log: &mut DecodeLog, range: Range<usize>) {
        let max = match argument.parse::<u64>() {
            Ok(max) if max > 0 => max,
            _ => {
                log.push_at(
                    DecodeWarning::InvalidRandom {
                        argument: argument.to_string(),
                    },
                    range,
                );
                return;
            }
        };
        let index = self.record.chosen.len();
        let value = if let Some(&value) = self.replay.get(index) {
            value
        } else {
            let value = self.rng.generate(1..=max).clamp(1, max);
            self.record.sampled.push(value);
            log.push_at(DecodeInfo::BranchSampled { max, value }, range);
            value
        };
        self.record.ranges.push(max);
        self.record.chosen.push(value);
        self.values.push(value);
    }

    /// Values met so far.
    #[must_use]
    pub const fn record(&self) -> &BranchRecord {
        &self.record
    }

    /// Consumes the resolver into the values it met.
    #[must_use]
    pub fn into_record(self) -> BranchRecord {
        self.record
    }
}
