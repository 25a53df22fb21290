//! Decoder of the measure/channel text encoding (`.bms`, `.bme`, `.bml`, `.pms`).
//!
//! Decoding runs two passes over the source:
//!
//! 1. Collect: every line is classified by [`lex`]. Branch directives drive the
//!    [`random::BranchResolver`], and only lines of taken branches go on. Header commands fill
//!    the metadata and definition tables, and message lines are bucketed per measure.
//! 2. Convert: measures become [`section::Section`]s in measure order. The mode is detected
//!    over all of them first, then each one places its events on the shared timeline cache.
//!
//! Nothing in a source is fatal except a starting tempo that cannot define a time axis. Every
//! other problem is a [`DecodeWarning`](crate::decode_log::DecodeWarning) in the returned log.
//!
//! ```rust
//! use bms_chart::{bms::decode_bms_str, config::DecodeConfig, rng::RngMock};
//!
//! let source = "#TITLE Test Song\n#BPM 120\n#WAV01 kick.wav\n#00111:0101";
//! let output = decode_bms_str(source, &DecodeConfig::default(), RngMock([1]));
//! let chart = output.chart.expect("decodes");
//! assert_eq!(chart.header.title, "Test Song");
//! assert_eq!(chart.total_notes(), 2);
//! ```

pub mod channel;
pub mod header;
pub mod lex;
pub mod long_note;
pub mod numeral;
pub mod random;
pub mod section;

use std::{borrow::Cow, collections::BTreeMap};

use crate::{
    chart::{
        Chart, ChartHeader,
        assemble::{ChartParts, assemble, check_start_bpm},
        builder::TimelineCache,
        mode::Mode,
        note::NoteArena,
    },
    config::{BmsSourceKind, DecodeConfig},
    decode_log::{DecodeError, DecodeInfo, DecodeLog},
    rng::{Rng, RngMock},
};

use self::{
    channel::ModeFlags,
    header::{Definitions, HeaderSink},
    lex::LineToken,
    long_note::{LongNoteTracker, NoteBoard},
    numeral::ObjId,
    random::{BranchRecord, BranchResolver},
    section::{RangedLine, Section, SectionContext},
};

const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

/// Result of decoding a text chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BmsDecodeOutput {
    /// The chart, `None` if the log holds a fatal error.
    pub chart: Option<Chart>,
    /// Everything reported while decoding.
    pub log: DecodeLog,
    /// Regenerator of other branch variants, present when no explicit choices were given.
    pub generator: Option<BmsGenerator>,
}

/// Re-decodes a source with explicit `#RANDOM` choices.
///
/// ```rust
/// use bms_chart::{bms::decode_bms_str, config::DecodeConfig, rng::RngMock};
///
/// let source = "#BPM 120\n#WAV01 a.wav\n#RANDOM 2\n#IF 1\n#00111:01\n#ENDIF\n#IF 2\n#00112:01\n#ENDIF\n#ENDRANDOM";
/// let output = decode_bms_str(source, &DecodeConfig::default(), RngMock([1]));
/// let generator = output.generator.expect("no explicit choices were given");
/// assert_eq!(generator.random_ranges(), &[2]);
///
/// let second = generator.generate(&[2]).chart.expect("decodes");
/// assert_eq!(second.random, vec![2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmsGenerator {
    bytes: Vec<u8>,
    config: DecodeConfig,
    random_ranges: Vec<u64>,
}

impl BmsGenerator {
    /// Declared bound of each `#RANDOM` met in the first decode, in order.
    #[must_use]
    pub fn random_ranges(&self) -> &[u64] {
        &self.random_ranges
    }

    /// Decodes the source again choosing `random` for the `#RANDOM`s in order.
    ///
    /// A `#RANDOM` beyond the given choices takes its first branch.
    #[must_use]
    pub fn generate(&self, random: &[u64]) -> BmsDecodeOutput {
        let config = self.config.clone().with_random(random.to_vec());
        decode_bms(&self.bytes, &config, RngMock([1]))
    }
}

/// Decodes raw chart bytes.
///
/// The bytes are read as UTF-8 (a BOM is skipped) and fall back to Shift_JIS, the encoding of
/// most charts in the wild. Branch values missing from [`DecodeConfig::random`] are drawn from
/// `rng`.
pub fn decode_bms(bytes: &[u8], config: &DecodeConfig, rng: impl Rng) -> BmsDecodeOutput {
    let mut log = DecodeLog::new();
    if bytes.is_empty() {
        log.push(DecodeError::Unreadable {
            reason: "empty source".to_string(),
        });
        return BmsDecodeOutput {
            chart: None,
            log,
            generator: None,
        };
    }
    let source = decode_text(bytes, &mut log);
    decode_source(&source, bytes, config, rng, log)
}

/// Decodes an already decoded chart text.
pub fn decode_bms_str(source: &str, config: &DecodeConfig, rng: impl Rng) -> BmsDecodeOutput {
    decode_source(source, source.as_bytes(), config, rng, DecodeLog::new())
}

fn decode_text<'a>(bytes: &'a [u8], log: &mut DecodeLog) -> Cow<'a, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Some(text) = encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes)
    {
        return text;
    }
    log.push(DecodeInfo::ShiftJisFallback);
    let (text, had_errors) = encoding_rs::SHIFT_JIS.decode_without_bom_handling(bytes);
    if had_errors {
        ::log::debug!("replaced undecodable Shift_JIS sequences");
    }
    text
}

fn decode_source(
    source: &str,
    bytes: &[u8],
    config: &DecodeConfig,
    rng: impl Rng,
    log: DecodeLog,
) -> BmsDecodeOutput {
    ::log::debug!("decoding {} bytes of channel text", source.len());
    let replay = config.random.as_deref().unwrap_or_default();
    let mut decoder = BmsDecoder::new(replay, rng, log);
    decoder.collect(source);
    let (chart, log, record) = decoder.convert(config, source.len());
    let generator = config.random.is_none().then(|| BmsGenerator {
        bytes: bytes.to_vec(),
        config: config.clone(),
        random_ranges: record.ranges,
    });
    BmsDecodeOutput {
        chart,
        log,
        generator,
    }
}

/// One decode call. Built fresh per call, so no state leaks between decodes.
#[derive(Debug)]
struct BmsDecoder<'a, R> {
    header: ChartHeader,
    definitions: Definitions,
    measures: BTreeMap<usize, Vec<RangedLine<'a>>>,
    resolver: BranchResolver<'a, R>,
    log: DecodeLog,
}

impl<'a, R: Rng> BmsDecoder<'a, R> {
    fn new(replay: &'a [u64], rng: R, log: DecodeLog) -> Self {
        Self {
            header: ChartHeader::default(),
            definitions: Definitions::default(),
            measures: BTreeMap::new(),
            resolver: BranchResolver::new(replay, rng),
            log,
        }
    }

    fn collect(&mut self, source: &'a str) {
        for line in lex::lines(source) {
            let Some(token) = line.token() else {
                continue;
            };
            let token = match token {
                Ok(LineToken::Control(word)) => {
                    self.resolver.apply(word, &mut self.log, line.range);
                    continue;
                }
                _ if !self.resolver.is_active() => continue,
                Ok(token) => token,
                Err(warning) => {
                    self.log.push_at(warning, line.range);
                    continue;
                }
            };
            match token {
                LineToken::Message(message) => self
                    .measures
                    .entry(message.measure)
                    .or_default()
                    .push((message, line.range)),
                LineToken::Header(command) => HeaderSink {
                    header: &mut self.header,
                    definitions: &mut self.definitions,
                    log: &mut self.log,
                }
                .apply(command, line.range),
                LineToken::Control(_) => {}
            }
        }
        ::log::debug!(
            "collected {} measures, {} sounds, {} pictures",
            self.measures.len(),
            self.definitions.wav_list.len(),
            self.definitions.bga_list.len()
        );
    }

    fn convert(
        self,
        config: &DecodeConfig,
        source_len: usize,
    ) -> (Option<Chart>, DecodeLog, BranchRecord) {
        let Self {
            header,
            definitions,
            mut measures,
            resolver,
            mut log,
        } = self;
        let record = resolver.into_record();
        if let Err(error) = check_start_bpm(header.bpm) {
            log.push(error);
            return (None, log, record);
        }

        let last_measure = measures.keys().next_back().copied().unwrap_or(0);
        let mut sections = Vec::with_capacity(last_measure + 1);
        let mut start = 0.0;
        for measure in 0..=last_measure {
            let lines = measures.remove(&measure).unwrap_or_default();
            let section = Section::new(start, lines, &mut log);
            start = section.end();
            sections.push(section);
        }

        let mut flags = ModeFlags::default();
        for section in &sections {
            section.touch_modes(&mut flags);
        }
        let initial = match config.source_kind {
            BmsSourceKind::Bms => Mode::Beat5K,
            BmsSourceKind::Pms => Mode::Popn9K,
        };
        let mode = flags.resolve(initial);
        ::log::debug!("detected {mode:?} from {flags:?}");

        let mut cache = TimelineCache::new(header.bpm, mode.lane_count());
        let mut notes = NoteArena::default();
        let mut ctx = SectionContext {
            board: NoteBoard {
                cache: &mut cache,
                notes: &mut notes,
                log: &mut log,
                range: 0..0,
            },
            definitions: &definitions,
            long_notes: LongNoteTracker::new(mode.lane_count(), header.ln_mode),
            mode,
            ln_obj: header.ln_obj.map(ObjId::as_base36),
        };
        for section in &sections {
            section.build(&mut ctx);
        }
        let SectionContext {
            mut board,
            mut long_notes,
            ..
        } = ctx;
        // dangling long notes are reported at the end of the source
        board.range = source_len..source_len;
        long_notes.finish(&mut board);

        let parts = ChartParts {
            header,
            mode,
            cache,
            notes,
            wav_list: definitions.wav_list,
            bga_list: definitions.bga_list,
            random: record.chosen.clone(),
        };
        let chart = assemble(parts, config.ln_type, config.hashes.clone(), &mut log);
        (Some(chart), log, record)
    }
}
