//! Fancy diagnostics support using `ariadne`.
//!
//! Each [`LogEntry`] of a [`DecodeLog`] carries the byte range of the source line it came from,
//! so it can be rendered as an `ariadne::Report` pointing into the text. Ariadne handles the
//! row/column calculation from the byte offsets. Entries without a range (such as those of a
//! bmson decode) point at the start of the source.
//!
//! # Usage Example
//!
//! ```rust
//! use bms_chart::{
//!     bms::decode_bms_str, config::DecodeConfig, diagnostics::emit_decode_log, rng::RngMock,
//! };
//!
//! let source = "#BPM 120\n#WAV01 a.wav\n#00111:0102\n";
//! let output = decode_bms_str(source, &DecodeConfig::default(), RngMock([1]));
//!
//! // Prints the undefined `#WAV02` reference.
//! emit_decode_log("test.bms", source, &output.log);
//! ```

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::decode_log::{DecodeLog, LogEntry, LogKind};

/// Simple source container that holds the filename and source text.
///
/// ```rust
/// use bms_chart::diagnostics::SimpleSource;
///
/// let source_text = "#TITLE test\n#ARTIST composer\n";
/// let source = SimpleSource::new("test.bms", source_text);
/// assert_eq!(source.text(), source_text);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SimpleSource<'a> {
    name: &'a str,
    text: &'a str,
}

impl<'a> SimpleSource<'a> {
    /// Create a new source container instance.
    #[must_use]
    pub const fn new(name: &'a str, text: &'a str) -> Self {
        Self { name, text }
    }

    /// Get source text content.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Get source file name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }
}

/// Trait for converting positioned diagnostics to `ariadne::Report`.
pub trait ToAriadne {
    /// Convert into an ariadne Report over `src`.
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)>;
}

/// Helper to build a styled ariadne `Report` consistently.
#[must_use]
pub fn build_report<'a>(
    src: &SimpleSource<'a>,
    kind: ReportKind<'a>,
    range: Range<usize>,
    title: &str,
    label_message: impl ToString,
    color: Color,
) -> Report<'a, (String, Range<usize>)> {
    let filename = src.name().to_string();
    Report::build(kind, (filename.clone(), range.clone()))
        .with_message(title)
        .with_label(
            Label::new((filename, range))
                .with_message(label_message.to_string())
                .with_color(color),
        )
        .finish()
}

impl ToAriadne for LogEntry {
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)> {
        let (kind, title, color) = match self.kind() {
            LogKind::Info => (ReportKind::Advice, "decode info", Color::Blue),
            LogKind::Warning => (ReportKind::Warning, "decode warning", Color::Yellow),
            LogKind::Error => (ReportKind::Error, "decode error", Color::Red),
        };
        // Clamp so a stale range never points past the text.
        let end = src.text().len();
        let range = self
            .range
            .clone()
            .map_or(0..0, |range| range.start.min(end)..range.end.min(end));
        build_report(src, kind, range, title, &self.message, color)
    }
}

/// Renders every entry of `log` to stderr.
pub fn emit_decode_log(name: &str, source: &str, log: &DecodeLog) {
    let simple = SimpleSource::new(name, source);
    let ariadne_source = Source::from(source);
    for entry in log {
        let report = entry.to_report(&simple);
        let _ = report.eprint((name.to_string(), ariadne_source.clone()));
    }
}

/// Collect `ariadne::Report` instances for the entries of `log` without printing.
#[must_use]
pub fn collect_reports<'a>(
    name: &'a str,
    source: &'a str,
    log: &DecodeLog,
) -> Vec<Report<'a, (String, Range<usize>)>> {
    let simple = SimpleSource::new(name, source);
    log.iter().map(|entry| entry.to_report(&simple)).collect()
}
