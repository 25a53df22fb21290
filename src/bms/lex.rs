//! Line tokenizer of the channel encoding.
//!
//! Raw text == [`lines`] ==> [`SourceLine`]s == [`SourceLine::token`] ==> [`LineToken`]s, each
//! keeping the byte range of its line for diagnostics.

use std::ops::Range;

use crate::decode_log::DecodeWarning;

use super::numeral::parse_base36;

/// A line of the source with its byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// Text without the line terminator and surrounding whitespace.
    pub text: &'a str,
    /// Byte range of `text` in the source.
    pub range: Range<usize>,
}

/// Splits `source` into lines, trimming the surrounding whitespace (and `\r`) of each.
pub fn lines(source: &str) -> impl Iterator<Item = SourceLine<'_>> {
    source.split('\n').scan(0, |offset, raw| {
        let line_start = *offset;
        *offset += raw.len() + 1;
        let trimmed = raw.trim_start();
        let start = line_start + (raw.len() - trimmed.len());
        let text = trimmed.trim_end();
        Some(SourceLine {
            text,
            range: start..start + text.len(),
        })
    })
}

/// A branch directive. Directives are interpreted even inside skipped branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlWord<'a> {
    /// `#RANDOM n` with its raw argument.
    Random(&'a str),
    /// `#IF v` with its raw argument.
    If(&'a str),
    /// `#ENDIF`.
    EndIf,
    /// `#ENDRANDOM`.
    EndRandom,
}

/// A `#MMMCC:data` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLine<'a> {
    /// Measure number, `0..=999`.
    pub measure: usize,
    /// Channel value in base 36.
    pub channel: u16,
    /// Everything after the colon.
    pub data: &'a str,
}

/// One digit pair of channel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pair {
    /// A well-formed pair and its value. `0` means no event.
    Value(u16),
    /// A pair with a non-alphanumeric character, as written.
    Malformed(String),
}

impl MessageLine<'_> {
    /// Digit pairs of the data in order. Pair `i` of `n` sits at fraction `i / n` of the measure.
    #[must_use]
    pub fn pairs(&self) -> Vec<Pair> {
        let chars: Vec<char> = self.data.trim_end().chars().collect();
        chars
            .chunks_exact(2)
            .map(|pair| {
                let text: String = pair.iter().collect();
                parse_base36(&text).map_or(Pair::Malformed(text), Pair::Value)
            })
            .collect()
    }
}

/// What a non-ignored line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineToken<'a> {
    /// A branch directive.
    Control(ControlWord<'a>),
    /// A channel message.
    Message(MessageLine<'a>),
    /// A header command, without the leading `#`.
    Header(&'a str),
}

/// Whether `line` continues `#` with `word`, comparing letters case-insensitively.
fn matches_word(line: &str, word: &str) -> bool {
    line.get(1..=word.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(word))
}

fn control_word(line: &str) -> Option<ControlWord<'_>> {
    let argument = |word: &str| line.get(word.len() + 1..).unwrap_or("").trim();
    if matches_word(line, "RANDOM") {
        Some(ControlWord::Random(argument("RANDOM")))
    } else if matches_word(line, "IF") {
        Some(ControlWord::If(argument("IF")))
    } else if matches_word(line, "ENDIF") {
        Some(ControlWord::EndIf)
    } else if matches_word(line, "ENDRANDOM") {
        Some(ControlWord::EndRandom)
    } else {
        None
    }
}

fn message(line: &str) -> Result<MessageLine<'_>, DecodeWarning> {
    let measure_text = line.get(1..4).unwrap_or("");
    if measure_text.len() != 3 || !measure_text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeWarning::InvalidMeasure {
            measure: line.chars().skip(1).take(3).collect(),
        });
    }
    let measure = measure_text
        .parse()
        .map_err(|_| DecodeWarning::InvalidMeasure {
            measure: measure_text.to_string(),
        })?;
    let invalid_channel = || DecodeWarning::InvalidChannel {
        channel: line.chars().skip(4).take(2).collect(),
    };
    let channel = line
        .get(4..6)
        .ok_or_else(invalid_channel)
        .and_then(|text| parse_base36(text).map_err(|_| invalid_channel()))?;
    let data = line.split_once(':').map_or("", |(_, data)| data);
    Ok(MessageLine {
        measure,
        channel,
        data,
    })
}

impl<'a> SourceLine<'a> {
    /// Classifies the line. `None` for a line that is not a command at all.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeWarning`] for a message line whose measure or channel is malformed.
    /// The line should be skipped.
    pub fn token(&self) -> Option<Result<LineToken<'a>, DecodeWarning>> {
        let line = self.text;
        if line.len() < 2 || !line.starts_with('#') {
            return None;
        }
        if let Some(word) = control_word(line) {
            return Some(Ok(LineToken::Control(word)));
        }
        let is_message =
            line.as_bytes().get(1).is_some_and(u8::is_ascii_digit) && line.chars().count() > 6;
        if is_message {
            return Some(message(line).map(LineToken::Message));
        }
        Some(Ok(LineToken::Header(&line[1..])))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn token(text: &str) -> Option<Result<LineToken<'_>, DecodeWarning>> {
        SourceLine {
            text,
            range: 0..text.len(),
        }
        .token()
    }

    #[test]
    fn lines_keep_ranges() {
        let source = "#TITLE a\r\n\n#00111:01";
        let lines: Vec<_> = lines(source).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "#TITLE a");
        assert_eq!(lines[0].range, 0..8);
        assert_eq!(lines[2].text, "#00111:01");
        assert_eq!(&source[lines[2].range.clone()], "#00111:01");

        let indented: Vec<_> = super::lines("  #BPM 120 \n").collect();
        assert_eq!(indented[0].text, "#BPM 120");
        assert_eq!(indented[0].range, 2..10);
    }

    #[test]
    fn control_words_ignore_case() {
        assert_eq!(
            token("#random 2"),
            Some(Ok(LineToken::Control(ControlWord::Random("2"))))
        );
        assert_eq!(
            token("#IF 1"),
            Some(Ok(LineToken::Control(ControlWord::If("1"))))
        );
        assert_eq!(
            token("#EndIf"),
            Some(Ok(LineToken::Control(ControlWord::EndIf)))
        );
        assert_eq!(
            token("#ENDRANDOM"),
            Some(Ok(LineToken::Control(ControlWord::EndRandom)))
        );
    }

    #[test]
    fn message_lines() {
        assert_eq!(
            token("#00211:0102"),
            Some(Ok(LineToken::Message(MessageLine {
                measure: 2,
                channel: 37,
                data: "0102",
            })))
        );
        assert_eq!(
            token("#0A011:01"),
            Some(Err(DecodeWarning::InvalidMeasure {
                measure: "0A0".to_string()
            }))
        );
        assert_eq!(
            token("#001-1:01"),
            Some(Err(DecodeWarning::InvalidChannel {
                channel: "-1".to_string()
            }))
        );
    }

    #[test]
    fn ignored_and_header_lines() {
        assert_eq!(token("#"), None);
        assert_eq!(token("TITLE x"), None);
        assert_eq!(token("#TITLE x"), Some(Ok(LineToken::Header("TITLE x"))));
        // too short to be a message
        assert_eq!(token("#00101"), Some(Ok(LineToken::Header("00101"))));
    }

    #[test]
    fn pairs_report_malformed() {
        let line = MessageLine {
            measure: 0,
            channel: 1,
            data: "01zz-100 ",
        };
        assert_eq!(
            line.pairs(),
            vec![
                Pair::Value(1),
                Pair::Value(1295),
                Pair::Malformed("-1".to_string()),
                Pair::Value(0),
            ]
        );
    }
}
