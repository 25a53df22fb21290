//! The [bmson format](https://bmson-spec.readthedocs.io/en/master/doc/index.html) definition.
//!
//! # Order of Processing
//!
//! When there are coincident events in the same pulse, they are processed in the order below:
//!
//! - [`ScrollEvent`],
//! - [`BpmEvent`],
//! - [`StopEvent`],
//! - [`Note`] and [`BgaEvent`] (are independent each other).
//!
//! If a [`BpmEvent`] and a [`StopEvent`] appear on the same pulse, the current BPM will be changed at first, then scrolling the chart will be stopped for a while depending the changed BPM.
//!
//! # Layered Notes
//!
//! In case that notes (not BGM) from different sound channels exist on the same (key and pulse) position, the later ones are layered on the first: when a player hits the key, all the sounds will be played.
//!
//! # Differences from BMS
//!
//! - A long note plays the sound of an `up` note on its end, if there is one.
//! - Transparent color on BGA is not supported. But you can use PNG files having RGBA channels.
//!
//! Every field is optional when deserializing, and takes the default the format defines.

pub mod decode;
pub mod pulse;

use self::pulse::PulseNumber;

/// Top-level object for bmson format.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Bmson {
    /// Version of bmson format, which should be compared using [Semantic Version 2.0.0](http://semver.org/spec/v2.0.0.html).
    pub version: String,
    /// Score metadata.
    pub info: BmsonInfo,
    /// Location of bar lines in pulses. If `None`, then a 4/4 beat is assumed and bar lines will be generated every 4 quarter notes. If `Some(vec![])`, this chart will not have any bar line.
    pub lines: Option<Vec<BarLine>>,
    /// Events of bpm change. If there are coincident events, the successor is only applied.
    pub bpm_events: Vec<BpmEvent>,
    /// Events of scroll stop.
    pub stop_events: Vec<StopEvent>,
    /// Events of scroll speed change.
    pub scroll_events: Vec<ScrollEvent>,
    /// Note data.
    pub sound_channels: Vec<SoundChannel>,
    /// BGA data.
    pub bga: Bga,
}

/// Header metadata of chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BmsonInfo {
    /// Self explanatory title.
    pub title: String,
    /// Self explanatory subtitle. Usually this is shown as a smaller text than `title`.
    pub subtitle: String,
    /// Author of the chart. It may multiple names such as `Alice vs Bob`, `Alice feat. Bob` and so on.
    pub artist: String,
    /// Other authors of the chart, in form of `key:value`.
    pub subartists: Vec<String>,
    /// Self explanatory genre.
    pub genre: String,
    /// Hint for layout lanes, e.g. "beat-7k", "popn-5k", "generic-nkeys". Defaults to `"beat-7k"`.
    pub mode_hint: String,
    /// Special chart name, e.g. "BEGINNER", "NORMAL", "HYPER", "FOUR DIMENSIONS".
    pub chart_name: String,
    /// Self explanatory level number.
    pub level: i64,
    /// Initial BPM.
    pub init_bpm: f64,
    /// Relative judge width in percentage. Larger is easier.
    pub judge_rank: f64,
    /// Relative life bar gain in percentage. Larger is easier.
    pub total: f64,
    /// Background image file name.
    pub back_image: String,
    /// Eyecatch image file name. This should be displayed during the chart is loading.
    pub eyecatch_image: String,
    /// Title image file name.
    pub title_image: String,
    /// Banner image file name. The aspect ratio of image is usually 15:4.
    pub banner_image: String,
    /// Preview music file name.
    pub preview_music: String,
    /// Numbers of pulse per quarter note in 4/4 measure. Non-positive values fall back to 240.
    pub resolution: i64,
    /// Long-note classification of the whole chart, `1..=3`. Other values leave it undefined.
    pub ln_type: i64,
}

impl Default for BmsonInfo {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            artist: String::new(),
            subartists: Vec::new(),
            genre: String::new(),
            mode_hint: "beat-7k".into(),
            chart_name: String::new(),
            level: 0,
            init_bpm: 0.0,
            judge_rank: 100.0,
            total: 100.0,
            back_image: String::new(),
            eyecatch_image: String::new(),
            title_image: String::new(),
            banner_image: String::new(),
            preview_music: String::new(),
            resolution: 240,
            ln_type: 0,
        }
    }
}

/// Event of bar line of the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BarLine {
    /// Pulse number to place the line.
    pub y: PulseNumber,
}

/// Note sound file and positions to be placed in the chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SoundChannel {
    /// Sound file path.
    pub name: String,
    /// Data of note to be placed.
    pub notes: Vec<Note>,
}

/// Sound note to ring a sound file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Note {
    /// Lane, counted from 1. `0` or a lane outside the mode is a background (BGM) note.
    pub x: u32,
    /// Position to be placed.
    pub y: PulseNumber,
    /// Length of pulses of the note. It will be a normal note if zero, otherwise a long note.
    pub l: u64,
    /// Continuation flag. It will continue to ring rest of the file when play if `true`, otherwise it will play from start.
    pub c: bool,
    /// Long-note classification of this note, `1..=3`.
    pub t: i64,
    /// Whether this note only gives the sound of the long-note end at its position.
    pub up: bool,
}

/// BPM change note.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BpmEvent {
    /// Position to change BPM of the chart.
    pub y: PulseNumber,
    /// New BPM to be.
    pub bpm: f64,
}

/// Scroll stop note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StopEvent {
    /// Start position to scroll stop.
    pub y: PulseNumber,
    /// Stopping duration in pulses.
    pub duration: u64,
}

/// Scroll speed change note.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrollEvent {
    /// Position to change the speed.
    pub y: PulseNumber,
    /// Multiplier of the scroll speed.
    pub rate: f64,
}

/// BGA data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Bga {
    /// Pictures data for playing BGA.
    pub bga_header: Vec<BgaHeader>,
    /// Base picture sequence.
    pub bga_events: Vec<BgaEvent>,
    /// Layered picture sequence.
    pub layer_events: Vec<BgaEvent>,
    /// Picture sequence displayed when missed.
    pub poor_events: Vec<BgaEvent>,
}

/// Picture file information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BgaHeader {
    /// Self explanatory ID of picture.
    pub id: BgaId,
    /// Picture file name.
    pub name: String,
}

/// BGA note to display the picture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BgaEvent {
    /// Position to display the picture in pulses.
    pub y: PulseNumber,
    /// ID of picture to display.
    pub id: BgaId,
}

/// Picture id for [`Bga`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BgaId(pub u32);

/// Failure of reading bmson JSON.
#[cfg(feature = "bmson")]
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum BmsonParseError {
    /// The text is not JSON, or does not fit the schema at the reported path.
    #[error("bmson deserialize error at {}: {}", .error.path(), .error.inner())]
    Deserialize {
        /// Error with the JSON path where it happened.
        #[source]
        error: serde_path_to_error::Error<serde_json::Error>,
    },
}

#[cfg(feature = "bmson")]
impl Bmson {
    /// Reads a bmson object from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BmsonParseError::Deserialize`] with the path of the mismatch if `json` is not a
    /// bmson object.
    ///
    /// ```rust
    /// use bms_chart::bmson::Bmson;
    ///
    /// let bmson = Bmson::from_json(br#"{"info": {"title": "x", "init_bpm": 150}}"#).unwrap();
    /// assert_eq!(bmson.info.title, "x");
    /// assert_eq!(bmson.info.resolution, 240);
    ///
    /// let error = Bmson::from_json(br#"{"info": {"init_bpm": "fast"}}"#).unwrap_err();
    /// assert!(error.to_string().contains("info.init_bpm"));
    /// ```
    pub fn from_json(json: &[u8]) -> Result<Self, BmsonParseError> {
        let deserializer = &mut serde_json::Deserializer::from_slice(json);
        serde_path_to_error::deserialize(deserializer)
            .map_err(|error| BmsonParseError::Deserialize { error })
    }
}

#[cfg(all(test, feature = "bmson"))]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let bmson = Bmson::from_json(
            br#"{
                "version": "1.0.0",
                "info": { "title": "t", "init_bpm": 120, "mode_hint": "beat-5k" },
                "sound_channels": [{ "name": "a.wav", "notes": [{ "x": 1, "y": 240 }] }]
            }"#,
        )
        .unwrap();
        assert_eq!(bmson.info.judge_rank, 100.0);
        assert_eq!(bmson.info.total, 100.0);
        assert_eq!(bmson.lines, None);
        assert_eq!(
            bmson.sound_channels[0].notes[0],
            Note {
                x: 1,
                y: PulseNumber(240),
                ..Note::default()
            }
        );
    }

    #[test]
    fn schema_mismatch_reports_path() {
        let error = Bmson::from_json(br#"{"sound_channels": [{"notes": [{"y": -1}]}]}"#)
            .unwrap_err();
        let BmsonParseError::Deserialize { error } = error;
        assert_eq!(error.path().to_string(), "sound_channels[0].notes[0].y");
    }
}
