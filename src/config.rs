//! Decode options supplied by the caller.

/// How long notes whose chart leaves the classification undefined are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LnType {
    /// Judged at the start only.
    #[default]
    LongNote,
    /// Judged at the start and the end.
    ChargeNote,
    /// Judged at the start, the end and while held.
    HellChargeNote,
}

/// Family of the text encoding, usually derived from the file extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BmsSourceKind {
    /// `.bms`, `.bme` and `.bml`: beatmania layouts.
    #[default]
    Bms,
    /// `.pms`: pop'n music 9 buttons.
    Pms,
}

impl BmsSourceKind {
    /// Maps a file extension (without dot, any case) to its family.
    ///
    /// ```rust
    /// use bms_chart::config::BmsSourceKind;
    ///
    /// assert_eq!(BmsSourceKind::from_extension("PMS"), Some(BmsSourceKind::Pms));
    /// assert_eq!(BmsSourceKind::from_extension("bme"), Some(BmsSourceKind::Bms));
    /// assert_eq!(BmsSourceKind::from_extension("bmson"), None);
    /// ```
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "bms" | "bme" | "bml" => Some(Self::Bms),
            "pms" => Some(Self::Pms),
            _ => None,
        }
    }
}

/// Hex digests of the raw chart bytes, computed by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentHashes {
    /// MD5 in lowercase hex.
    pub md5: String,
    /// SHA-256 in lowercase hex.
    pub sha256: String,
}

/// Options of one decode call.
///
/// ```rust
/// use bms_chart::config::{DecodeConfig, LnType};
///
/// let config = DecodeConfig::default()
///     .with_ln_type(LnType::ChargeNote)
///     .with_random(vec![2, 1]);
/// assert_eq!(config.random.as_deref(), Some(&[2, 1][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeConfig {
    /// Interpretation of long notes left undefined by the chart.
    pub ln_type: LnType,
    /// Explicit `#RANDOM` choices, consumed in declaration order. Missing ones are sampled.
    pub random: Option<Vec<u64>>,
    /// Digests attached to the chart verbatim.
    pub hashes: ContentHashes,
    /// Text-encoding family.
    pub source_kind: BmsSourceKind,
}

impl DecodeConfig {
    /// Sets [`Self::ln_type`].
    #[must_use]
    pub fn with_ln_type(mut self, ln_type: LnType) -> Self {
        self.ln_type = ln_type;
        self
    }

    /// Sets [`Self::random`].
    #[must_use]
    pub fn with_random(mut self, random: Vec<u64>) -> Self {
        self.random = Some(random);
        self
    }

    /// Sets [`Self::hashes`].
    #[must_use]
    pub fn with_hashes(mut self, md5: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.hashes = ContentHashes {
            md5: md5.into(),
            sha256: sha256.into(),
        };
        self
    }

    /// Sets [`Self::source_kind`].
    #[must_use]
    pub fn with_source_kind(mut self, source_kind: BmsSourceKind) -> Self {
        self.source_kind = source_kind;
        self
    }
}
