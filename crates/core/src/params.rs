//! Generation parameters and their `metadata` wire encoding.
//!
//! [`GenerationParameters`] is the typed, always-valid form state. It is
//! serialised for upload as [`UploadMetadata`]
//! (`{ bpm, tags, language, singer }`), and a decoded [`UploadMetadata`]
//! converts back through [`TryFrom`], which re-checks every bound.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Tempo
// ---------------------------------------------------------------------------

/// Lowest selectable tempo in beats per minute.
pub const MIN_TEMPO: i64 = 60;
/// Highest selectable tempo in beats per minute.
pub const MAX_TEMPO: i64 = 200;
/// Tempo the form starts with.
pub const DEFAULT_TEMPO: i64 = 120;

/// Song tempo in BPM, always within `[MIN_TEMPO, MAX_TEMPO]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tempo(u16);

impl Tempo {
    /// Build a tempo the way the slider does: out-of-range input is clamped.
    pub fn new(bpm: i64) -> Self {
        Self(bpm.clamp(MIN_TEMPO, MAX_TEMPO) as u16)
    }

    /// Build a tempo, rejecting out-of-range input.
    pub fn try_new(bpm: i64) -> Result<Self, CoreError> {
        if (MIN_TEMPO..=MAX_TEMPO).contains(&bpm) {
            Ok(Self(bpm as u16))
        } else {
            Err(CoreError::Validation(format!(
                "Tempo must be between {MIN_TEMPO} and {MAX_TEMPO} BPM, got {bpm}"
            )))
        }
    }

    pub fn bpm(self) -> u16 {
        self.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO)
    }
}

// ---------------------------------------------------------------------------
// Genre tags
// ---------------------------------------------------------------------------

/// Ordered set of genre tags. Entries are unique (case-sensitive) and
/// never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GenreTags(Vec<String>);

impl GenreTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from an already-deduplicated list.
    ///
    /// Fails on blank or duplicate entries instead of silently dropping
    /// them, so decoded metadata maps back to exactly what was sent.
    pub fn from_unique(tags: Vec<String>) -> Result<Self, CoreError> {
        let mut set = Self::new();
        for tag in tags {
            if tag.trim().is_empty() {
                return Err(CoreError::Validation("Genre tags must not be blank".into()));
            }
            if set.contains(&tag) {
                return Err(CoreError::Validation(format!("Duplicate genre tag '{tag}'")));
            }
            set.0.push(tag);
        }
        Ok(set)
    }

    /// Add a tag after trimming surrounding whitespace.
    ///
    /// Blank and already-present tags are ignored. Returns whether the set
    /// changed.
    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    /// Remove an exact match. Returns whether the set changed.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Lyrics language offered by the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    It,
    Ja,
    Ko,
    Zh,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Self::En,
        Self::Es,
        Self::Fr,
        Self::De,
        Self::It,
        Self::Ja,
        Self::Ko,
        Self::Zh,
    ];

    /// ISO 639-1 code sent on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::It => "it",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Zh => "zh",
        }
    }

    /// English display name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
            Self::Fr => "French",
            Self::De => "German",
            Self::It => "Italian",
            Self::Ja => "Japanese",
            Self::Ko => "Korean",
            Self::Zh => "Chinese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let codes: Vec<_> = Self::ALL.iter().map(|l| l.code()).collect();
                CoreError::Validation(format!(
                    "Unknown language '{s}'. Valid codes: {}",
                    codes.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Voice type
// ---------------------------------------------------------------------------

/// Singer voice requested for the song.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceType {
    #[default]
    Random,
    Male,
    Female,
}

impl VoiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for VoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(CoreError::Validation(format!(
                "Unknown singer '{s}'. Valid values: random, male, female"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationParameters
// ---------------------------------------------------------------------------

/// Everything the user can tune before submitting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationParameters {
    pub tempo: Tempo,
    pub tags: GenreTags,
    pub language: Language,
    pub voice: VoiceType,
}

/// JSON body of the `metadata` multipart field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UploadMetadata {
    #[validate(range(min = 60, max = 200))]
    pub bpm: i64,
    pub tags: Vec<String>,
    pub language: Language,
    pub singer: VoiceType,
}

impl From<&GenerationParameters> for UploadMetadata {
    fn from(params: &GenerationParameters) -> Self {
        Self {
            bpm: i64::from(params.tempo.bpm()),
            tags: params.tags.as_slice().to_vec(),
            language: params.language,
            singer: params.voice,
        }
    }
}

impl TryFrom<UploadMetadata> for GenerationParameters {
    type Error = CoreError;

    fn try_from(meta: UploadMetadata) -> Result<Self, Self::Error> {
        meta.validate()
            .map_err(|e| CoreError::Validation(format!("Invalid metadata: {e}")))?;

        Ok(Self {
            tempo: Tempo::try_new(meta.bpm)?,
            tags: GenreTags::from_unique(meta.tags)?,
            language: meta.language,
            voice: meta.singer,
        })
    }
}

impl UploadMetadata {
    /// Encode as the JSON string placed in the `metadata` part.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(self)
            .map_err(|e| CoreError::Internal(format!("Failed to encode metadata: {e}")))
    }

    /// Decode a `metadata` part.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("Malformed metadata: {e}")))
    }
}
