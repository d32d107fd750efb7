//! Generation parameter mapping
//!
//! Pure, deterministic translation of (mood, requested genre, lyric
//! duration) into the [`GenerationParameters`] driving both generators.
//! All musical decisions live in fixed tables here; nothing in this
//! module performs I/O or randomness.

use crate::mood::{Mood, MoodProfile};
use serde::{Deserialize, Serialize};
use songforge_common::config::GenerationConfig;
use songforge_common::{Error, Result};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Closed genre catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Pop,
    Ballad,
    Rock,
    Ambient,
    Electronic,
    #[serde(rename = "r&b")]
    Rnb,
    Jazz,
    Classical,
}

impl Genre {
    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Pop => "pop",
            Genre::Ballad => "ballad",
            Genre::Rock => "rock",
            Genre::Ambient => "ambient",
            Genre::Electronic => "electronic",
            Genre::Rnb => "r&b",
            Genre::Jazz => "jazz",
            Genre::Classical => "classical",
        }
    }

    pub const ALL: [Genre; 8] = [
        Genre::Pop,
        Genre::Ballad,
        Genre::Rock,
        Genre::Ambient,
        Genre::Electronic,
        Genre::Rnb,
        Genre::Jazz,
        Genre::Classical,
    ];
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pop" => Ok(Genre::Pop),
            "ballad" => Ok(Genre::Ballad),
            "rock" => Ok(Genre::Rock),
            "ambient" => Ok(Genre::Ambient),
            "electronic" => Ok(Genre::Electronic),
            "r&b" | "rnb" => Ok(Genre::Rnb),
            "jazz" => Ok(Genre::Jazz),
            "classical" => Ok(Genre::Classical),
            other => Err(Error::Input(format!("Unknown genre: {other}"))),
        }
    }
}

/// Caller's genre selection: a concrete catalog entry or "auto".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreRequest {
    Auto,
    Named(Genre),
}

impl FromStr for GenreRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(GenreRequest::Auto)
        } else {
            Ok(GenreRequest::Named(s.parse()?))
        }
    }
}

/// Song sections used for structure hints to the music provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Intro,
    Verse,
    Chorus,
    Bridge,
    Outro,
}

/// Resolved musical configuration for one run.
///
/// Invariants: genre is concrete (never "auto"), `tempo_bpm` is within
/// 40-220, `duration_seconds > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub genre: Genre,
    pub tempo_bpm: u32,
    /// Musical key, e.g. "C", "F#m"
    pub key: String,
    pub duration_seconds: f64,
    pub instrumentation_tags: BTreeSet<String>,
    pub structure: Vec<SectionKind>,
    pub voice_profile_id: String,
}

/// Tempo bounds for any generated track.
pub const MIN_TEMPO_BPM: u32 = 40;
pub const MAX_TEMPO_BPM: u32 = 220;

/// The single source of truth for "auto" genre inference.
///
/// Total over [`Mood`]: the match is exhaustive, so adding a mood
/// without a genre fails to compile.
pub fn genre_for_mood(mood: Mood) -> Genre {
    match mood {
        Mood::Happy => Genre::Pop,
        Mood::Sad => Genre::Ballad,
        Mood::Angry => Genre::Rock,
        Mood::Energetic => Genre::Rock,
        Mood::Romantic => Genre::Rnb,
        Mood::Calm => Genre::Ambient,
        Mood::Mysterious => Genre::Electronic,
        Mood::Neutral => Genre::Pop,
    }
}

/// Base tempo, key, instrumentation, and structure per genre.
struct GenreDefaults {
    tempo_bpm: u32,
    key: &'static str,
    instruments: &'static [&'static str],
    structure: &'static [SectionKind],
}

const VERSE_CHORUS: &[SectionKind] = &[
    SectionKind::Intro,
    SectionKind::Verse,
    SectionKind::Chorus,
    SectionKind::Verse,
    SectionKind::Chorus,
    SectionKind::Outro,
];

const THROUGH_COMPOSED: &[SectionKind] = &[
    SectionKind::Intro,
    SectionKind::Verse,
    SectionKind::Bridge,
    SectionKind::Verse,
    SectionKind::Outro,
];

fn genre_defaults(genre: Genre) -> GenreDefaults {
    match genre {
        Genre::Pop => GenreDefaults {
            tempo_bpm: 120,
            key: "C",
            instruments: &["piano", "drums", "bass", "synth"],
            structure: VERSE_CHORUS,
        },
        Genre::Ballad => GenreDefaults {
            tempo_bpm: 72,
            key: "G",
            instruments: &["piano", "strings", "bass"],
            structure: THROUGH_COMPOSED,
        },
        Genre::Rock => GenreDefaults {
            tempo_bpm: 140,
            key: "E",
            instruments: &["electric_guitar", "drums", "bass"],
            structure: VERSE_CHORUS,
        },
        Genre::Ambient => GenreDefaults {
            tempo_bpm: 60,
            key: "Dm",
            instruments: &["pad", "atmosphere", "texture"],
            structure: THROUGH_COMPOSED,
        },
        Genre::Electronic => GenreDefaults {
            tempo_bpm: 128,
            key: "Am",
            instruments: &["synth", "drums", "bass", "effects"],
            structure: VERSE_CHORUS,
        },
        Genre::Rnb => GenreDefaults {
            tempo_bpm: 96,
            // Sharp spelling keeps the key inside the shift vocabulary
            key: "D#",
            instruments: &["keys", "drums", "bass", "guitar"],
            structure: VERSE_CHORUS,
        },
        Genre::Jazz => GenreDefaults {
            tempo_bpm: 90,
            key: "F",
            instruments: &["piano", "saxophone", "bass", "drums"],
            structure: THROUGH_COMPOSED,
        },
        Genre::Classical => GenreDefaults {
            tempo_bpm: 80,
            key: "D",
            instruments: &["strings", "piano", "woodwinds"],
            structure: THROUGH_COMPOSED,
        },
    }
}

/// Mood adjustments layered over the genre defaults.
struct MoodModifiers {
    tempo_multiplier: f64,
    key_shift_semitones: i32,
}

fn mood_modifiers(mood: Mood) -> MoodModifiers {
    match mood {
        Mood::Happy => MoodModifiers {
            tempo_multiplier: 1.1,
            key_shift_semitones: 2,
        },
        Mood::Sad => MoodModifiers {
            tempo_multiplier: 0.8,
            key_shift_semitones: -3,
        },
        Mood::Angry => MoodModifiers {
            tempo_multiplier: 1.2,
            key_shift_semitones: 0,
        },
        Mood::Energetic => MoodModifiers {
            tempo_multiplier: 1.3,
            key_shift_semitones: 0,
        },
        Mood::Romantic => MoodModifiers {
            tempo_multiplier: 0.9,
            key_shift_semitones: 1,
        },
        Mood::Calm => MoodModifiers {
            tempo_multiplier: 0.7,
            key_shift_semitones: -2,
        },
        Mood::Mysterious => MoodModifiers {
            tempo_multiplier: 0.85,
            key_shift_semitones: -1,
        },
        Mood::Neutral => MoodModifiers {
            tempo_multiplier: 1.0,
            key_shift_semitones: 0,
        },
    }
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Shift a key string by semitones, preserving a trailing "m" marker.
fn shift_key(key: &str, semitones: i32) -> String {
    let (root, minor) = match key.strip_suffix('m') {
        // "Fm" is minor, but "F#"/"Eb" are accidentals, not minors
        Some(root) if !root.is_empty() && !root.ends_with('#') && !root.ends_with('b') => {
            (root, true)
        }
        _ => (key, false),
    };

    let Some(index) = NOTE_NAMES.iter().position(|n| *n == root) else {
        // Flats and unknown spellings pass through unshifted
        return key.to_string();
    };

    let shifted = (index as i32 + semitones).rem_euclid(12) as usize;
    let mut out = NOTE_NAMES[shifted].to_string();
    if minor {
        out.push('m');
    }
    out
}

/// Deterministic (MoodProfile, genre request, duration) mapper.
#[derive(Debug, Clone)]
pub struct ParameterMapper {
    intro_pad_seconds: f64,
    outro_pad_seconds: f64,
}

impl ParameterMapper {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            intro_pad_seconds: config.intro_pad_seconds,
            outro_pad_seconds: config.outro_pad_seconds,
        }
    }

    /// Instrumental lead-in; the mixer uses this as the vocal start offset.
    pub fn intro_pad_seconds(&self) -> f64 {
        self.intro_pad_seconds
    }

    /// Resolve generation parameters. Pure and deterministic: identical
    /// inputs always yield identical output.
    pub fn map(
        &self,
        profile: &MoodProfile,
        requested: GenreRequest,
        total_lyrics_duration: f64,
        voice_profile_id: &str,
    ) -> Result<GenerationParameters> {
        if total_lyrics_duration <= 0.0 {
            return Err(Error::Input(
                "Total lyric duration must be positive".into(),
            ));
        }

        let genre = match requested {
            GenreRequest::Named(genre) => genre,
            GenreRequest::Auto => genre_for_mood(profile.primary_mood),
        };

        let defaults = genre_defaults(genre);
        let modifiers = mood_modifiers(profile.primary_mood);

        let tempo_bpm = ((defaults.tempo_bpm as f64 * modifiers.tempo_multiplier).round() as u32)
            .clamp(MIN_TEMPO_BPM, MAX_TEMPO_BPM);
        let key = shift_key(defaults.key, modifiers.key_shift_semitones);

        let duration_seconds =
            total_lyrics_duration + self.intro_pad_seconds + self.outro_pad_seconds;

        Ok(GenerationParameters {
            genre,
            tempo_bpm,
            key,
            duration_seconds,
            instrumentation_tags: defaults.instruments.iter().map(|s| s.to_string()).collect(),
            structure: defaults.structure.to_vec(),
            voice_profile_id: voice_profile_id.to_string(),
        })
    }
}
