//! Data model for representing a parsed MusicXML score.
//!
//! Only the information needed to place note onsets on a punch strip is
//! kept: parts, measures, meter, and the pitch/onset of every note.

use serde::{Deserialize, Serialize};

/// A complete musical score parsed from MusicXML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    /// Title of the piece
    pub title: Option<String>,
    /// Composer name
    pub composer: Option<String>,
    /// MusicXML version (e.g., "3.1", "4.0")
    pub version: Option<String>,
    /// Software that created the file
    pub software: Option<String>,
    /// Musical parts (instruments)
    pub parts: Vec<Part>,
}

/// A musical part (one instrument or voice).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Part identifier (e.g., "P1")
    pub id: String,
    /// Part name (e.g., "Music Box")
    pub name: String,
    /// Ordered list of measures
    pub measures: Vec<Measure>,
}

/// A single measure (bar) of music.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    /// Measure number
    pub number: i32,
    /// Attributes (divisions, time) — only present when they change
    pub attributes: Option<Attributes>,
    /// Notes and rests in this measure, in document order
    pub notes: Vec<Note>,
}

/// Musical attributes that may change at the start of a measure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Divisions per quarter note (determines duration resolution)
    pub divisions: Option<i32>,
    /// Time signature
    pub time: Option<TimeSignature>,
}

/// Time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Numerator (e.g., 3 in 3/4)
    pub beats: i32,
    /// Denominator (e.g., 4 in 3/4)
    pub beat_type: i32,
}

/// A single note or rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Pitch (None if this is a rest)
    pub pitch: Option<Pitch>,
    /// Duration in divisions
    pub duration: i32,
    /// Start of the note in divisions from the beginning of the measure,
    /// after applying `<backup>`, `<forward>` and `<chord>`.
    pub onset: i32,
    /// Voice number (for multi-voice writing)
    pub voice: Option<i32>,
    /// Whether this is a rest
    pub rest: bool,
    /// Whether this note is part of a chord with the previous note
    pub chord: bool,
    /// Whether this is a grace note
    pub grace: bool,
}

/// Pitch of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Note name: A, B, C, D, E, F, G
    pub step: String,
    /// Octave number (middle C = C4)
    pub octave: i32,
    /// Chromatic alteration: -1.0 = flat, 1.0 = sharp, 0.0 = natural
    pub alter: Option<f64>,
}

impl Score {
    /// Create a new empty score.
    pub fn new() -> Self {
        Self {
            title: None,
            composer: None,
            version: None,
            software: None,
            parts: Vec::new(),
        }
    }

    /// Get the number of measures in the first part.
    pub fn measure_count(&self) -> usize {
        self.parts.first().map_or(0, |p| p.measures.len())
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSignature {
    /// Length of one beat in quarter notes.
    ///
    /// Compound meters (6/8, 9/8, 12/16, ...) count dotted beats; every
    /// other meter counts the denominator unit.
    pub fn beat_duration(&self) -> f64 {
        let unit = 4.0 / self.beat_type.max(1) as f64;
        let compound = self.beats > 3 && self.beats % 3 == 0 && self.beat_type >= 8;
        if compound {
            unit * 3.0
        } else {
            unit
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl Pitch {
    /// Name with octave in the flat-as-minus spelling: `C4`, `F#5`, `B-4`.
    pub fn name_with_octave(&self) -> String {
        let alter = self.alter.unwrap_or(0.0).round() as i32;
        let accidental = if alter >= 0 {
            "#".repeat(alter as usize)
        } else {
            "-".repeat(alter.unsigned_abs() as usize)
        };
        format!("{}{}{}", self.step, accidental, self.octave)
    }
}
