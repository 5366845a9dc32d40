//! Score quantization — folds the notes of every part onto one discrete
//! timeline of `ticks_per_measure` ticks per measure.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::{extract_notes, PartMeasures};
use crate::pitch::{normalize_with, FlatSpelling};

/// Guards `floor` against fractions such as 2.9999999999 that are exact
/// in the score but not in binary.
const TICK_EPSILON: f64 = 1e-9;

/// Resolution and measure window used when quantizing a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    /// Ticks ("carillon beats") per measure.
    pub ticks_per_measure: u32,
    /// Measures dropped from the start of every part, e.g. a title or
    /// pickup measure.
    ///
    /// Counts measures by position in the part, not by their printed
    /// number: a pickup numbered 0 is the first measure, so the default
    /// of 1 drops the pickup and keeps measure 1.
    pub skip_leading_measures: usize,
    /// Measures read from the start of every part (before skipping).
    /// `None` reads the whole part.
    pub max_measures: Option<usize>,
    pub flat_spelling: FlatSpelling,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            ticks_per_measure: 8,
            skip_leading_measures: 1,
            max_measures: Some(32),
            flat_spelling: FlatSpelling::Literal,
        }
    }
}

/// Sparse map from tick index to the set of pitches starting at that tick.
///
/// Iteration is always by ascending tick, and pitches within a tick are
/// sorted, so two timelines built from the same input compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    ticks: BTreeMap<u32, BTreeSet<String>>,
}

impl Timeline {
    pub fn get(&self, tick: u32) -> Option<&BTreeSet<String>> {
        self.ticks.get(&tick)
    }

    /// Occupied ticks in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &BTreeSet<String>)> {
        self.ticks.iter().map(|(&tick, pitches)| (tick, pitches))
    }

    pub fn max_tick(&self) -> Option<u32> {
        self.ticks.keys().next_back().copied()
    }

    /// Number of occupied ticks.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Every distinct pitch in the timeline.
    pub fn pitches(&self) -> BTreeSet<&str> {
        self.ticks
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

/// Accumulates onsets into a [`Timeline`].
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    ticks: BTreeMap<u32, BTreeSet<String>>,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `pitch` at `tick`. Returns false if it was already there.
    pub fn insert(&mut self, tick: u32, pitch: impl Into<String>) -> bool {
        self.ticks.entry(tick).or_default().insert(pitch.into())
    }

    pub fn build(self) -> Timeline {
        Timeline { ticks: self.ticks }
    }
}

/// Global tick of a note starting at `beat_offset` (1-based) in the
/// `measure_index`-th quantized measure.
///
/// Returns `None` when the tick does not fit in a `u32`.
pub fn tick_index(
    measure_index: usize,
    beat_offset: f64,
    beat_duration: f64,
    ticks_per_measure: u32,
) -> Option<u32> {
    let fraction = (beat_offset - 1.0) / (beat_duration * 4.0);
    let within = (fraction * ticks_per_measure as f64 + TICK_EPSILON)
        .floor()
        .max(0.0) as u32;
    u32::try_from(measure_index)
        .ok()?
        .checked_mul(ticks_per_measure)?
        .checked_add(within)
}

/// Quantize every part onto one shared timeline.
pub fn quantize(parts: &[PartMeasures], config: &QuantizeConfig) -> Result<Timeline> {
    if config.ticks_per_measure == 0 {
        return Err(Error::Config("ticks_per_measure must be at least 1".to_string()));
    }
    if parts.is_empty() {
        return Err(Error::MalformedScore("the score has no parts".to_string()));
    }

    let mut builder = TimelineBuilder::new();

    for part in parts {
        if part.measures.is_empty() {
            return Err(Error::MalformedScore(format!(
                "part '{}' has no measures",
                part.id
            )));
        }

        let end = match config.max_measures {
            Some(max) if part.measures.len() > max => {
                log::warn!(
                    "part '{}' has {} measures; only the first {max} are punched",
                    part.id,
                    part.measures.len()
                );
                max
            }
            _ => part.measures.len(),
        };
        let window = part.measures[..end]
            .iter()
            .skip(config.skip_leading_measures);

        let mut inserted = 0usize;
        for (measure_index, measure) in window.enumerate() {
            for note in extract_notes(measure) {
                let tick = tick_index(
                    measure_index,
                    note.beat_offset,
                    note.beat_duration,
                    config.ticks_per_measure,
                )
                .ok_or_else(|| {
                    Error::Config(format!(
                        "{} ticks per measure overflows the timeline in measure {} of part '{}'",
                        config.ticks_per_measure,
                        measure_index + config.skip_leading_measures,
                        part.id
                    ))
                })?;
                if builder.insert(tick, normalize_with(&note.pitch, config.flat_spelling)) {
                    inserted += 1;
                }
            }
        }
        log::debug!("part '{}': {inserted} onset(s) quantized", part.id);
    }

    Ok(builder.build())
}
