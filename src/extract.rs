//! Note extraction — flattens one measure into (pitch, beat offset, beat
//! duration) triples.
//!
//! A measure is seen either as one flat stream of onsets or, when the
//! score writes several voices into it, as one stream per voice. Chords
//! are carried as a single onset with several pitches and only split
//! into individual [`NoteEvent`]s here.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::model::{Measure, Part, Score, TimeSignature};

/// The pitches sounding at one onset.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteOrChord {
    Single(String),
    Chord(BTreeSet<String>),
}

/// One onset within a measure.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureEvent {
    pub notes: NoteOrChord,
    /// 1-based position within the measure, in beats.
    pub beat_offset: f64,
    /// Length of one beat in quarter notes under the current meter.
    pub beat_duration: f64,
}

/// The onsets of one measure.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureContent {
    Flat(Vec<MeasureEvent>),
    /// One event list per voice, ordered by voice number.
    Voiced(Vec<Vec<MeasureEvent>>),
}

/// One sounding pitch within a measure.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    /// Pitch name as written in the score, e.g. `B-4`.
    pub pitch: String,
    pub beat_offset: f64,
    pub beat_duration: f64,
}

/// All measures of one part, in performance order.
#[derive(Debug, Clone, PartialEq)]
pub struct PartMeasures {
    pub id: String,
    pub measures: Vec<MeasureContent>,
}

/// Flatten a measure into one [`NoteEvent`] per sounding pitch.
///
/// Chord members share the chord's beat offset and duration. The order of
/// the result carries no meaning.
pub fn extract_notes(measure: &MeasureContent) -> Vec<NoteEvent> {
    match measure {
        MeasureContent::Flat(events) => events.iter().flat_map(event_notes).collect(),
        MeasureContent::Voiced(voices) => voices
            .iter()
            .flatten()
            .flat_map(event_notes)
            .collect(),
    }
}

fn event_notes(event: &MeasureEvent) -> Vec<NoteEvent> {
    let note = |pitch: &String| NoteEvent {
        pitch: pitch.clone(),
        beat_offset: event.beat_offset,
        beat_duration: event.beat_duration,
    };
    match &event.notes {
        NoteOrChord::Single(pitch) => vec![note(pitch)],
        NoteOrChord::Chord(pitches) => pitches.iter().map(note).collect(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// MusicXML model → MeasureContent
// ═══════════════════════════════════════════════════════════════════════

/// Meter state carried from one measure to the next.
#[derive(Debug, Clone, Copy, Default)]
struct MeasureContext {
    divisions: Option<i32>,
    time: TimeSignature,
}

/// Convert every part of a parsed score.
pub fn score_measures(score: &Score) -> Result<Vec<PartMeasures>> {
    score.parts.iter().map(part_measures).collect()
}

/// Convert one part, tracking divisions and time signature changes.
pub fn part_measures(part: &Part) -> Result<PartMeasures> {
    let mut ctx = MeasureContext::default();
    let measures = part
        .measures
        .iter()
        .map(|measure| {
            if let Some(ref attrs) = measure.attributes {
                if attrs.divisions.is_some() {
                    ctx.divisions = attrs.divisions;
                }
                if let Some(time) = attrs.time {
                    ctx.time = time;
                }
            }
            measure_content(part, measure, &ctx)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PartMeasures {
        id: part.id.clone(),
        measures,
    })
}

fn measure_content(part: &Part, measure: &Measure, ctx: &MeasureContext) -> Result<MeasureContent> {
    let unsupported = |reason: String| Error::UnsupportedVoicing {
        part: part.id.clone(),
        measure: measure.number,
        reason,
    };
    let beat_duration = ctx.time.beat_duration();

    // Voice → events, in document order within each voice.
    let mut voices: BTreeMap<i32, Vec<MeasureEvent>> = BTreeMap::new();

    for note in &measure.notes {
        let pitch = match (&note.pitch, note.rest) {
            (Some(pitch), false) => pitch.name_with_octave(),
            _ => continue,
        };
        if note.grace {
            log::debug!(
                "skipping grace note {pitch} in part '{}', measure {}",
                part.id,
                measure.number
            );
            continue;
        }

        let divisions = match ctx.divisions {
            Some(d) if d > 0 => d,
            _ => return Err(unsupported("no <divisions> in effect".to_string())),
        };
        if note.onset < 0 {
            return Err(unsupported(format!(
                "{pitch} starts {} division(s) before the measure",
                -note.onset
            )));
        }

        let events = voices.entry(note.voice.unwrap_or(1)).or_default();
        if note.chord {
            if let Some(last) = events.last_mut() {
                match &mut last.notes {
                    NoteOrChord::Chord(pitches) => {
                        pitches.insert(pitch);
                    }
                    NoteOrChord::Single(first) => {
                        let pitches = BTreeSet::from([first.clone(), pitch]);
                        last.notes = NoteOrChord::Chord(pitches);
                    }
                }
                continue;
            }
        }

        let quarters = note.onset as f64 / divisions as f64;
        events.push(MeasureEvent {
            notes: NoteOrChord::Single(pitch),
            beat_offset: 1.0 + quarters / beat_duration,
            beat_duration,
        });
    }

    Ok(if voices.len() > 1 {
        MeasureContent::Voiced(voices.into_values().collect())
    } else {
        MeasureContent::Flat(voices.into_values().next().unwrap_or_default())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, Note, Pitch};
    use pretty_assertions::assert_eq;

    fn event(notes: NoteOrChord, beat_offset: f64) -> MeasureEvent {
        MeasureEvent {
            notes,
            beat_offset,
            beat_duration: 1.0,
        }
    }

    fn note(step: &str, octave: i32, onset: i32, voice: i32) -> Note {
        Note {
            pitch: Some(Pitch {
                step: step.to_string(),
                octave,
                alter: None,
            }),
            duration: 1,
            onset,
            voice: Some(voice),
            rest: false,
            chord: false,
            grace: false,
        }
    }

    fn part_with(notes: Vec<Note>, divisions: Option<i32>) -> Part {
        Part {
            id: "P1".to_string(),
            name: "Box".to_string(),
            measures: vec![Measure {
                number: 1,
                attributes: Some(Attributes {
                    divisions,
                    time: None,
                }),
                notes,
            }],
        }
    }

    #[test]
    fn chords_split_into_one_event_per_pitch() {
        let pitches = BTreeSet::from(["C4".to_string(), "E4".to_string(), "G4".to_string()]);
        let measure = MeasureContent::Flat(vec![
            event(NoteOrChord::Chord(pitches), 1.0),
            event(NoteOrChord::Single("A4".to_string()), 2.5),
        ]);

        let notes = extract_notes(&measure);
        assert_eq!(notes.len(), 4);
        assert!(notes[..3].iter().all(|n| n.beat_offset == 1.0));
        assert_eq!(notes[3].pitch, "A4");
        assert_eq!(notes[3].beat_offset, 2.5);
    }

    #[test]
    fn voiced_measures_keep_simultaneous_notes_from_every_voice() {
        let measure = MeasureContent::Voiced(vec![
            vec![event(NoteOrChord::Single("C5".to_string()), 1.0)],
            vec![event(NoteOrChord::Single("C4".to_string()), 1.0)],
        ]);

        let mut pitches: Vec<String> = extract_notes(&measure).into_iter().map(|n| n.pitch).collect();
        pitches.sort();
        assert_eq!(pitches, vec!["C4", "C5"]);
    }

    #[test]
    fn builds_chords_and_voices_from_the_model() {
        let mut chord_member = note("E", 4, 0, 1);
        chord_member.chord = true;
        let notes = vec![
            note("C", 4, 0, 1),
            chord_member,
            note("D", 4, 1, 1),
            note("G", 3, 0, 2),
        ];
        let content = part_measures(&part_with(notes, Some(1))).unwrap();

        let expected = MeasureContent::Voiced(vec![
            vec![
                event(
                    NoteOrChord::Chord(BTreeSet::from(["C4".to_string(), "E4".to_string()])),
                    1.0,
                ),
                event(NoteOrChord::Single("D4".to_string()), 2.0),
            ],
            vec![event(NoteOrChord::Single("G3".to_string()), 1.0)],
        ]);
        assert_eq!(content.measures, vec![expected]);
    }

    #[test]
    fn compound_meter_counts_dotted_beats() {
        let mut part = part_with(vec![note("C", 5, 3, 1)], Some(2));
        part.measures[0].attributes.as_mut().unwrap().time = Some(TimeSignature {
            beats: 6,
            beat_type: 8,
        });
        let content = part_measures(&part).unwrap();
        let notes = extract_notes(&content.measures[0]);
        // 3 divisions at 2 per quarter = 1.5 quarters = one dotted beat
        assert_eq!(notes[0].beat_offset, 2.0);
        assert_eq!(notes[0].beat_duration, 1.5);
    }

    #[test]
    fn rests_and_grace_notes_produce_nothing() {
        let mut rest = note("C", 4, 0, 1);
        rest.rest = true;
        rest.pitch = None;
        let mut grace = note("D", 4, 1, 1);
        grace.grace = true;
        let content = part_measures(&part_with(vec![rest, grace], Some(1))).unwrap();
        assert_eq!(content.measures, vec![MeasureContent::Flat(vec![])]);
    }

    #[test]
    fn missing_divisions_is_unsupported_voicing() {
        let err = part_measures(&part_with(vec![note("C", 4, 0, 1)], None)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVoicing { measure: 1, .. }));
    }

    #[test]
    fn negative_onset_is_unsupported_voicing() {
        let err = part_measures(&part_with(vec![note("C", 4, -2, 1)], Some(1))).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVoicing { .. }));
    }
}
