//! MusicXML parser — converts MusicXML XML into the Score data model.

use roxmltree::{Document, Node};

use crate::error::{Error, Result};
use crate::model::*;

/// Parse a MusicXML XML string into a Score.
pub fn parse_musicxml(xml: &str) -> Result<Score> {
    // MusicXML files include a DOCTYPE declaration, so we must allow DTDs
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| Error::Xml(format!("XML parse error: {e}")))?;
    let root = doc.root_element();

    // Verify this is a score-partwise document
    if root.tag_name().name() != "score-partwise" {
        return Err(Error::Xml(format!(
            "Unsupported root element: '{}'. Only 'score-partwise' is supported.",
            root.tag_name().name()
        )));
    }

    let mut score = Score::new();
    score.version = root.attribute("version").map(String::from);

    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "work" => parse_work(&child, &mut score),
            "movement-title" => {
                if score.title.is_none() {
                    score.title = text_of(&child);
                }
            }
            "identification" => parse_identification(&child, &mut score),
            "credit" => parse_credit(&child, &mut score),
            "part-list" => parse_part_list(&child, &mut score),
            "part" => parse_part(&child, &mut score),
            _ => {}
        }
    }

    log::debug!(
        "parsed score {:?}: {} part(s), {} measure(s)",
        score.title,
        score.parts.len(),
        score.measure_count()
    );

    Ok(score)
}

// ─── Work ────────────────────────────────────────────────────────────

fn parse_work(node: &Node, score: &mut Score) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "work-title" {
            // Only use work-title as a fallback; <credit type="title"> takes priority.
            if score.title.is_none() {
                score.title = text_of(&child);
            }
        }
    }
}

// ─── Identification ──────────────────────────────────────────────────

fn parse_identification(node: &Node, score: &mut Score) {
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "creator" => {
                if child.attribute("type") == Some("composer") && score.composer.is_none() {
                    score.composer = text_of(&child);
                }
            }
            "encoding" => {
                for enc_child in child.children().filter(|n| n.is_element()) {
                    if enc_child.tag_name().name() == "software" {
                        score.software = text_of(&enc_child);
                    }
                }
            }
            _ => {}
        }
    }
}

// ─── Credits ─────────────────────────────────────────────────────────

fn parse_credit(node: &Node, score: &mut Score) {
    let mut credit_type = String::new();
    let mut credit_text = String::new();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "credit-type" => {
                credit_type = child.text().unwrap_or("").trim().to_string();
            }
            "credit-words" => {
                let text = child.text().unwrap_or("").trim();
                if !text.is_empty() {
                    if !credit_text.is_empty() {
                        credit_text.push(' ');
                    }
                    credit_text.push_str(text);
                }
            }
            _ => {}
        }
    }

    if credit_text.is_empty() {
        return;
    }
    match credit_type.as_str() {
        "title" => score.title = Some(credit_text),
        "composer" => score.composer = Some(credit_text),
        _ => {}
    }
}

// ─── Part List ───────────────────────────────────────────────────────

fn parse_part_list(node: &Node, score: &mut Score) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "score-part" {
            let id = child.attribute("id").unwrap_or("").to_string();
            let name = child
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == "part-name")
                .and_then(|n| text_of(&n))
                .unwrap_or_default();

            score.parts.push(Part {
                id,
                name,
                measures: Vec::new(),
            });
        }
    }
}

// ─── Part (measures) ─────────────────────────────────────────────────

fn parse_part(node: &Node, score: &mut Score) {
    let part_id = node.attribute("id").unwrap_or("").to_string();

    // Find the matching part from the part-list
    let part = match score.parts.iter_mut().find(|p| p.id == part_id) {
        Some(p) => p,
        None => {
            log::warn!("ignoring <part id=\"{part_id}\"> missing from the part list");
            return;
        }
    };

    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().name() == "measure" {
            part.measures.push(parse_measure(&child));
        }
    }
}

// ─── Measure ─────────────────────────────────────────────────────────

fn parse_measure(node: &Node) -> Measure {
    let number = node
        .attribute("number")
        .and_then(|n| n.parse::<i32>().ok())
        .unwrap_or(0);

    let mut measure = Measure {
        number,
        attributes: None,
        notes: Vec::new(),
    };

    // Time cursor in divisions; <chord> notes reuse the onset of the
    // note they attach to.
    let mut cursor = 0;
    let mut last_onset = 0;

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "attributes" => {
                let attrs = parse_attributes(&child);
                // A measure may carry several <attributes> blocks; later ones win.
                let merged = measure.attributes.get_or_insert_with(Attributes::default);
                if attrs.divisions.is_some() {
                    merged.divisions = attrs.divisions;
                }
                if attrs.time.is_some() {
                    merged.time = attrs.time;
                }
            }
            "note" => {
                let mut note = parse_note(&child);
                if note.chord {
                    note.onset = last_onset;
                } else {
                    note.onset = cursor;
                    last_onset = cursor;
                    if !note.grace {
                        cursor += note.duration;
                    }
                }
                measure.notes.push(note);
            }
            "backup" => cursor -= duration_of(&child),
            "forward" => cursor += duration_of(&child),
            _ => {}
        }
    }

    measure
}

// ─── Attributes ──────────────────────────────────────────────────────

fn parse_attributes(node: &Node) -> Attributes {
    let mut attrs = Attributes::default();

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "divisions" => attrs.divisions = parse_i32(&child),
            "time" => attrs.time = parse_time(&child),
            _ => {}
        }
    }

    attrs
}

/// Returns `None` for senza-misura or otherwise unreadable signatures.
fn parse_time(node: &Node) -> Option<TimeSignature> {
    let mut beats = None;
    let mut beat_type = None;
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            // Additive signatures like "3+2" are summed.
            "beats" => {
                beats = child.text().and_then(|t| {
                    t.split('+')
                        .map(|b| b.trim().parse::<i32>().ok())
                        .sum::<Option<i32>>()
                })
            }
            "beat-type" => beat_type = parse_i32(&child),
            _ => {}
        }
    }
    match (beats, beat_type) {
        (Some(beats), Some(beat_type)) if beats > 0 && beat_type > 0 => {
            Some(TimeSignature { beats, beat_type })
        }
        _ => None,
    }
}

// ─── Note ────────────────────────────────────────────────────────────

fn parse_note(node: &Node) -> Note {
    let mut note = Note {
        pitch: None,
        duration: 0,
        onset: 0,
        voice: None,
        rest: false,
        chord: false,
        grace: false,
    };

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "pitch" => note.pitch = Some(parse_pitch(&child)),
            "duration" => note.duration = parse_i32(&child).unwrap_or(0),
            "voice" => note.voice = parse_i32(&child),
            "rest" => note.rest = true,
            "grace" => note.grace = true,
            "chord" => note.chord = true,
            _ => {}
        }
    }

    note
}

fn parse_pitch(node: &Node) -> Pitch {
    let mut pitch = Pitch {
        step: "C".to_string(),
        octave: 4,
        alter: None,
    };
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "step" => pitch.step = child.text().unwrap_or("C").trim().to_string(),
            "octave" => pitch.octave = parse_i32(&child).unwrap_or(4),
            "alter" => pitch.alter = parse_f64(&child),
            _ => {}
        }
    }
    pitch
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn duration_of(node: &Node) -> i32 {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == "duration")
        .and_then(|n| parse_i32(&n))
        .unwrap_or(0)
}

fn text_of(node: &Node) -> Option<String> {
    node.text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn parse_i32(node: &Node) -> Option<i32> {
    node.text()?.trim().parse().ok()
}

fn parse_f64(node: &Node) -> Option<f64> {
    node.text()?.trim().parse().ok()
}
