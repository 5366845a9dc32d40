//! End-to-end tests — MusicXML in, laid-out pages and SVG files out.

mod common;

use carillon::layout::Primitive;
use carillon::{
    parse_bytes, punch_file, punch_score, score_to_timeline, timeline_to_json, Config, Error,
    InstrumentProfile, PageLayoutParams, QuantizeConfig,
};
use common::*;
use pretty_assertions::assert_eq;

/// C4 on the first beat of measure 1, C#5 on the second beat of measure 2.
fn two_note_score() -> String {
    score_xml(
        "Two Notes",
        &[
            measure(1, Some((1, 4, 4)), &[note("C", 0, 4, 1, 1), rest(3, 1)]),
            measure(2, None, &[rest(1, 1), note("C", 1, 5, 1, 1), rest(2, 1)]),
        ]
        .concat(),
    )
}

fn two_line_config() -> Config {
    Config {
        quantize: QuantizeConfig {
            ticks_per_measure: 4,
            skip_leading_measures: 0,
            max_measures: None,
            ..Default::default()
        },
        instrument: InstrumentProfile::new(["C4", "C#5"], 2.0),
        page: PageLayoutParams {
            page_height: 70.0,
            pitch_offset: 0,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn two_notes_on_a_two_line_instrument() {
    let score = parse_bytes(two_note_score().as_bytes(), Some("musicxml")).unwrap();
    let config = two_line_config();

    let timeline = score_to_timeline(&score, &config.quantize).unwrap();
    let ticks: Vec<u32> = timeline.iter().map(|(tick, _)| tick).collect();
    assert_eq!(ticks, vec![0, 5]);

    let pages = punch_score(&score, &config).unwrap();
    assert_eq!(pages.len(), 1);

    let labels: Vec<&str> = pages[0]
        .primitives
        .iter()
        .filter_map(|p| match p {
            Primitive::Text { content, .. } if content.starts_with("STAVE") => {
                Some(content.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["STAVE 0 - Two Notes"]);

    let divisor = config.page.divisor;
    let margin = config.page.margin;
    let dots: Vec<(f64, f64)> = pages[0].dots().collect();
    assert_eq!(
        dots,
        vec![(margin, margin), (margin + 5.0 * divisor, margin + 2.0)]
    );
}

#[test]
fn default_window_skips_the_first_measure() {
    let score = parse_bytes(two_note_score().as_bytes(), None).unwrap();
    let quantize = QuantizeConfig {
        ticks_per_measure: 4,
        ..Default::default()
    };
    let timeline = score_to_timeline(&score, &quantize).unwrap();
    let ticks: Vec<u32> = timeline.iter().map(|(tick, _)| tick).collect();
    assert_eq!(ticks, vec![1]);
}

#[test]
fn pickup_numbered_zero_is_the_skipped_measure() {
    let xml = score_xml(
        "Pickup",
        &[
            measure(0, Some((1, 4, 4)), &[note("G", 0, 3, 1, 1)]),
            measure(1, None, &[note("C", 0, 4, 4, 1)]),
            measure(2, None, &[note("D", 0, 4, 4, 1)]),
        ]
        .concat(),
    );
    let score = parse_bytes(xml.as_bytes(), None).unwrap();
    let quantize = QuantizeConfig {
        ticks_per_measure: 4,
        ..Default::default()
    };
    let timeline = score_to_timeline(&score, &quantize).unwrap();
    let ticks: Vec<(u32, Vec<&str>)> = timeline
        .iter()
        .map(|(tick, pitches)| (tick, pitches.iter().map(String::as_str).collect()))
        .collect();
    assert_eq!(ticks, vec![(0, vec!["C4"]), (4, vec!["D4"])]);
}

#[test]
fn voices_and_flats_collapse_onto_instrument_pitches() {
    // voice 1 holds B-flat while voice 2 plays A-sharp twice
    let xml = score_xml(
        "Voices",
        &measure(
            1,
            Some((1, 4, 4)),
            &[
                note("B", -1, 4, 4, 1),
                backup(4),
                note("A", 1, 4, 2, 2),
                note("A", 1, 4, 2, 2),
                backup(4),
                note("E", -1, 5, 4, 3),
            ],
        ),
    );
    let score = parse_bytes(xml.as_bytes(), None).unwrap();
    let quantize = QuantizeConfig {
        skip_leading_measures: 0,
        ..Default::default()
    };
    let timeline = score_to_timeline(&score, &quantize).unwrap();

    let json = timeline_to_json(&timeline).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "0": ["A#4", "D#5"],
            "4": ["A#4"]
        })
    );
}

#[test]
fn pitch_outside_the_instrument_fails() {
    let xml = score_xml(
        "Out of range",
        &measure(1, Some((1, 4, 4)), &[note("C", 0, 2, 4, 1)]),
    );
    let score = parse_bytes(xml.as_bytes(), None).unwrap();
    let config = Config {
        quantize: QuantizeConfig {
            skip_leading_measures: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    let err = punch_score(&score, &config).unwrap_err();
    assert!(matches!(err, Error::UnknownPitch(ref p) if p == "C2"));
}

#[test]
fn score_with_only_rests_is_empty() {
    let xml = score_xml("Silence", &measure(1, Some((1, 4, 4)), &[rest(4, 1)]));
    let score = parse_bytes(xml.as_bytes(), None).unwrap();
    let config = Config {
        quantize: QuantizeConfig {
            skip_leading_measures: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(punch_score(&score, &config), Err(Error::EmptyScore)));
}

#[test]
fn part_without_measures_is_malformed() {
    let xml = score_xml("Nothing", "");
    let score = parse_bytes(xml.as_bytes(), None).unwrap();
    assert!(matches!(
        punch_score(&score, &Config::default()),
        Err(Error::MalformedScore(_))
    ));
}

#[test]
fn notes_before_divisions_are_unsupported() {
    let xml = score_xml(
        "No divisions",
        "<measure number=\"1\"><note><pitch><step>C</step><octave>4</octave></pitch>\
         <duration>1</duration></note></measure>",
    );
    let score = parse_bytes(xml.as_bytes(), None).unwrap();
    let config = two_line_config();
    assert!(matches!(
        punch_score(&score, &config),
        Err(Error::UnsupportedVoicing { .. })
    ));
}

#[test]
fn pages_land_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("two.musicxml");
    std::fs::write(&input, two_note_score()).unwrap();

    let config = Config {
        output_prefix: "two".to_string(),
        title: Some("Printed".to_string()),
        ..two_line_config()
    };
    let written = punch_file(&input, &config, dir.path()).unwrap();
    assert_eq!(written, vec![dir.path().join("two_0.svg")]);

    let svg = std::fs::read_to_string(&written[0]).unwrap();
    assert!(svg.contains(r#"width="297mm""#));
    assert!(svg.contains("STAVE 0 - Printed"));
    assert_eq!(svg.matches("<circle").count(), 2);
}
