//! Inline MusicXML fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

/// A one-part score-partwise document with the given measures.
pub fn score_xml(title: &str, measures: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 3.1 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">
<score-partwise version="3.1">
  <work><work-title>{title}</work-title></work>
  <identification>
    <creator type="composer">Anonymous</creator>
    <encoding><software>MuseScore 3.6.2</software></encoding>
  </identification>
  <part-list>
    <score-part id="P1"><part-name>Music Box</part-name></score-part>
  </part-list>
  <part id="P1">
{measures}
  </part>
</score-partwise>
"#
    )
}

pub fn note(step: &str, alter: i32, octave: i32, duration: i32, voice: i32) -> String {
    let alter = if alter != 0 {
        format!("<alter>{alter}</alter>")
    } else {
        String::new()
    };
    format!(
        "<note><pitch><step>{step}</step>{alter}<octave>{octave}</octave></pitch>\
         <duration>{duration}</duration><voice>{voice}</voice></note>"
    )
}

pub fn rest(duration: i32, voice: i32) -> String {
    format!("<note><rest/><duration>{duration}</duration><voice>{voice}</voice></note>")
}

pub fn backup(duration: i32) -> String {
    format!("<backup><duration>{duration}</duration></backup>")
}

/// A measure; the first one should carry `attributes`.
pub fn measure(number: i32, attributes: Option<(i32, i32, i32)>, body: &[String]) -> String {
    let attributes = attributes
        .map(|(divisions, beats, beat_type)| {
            format!(
                "<attributes><divisions>{divisions}</divisions>\
                 <time><beats>{beats}</beats><beat-type>{beat_type}</beat-type></time></attributes>"
            )
        })
        .unwrap_or_default();
    format!(
        "<measure number=\"{number}\">{attributes}{}</measure>",
        body.concat()
    )
}

/// Pack a MusicXML document into an .mxl archive.
pub fn mxl(xml: &str, with_container: bool) -> Vec<u8> {
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    if with_container {
        writer.start_file("META-INF/container.xml", options).unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0" encoding="UTF-8"?>
<container><rootfiles><rootfile full-path="score/lullaby.xml"/></rootfiles></container>"#,
            )
            .unwrap();
    }
    writer.start_file("score/lullaby.xml", options).unwrap();
    writer.write_all(xml.as_bytes()).unwrap();

    writer.finish().unwrap().into_inner()
}
