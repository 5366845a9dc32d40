//! carillon — turns MusicXML scores into punch strips for music-box and
//! carillon cylinders.
//!
//! The pipeline reads a score, quantizes every note onset onto a grid of
//! `ticks_per_measure` ticks per measure, and lays the resulting timeline
//! out as staves on printable pages, one SVG file per page.
//!
//! Supports both uncompressed MusicXML (.musicxml) and compressed MXL (.mxl) files.
//!
//! # Example
//! ```no_run
//! use carillon::{punch_file, Config};
//!
//! let config = Config::default();
//! let written = punch_file("path/to/score.musicxml", &config, ".").unwrap();
//! println!("Wrote {} page(s)", written.len());
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod model;
pub mod mxl;
pub mod parser;
pub mod pitch;
pub mod quantize;
pub mod svg;

use std::path::{Path, PathBuf};

pub use config::Config;
pub use error::{Error, Result};
pub use extract::{extract_notes, MeasureContent, NoteEvent, NoteOrChord};
pub use layout::{layout, paginate, InstrumentProfile, Page, PageLayoutParams, Pagination};
pub use model::*;
pub use mxl::parse_mxl;
pub use parser::parse_musicxml;
pub use pitch::{normalize, FlatSpelling};
pub use quantize::{quantize, QuantizeConfig, Timeline};

/// Parse a MusicXML file from a file path.
/// Automatically detects format based on file extension:
/// - `.musicxml` or `.xml` → uncompressed MusicXML
/// - `.mxl` → compressed MXL (ZIP archive)
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Score> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;

    parse_bytes(&data, path.extension().and_then(|e| e.to_str()))
}

/// Parse MusicXML from raw bytes with an optional format hint.
/// If `extension` is None, tries to auto-detect the format.
pub fn parse_bytes(data: &[u8], extension: Option<&str>) -> Result<Score> {
    match extension {
        Some("mxl") => parse_mxl(data),
        Some("musicxml") | Some("xml") => {
            let xml = std::str::from_utf8(data)
                .map_err(|e| Error::Xml(format!("Invalid UTF-8 in MusicXML file: {e}")))?;
            parse_musicxml(xml)
        }
        _ => {
            // Auto-detect: try as XML first, then as MXL
            if let Ok(xml) = std::str::from_utf8(data) {
                if xml.trim_start().starts_with('<') {
                    return parse_musicxml(xml);
                }
            }
            parse_mxl(data)
        }
    }
}

/// Quantize a parsed score onto a tick timeline.
pub fn score_to_timeline(score: &Score, config: &QuantizeConfig) -> Result<Timeline> {
    let parts = extract::score_measures(score)?;
    quantize(&parts, config)
}

/// Convert a timeline to a JSON object keyed by tick.
pub fn timeline_to_json(timeline: &Timeline) -> Result<String> {
    Ok(serde_json::to_string_pretty(timeline)?)
}

/// Quantize and lay out a parsed score.
pub fn punch_score(score: &Score, config: &Config) -> Result<Vec<Page>> {
    config.validate()?;
    let timeline = score_to_timeline(score, &config.quantize)?;
    let title = config.title_for(score.title.as_deref());
    layout(&timeline, &config.instrument, &config.page, &title)
}

/// Parse a score file and write its pages into `out_dir`.
///
/// Returns the paths of the written pages, in page order.
pub fn punch_file<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    config: &Config,
    out_dir: Q,
) -> Result<Vec<PathBuf>> {
    let score = parse_file(path)?;
    let pages = punch_score(&score, config)?;
    svg::write_pages(&pages, out_dir, &config.output_prefix)
}
