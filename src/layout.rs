//! Stave layout — turns a [`Timeline`] into pages of punch strips.
//!
//! A stave is one horizontal strip carrying every pitch line of the
//! instrument; time runs left to right at `divisor` millimetres per tick.
//! Pages stack as many staves as fit between the margins, and staves are
//! filled in order, so the score continues from the right end of one
//! stave to the left end of the next, across pages.
//!
//! All coordinates are in millimetres from the top-left page corner.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quantize::Timeline;

/// A4 landscape.
const A4_WIDTH: f64 = 297.0;
const A4_HEIGHT: f64 = 210.0;

/// The 28-note carillon, lowest to highest.
pub const CARILLON_28: [&str; 28] = [
    "G3", "C4", "D4", "E4", "F4", "G4", "A4", "A#4", "B4", "C5", "C#5", "D5", "D#5", "E5",
    "F5", "F#5", "G5", "G#5", "A5", "A#5", "B5", "C6", "C#6", "D6", "D#6", "E6", "F6", "G6",
];

// ═══════════════════════════════════════════════════════════════════════
// Inputs
// ═══════════════════════════════════════════════════════════════════════

/// The physical note lines of the instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentProfile {
    /// Pitch names, lowest to highest.
    pub pitch_lines: Vec<String>,
    /// Distance between adjacent pitch lines.
    pub line_spacing: f64,
    /// Draw the highest pitch on the top line instead of the lowest.
    pub reverse: bool,
}

impl Default for InstrumentProfile {
    fn default() -> Self {
        Self {
            pitch_lines: CARILLON_28.iter().map(|p| p.to_string()).collect(),
            line_spacing: 2.0,
            reverse: false,
        }
    }
}

impl InstrumentProfile {
    pub fn new<S: Into<String>>(pitch_lines: impl IntoIterator<Item = S>, line_spacing: f64) -> Self {
        Self {
            pitch_lines: pitch_lines.into_iter().map(Into::into).collect(),
            line_spacing,
            reverse: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pitch_lines.is_empty() {
            return Err(Error::Config("the instrument has no pitch lines".to_string()));
        }
        for (i, pitch) in self.pitch_lines.iter().enumerate() {
            if self.pitch_lines[..i].contains(pitch) {
                return Err(Error::Config(format!("pitch line '{pitch}' is listed twice")));
            }
        }
        positive("line_spacing", self.line_spacing)
    }

    /// Row of `pitch` on the stave, counted from the top line.
    pub fn line_of(&self, pitch: &str) -> Result<usize> {
        let index = self
            .pitch_lines
            .iter()
            .position(|p| p == pitch)
            .ok_or_else(|| Error::UnknownPitch(pitch.to_string()))?;
        Ok(self.row(index))
    }

    fn row(&self, index: usize) -> usize {
        if self.reverse {
            self.pitch_lines.len() - 1 - index
        } else {
            index
        }
    }
}

/// Physical page geometry, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayoutParams {
    pub page_width: f64,
    pub page_height: f64,
    /// Distance between the page border and the staves, and between staves.
    pub margin: f64,
    /// Distance between consecutive ticks.
    pub divisor: f64,
    pub font_size: f64,
    /// Distance from the outer pitch lines to the cutting border.
    pub marker_offset: f64,
    /// Arm length of the corner registration crosses.
    pub marker_size: f64,
    pub dot_radius: f64,
    /// Blank ticks before the first note.
    pub pitch_offset: u32,
}

impl Default for PageLayoutParams {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: 20.0,
            divisor: 4.0,
            font_size: 1.5,
            marker_offset: 6.0,
            marker_size: 5.0,
            dot_radius: 1.0,
            pitch_offset: 1,
        }
    }
}

impl PageLayoutParams {
    pub fn validate(&self) -> Result<()> {
        positive("page_width", self.page_width)?;
        positive("page_height", self.page_height)?;
        positive("divisor", self.divisor)?;
        positive("font_size", self.font_size)?;
        positive("marker_size", self.marker_size)?;
        positive("dot_radius", self.dot_radius)?;
        non_negative("margin", self.margin)?;
        non_negative("marker_offset", self.marker_offset)?;
        if self.page_width - 2.0 * self.margin <= 0.0 {
            return Err(Error::Config(format!(
                "margin {} leaves no room on a {}mm wide page",
                self.margin, self.page_width
            )));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} must be a positive number, got {value}")))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} must not be negative, got {value}")))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Outputs
// ═══════════════════════════════════════════════════════════════════════

/// How a score is spread over staves and pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    /// Length of the time axis, leading blank ticks included.
    pub score_length: f64,
    pub stave_width: f64,
    /// Pitch-line span plus one margin of spacing.
    pub stave_height: f64,
    pub staves_per_page: usize,
    pub staves_required: usize,
    pub pages_required: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    StaveLabel,
    PitchLabel,
}

/// One absolutely positioned drawing element.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        size: f64,
        role: TextRole,
    },
    Dot {
        cx: f64,
        cy: f64,
        r: f64,
    },
}

/// One printable page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 0-based page number.
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub primitives: Vec<Primitive>,
}

impl Page {
    /// File name of this page for the given output prefix.
    pub fn file_name(&self, prefix: &str) -> String {
        format!("{prefix}_{}.svg", self.index)
    }

    pub fn dots(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.primitives.iter().filter_map(|p| match *p {
            Primitive::Dot { cx, cy, .. } => Some((cx, cy)),
            _ => None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Layout
// ═══════════════════════════════════════════════════════════════════════

/// Work out stave and page counts for a timeline.
pub fn paginate(
    timeline: &Timeline,
    instrument: &InstrumentProfile,
    params: &PageLayoutParams,
) -> Result<Pagination> {
    let max_tick = timeline.max_tick().ok_or(Error::EmptyScore)?;
    let score_length = strip_position(max_tick, params);

    let stave_height =
        (instrument.pitch_lines.len() as f64 - 1.0) * instrument.line_spacing + params.margin;
    let usable_height = params.page_height - 2.0 * params.margin;
    let staves_per_page = (usable_height / stave_height).floor();
    if staves_per_page < 1.0 {
        return Err(Error::InsufficientPageSpace {
            stave_height,
            usable_height,
        });
    }
    let staves_per_page = staves_per_page as usize;

    let stave_width = params.page_width - 2.0 * params.margin;
    let staves_required = stave_of(score_length, stave_width) + 1;
    let pages_required = staves_required.div_ceil(staves_per_page);

    Ok(Pagination {
        score_length,
        stave_width,
        stave_height,
        staves_per_page,
        staves_required,
        pages_required,
    })
}

/// Lay the timeline out on as many pages as it needs.
///
/// Every stave slot of every page is drawn, so the last page may end with
/// empty staves. Fails without producing anything if a pitch in the
/// timeline has no line on the instrument.
pub fn layout(
    timeline: &Timeline,
    instrument: &InstrumentProfile,
    params: &PageLayoutParams,
    title: &str,
) -> Result<Vec<Page>> {
    instrument.validate()?;
    params.validate()?;
    let pagination = paginate(timeline, instrument, params)?;

    log::info!(
        "score length {:.1}mm, stave {:.1}mm x {:.1}mm, {} stave(s) on {} page(s) of {}",
        pagination.score_length,
        pagination.stave_width,
        pagination.stave_height,
        pagination.staves_required,
        pagination.pages_required,
        pagination.staves_per_page
    );

    let mut pending = timeline.iter().peekable();
    let mut pages = Vec::with_capacity(pagination.pages_required);

    for index in 0..pagination.pages_required {
        let mut stave = StaveDrawer {
            instrument,
            params,
            pagination: &pagination,
            title,
            primitives: Vec::new(),
        };

        for slot in 0..pagination.staves_per_page {
            let number = index * pagination.staves_per_page + slot;
            let line_offset = slot as f64 * pagination.stave_height + params.margin;

            stave.crosses(line_offset);
            stave.label(line_offset, number);
            stave.pitch_lines(line_offset);

            while let Some(&(tick, pitches)) = pending.peek() {
                let note_time =
                    stave_time(strip_position(tick, params), number, pagination.stave_width);
                if note_time > pagination.stave_width {
                    break;
                }
                for pitch in pitches {
                    let row = instrument.line_of(pitch)?;
                    stave.dot(line_offset, note_time, row);
                }
                pending.next();
            }
        }

        log::debug!("page {index}: {} primitive(s)", stave.primitives.len());
        pages.push(Page {
            index,
            width: params.page_width,
            height: params.page_height,
            primitives: stave.primitives,
        });
    }

    debug_assert!(
        pending.peek().is_none(),
        "ticks left over after the last stave"
    );
    Ok(pages)
}

/// Distance of `tick` from the start of the first stave, in mm.
fn strip_position(tick: u32, params: &PageLayoutParams) -> f64 {
    (f64::from(tick) + f64::from(params.pitch_offset)) * params.divisor
}

/// Distance of a strip position from the start of stave `stave`.
fn stave_time(position: f64, stave: usize, stave_width: f64) -> f64 {
    position - stave as f64 * stave_width
}

/// First stave whose width reaches `position`.
///
/// Uses the same arithmetic as the dot placement in [`layout`], so the
/// stave count never disagrees with where the last dot lands.
fn stave_of(position: f64, stave_width: f64) -> usize {
    let mut stave = ((position / stave_width).ceil() as usize).saturating_sub(1);
    while stave_time(position, stave, stave_width) > stave_width {
        stave += 1;
    }
    while stave > 0 && stave_time(position, stave - 1, stave_width) <= stave_width {
        stave -= 1;
    }
    stave
}

/// Emits the primitives of one page, stave by stave.
struct StaveDrawer<'a> {
    instrument: &'a InstrumentProfile,
    params: &'a PageLayoutParams,
    pagination: &'a Pagination,
    title: &'a str,
    primitives: Vec<Primitive>,
}

impl StaveDrawer<'_> {
    fn line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64)) {
        self.primitives.push(Primitive::Line { x1, y1, x2, y2 });
    }

    fn text(&mut self, x: f64, y: f64, content: String, role: TextRole) {
        self.primitives.push(Primitive::Text {
            x,
            y,
            content,
            size: self.params.font_size,
            role,
        });
    }

    /// Bottom edge of the cutting border of a stave.
    fn bottom(&self, line_offset: f64) -> f64 {
        line_offset + self.pagination.stave_height - self.params.margin + self.params.marker_offset
    }

    /// Registration crosses on the four cutting corners, joined by the
    /// cutting border.
    fn crosses(&mut self, line_offset: f64) {
        let left = self.params.margin;
        let right = self.params.margin + self.pagination.stave_width;
        let top = line_offset - self.params.marker_offset;
        let bottom = self.bottom(line_offset);

        let corners = [(right, top), (right, bottom), (left, bottom), (left, top)];
        let half = self.params.marker_size / 2.0;
        for &(x, y) in &corners {
            self.line((x - half, y), (x + half, y));
            self.line((x, y - half), (x, y + half));
        }
        for i in 0..corners.len() {
            self.line(corners[i], corners[(i + 1) % corners.len()]);
        }
    }

    fn label(&mut self, line_offset: f64, number: usize) {
        let x = self.params.margin * 2.0;
        let y = self.bottom(line_offset);
        self.text(x, y, format!("STAVE {number} - {}", self.title), TextRole::StaveLabel);
    }

    fn pitch_lines(&mut self, line_offset: f64) {
        let left = self.params.margin;
        let right = self.params.margin + self.pagination.stave_width;
        for (index, pitch) in self.instrument.pitch_lines.iter().enumerate() {
            let y = line_offset + self.instrument.row(index) as f64 * self.instrument.line_spacing;
            self.line((left, y), (right, y));
            self.text(
                left - 2.0,
                y + self.params.font_size / 2.0,
                pitch.clone(),
                TextRole::PitchLabel,
            );
        }
    }

    fn dot(&mut self, line_offset: f64, note_time: f64, row: usize) {
        self.primitives.push(Primitive::Dot {
            cx: self.params.margin + note_time,
            cy: line_offset + row as f64 * self.instrument.line_spacing,
            r: self.params.dot_radius,
        });
    }
}
