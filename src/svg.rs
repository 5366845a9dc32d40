//! SVG output — serializes laid-out pages and writes them to disk.
//!
//! The document size is given in `mm` and the view box spans the same
//! numbers, so every coordinate in the file is a millimetre.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::layout::{Page, Primitive, TextRole};

const LINE_COLOR: &str = "black";
const LINE_WIDTH: f64 = 0.1;
const DOT_COLOR: &str = "black";
const STAVE_LABEL_COLOR: &str = "blue";
const PITCH_LABEL_COLOR: &str = "red";

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

struct SvgBuilder {
    elements: Vec<String>,
    width: f64,
    height: f64,
}

impl SvgBuilder {
    fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
        }
    }

    fn build(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}mm" height="{}mm" style="font-family: sans-serif;">"#,
            self.width, self.height, self.width, self.height
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.elements.push(format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}"/>"#,
            x1, y1, x2, y2, LINE_COLOR, LINE_WIDTH
        ));
    }

    fn circle(&mut self, cx: f64, cy: f64, r: f64) {
        self.elements.push(format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
            cx, cy, r, DOT_COLOR
        ));
    }

    fn text(&mut self, x: f64, y: f64, content: &str, size: f64, fill: &str) {
        let escaped = content
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        self.elements.push(format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="{}" fill="{}">{}</text>"#,
            x, y, size, fill, escaped
        ));
    }
}

/// Render one page as a standalone SVG document.
pub fn render_page(page: &Page) -> String {
    let mut svg = SvgBuilder::new(page.width, page.height);

    for primitive in &page.primitives {
        match primitive {
            Primitive::Line { x1, y1, x2, y2 } => svg.line(*x1, *y1, *x2, *y2),
            Primitive::Dot { cx, cy, r } => svg.circle(*cx, *cy, *r),
            Primitive::Text {
                x,
                y,
                content,
                size,
                role,
            } => {
                let fill = match role {
                    TextRole::StaveLabel => STAVE_LABEL_COLOR,
                    TextRole::PitchLabel => PITCH_LABEL_COLOR,
                };
                svg.text(*x, *y, content, *size, fill);
            }
        }
    }

    svg.build()
}

/// Write every page to `dir/{prefix}_{index}.svg`.
///
/// Each file is flushed and closed before the next one is opened, so if
/// writing fails part way the pages already written are complete.
pub fn write_pages<P: AsRef<Path>>(pages: &[Page], dir: P, prefix: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut written = Vec::with_capacity(pages.len());

    for page in pages {
        let path = dir.join(page.file_name(prefix));
        log::debug!("writing page {} to {}", page.index, path.display());
        write_page(page, &path)?;
        written.push(path);
    }

    Ok(written)
}

fn write_page(page: &Page, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(render_page(page).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(path, e))
}
