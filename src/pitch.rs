//! Pitch spelling for the instrument's fixed note set.
//!
//! Instruments label their pitch lines with sharps only, so flats coming
//! out of the score (`B-4`) are re-spelled as the sharp of the natural
//! below (`A#4`).

use serde::{Deserialize, Serialize};

const NATURALS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// How the octave digit is treated when a flat wraps from C down to B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlatSpelling {
    /// Keep the octave digit verbatim: `C-5` becomes `B#5`.
    #[default]
    Literal,
    /// Drop one octave when wrapping past C: `C-5` becomes `B#4`.
    OctaveAware,
}

/// Re-spell a single-flat pitch name as a sharp, keeping the octave verbatim.
///
/// Names without a flat marker are returned unchanged.
pub fn normalize(raw: &str) -> String {
    normalize_with(raw, FlatSpelling::Literal)
}

/// Re-spell a single-flat pitch name as a sharp using the given octave policy.
///
/// Only the `<letter>-<octave>` form is rewritten. Anything else, double
/// flats included, passes through untouched and will fail the instrument
/// lookup later on.
pub fn normalize_with(raw: &str, spelling: FlatSpelling) -> String {
    let mut chars = raw.chars();
    let (letter, rest) = match (chars.next(), chars.as_str().strip_prefix('-')) {
        (Some(letter), Some(rest)) if !rest.starts_with('-') => (letter, rest),
        _ => return raw.to_string(),
    };
    let index = match NATURALS.iter().position(|&n| n == letter) {
        Some(index) => index,
        None => return raw.to_string(),
    };

    let below = NATURALS[(index + NATURALS.len() - 1) % NATURALS.len()];
    let wraps = index == 0;
    let octave = match (spelling, wraps, rest.parse::<i32>()) {
        (FlatSpelling::OctaveAware, true, Ok(octave)) => (octave - 1).to_string(),
        _ => rest.to_string(),
    };

    format!("{below}#{octave}")
}
