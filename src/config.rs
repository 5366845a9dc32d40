//! Run configuration: quantization, instrument and page settings.
//!
//! Every field has a default, so a configuration file only needs the
//! values it changes:
//!
//! ```json
//! {
//!   "quantize": { "ticks_per_measure": 16 },
//!   "page": { "page_width": 210.0, "page_height": 297.0 },
//!   "output_prefix": "lullaby"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{InstrumentProfile, PageLayoutParams};
use crate::quantize::QuantizeConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quantize: QuantizeConfig,
    pub instrument: InstrumentProfile,
    pub page: PageLayoutParams,
    /// Printed on every stave. Falls back to the score title, then to
    /// the output prefix.
    pub title: Option<String>,
    /// Output files are named `{output_prefix}_{page}.svg`.
    pub output_prefix: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            quantize: QuantizeConfig::default(),
            instrument: InstrumentProfile::default(),
            page: PageLayoutParams::default(),
            title: None,
            output_prefix: "carillon".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Config::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Config> {
        serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantize.ticks_per_measure < 1 {
            return Err(Error::Config("ticks_per_measure must be at least 1".to_string()));
        }
        if self.output_prefix.trim().is_empty() {
            return Err(Error::Config("output_prefix must not be empty".to_string()));
        }
        self.instrument.validate()?;
        self.page.validate()
    }

    /// Title printed on the staves of `score_title`'s score.
    pub fn title_for(&self, score_title: Option<&str>) -> String {
        self.title
            .as_deref()
            .or(score_title)
            .unwrap_or(&self.output_prefix)
            .to_string()
    }
}
