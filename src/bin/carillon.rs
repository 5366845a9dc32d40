//! `carillon` turns a MusicXML score into printable punch strips.

use std::path::PathBuf;

use anyhow::Context;
use carillon::{punch_score, svg, timeline_to_json, Config, FlatSpelling};
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Score to convert (.musicxml, .xml or .mxl)
    input: PathBuf,

    /// JSON configuration file; flags below override its values
    #[clap(short = 'c', long, value_parser)]
    config: Option<PathBuf>,

    /// Output file prefix; pages are written as PREFIX_0.svg, PREFIX_1.svg, ...
    #[clap(short = 'o', long, value_parser)]
    output: Option<String>,

    /// Directory the pages are written to
    #[clap(short = 'd', long, value_parser, default_value = ".")]
    out_dir: PathBuf,

    /// Title printed on every stave (defaults to the score title)
    #[clap(short = 't', long, value_parser)]
    title: Option<String>,

    /// Ticks per measure
    #[clap(long, value_parser)]
    ticks: Option<u32>,

    /// Drop one octave when re-spelling C-flat as B-sharp
    #[clap(long, value_parser)]
    octave_aware_flats: bool,

    /// Print the quantized timeline as JSON instead of writing pages
    #[clap(long, value_parser)]
    dump_timeline: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(ref output) = self.output {
            config.output_prefix = output.clone();
        }
        if self.title.is_some() {
            config.title = self.title.clone();
        }
        if let Some(ticks) = self.ticks {
            config.quantize.ticks_per_measure = ticks;
        }
        if self.octave_aware_flats {
            config.quantize.flat_spelling = FlatSpelling::OctaveAware;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config()?;

    let score = carillon::parse_file(&args.input)
        .with_context(|| format!("while reading {}", args.input.display()))?;

    if args.dump_timeline {
        let timeline = carillon::score_to_timeline(&score, &config.quantize)?;
        println!("{}", timeline_to_json(&timeline)?);
        return Ok(());
    }

    let pages = punch_score(&score, &config)?;
    for path in svg::write_pages(&pages, &args.out_dir, &config.output_prefix)? {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
