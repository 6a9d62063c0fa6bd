use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use imgcompare::{Tolerance, ToleranceError};

use crate::config::SvgConfig;

fn parse_tolerance(s: &str) -> Result<Tolerance, ToleranceError> {
    s.parse()
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line: `Comparison result: ...`
    #[default]
    Text,
    /// The outcome as a JSON object
    Json,
}

#[derive(Parser)]
#[command(
    name = "imgcompare",
    version,
    about = "Compare two images pixel by pixel and highlight the differences (exit 0 = match, 1 = differ)"
)]
pub struct Cli {
    /// Path to the base image (PNG, JPEG or SVG)
    #[arg(long)]
    pub base: PathBuf,

    /// Path to the image to compare against the base
    #[arg(long)]
    pub compare: PathBuf,

    /// Max share of mismatched pixels in percent (overrides config). 0 = exact match only.
    #[arg(long, value_parser = parse_tolerance)]
    pub tolerance: Option<Tolerance>,

    /// Remove converted SVG renders and the highlight image after reporting
    #[arg(long)]
    pub clean: bool,

    /// How to print the result
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Config file (default: ./imgcompare.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub svg: SvgConfig,
}
