use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use imgcompare::Tolerance;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "imgcompare.toml";

const DEFAULT_SVG_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SVG_WINDOW: (u32, u32) = (1366, 768);

/// How SVG inputs are rasterized.
///
/// Fields are `Option` — `None` means "use default".
/// Serves both TOML deserialization (`[svg]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, clap::Args, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SvgConfig {
    /// Chrome/Chromium binary used to rasterize SVG inputs
    #[arg(long = "chrome")]
    #[serde(default)]
    pub chrome: Option<String>,

    /// Seconds to wait for Chrome before giving up
    #[arg(long = "svg-timeout")]
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Render window width for SVG inputs
    #[arg(long = "svg-width")]
    #[serde(default)]
    pub width: Option<u32>,

    /// Render window height for SVG inputs
    #[arg(long = "svg-height")]
    #[serde(default)]
    pub height: Option<u32>,
}

impl SvgConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &SvgConfig) {
        if other.chrome.is_some() {
            self.chrome = other.chrome.clone();
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.width.is_some() {
            self.width = other.width;
        }
        if other.height.is_some() {
            self.height = other.height;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_SVG_TIMEOUT_SECS))
    }

    pub fn window(&self) -> (u32, u32) {
        (
            self.width.unwrap_or(DEFAULT_SVG_WINDOW.0),
            self.height.unwrap_or(DEFAULT_SVG_WINDOW.1),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == Some(0) {
            bail!("svg.timeout_secs must be > 0");
        }
        if self.width == Some(0) || self.height == Some(0) {
            bail!(
                "svg window has invalid dimensions ({}x{}). Both width and height must be > 0",
                self.width.unwrap_or(DEFAULT_SVG_WINDOW.0),
                self.height.unwrap_or(DEFAULT_SVG_WINDOW.1),
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub svg: SvgConfig,
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: FileConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Load `explicit`, or `./imgcompare.toml` when it exists, or defaults.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    match explicit {
        Some(path) => read_file(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                read_file(default)
            } else {
                Ok(FileConfig::default())
            }
        }
    }
}

/// Values extracted from the CLI that participate in the merge.
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub tolerance: Option<Tolerance>,
    pub svg: SvgConfig,
}

/// Values read from `IMGCOMPARE_*` environment variables.
#[derive(Default)]
struct EnvOverrides {
    tolerance: Option<Tolerance>,
    chrome: Option<String>,
}

impl EnvOverrides {
    fn from_process() -> Result<Self> {
        let tolerance = std::env::var("IMGCOMPARE_TOLERANCE")
            .ok()
            .map(|v| v.parse::<Tolerance>())
            .transpose()
            .context("IMGCOMPARE_TOLERANCE must be a non-negative percentage")?;
        let chrome = std::env::var("IMGCOMPARE_CHROME").ok();
        Ok(Self { tolerance, chrome })
    }
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub tolerance: Tolerance,
    pub svg: SvgConfig,
}

impl ResolvedConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file = load(cli.config.as_deref())?;
        let env = EnvOverrides::from_process()?;
        Self::merge(cli, env, file)
    }

    fn merge(cli: CliOverrides, env: EnvOverrides, file: FileConfig) -> Result<Self> {
        let file_tolerance = file
            .tolerance
            .map(Tolerance::new)
            .transpose()
            .map_err(|e| anyhow::anyhow!("config: {e}"))?;

        let tolerance = cli
            .tolerance
            .or(env.tolerance)
            .or(file_tolerance)
            .unwrap_or(Tolerance::EXACT);

        // File base, then env, then CLI overlay
        let mut svg = file.svg;
        if env.chrome.is_some() {
            svg.chrome = env.chrome;
        }
        svg.merge(&cli.svg);
        svg.validate()?;

        Ok(Self { tolerance, svg })
    }
}
