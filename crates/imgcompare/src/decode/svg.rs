use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::error::CompareError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_WINDOW: (u32, u32) = (1366, 768);

/// Rasterizes an SVG file to a PNG the decoder can read.
pub trait SvgRenderer: Send + Sync {
    /// Returns the path of the written PNG.
    fn convert(&self, svg_path: &Path) -> Result<PathBuf, CompareError>;
}

/// Where the PNG for `svg_path` is written: same directory, `.png` extension.
pub fn converted_png_path(svg_path: &Path) -> PathBuf {
    svg_path.with_extension("png")
}

/// Renders SVGs with a local headless Chrome/Chromium (`--screenshot`).
///
/// `convert` blocks on `runtime`, so call it from a blocking thread
/// (e.g. inside `spawn_blocking`), never from async code.
pub struct ChromeRenderer {
    /// None means search the usual install locations at first use.
    chrome: Option<String>,
    window: (u32, u32),
    timeout: Duration,
    runtime: Handle,
}

impl ChromeRenderer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            chrome: None,
            window: DEFAULT_WINDOW,
            timeout: DEFAULT_TIMEOUT,
            runtime,
        }
    }

    pub fn with_chrome(mut self, chrome: impl Into<String>) -> Self {
        self.chrome = Some(chrome.into());
        self
    }

    pub fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window = (width, height);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn render(&self, svg_path: &Path) -> Result<PathBuf, CompareError> {
        let absolute = std::fs::canonicalize(svg_path)
            .map_err(|e| CompareError::io("resolve", svg_path, e))?;
        let chrome = match &self.chrome {
            Some(chrome) => chrome.clone(),
            None => find_chrome().map_err(|reason| CompareError::Render {
                path: svg_path.to_path_buf(),
                reason,
            })?,
        };
        let png_path = converted_png_path(&absolute);

        // Fresh profile per conversion.
        let data_dir = tempfile::tempdir()
            .map_err(|e| CompareError::io("create Chrome profile for", svg_path, e))?;

        info!(svg = %svg_path.display(), chrome = %chrome, "converting SVG to PNG");
        let (width, height) = self.window;
        let mut command = Command::new(&chrome);
        command
            .args([
                "--headless=new",
                "--disable-gpu",
                "--no-first-run",
                "--no-default-browser-check",
                "--disable-extensions",
                "--hide-scrollbars",
                "--mute-audio",
            ])
            .arg(format!("--user-data-dir={}", data_dir.path().display()))
            .arg(format!("--window-size={width},{height}"))
            .arg(format!("--screenshot={}", png_path.display()))
            .arg(format!("file://{}", absolute.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CompareError::Timeout {
                path: svg_path.to_path_buf(),
                timeout: self.timeout,
            })?
            .map_err(|e| CompareError::io("launch Chrome for", svg_path, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.lines().last().unwrap_or("").trim();
            return Err(CompareError::Render {
                path: svg_path.to_path_buf(),
                reason: format!("Chrome exited with {}: {last}", output.status),
            });
        }
        if !png_path.exists() {
            return Err(CompareError::Render {
                path: svg_path.to_path_buf(),
                reason: "Chrome wrote no screenshot".to_string(),
            });
        }

        debug!(png = %png_path.display(), "SVG converted");
        Ok(png_path)
    }
}

impl SvgRenderer for ChromeRenderer {
    fn convert(&self, svg_path: &Path) -> Result<PathBuf, CompareError> {
        self.runtime.block_on(self.render(svg_path))
    }
}

const CHROME_NAMES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

const MACOS_APPS: [&str; 2] = [
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

/// Locate Chrome: the macOS app bundles, then each `PATH` entry.
fn find_chrome() -> Result<String, String> {
    if cfg!(target_os = "macos")
        && let Some(app) = MACOS_APPS.iter().find(|app| Path::new(app).is_file())
    {
        return Ok(app.to_string());
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    search_path(&path_var, &CHROME_NAMES)
        .map(|p| p.display().to_string())
        .ok_or_else(|| format!("Chrome not found on PATH. Tried: {}", CHROME_NAMES.join(", ")))
}

/// First `name` found as a file in the directories of `path_var`, in order.
fn search_path(path_var: &OsStr, names: &[&str]) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}
