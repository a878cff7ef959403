//! RFox Export
//!
//! Captures a rendered report surface as a raster snapshot and exports it as a
//! paginated PDF document.
//!
//! # Pipeline
//!
//! - **Capture**: a [`Renderer`] rasterizes a [`RenderSurface`] at its full
//!   scroll extent. The default backend ([`HtmlRenderer`], feature `html`)
//!   lays out and paints HTML without a browser.
//! - **Pagination**: [`paginate`] slices the snapshot into fixed-size pages
//!   preserving the aspect ratio.
//! - **Export**: [`Exporter`] drives the whole call, saves the document and
//!   reports success or failure through a [`Notifier`].
//!
//! # Example
//!
//! ```no_run
//! use rfexport::{ExportConfig, RenderSurface};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = rfexport::new_exporter(ExportConfig::default())?;
//! let surface = RenderSurface::from_html("<body><h1>Report</h1><p>Findings</p></body>");
//! let outcome = exporter.export(Some(&surface), Some("report.pdf")).await?;
//! println!("{} pages written to {}", outcome.page_count, outcome.path.display());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub mod error;
pub use error::{Error, Result};

pub mod export;
pub mod notify;
pub mod paginate;
pub mod pdf;
pub mod snapshot;
pub mod surface;

// Pure-rust HTML capture backend (layout, paint, raster)
#[cfg(feature = "html")]
pub mod capture;
#[cfg(feature = "html")]
pub mod rendering;

pub use export::{DocumentSink, ExportJob, ExportOutcome, Exporter, FsSink, JobStatus, MemorySink};
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier};
pub use paginate::{paginate, PageGeometry, PagePlacement, Pagination, PaperSize, Unit};
pub use snapshot::RasterSnapshot;
pub use surface::RenderSurface;

#[cfg(feature = "html")]
pub use capture::HtmlRenderer;

/// Configuration for an export call
///
/// The defaults reproduce the report screen: A4 portrait pages, a 2x capture
/// scale and the dark application background.
///
/// # Examples
///
/// ```
/// let cfg = rfexport::ExportConfig::default();
/// assert_eq!(cfg.default_filename, "report.pdf");
/// assert_eq!(cfg.capture.scale, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Physical page size of the output document
    pub page: PageGeometry,
    /// Options forwarded to the capture engine
    pub capture: CaptureOptions,
    /// Filename used when the caller supplies none
    pub default_filename: String,
    /// Directory the filesystem sink writes into
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            capture: CaptureOptions::default(),
            default_filename: "report.pdf".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExportConfig {
    /// Load a configuration from a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: ExportConfig =
            serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        self.capture.validate()?;
        if self.default_filename.trim().is_empty() {
            return Err(Error::ConfigError("default filename must not be empty".into()));
        }
        Ok(())
    }
}

/// Largest accepted capture scale factor
pub const MAX_SCALE: u32 = 8;

/// Options for a single capture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Resolution multiplier applied once at capture time
    pub scale: u32,
    /// Fill color behind the surface; should match the surface theme
    pub background: Color,
    /// Whether images from other origins may be captured
    pub use_cors: bool,
    /// Largest raster height (after scaling) a capture may produce
    pub max_raster_height: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 2,
            background: Color::rgb(0x0a, 0x0a, 0x0a),
            use_cors: true,
            max_raster_height: 32_767,
        }
    }
}

impl CaptureOptions {
    pub fn validate(&self) -> Result<()> {
        if self.scale == 0 || self.scale > MAX_SCALE {
            return Err(Error::ConfigError(format!(
                "capture scale must be between 1 and {}, got {}",
                MAX_SCALE, self.scale
            )));
        }
        if self.max_raster_height == 0 {
            return Err(Error::ConfigError("max_raster_height must be positive".into()));
        }
        Ok(())
    }
}

/// Viewport dimensions of the surface host, in CSS pixels
///
/// Only the width constrains layout; content taller than `height` is still
/// captured in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 794,
            height: 1123,
        }
    }
}

/// An opaque sRGB color, written as `#RRGGBB` in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Relative luminance in `[0, 1]` (ITU-R BT.709 weights, no gamma)
    pub fn luminance(&self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }

    pub fn to_rgba(self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, 255)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || Error::ConfigError(format!("invalid color `{}`, expected #RRGGBB", s));
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
                Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            3 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| bad())
                };
                Ok(Color::rgb(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// Capture engine abstraction
///
/// Implementations rasterize a surface at its full scroll extent. They run on
/// a blocking worker thread, so they may do CPU-heavy work synchronously.
pub trait Renderer: Send + Sync {
    /// Rasterize `surface`. Either a complete snapshot is returned or an
    /// error; partial snapshots are never produced.
    fn capture(&self, surface: &RenderSurface, options: &CaptureOptions) -> Result<RasterSnapshot>;
}

/// Create the default capture backend
#[cfg(feature = "html")]
pub fn new_renderer() -> std::sync::Arc<dyn Renderer> {
    std::sync::Arc::new(HtmlRenderer::new())
}

/// Create an exporter backed by the default renderer, a filesystem sink
/// rooted at `config.output_dir` and a log-based notifier.
#[cfg(feature = "html")]
pub fn new_exporter(config: ExportConfig) -> Result<Exporter> {
    Exporter::new(new_renderer(), config)
}
