use anyhow::Context;
use clap::Parser;
use rfexport::{Color, ExportConfig, PaperSize, RenderSurface, Viewport};
use std::path::PathBuf;

/// Export an HTML report as a paginated PDF
#[derive(Parser, Debug)]
#[command(name = "rfexport", version, about)]
struct Cli {
    /// HTML file containing the rendered report
    input: PathBuf,

    /// CSS selector of the subtree to capture (defaults to <body>)
    #[arg(short, long)]
    selector: Option<String>,

    /// Output filename (defaults to report.pdf)
    #[arg(short, long)]
    output: Option<String>,

    /// Directory to write the document into
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Page size: a3, a4, a5, letter or legal
    #[arg(long)]
    paper: Option<PaperSize>,

    /// Capture scale factor
    #[arg(long)]
    scale: Option<u32>,

    /// Background fill, #RRGGBB
    #[arg(long)]
    background: Option<Color>,

    /// Refuse to capture images from other origins
    #[arg(long)]
    no_cors: bool,

    /// Layout width in CSS pixels
    #[arg(long)]
    viewport_width: Option<u32>,

    /// Origin the document was served from, for cross-origin checks
    #[arg(long)]
    origin: Option<String>,

    /// JSON configuration file; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> anyhow::Result<ExportConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ExportConfig::from_json(&json)?
        }
        None => ExportConfig::default(),
    };
    if let Some(paper) = cli.paper {
        cfg.page = paper.geometry();
    }
    if let Some(scale) = cli.scale {
        cfg.capture.scale = scale;
    }
    if let Some(bg) = cli.background {
        cfg.capture.background = bg;
    }
    if cli.no_cors {
        cfg.capture.use_cors = false;
    }
    if let Some(dir) = &cli.out_dir {
        cfg.output_dir = dir.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let html = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let mut surface = RenderSurface::from_html(html);
    if let Some(sel) = &cli.selector {
        surface = surface.with_selector(sel.clone());
    }
    if let Some(origin) = &cli.origin {
        surface = surface.with_origin(origin.clone());
    }
    if let Some(width) = cli.viewport_width {
        surface = surface.with_viewport(Viewport {
            width,
            ..Viewport::default()
        });
    }

    let exporter = rfexport::new_exporter(config)?;
    let outcome = exporter
        .export(Some(&surface), cli.output.as_deref())
        .await
        .with_context(|| format!("exporting {}", cli.input.display()))?;
    println!(
        "{} ({} page(s), {} bytes)",
        outcome.path.display(),
        outcome.page_count,
        outcome.size_bytes
    );
    Ok(())
}
