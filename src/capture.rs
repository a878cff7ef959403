//! HtmlRenderer: pure-Rust capture backend for HTML surfaces.
//!
//! Parses the surface markup, lays out the selected subtree at its full
//! scroll extent and rasterizes it at the requested scale.

use crate::rendering::{layout, paint, raster};
use crate::{CaptureOptions, Error, RasterSnapshot, RenderSurface, Renderer, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Widest raster the backend will allocate, in pixels
pub const MAX_RASTER_WIDTH: u32 = 32_767;

/// Capture backend rendering HTML without a browser
#[derive(Debug, Default, Clone)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        HtmlRenderer
    }
}

impl Renderer for HtmlRenderer {
    fn capture(&self, surface: &RenderSurface, options: &CaptureOptions) -> Result<RasterSnapshot> {
        options.validate()?;
        let document = Html::parse_document(surface.html());
        let root = resolve_root(&document, surface.selector())?;

        let origin = surface
            .origin()
            .map(|o| {
                Url::parse(o).map_err(|e| Error::CaptureError(format!("invalid surface origin `{}`: {}", o, e)))
            })
            .transpose()?;
        check_image_origins(root, origin.as_ref(), options.use_cors)?;

        let layout = layout::layout_subtree(root, surface.viewport()).map_err(|e| match e {
            Error::ContentTooLarge { height, .. } => Error::ContentTooLarge {
                height: height.saturating_mul(u64::from(options.scale)),
                max: options.max_raster_height,
            },
            other => other,
        })?;
        let raster_height = u64::from(layout.scroll_height) * u64::from(options.scale);
        if raster_height > u64::from(options.max_raster_height) {
            return Err(Error::ContentTooLarge {
                height: raster_height,
                max: options.max_raster_height,
            });
        }
        let raster_width = u64::from(layout.scroll_width) * u64::from(options.scale);
        if raster_width > u64::from(MAX_RASTER_WIDTH) {
            return Err(Error::CaptureError(format!(
                "raster width {}px exceeds the {}px limit",
                raster_width, MAX_RASTER_WIDTH
            )));
        }

        log::debug!(
            "capturing {} box(es), extent {}x{} css px at {}x",
            layout.nodes.len(),
            layout.scroll_width,
            layout.scroll_height,
            options.scale
        );

        let palette = paint::Palette::for_background(options.background);
        let commands = paint::build_display_list(&layout, &palette);
        let image = raster::rasterize(
            &commands,
            layout.scroll_width,
            layout.scroll_height,
            options.scale,
            palette.background,
        );
        RasterSnapshot::from_image(&image, options.scale)
    }
}

/// Find the subtree to capture: the first selector match, or `<body>`.
fn resolve_root<'a>(document: &'a Html, selector: Option<&str>) -> Result<ElementRef<'a>> {
    match selector {
        Some(sel) => {
            let parsed = Selector::parse(sel)
                .map_err(|e| Error::CaptureError(format!("invalid surface selector `{}`: {:?}", sel, e)))?;
            document.select(&parsed).next().ok_or_else(|| {
                Error::CaptureError(format!("surface `{}` is not mounted in the document", sel))
            })
        }
        None => {
            let body = Selector::parse("body")
                .map_err(|e| Error::CaptureError(format!("body selector: {:?}", e)))?;
            Ok(document
                .select(&body)
                .next()
                .unwrap_or_else(|| document.root_element()))
        }
    }
}

/// Whether `src` loads from a different origin than the surface.
///
/// Sources are resolved against the surface origin first, so relative and
/// protocol-relative references compare by their effective origin. `data:`
/// and `blob:` sources are same-origin. Without a surface origin any absolute
/// or protocol-relative network source counts as cross-origin.
fn is_cross_origin(src: &str, origin: Option<&Url>) -> bool {
    let src = src.trim();
    let resolved = match origin {
        Some(base) => base.join(src),
        None => Url::parse(src),
    };
    match resolved {
        Ok(url) => match url.scheme() {
            "data" | "blob" => false,
            _ => match origin {
                Some(base) => url.origin() != base.origin(),
                None => true,
            },
        },
        Err(_) => src.starts_with("//"),
    }
}

fn check_image_origins(root: ElementRef<'_>, origin: Option<&Url>, use_cors: bool) -> Result<()> {
    if use_cors {
        return Ok(());
    }
    for node in root.descendants() {
        let Some(el) = ElementRef::wrap(node) else { continue };
        if el.value().name() != "img" {
            continue;
        }
        if let Some(src) = el.value().attr("src") {
            if is_cross_origin(src, origin) {
                return Err(Error::CaptureError(format!(
                    "cross-origin image `{}` cannot be captured without CORS",
                    src
                )));
            }
        }
    }
    Ok(())
}
