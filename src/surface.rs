//! Render surface handles

use crate::Viewport;
use std::sync::Arc;

/// A handle to a rendered visual subtree
///
/// The surface is an HTML document plus an optional CSS selector naming the
/// subtree to capture; without a selector the whole `<body>` is captured.
/// Cloning is cheap: the markup is shared, so the exporter can hand a clone
/// to the capture worker and drop it when the call ends.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    html: Arc<str>,
    selector: Option<String>,
    origin: Option<String>,
    viewport: Viewport,
}

impl RenderSurface {
    pub fn from_html(html: impl Into<Arc<str>>) -> Self {
        Self {
            html: html.into(),
            selector: None,
            origin: None,
            viewport: Viewport::default(),
        }
    }

    /// Capture only the first element matching `selector`
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Origin the document was served from (e.g. `https://app.example`).
    /// Image sources are checked against it for cross-origin capture.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
