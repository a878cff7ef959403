#![cfg(feature = "html")]

use lopdf::Document;
use rfexport::{
    CaptureOptions, Color, Error, ExportConfig, Exporter, HtmlRenderer, MemorySink,
    RecordingNotifier, RenderSurface, Renderer, Viewport,
};
use std::sync::Arc;

const REPORT: &str = r#"<!DOCTYPE html>
<html>
<head><title>Scan Report</title><style>body { background: #0a0a0a; }</style></head>
<body>
  <nav>Back</nav>
  <main id="report">
    <h1>Analysis Summary</h1>
    <p>Three documents were processed.</p>
    <ul><li>Invoice</li><li>Receipt</li><li>Contract</li></ul>
    <hr>
    <img src="/assets/chart.png" width="200" height="120">
  </main>
</body>
</html>"#;

fn opts() -> CaptureOptions {
    CaptureOptions::default()
}

fn viewport(width: u32) -> Viewport {
    Viewport { width, height: 200 }
}

#[test]
fn snapshot_is_scaled_from_scroll_extent() {
    let r = HtmlRenderer::new();
    let surface = RenderSurface::from_html(REPORT).with_viewport(viewport(320));

    let one = r
        .capture(&surface, &CaptureOptions { scale: 1, ..opts() })
        .unwrap();
    let two = r.capture(&surface, &opts()).unwrap();
    assert_eq!(one.width, 320);
    assert_eq!((two.width, two.height), (one.width * 2, one.height * 2));
    assert_eq!(two.scale, 2);
    assert_eq!(&two.png_data[0..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn tall_content_is_captured_beyond_the_viewport() {
    let body: String = (0..80).map(|i| format!("<p>Line item {}</p>", i)).collect();
    let surface = RenderSurface::from_html(format!("<body>{}</body>", body))
        .with_viewport(Viewport { width: 300, height: 100 });
    let snap = HtmlRenderer::new()
        .capture(&surface, &CaptureOptions { scale: 1, ..opts() })
        .unwrap();
    assert!(snap.height > 100 * 10, "height {} looks clipped", snap.height);
}

#[test]
fn background_fill_matches_theme() {
    let surface = RenderSurface::from_html(REPORT).with_viewport(viewport(320));
    let snap = HtmlRenderer::new().capture(&surface, &opts()).unwrap();
    let rgb = snap.decode_rgb().unwrap();
    assert_eq!(rgb.get_pixel(0, 0).0, [10, 10, 10]);
    // light glyphs were painted on the dark background
    assert!(rgb.pixels().any(|p| p.0 == [0xf5, 0xf5, 0xf5]));

    let light = CaptureOptions {
        background: Color::rgb(255, 255, 255),
        ..opts()
    };
    let rgb = HtmlRenderer::new()
        .capture(&surface, &light)
        .unwrap()
        .decode_rgb()
        .unwrap();
    assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
    assert!(rgb.pixels().any(|p| p.0 == [0, 0, 0]));
}

#[test]
fn selector_limits_capture_to_subtree() {
    let whole = RenderSurface::from_html(REPORT).with_viewport(viewport(320));
    let section = whole.clone().with_selector("#report");
    let r = HtmlRenderer::new();
    let a = r.capture(&whole, &opts()).unwrap();
    let b = r.capture(&section, &opts()).unwrap();
    // the <nav> paragraph is outside #report
    assert!(b.height < a.height);
}

#[test]
fn detached_surface_fails_capture() {
    let surface = RenderSurface::from_html(REPORT).with_selector("#missing");
    let err = HtmlRenderer::new().capture(&surface, &opts()).unwrap_err();
    assert!(matches!(err, Error::CaptureError(_)));
}

#[test]
fn cross_origin_images_need_cors() {
    let html = r#"<body><img src="https://cdn.example/logo.png"></body>"#;
    let surface = RenderSurface::from_html(html).with_origin("https://app.example");
    let r = HtmlRenderer::new();

    let strict = CaptureOptions {
        use_cors: false,
        ..opts()
    };
    assert!(matches!(r.capture(&surface, &strict), Err(Error::CaptureError(_))));
    assert!(r.capture(&surface, &opts()).is_ok());

    // protocol-relative sources resolve against the surface origin
    let cdn = RenderSurface::from_html(r#"<body><img src="//cdn.example/logo.png"></body>"#)
        .with_origin("https://app.example");
    assert!(matches!(r.capture(&cdn, &strict), Err(Error::CaptureError(_))));
    assert!(r.capture(&cdn, &opts()).is_ok());

    // same-origin images are fine either way
    let local = RenderSurface::from_html(REPORT).with_origin("https://app.example");
    assert!(r.capture(&local, &strict).is_ok());
}

#[test]
fn unsupported_content_fails_capture() {
    let surface = RenderSurface::from_html("<body><p>x</p><video src=\"a.mp4\"></video></body>");
    let err = HtmlRenderer::new().capture(&surface, &opts()).unwrap_err();
    assert!(matches!(err, Error::CaptureError(_)));
}

#[test]
fn oversized_content_is_refused_before_painting() {
    let body: String = (0..200).map(|i| format!("<p>Row {}</p>", i)).collect();
    let surface = RenderSurface::from_html(format!("<body>{}</body>", body));
    let small = CaptureOptions {
        max_raster_height: 500,
        ..opts()
    };
    let err = HtmlRenderer::new().capture(&surface, &small).unwrap_err();
    assert!(matches!(err, Error::ContentTooLarge { max: 500, .. }));
}

#[test]
fn huge_image_attributes_fail_instead_of_wrapping() {
    let r = HtmlRenderer::new();

    let wide = RenderSurface::from_html(r#"<body><img width="4294967295" height="10"></body>"#);
    assert!(matches!(r.capture(&wide, &opts()), Err(Error::CaptureError(_))));

    let tall = RenderSurface::from_html(
        r#"<body><img height="3000000000"><img height="3000000000"></body>"#,
    );
    assert!(matches!(
        r.capture(&tall, &opts()),
        Err(Error::ContentTooLarge { max: 32_767, .. })
    ));
}

#[test]
fn raster_wider_than_limit_is_refused() {
    // 20000 css px fits the layout but not the raster at 2x
    let surface = RenderSurface::from_html(r#"<body><img width="20000" height="10"></body>"#);
    let err = HtmlRenderer::new().capture(&surface, &opts()).unwrap_err();
    assert!(matches!(err, Error::CaptureError(ref msg) if msg.contains("width")));
}

#[test]
fn tall_image_attribute_hits_the_height_guard() {
    let surface = RenderSurface::from_html(r#"<body><img height="20000"></body>"#);
    let err = HtmlRenderer::new().capture(&surface, &opts()).unwrap_err();
    assert!(matches!(err, Error::ContentTooLarge { max: 32_767, .. }));
}

#[test]
fn capture_is_deterministic() {
    let surface = RenderSurface::from_html(REPORT);
    let r = HtmlRenderer::new();
    let a = r.capture(&surface, &opts()).unwrap();
    let b = r.capture(&surface, &opts()).unwrap();
    assert_eq!(a.png_data, b.png_data);
}

#[tokio::test]
async fn html_report_exports_end_to_end() {
    let body: String = (0..120)
        .map(|i| format!("<p>Finding {}: document processed without errors.</p>", i))
        .collect();
    let surface = RenderSurface::from_html(format!("<body><h1>Report</h1>{}</body>", body))
        .with_viewport(Viewport { width: 600, height: 800 });

    let notifier = Arc::new(RecordingNotifier::new());
    let sink = Arc::new(MemorySink::new());
    let exporter = Exporter::new(Arc::new(HtmlRenderer::new()), ExportConfig::default())
        .unwrap()
        .with_notifier(notifier.clone())
        .with_sink(sink.clone());

    let outcome = exporter
        .export(Some(&surface), Some("scan-report.pdf"))
        .await
        .unwrap();
    assert!(outcome.page_count > 1);

    let docs = sink.documents();
    assert_eq!(docs[0].0, "scan-report.pdf");
    let doc = Document::load_mem(&docs[0].1).unwrap();
    assert_eq!(doc.get_pages().len(), outcome.page_count);
    assert_eq!(notifier.events().len(), 1);
}

#[tokio::test]
async fn fs_export_writes_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        output_dir: dir.path().to_path_buf(),
        ..ExportConfig::default()
    };
    let exporter = rfexport::new_exporter(config).unwrap();
    let surface = RenderSurface::from_html(REPORT);

    let outcome = exporter.export(Some(&surface), None).await.unwrap();
    assert_eq!(outcome.path, dir.path().join("report.pdf"));
    let bytes = std::fs::read(&outcome.path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}
