//! The caller-facing export pipeline
//!
//! One `export` call walks `idle → capturing → paginating → done`, or ends in
//! `failed`. Capture runs on a blocking worker; saving goes through an async
//! [`DocumentSink`]. Nothing outlives the call except the saved document.

use crate::notify::{LogNotifier, Notification, Notifier, EXPORT_SUCCEEDED};
use crate::paginate::paginate;
use crate::pdf::{self, ImagePayload};
use crate::{CaptureOptions, Error, ExportConfig, RasterSnapshot, RenderSurface, Renderer, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type StatusHandler = Arc<dyn Fn(&ExportJob) + Send + Sync>;

/// Stage of an export call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Capturing,
    Paginating,
    Done,
    Failed,
}

/// State of a single export invocation
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub filename: String,
    pub status: JobStatus,
    /// Set once the document has been saved
    pub page_count: Option<usize>,
    /// Diagnostic for a failed job
    pub failure: Option<String>,
}

impl ExportJob {
    fn new(filename: String) -> Self {
        Self {
            filename,
            status: JobStatus::Idle,
            page_count: None,
            failure: None,
        }
    }

    /// True while the job is capturing or paginating
    pub fn is_exporting(&self) -> bool {
        matches!(self.status, JobStatus::Capturing | JobStatus::Paginating)
    }
}

/// Result of a successful export
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub job: ExportJob,
    /// Where the sink stored the document
    pub path: PathBuf,
    pub page_count: usize,
    pub size_bytes: usize,
}

/// Destination for finished documents
pub trait DocumentSink: Send + Sync {
    /// Persist `bytes` under `filename` and return where it landed.
    fn save<'a>(&'a self, filename: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<PathBuf>>;
}

/// Sink writing documents into a directory
///
/// Data goes to `<filename>.part` first and is renamed into place, so a
/// failed write never leaves a truncated document under the final name.
#[derive(Debug, Clone)]
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for FsSink {
    fn save<'a>(&'a self, filename: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<PathBuf>> {
        async move {
            tokio::fs::create_dir_all(&self.dir).await?;
            let target = self.dir.join(filename);
            let partial = self.dir.join(format!("{}.part", filename));

            let written = match tokio::fs::write(&partial, &bytes).await {
                Ok(()) => tokio::fs::rename(&partial, &target).await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(Error::SaveError(format!("{}: {}", target.display(), e)));
            }
            Ok(target)
        }
        .boxed()
    }
}

/// Sink keeping documents in memory, keyed by filename
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved documents, oldest first
    pub fn documents(&self) -> Vec<(String, Vec<u8>)> {
        match self.documents.lock() {
            Ok(docs) => docs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DocumentSink for MemorySink {
    fn save<'a>(&'a self, filename: &'a str, bytes: Vec<u8>) -> BoxFuture<'a, Result<PathBuf>> {
        async move {
            let mut docs = self
                .documents
                .lock()
                .map_err(|_| Error::SaveError("memory sink lock poisoned".into()))?;
            docs.push((filename.to_string(), bytes));
            Ok(PathBuf::from(filename))
        }
        .boxed()
    }
}

/// Resets the busy flag when dropped, whichever way the call exits
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn engage(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Pick the filename for a job: trimmed, defaulted when empty, and reduced to
/// its last path component.
pub fn resolve_filename(requested: Option<&str>, default: &str) -> String {
    let candidate = requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default);
    Path::new(candidate)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

fn check_raster_limit(snapshot: &RasterSnapshot, options: &CaptureOptions) -> Result<()> {
    if snapshot.height > options.max_raster_height {
        return Err(Error::ContentTooLarge {
            height: u64::from(snapshot.height),
            max: options.max_raster_height,
        });
    }
    Ok(())
}

/// Exports render surfaces as paginated PDF documents
///
/// Each exporter owns its busy flag, so independent exporters never share
/// state. Preventing overlapping calls on one exporter is up to the caller,
/// typically by disabling the trigger while [`Exporter::is_exporting`] is true.
pub struct Exporter {
    renderer: Arc<dyn Renderer>,
    config: ExportConfig,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn DocumentSink>,
    busy: Arc<AtomicBool>,
    on_status: Option<StatusHandler>,
}

impl Exporter {
    /// Create an exporter writing into `config.output_dir` and notifying via `log`.
    pub fn new(renderer: Arc<dyn Renderer>, config: ExportConfig) -> Result<Self> {
        config.validate()?;
        let sink = Arc::new(FsSink::new(config.output_dir.clone()));
        Ok(Self {
            renderer,
            config,
            notifier: Arc::new(LogNotifier),
            sink,
            busy: Arc::new(AtomicBool::new(false)),
            on_status: None,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Register a callback invoked on every job status transition.
    pub fn on_status<F>(&mut self, cb: F)
    where
        F: Fn(&ExportJob) + Send + Sync + 'static,
    {
        self.on_status = Some(Arc::new(cb));
    }

    pub fn clear_on_status(&mut self) {
        self.on_status = None;
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Whether an export call is currently in flight
    pub fn is_exporting(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Shared handle to the busy flag, for observers outside the call
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.busy)
    }

    /// Capture `surface`, paginate it and save it as `filename`
    /// (`report.pdf` by default).
    ///
    /// A missing surface fails immediately with [`Error::NoContent`] without
    /// touching the renderer. Every outcome is reported to the notifier
    /// exactly once.
    pub async fn export(
        &self,
        surface: Option<&RenderSurface>,
        filename: Option<&str>,
    ) -> Result<ExportOutcome> {
        let mut job = ExportJob::new(resolve_filename(filename, &self.config.default_filename));

        let Some(surface) = surface else {
            let err = Error::NoContent;
            log::warn!("PDF export of {} skipped: {}", job.filename, err);
            self.fail(&mut job, &err);
            return Err(err);
        };

        let _busy = BusyGuard::engage(&self.busy);
        match self.run(&mut job, surface).await {
            Ok(outcome) => {
                self.notifier.notify(&Notification::success(EXPORT_SUCCEEDED));
                Ok(outcome)
            }
            Err(err) => {
                log::error!("PDF export of {} failed: {}", job.filename, err);
                self.fail(&mut job, &err);
                Err(err)
            }
        }
    }

    async fn run(&self, job: &mut ExportJob, surface: &RenderSurface) -> Result<ExportOutcome> {
        self.transition(job, JobStatus::Capturing);
        let snapshot = self.capture(surface).await?;
        check_raster_limit(&snapshot, &self.config.capture)?;

        self.transition(job, JobStatus::Paginating);
        let pagination = paginate(snapshot.width, snapshot.height, &self.config.page)?;
        let payload = ImagePayload::encode(&snapshot)?;
        drop(snapshot);
        let bytes = pdf::assemble(payload, &pagination, &self.config.page, &job.filename)?;
        let size_bytes = bytes.len();
        let path = self.sink.save(&job.filename, bytes).await?;

        let page_count = pagination.page_count();
        job.page_count = Some(page_count);
        self.transition(job, JobStatus::Done);
        log::info!(
            "exported {} ({} page(s), {} bytes) to {}",
            job.filename,
            page_count,
            size_bytes,
            path.display()
        );

        Ok(ExportOutcome {
            job: job.clone(),
            path,
            page_count,
            size_bytes,
        })
    }

    async fn capture(&self, surface: &RenderSurface) -> Result<RasterSnapshot> {
        let renderer = Arc::clone(&self.renderer);
        let surface = surface.clone();
        let options = self.config.capture.clone();
        tokio::task::spawn_blocking(move || renderer.capture(&surface, &options))
            .await
            .map_err(|e| Error::CaptureError(format!("capture worker failed: {}", e)))?
    }

    fn fail(&self, job: &mut ExportJob, err: &Error) {
        job.failure = Some(err.to_string());
        self.transition(job, JobStatus::Failed);
        self.notifier.notify(&Notification::error(err.user_message()));
    }

    fn transition(&self, job: &mut ExportJob, next: JobStatus) {
        log::debug!("export {}: {:?} -> {:?}", job.filename, job.status, next);
        job.status = next;
        if let Some(cb) = &self.on_status {
            cb(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_defaults_and_strips_directories() {
        assert_eq!(resolve_filename(None, "report.pdf"), "report.pdf");
        assert_eq!(resolve_filename(Some("   "), "report.pdf"), "report.pdf");
        assert_eq!(resolve_filename(Some(" q3.pdf "), "report.pdf"), "q3.pdf");
        assert_eq!(resolve_filename(Some("../../etc/x.pdf"), "report.pdf"), "x.pdf");
        assert_eq!(resolve_filename(Some(".."), "report.pdf"), "report.pdf");
    }

    #[test]
    fn busy_guard_resets_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        {
            let _g = BusyGuard::engage(&flag);
            assert!(flag.load(Ordering::SeqCst));
        }
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn job_reports_exporting_only_mid_pipeline() {
        let mut job = ExportJob::new("a.pdf".into());
        assert!(!job.is_exporting());
        for (status, busy) in [
            (JobStatus::Capturing, true),
            (JobStatus::Paginating, true),
            (JobStatus::Done, false),
            (JobStatus::Failed, false),
        ] {
            job.status = status;
            assert_eq!(job.is_exporting(), busy);
        }
    }

    #[tokio::test]
    async fn fs_sink_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(dir.path());
        let path = sink.save("out.pdf", b"%PDF-1.5".to_vec()).await.unwrap();
        assert_eq!(path, dir.path().join("out.pdf"));
        assert!(!dir.path().join("out.pdf.part").exists());
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.5");
    }
}
