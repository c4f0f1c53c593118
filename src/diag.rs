use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A structured, user-facing diagnostic event. Not persisted; it goes to
/// the log and, through the control surface, to whoever is listening.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<(String, String)>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            summary: summary.into(),
            detail: String::new(),
            evidence: Vec::new(),
        }
    }

    pub fn warning(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, summary)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_evidence(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.evidence.push((key.into(), value.into()));
        self
    }

    pub fn emit(&self) {
        match self.severity {
            Severity::Info => {
                tracing::info!(code = %self.code, detail = %self.detail, "{}", self.summary);
            }
            Severity::Warning => {
                tracing::warn!(code = %self.code, detail = %self.detail, "{}", self.summary);
            }
            Severity::Error => {
                tracing::error!(code = %self.code, detail = %self.detail, "{}", self.summary);
            }
        }
    }
}

/// Shared frame-loop counters. Cheap enough to bump every tick and safe to
/// read from any thread.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub frames_rendered: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub driver_errors: AtomicU64,
    pub hook_errors: AtomicU64,
}

impl Diagnostics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn frame_rendered(&self) {
        self.frames_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn driver_error(&self) {
        self.driver_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hook_error(&self) {
        self.hook_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Write the final tallies to the log; called when the loop exits.
    pub fn flush(&self) {
        tracing::info!(
            frames_rendered = self.frames_rendered.load(Ordering::Relaxed),
            frames_dropped = self.frames_dropped.load(Ordering::Relaxed),
            driver_errors = self.driver_errors.load(Ordering::Relaxed),
            hook_errors = self.hook_errors.load(Ordering::Relaxed),
            "render loop finished"
        );
    }
}
