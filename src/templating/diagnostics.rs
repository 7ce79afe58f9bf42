//! Sink for the non-fatal conditions reported while rendering.
//!
//! Rendering never aborts on a missing variable, a malformed structured
//! literal or an unreachable pipeline service. Those are reported here and
//! rendering continues with a substitute value.

/// Severity of a reported condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Receives diagnostic messages from a render.
pub trait Diagnostics: Send + Sync {
    fn report(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.report(Severity::Warn, message);
    }

    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}

/// Forwards diagnostics to `tracing` under the `render` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => tracing::info!(target: "render", "{}", message),
            Severity::Warn => tracing::warn!(target: "render", "{}", message),
            Severity::Error => tracing::error!(target: "render", "{}", message),
        }
    }
}
