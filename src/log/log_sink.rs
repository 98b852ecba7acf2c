use std::sync::Arc;

use crate::log::{error_report::ErrorReport, log_error::SinkError, log_level::LogLevel};

/// A destination for formatted log records.
///
/// Sinks are shared behind `Arc` and identified by that allocation, so two
/// sinks with identical configuration are still distinct registrations.
/// `log` may be called concurrently from any thread.
pub trait LogSink: Send + Sync {
    fn log(
        &self,
        level: LogLevel,
        tag: &str,
        msg: &str,
        error: Option<&ErrorReport>,
    ) -> Result<(), SinkError>;

    /// Disabled sinks are skipped by dispatch.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Short label used in failure reports.
    fn name(&self) -> &str {
        "sink"
    }
}

/// Identity of a registered sink: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(usize);

impl SinkId {
    #[must_use]
    pub fn of<S: LogSink + ?Sized>(sink: &Arc<S>) -> Self {
        SinkId(Arc::as_ptr(sink).cast::<()>() as usize)
    }
}
