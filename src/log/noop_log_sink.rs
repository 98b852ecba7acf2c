use crate::log::{
    error_report::ErrorReport, log_error::SinkError, log_level::LogLevel, log_sink::LogSink,
};

/// Sink that accepts and discards every record.
#[derive(Debug, Clone, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    #[inline]
    fn log(
        &self,
        _level: LogLevel,
        _tag: &str,
        _msg: &str,
        _error: Option<&ErrorReport>,
    ) -> Result<(), SinkError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
