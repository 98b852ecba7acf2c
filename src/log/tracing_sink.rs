use crate::log::{
    error_report::ErrorReport, log_error::SinkError, log_level::LogLevel, log_sink::LogSink,
};

/// Target of every event emitted by [`TracingSink`].
pub const TARGET: &str = "taglog";

/// Forwards records to `tracing` as events with `tag` (and `error`) fields.
///
/// Verbose maps to `TRACE`; Error and Fatal both map to `ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! emit {
    ($mac:ident, $tag:expr, $msg:expr, $error:expr) => {
        match $error {
            Some(err) => tracing::$mac!(target: TARGET, tag = %$tag, error = %err, "{}", $msg),
            None => tracing::$mac!(target: TARGET, tag = %$tag, "{}", $msg),
        }
    };
}

impl LogSink for TracingSink {
    fn log(
        &self,
        level: LogLevel,
        tag: &str,
        msg: &str,
        error: Option<&ErrorReport>,
    ) -> Result<(), SinkError> {
        match level {
            LogLevel::Verbose => emit!(trace, tag, msg, error),
            LogLevel::Debug => emit!(debug, tag, msg, error),
            LogLevel::Info => emit!(info, tag, msg, error),
            LogLevel::Warning => emit!(warn, tag, msg, error),
            LogLevel::Error | LogLevel::Fatal => emit!(error, tag, msg, error),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
