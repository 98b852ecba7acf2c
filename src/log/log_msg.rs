use crate::log::log_level::LogLevel;

/// Represents a single delivered log record.
///
/// This struct is what buffering sinks (memory cache, file worker) keep:
/// the severity, timestamp, resolved tag and the fully formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMsg {
    /// The severity level of the record.
    pub level: LogLevel,
    /// The timestamp of the log event in milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    /// The caller tag produced by the call-site resolver.
    pub tag: String,
    /// The formatted message body.
    pub text: String,
}

impl LogMsg {
    /// Creates a new `LogMsg` instance.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let msg = LogMsg::new(
    ///     LogLevel::Info,
    ///     "(main.rs:12) run⇛",
    ///     "Connection established",
    ///     1678900000000,
    /// );
    /// ```
    pub fn new(level: LogLevel, tag: impl Into<String>, text: impl Into<String>, ts_ms: u128) -> Self {
        Self {
            level,
            ts_ms,
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// Builds a record stamped with the current wall-clock time.
    pub fn now(level: LogLevel, tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(level, tag, text, now_millis())
    }

    /// Renders the record the way console-like sinks print it: `X/<tag>: <text>`.
    #[must_use]
    pub fn line(&self) -> String {
        format!("{}/{}: {}", self.level.short_code(), self.tag, self.text)
    }
}

/// Milliseconds since the UNIX epoch; zero if the clock is before it.
#[must_use]
pub fn now_millis() -> u128 {
    u128::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
