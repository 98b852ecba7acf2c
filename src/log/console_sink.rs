use std::{
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

use crate::log::{
    chunk_splitter::part_of, error_report::ErrorReport, log_error::SinkError,
    log_level::LogLevel, log_sink::LogSink,
};

/// Messages longer than this many characters are cut by the console.
pub const DEFAULT_MAX_LEN: usize = 4_000;

/// Platform-style console output: `X/<tag>: <message>` on stderr.
///
/// Like most platform log buffers it truncates long messages, which is why
/// [`ChunkSplitter`](crate::log::chunk_splitter::ChunkSplitter) exists.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
    max_len: usize,
    enabled: AtomicBool,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Console writing to `out` instead of stderr.
    pub fn with_writer<W: Write + Send + 'static>(out: W) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            max_len: DEFAULT_MAX_LEN,
            enabled: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn truncate<'a>(&self, msg: &'a str) -> &'a str {
        match msg.char_indices().nth(self.max_len) {
            Some((end, _)) => &msg[..end],
            None => msg,
        }
    }
}

impl LogSink for ConsoleSink {
    fn log(
        &self,
        level: LogLevel,
        tag: &str,
        msg: &str,
        error: Option<&ErrorReport>,
    ) -> Result<(), SinkError> {
        let body = self.truncate(msg);
        let mut out = self.out.lock();
        write!(out, "{}/{tag}: {body}", level.short_code())?;
        if !body.ends_with('\n') {
            writeln!(out)?;
        }
        // A chunked block already carried the headline in an earlier part.
        let shown = |r: &ErrorReport| part_of(msg).is_some() || msg.contains(&r.headline());
        if let Some(report) = error.filter(|r| !shown(r)) {
            writeln!(out, "{}/{tag}: {report}", level.short_code())?;
        }
        out.flush()?;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn name(&self) -> &str {
        "console"
    }
}
