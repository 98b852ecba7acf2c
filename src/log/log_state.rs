use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use parking_lot::RwLock;

use crate::config::LogConfig;

/// Default chunk budget, below common per-message platform limits.
pub const DEFAULT_CHUNK_SIZE: usize = 3_800;

/// Starting width for tag alignment.
pub const DEFAULT_TAG_WIDTH: usize = 40;

/// Columns printed before the tag by console-like sinks (`X/` and `: `).
pub const DEFAULT_LINE_OFFSET: usize = 4;

/// Shared, runtime-tunable formatting state.
///
/// One instance is shared (`Arc`) between the resolver, the formatter and the
/// splitter of a [`Logger`](crate::log::Logger). All fields use relaxed
/// consistency: the tag width is a cosmetic best-effort value and a racing
/// update can at worst misalign one line.
#[derive(Debug)]
pub struct LogState {
    boxed: AtomicBool,
    resolve_call_site: AtomicBool,
    error_traces: AtomicBool,
    tag_width: AtomicUsize,
    line_offset: AtomicUsize,
    chunk_size: AtomicUsize,
    stamp: RwLock<Option<Arc<str>>>,
}

impl Default for LogState {
    fn default() -> Self {
        Self {
            boxed: AtomicBool::new(true),
            resolve_call_site: AtomicBool::new(true),
            error_traces: AtomicBool::new(true),
            tag_width: AtomicUsize::new(DEFAULT_TAG_WIDTH),
            line_offset: AtomicUsize::new(DEFAULT_LINE_OFFSET),
            chunk_size: AtomicUsize::new(DEFAULT_CHUNK_SIZE),
            stamp: RwLock::new(None),
        }
    }
}

impl LogState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &LogConfig) -> Self {
        let state = Self::default();
        state.set_boxed(config.boxed);
        state.set_resolve_call_site(config.resolve_call_site);
        state.set_error_traces(config.error_traces);
        state.tag_width.store(config.tag_width, Ordering::Relaxed);
        state.set_line_offset(config.line_offset);
        state.set_chunk_size(config.chunk_size);
        state.set_stamp(config.stamp.as_deref());
        state
    }

    #[must_use]
    pub fn is_boxed(&self) -> bool {
        self.boxed.load(Ordering::Relaxed)
    }

    pub fn set_boxed(&self, boxed: bool) {
        self.boxed.store(boxed, Ordering::Relaxed);
    }

    #[must_use]
    pub fn resolve_call_site(&self) -> bool {
        self.resolve_call_site.load(Ordering::Relaxed)
    }

    pub fn set_resolve_call_site(&self, on: bool) {
        self.resolve_call_site.store(on, Ordering::Relaxed);
    }

    #[must_use]
    pub fn error_traces(&self) -> bool {
        self.error_traces.load(Ordering::Relaxed)
    }

    pub fn set_error_traces(&self, on: bool) {
        self.error_traces.store(on, Ordering::Relaxed);
    }

    /// Current alignment width for tags.
    #[must_use]
    pub fn tag_width(&self) -> usize {
        self.tag_width.load(Ordering::Relaxed)
    }

    /// Raises the alignment width to `len` if it is wider; returns the width to pad to.
    pub fn observe_tag(&self, len: usize) -> usize {
        let previous = self.tag_width.fetch_max(len, Ordering::Relaxed);
        previous.max(len)
    }

    /// Forgets every tag seen so far and restarts alignment at `width`.
    pub fn reset_tag_width(&self, width: usize) {
        self.tag_width.store(width, Ordering::Relaxed);
    }

    #[must_use]
    pub fn line_offset(&self) -> usize {
        self.line_offset.load(Ordering::Relaxed)
    }

    pub fn set_line_offset(&self, offset: usize) {
        self.line_offset.store(offset, Ordering::Relaxed);
    }

    /// Spaces needed to put a continuation line under the first message column.
    ///
    /// Accounts for the sink prefix, the padded tag and its marker glyph.
    #[must_use]
    pub fn continuation_indent(&self) -> usize {
        self.line_offset() + self.tag_width() + 1
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.load(Ordering::Relaxed)
    }

    /// Sets the chunk budget in characters; zero is raised to one.
    pub fn set_chunk_size(&self, size: usize) {
        self.chunk_size.store(size.max(1), Ordering::Relaxed);
    }

    #[must_use]
    pub fn stamp(&self) -> Option<Arc<str>> {
        self.stamp.read().clone()
    }

    /// Sets (or clears with `None` / empty) the stamp prefixed to every tag.
    pub fn set_stamp(&self, stamp: Option<&str>) {
        *self.stamp.write() = stamp.filter(|s| !s.is_empty()).map(Arc::from);
    }
}
