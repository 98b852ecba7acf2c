use std::{
    collections::VecDeque,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

use crate::log::{
    error_report::ErrorReport, log_error::SinkError, log_level::LogLevel, log_msg::LogMsg,
    log_sink::LogSink,
};

/// Default number of records kept by [`MemorySink`].
pub const DEFAULT_CAPACITY: usize = 1_000;

/// Keeps the most recent records in memory, evicting the oldest first.
///
/// Useful for in-app log viewers and for asserting on output in tests.
#[derive(Debug)]
pub struct MemorySink {
    records: Mutex<VecDeque<LogMsg>>,
    capacity: usize,
    enabled: AtomicBool,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemorySink {
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
            capacity,
            enabled: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copies of the kept records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<LogMsg> {
        self.records.lock().iter().cloned().collect()
    }

    /// Removes and returns the kept records, oldest first.
    pub fn drain(&self) -> Vec<LogMsg> {
        self.records.lock().drain(..).collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

impl LogSink for MemorySink {
    fn log(
        &self,
        level: LogLevel,
        tag: &str,
        msg: &str,
        _error: Option<&ErrorReport>,
    ) -> Result<(), SinkError> {
        let record = LogMsg::now(level, tag, msg);
        let mut records = self.records.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
