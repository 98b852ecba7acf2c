use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc,
};

use crate::log::{
    error_report::ErrorReport, log_error::SinkError, log_level::LogLevel, log_msg::LogMsg,
    log_sink::LogSink,
};

/// Messages consumed by the file worker.
#[derive(Debug)]
pub enum WorkerMsg {
    Log(LogMsg),
    /// Flush the file, then acknowledge on the given channel.
    Flush(mpsc::Sender<()>),
}

/// Lightweight, cloneable handle to a [`FileLogger`](crate::log::file_logger::FileLogger).
///
/// `LoggerHandle` enqueues records into a bounded `SyncSender`. Calls to
/// [`try_log`](Self::try_log) are non-blocking: if the queue is full, the
/// record is dropped and an error is returned.
///
/// Register it with a [`SinkRegistry`](crate::log::sink_registry::SinkRegistry)
/// to have every record appended to the log file.
#[derive(Clone, Debug)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<WorkerMsg>,
    pub(super) recording: Arc<AtomicBool>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(
        &self,
        level: LogLevel,
        tag: &str,
        msg: &str,
        _error: Option<&ErrorReport>,
    ) -> Result<(), SinkError> {
        self.try_log(level, tag, msg).map_err(|e| match e {
            mpsc::TrySendError::Full(_) => SinkError::QueueFull,
            mpsc::TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }

    /// A paused file logger is skipped by dispatch.
    fn is_enabled(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl LoggerHandle {
    /// Attempts to enqueue a record without blocking.
    ///
    /// The record is stamped with the current time in milliseconds.
    ///
    /// # Errors
    /// Returns:
    /// - `Err(TrySendError::Full(_))` when the bounded queue is at capacity (record is not sent).
    /// - `Err(TrySendError::Disconnected(_))` when the file worker has exited.
    ///
    /// # Examples
    /// ```ignore
    /// handle.try_log(LogLevel::Warning, "(net.rs:10) poll⇛", "rate-limited")?;
    /// ```
    pub fn try_log<T, S>(
        &self,
        level: LogLevel,
        tag: T,
        text: S,
    ) -> Result<(), mpsc::TrySendError<WorkerMsg>>
    where
        T: Into<String>,
        S: Into<String>,
    {
        self.tx.try_send(WorkerMsg::Log(LogMsg::now(level, tag, text)))
    }

    /// Stops recording; records logged while paused are skipped.
    pub fn pause(&self) {
        self.recording.store(false, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.recording.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::mpsc::{TrySendError, sync_channel};

    fn handle(tx: mpsc::SyncSender<WorkerMsg>) -> LoggerHandle {
        LoggerHandle {
            tx,
            recording: Arc::new(AtomicBool::new(true)),
        }
    }

    #[test]
    fn try_log_ok_when_capacity_available() {
        let (tx, rx) = sync_channel::<WorkerMsg>(2);
        let h = handle(tx);

        let res = h.try_log(LogLevel::Info, "test⇛", "hello");
        assert!(res.is_ok(), "expected Ok from try_log");

        match rx.recv().expect("a message should arrive") {
            WorkerMsg::Log(msg) => {
                assert_eq!(msg.level, LogLevel::Info);
                assert_eq!(msg.text, "hello");
                assert_eq!(msg.tag, "test⇛");
                assert!(msg.ts_ms > 0, "timestamp should be non-zero");
            }
            other => panic!("expected a record, got: {other:?}"),
        }
    }

    #[test]
    fn try_log_err_full_when_queue_full() {
        // Capacity = 1, send once and do not recv -> next send should be Full.
        let (tx, _rx) = sync_channel::<WorkerMsg>(1);
        let h = handle(tx);

        h.try_log(LogLevel::Info, "t", "first")
            .expect("first send should succeed");

        match h.try_log(LogLevel::Info, "t", "second") {
            Err(TrySendError::Full(_)) => {} // expected
            other => panic!("expected Full, got: {:?}", other),
        }
        assert!(matches!(
            h.log(LogLevel::Info, "t", "third", None),
            Err(SinkError::QueueFull)
        ));
    }

    #[test]
    fn try_log_err_disconnected_when_receiver_closed() {
        // Drop the receiver immediately so the channel is disconnected.
        let (tx, rx) = sync_channel::<WorkerMsg>(1);
        drop(rx);
        let h = handle(tx);

        match h.try_log(LogLevel::Error, "t", "won't send") {
            Err(TrySendError::Disconnected(_)) => {} // expected
            other => panic!("expected Disconnected, got: {:?}", other),
        }
        assert!(matches!(
            h.log(LogLevel::Error, "t", "won't send", None),
            Err(SinkError::Disconnected)
        ));
    }

    #[test]
    fn paused_handle_reports_disabled() {
        let (tx, _rx) = sync_channel::<WorkerMsg>(1);
        let h = handle(tx);
        let clone = h.clone();
        h.pause();
        assert!(!clone.is_enabled());
        clone.resume();
        assert!(h.is_recording());
    }
}
