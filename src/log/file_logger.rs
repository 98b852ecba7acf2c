use crate::{
    config::LogConfig,
    log::{
        log_level::LogLevel,
        log_msg::LogMsg,
        logger_handle::{LoggerHandle, WorkerMsg},
    },
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::AtomicBool,
        mpsc::{self, TrySendError},
    },
    thread,
};

// -----------------------------------------------------------------------------
// COMPILE-TIME CONFIGURATION
// -----------------------------------------------------------------------------

/// Flush to disk every 100 records in debug builds (to see crashes near real-time).
#[cfg(debug_assertions)]
const FLUSH_BATCH_SIZE: u32 = 100;

/// Flush to disk every 1000 records in release builds (to save I/O & CPU).
#[cfg(not(debug_assertions))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

/// Ends every record in the file; records may span several lines.
pub const RECORD_SEPARATOR: char = '\u{2028}';

/// Separates the fields of a record.
pub const FIELD_SEPARATOR: char = '\u{2063}';

// -----------------------------------------------------------------------------

/// Bounded, non-blocking sink that appends records to a per-process log file.
///
/// # Architecture
///
/// 1. **Producers**: dispatch calls [`LoggerHandle::log`], which never blocks.
/// 2. **Queue**: a bounded `mpsc` channel buffers records.
/// 3. **Consumer**: a dedicated background thread writes to disk and flushes periodically.
///
/// Each record is written as
/// `<ts_ms>⁣<level code>⁣<tag>⁣<text>\u{2028}\n` so multi-line messages can be
/// read back with [`read_records`].
pub struct FileLogger {
    handle: LoggerHandle,
    _thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl FileLogger {
    /// Starts a file logger when `file_path` or `file_name` is configured.
    ///
    /// With only a name, the file goes to a `logs/` directory next to the executable.
    pub fn from_config(config: &LogConfig) -> io::Result<Option<Self>> {
        let name = config.file_name.as_deref();
        match (&config.file_path, name) {
            (Some(dir), _) => Self::start_in_dir(dir, name, config.file_queue).map(Some),
            (None, Some(_)) => Self::start_default(name, config.file_queue).map(Some),
            (None, None) => Ok(None),
        }
    }

    /// Creates a `logs/` directory next to the executable and starts the logger there.
    ///
    /// # Example Filename
    /// `target/debug/logs/app-20251102_023045-pid1234.log`
    pub fn start_default(app_name: Option<&str>, cap: usize) -> io::Result<Self> {
        let base = exe_dir_fallback_cwd().join("logs");
        Self::start_in_dir(base, app_name, cap)
    }

    /// Starts the logger in a specific directory.
    ///
    /// This function:
    /// 1. Creates the target directory if it is missing.
    /// 2. Generates a unique filename based on the timestamp and process ID (PID).
    /// 3. Spawns the background worker thread.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory where the log file will be created.
    /// * `app_name` - Optional prefix for the log filename.
    /// * `cap` - Capacity of the record channel (backpressure buffer).
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: Option<&str>,
        cap: usize,
    ) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let file_path = dir.join(file_name(app_name, &timestamp_for_filename()));

        let (tx, rx) = mpsc::sync_channel::<WorkerMsg>(cap.max(1));
        let handle = LoggerHandle {
            tx,
            recording: Arc::new(AtomicBool::new(true)),
        };

        let file_path_clone = file_path.clone();

        let thread = thread::Builder::new()
            .name("taglog-file".into())
            .spawn(move || run_worker(&file_path_clone, &rx))?;

        Ok(Self {
            handle,
            _thread: Some(thread),
            file_path,
        })
    }

    /// Attempts to enqueue a record without blocking the current thread.
    ///
    /// If the channel is full, the record is **dropped** and an error is returned.
    pub fn try_log<T: Into<String>, S: Into<String>>(
        &self,
        level: LogLevel,
        tag: T,
        text: S,
    ) -> Result<(), TrySendError<WorkerMsg>> {
        self.handle.try_log(level, tag, text)
    }

    /// Returns a cloneable handle, the piece that gets registered as a sink.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// Blocks until every record queued before this call is on disk.
    pub fn flush(&self) -> io::Result<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.handle
            .tx
            .send(WorkerMsg::Flush(ack_tx))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "file worker is gone"))?;
        ack_rx
            .recv()
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "file worker is gone"))
    }

    pub fn pause(&self) {
        self.handle.pause();
    }

    pub fn resume(&self) {
        self.handle.resume();
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.handle.is_recording()
    }

    /// Returns the path of the active log file.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl std::fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLogger")
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn run_worker(path: &Path, rx: &mpsc::Receiver<WorkerMsg>) {
    // Try target file -> temp file -> sink (never panic).
    let writer: Box<dyn Write + Send> =
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Box::new(f),
            Err(err) => {
                let fallback = std::env::temp_dir().join("taglog-fallback.log");
                tracing::warn!(path = %path.display(), %err, "cannot open log file, using fallback");
                match OpenOptions::new().create(true).append(true).open(&fallback) {
                    Ok(f) => Box::new(f),
                    Err(_) => Box::new(io::sink()),
                }
            }
        };

    let mut out: BufWriter<Box<dyn Write + Send>> = BufWriter::new(writer);
    let mut lines_written: u32 = 0;

    while let Ok(msg) = rx.recv() {
        match msg {
            WorkerMsg::Log(m) => {
                if let Err(err) = write_record(&mut out, &m) {
                    tracing::warn!(%err, "log file write failed");
                }
                lines_written = lines_written.wrapping_add(1);

                // Flush periodically to ensure data persists on crash.
                if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
                    let _ = out.flush();
                }
            }
            WorkerMsg::Flush(ack) => {
                let _ = out.flush();
                let _ = ack.send(());
            }
        }
    }

    let _ = out.flush();
}

fn write_record<W: Write>(out: &mut W, m: &LogMsg) -> io::Result<()> {
    writeln!(
        out,
        "{ts}{FIELD_SEPARATOR}{code}{FIELD_SEPARATOR}{tag}{FIELD_SEPARATOR}{text}{RECORD_SEPARATOR}",
        ts = m.ts_ms,
        code = m.level.short_code(),
        tag = m.tag,
        text = m.text,
    )
}

/// Reads back the records of a log file written by [`FileLogger`].
///
/// Malformed records are skipped.
pub fn read_records<P: AsRef<Path>>(path: P) -> io::Result<Vec<LogMsg>> {
    let content = fs::read_to_string(path)?;
    let records = content
        .split(RECORD_SEPARATOR)
        .map(|r| r.strip_prefix('\n').unwrap_or(r))
        .filter(|r| !r.is_empty())
        .filter_map(parse_record)
        .collect();
    Ok(records)
}

fn parse_record(raw: &str) -> Option<LogMsg> {
    let mut fields = raw.splitn(4, FIELD_SEPARATOR);
    let ts_ms = fields.next()?.parse().ok()?;
    let mut code = fields.next()?.chars();
    let level = LogLevel::from_short_code(code.next()?)?;
    let tag = fields.next()?;
    let text = fields.next()?;
    Some(LogMsg::new(level, tag, text, ts_ms))
}

fn file_name(app_name: Option<&str>, ts: &str) -> String {
    let pid = std::process::id();
    match app_name {
        Some(name) => format!("{name}-{ts}-pid{pid}.log"),
        None => format!("{ts}-pid{pid}.log"),
    }
}

/// Locates the directory of the executable (target/{debug,release}),
/// or falls back to the current working directory on error.
fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Output Format: `YYYYMMDD_HHMMSS` (e.g., `20251102_023045`), UTC.
fn timestamp_for_filename() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::log_sink::LogSink;

    #[test]
    fn writes_and_reads_back_multiline_records() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FileLogger::start_in_dir(dir.path(), Some("app"), 16).unwrap();
        let handle = logger.handle();

        handle
            .log(LogLevel::Info, "(a.rs:1) f⇛", "first", None)
            .unwrap();
        handle
            .log(LogLevel::Error, "(b.rs:2) g⇛", "two\nlines", None)
            .unwrap();
        logger.flush().unwrap();

        let records = read_records(logger.file_path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, "(a.rs:1) f⇛");
        assert_eq!(records[0].text, "first");
        assert_eq!(records[1].level, LogLevel::Error);
        assert_eq!(records[1].text, "two\nlines");
    }

    #[test]
    fn file_name_has_prefix_timestamp_and_pid() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FileLogger::start_in_dir(dir.path(), Some("svc"), 4).unwrap();
        let name = logger.file_path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("svc-"));
        assert!(name.ends_with(&format!("-pid{}.log", std::process::id())));
        assert_eq!(name.len(), "svc-".len() + 15 + format!("-pid{}.log", std::process::id()).len());
    }

    #[test]
    fn pause_stops_recording() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FileLogger::start_in_dir(dir.path(), None, 4).unwrap();
        logger.pause();
        assert!(!logger.handle().is_enabled());
        logger.resume();
        assert!(logger.is_recording());
    }

    #[test]
    fn from_config_without_path_or_name_is_none() {
        assert!(FileLogger::from_config(&LogConfig::default()).unwrap().is_none());

        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            file_path: Some(dir.path().to_path_buf()),
            file_name: Some("cfg".into()),
            ..LogConfig::default()
        };
        let logger = FileLogger::from_config(&config).unwrap().unwrap();
        assert!(logger.file_path().starts_with(dir.path()));
    }

    #[test]
    fn malformed_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.log");
        fs::write(&path, "garbage\u{2028}\n12\u{2063}W\u{2063}t\u{2063}ok\u{2028}\n").unwrap();
        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Warning);
        assert_eq!(records[0].ts_ms, 12);
    }
}
