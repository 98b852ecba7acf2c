//! Public entry points.
//!
//! ```rust,ignore
//! let log = Logger::global();
//! log.d("connected");
//! log.with(Subject::of::<Client>()).w("slow handshake");
//! log.long().i(&huge_dump);
//! let body = log.rt("fetch failed", || fetch(url));
//! ```
//!
//! Every entry point is `#[track_caller]`, so when stack walking is disabled
//! or the backtrace has no file information, the tag still points at the
//! line that called the logger.

use std::{
    error::Error,
    fmt::Display,
    panic::{self, AssertUnwindSafe, Location},
    path::Path,
    sync::Arc,
    thread,
};

use once_cell::sync::Lazy;

use crate::{
    config::LogConfig,
    log::{
        call_frame::CallStack,
        call_site::{CallSiteResolver, FrameFilter, Subject},
        chunk_splitter::ChunkSplitter,
        console_sink::ConsoleSink,
        dump::{self, Describable, HEX_PER_LINE},
        error_report::ErrorReport,
        file_logger::FileLogger,
        formatter::MessageFormatter,
        log_error::LogError,
        log_level::LogLevel,
        log_state::LogState,
        sink_registry::SinkRegistry,
    },
};

static GLOBAL: Lazy<Logger> = Lazy::new(Logger::new);

/// Entry points shared by [`Logger`] and [`LogScope`]. Both provide
/// `emit` and `core`.
macro_rules! facade_methods {
    () => {
        /// General entry point. A `None` message renders as `null`; a subject
        /// replaces the one of the scope.
        #[track_caller]
        pub fn log(
            &self,
            level: LogLevel,
            subject: Option<&Subject>,
            message: Option<&str>,
            error: Option<&ErrorReport>,
        ) {
            let caller = Location::caller();
            match subject {
                Some(subject) => self.with(*subject).emit(level, message, error, None, caller),
                None => self.emit(level, message, error, None, caller),
            }
        }

        #[track_caller]
        pub fn v(&self, message: impl AsRef<str>) {
            self.emit(LogLevel::Verbose, Some(message.as_ref()), None, None, Location::caller());
        }

        #[track_caller]
        pub fn d(&self, message: impl AsRef<str>) {
            self.emit(LogLevel::Debug, Some(message.as_ref()), None, None, Location::caller());
        }

        #[track_caller]
        pub fn i(&self, message: impl AsRef<str>) {
            self.emit(LogLevel::Info, Some(message.as_ref()), None, None, Location::caller());
        }

        #[track_caller]
        pub fn w(&self, message: impl AsRef<str>) {
            self.emit(LogLevel::Warning, Some(message.as_ref()), None, None, Location::caller());
        }

        #[track_caller]
        pub fn e(&self, message: impl AsRef<str>) {
            self.emit(LogLevel::Error, Some(message.as_ref()), None, None, Location::caller());
        }

        /// What a Terrible Failure: a condition that should never happen.
        #[track_caller]
        pub fn wtf(&self, message: impl AsRef<str>) {
            self.emit(LogLevel::Fatal, Some(message.as_ref()), None, None, Location::caller());
        }

        /// Logs an already captured error report.
        #[track_caller]
        pub fn report(&self, level: LogLevel, message: Option<&str>, report: &ErrorReport) {
            self.emit(level, message, Some(report), None, Location::caller());
        }

        #[track_caller]
        pub fn v_err<E: Error + 'static>(&self, message: impl AsRef<str>, err: &E) {
            self.report(LogLevel::Verbose, Some(message.as_ref()), &ErrorReport::new(err));
        }

        #[track_caller]
        pub fn d_err<E: Error + 'static>(&self, message: impl AsRef<str>, err: &E) {
            self.report(LogLevel::Debug, Some(message.as_ref()), &ErrorReport::new(err));
        }

        #[track_caller]
        pub fn i_err<E: Error + 'static>(&self, message: impl AsRef<str>, err: &E) {
            self.report(LogLevel::Info, Some(message.as_ref()), &ErrorReport::new(err));
        }

        #[track_caller]
        pub fn w_err<E: Error + 'static>(&self, message: impl AsRef<str>, err: &E) {
            self.report(LogLevel::Warning, Some(message.as_ref()), &ErrorReport::new(err));
        }

        #[track_caller]
        pub fn e_err<E: Error + 'static>(&self, message: impl AsRef<str>, err: &E) {
            self.report(LogLevel::Error, Some(message.as_ref()), &ErrorReport::new(err));
        }

        #[track_caller]
        pub fn wtf_err<E: Error + 'static>(&self, message: impl AsRef<str>, err: &E) {
            self.report(LogLevel::Fatal, Some(message.as_ref()), &ErrorReport::new(err));
        }

        /// Runs `f` and logs its failure at `Error`.
        ///
        /// An `Err` is logged and turned into `None`. A panic is logged and
        /// then resumed, so the caller still unwinds.
        #[track_caller]
        pub fn rt<T, E, F>(&self, message: &str, f: F) -> Option<T>
        where
            E: Error + 'static,
            F: FnOnce() -> Result<T, E>,
        {
            let caller = Location::caller();
            match panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(Ok(value)) => Some(value),
                Ok(Err(err)) => {
                    let report = ErrorReport::new(&err);
                    self.emit(LogLevel::Error, Some(message), Some(&report), None, caller);
                    None
                }
                Err(payload) => {
                    let report = ErrorReport::from_panic(payload.as_ref());
                    self.emit(LogLevel::Error, Some(message), Some(&report), None, caller);
                    panic::resume_unwind(payload)
                }
            }
        }

        /// `key = value` dump at `Debug`.
        #[track_caller]
        pub fn map<K, V, I>(&self, entries: I)
        where
            K: Display,
            V: Display,
            I: IntoIterator<Item = (K, V)>,
        {
            let body = dump::map(entries);
            self.emit(LogLevel::Debug, Some(&body), None, Some("Map"), Location::caller());
        }

        /// One item per line at `Debug`.
        #[track_caller]
        pub fn list<T, I>(&self, items: I)
        where
            T: Display,
            I: IntoIterator<Item = T>,
        {
            let body = dump::list(items);
            self.emit(LogLevel::Debug, Some(&body), None, Some("List"), Location::caller());
        }

        /// `[index] value` per line at `Debug`.
        #[track_caller]
        pub fn array<T, I>(&self, items: I)
        where
            T: Display,
            I: IntoIterator<Item = T>,
        {
            let body = dump::indexed(items);
            self.emit(LogLevel::Debug, Some(&body), None, Some("Array"), Location::caller());
        }

        /// Hex dump at `Debug`, sixteen bytes per line.
        #[track_caller]
        pub fn hex(&self, data: &[u8]) {
            let body = dump::hex(data, HEX_PER_LINE);
            let title = format!("Hex ({} bytes)", data.len());
            self.emit(LogLevel::Debug, Some(&body), None, Some(&title), Location::caller());
        }

        /// Field dump of `value` at `Debug`; `None` logs `null`.
        #[track_caller]
        pub fn object_info<T: Describable>(&self, value: Option<&T>) {
            let body = dump::describe(value.map(|v| v as &dyn Describable));
            let title = std::any::type_name::<T>();
            self.emit(LogLevel::Debug, Some(&body), None, Some(title), Location::caller());
        }

        /// Name and id of the calling thread at `Debug`.
        #[track_caller]
        pub fn thread_info(&self) {
            let body = dump::thread_info(&thread::current());
            self.emit(LogLevel::Debug, Some(&body), None, None, Location::caller());
        }

        /// `message` followed by the stack from the call site outwards, at `Debug`.
        #[track_caller]
        pub fn stack_trace(&self, message: impl AsRef<str>) {
            let caller = Location::caller();
            let frames = self.core().resolver.trace_from_call_site(CallStack::capture().frames());
            let body = format!("{}\n{}", message.as_ref(), dump::stack_trace(&frames));
            self.emit(LogLevel::Debug, Some(&body), None, Some("Stack trace"), caller);
        }
    };
}

/// The logging facade: resolves the call site, formats, and dispatches.
///
/// Each logger owns its [`LogState`] and [`SinkRegistry`] through `Arc`s, so
/// several independent loggers can coexist; [`Logger::global`] is the
/// process-wide one used by the `log_*!` macros.
#[derive(Debug)]
pub struct Logger {
    state: Arc<LogState>,
    registry: Arc<SinkRegistry>,
    resolver: CallSiteResolver,
    formatter: MessageFormatter,
    file: Option<FileLogger>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Logger with default state and the console sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Arc::new(LogState::new()), Arc::new(SinkRegistry::new()))
    }

    /// Logger over an existing state and registry.
    #[must_use]
    pub fn with_parts(state: Arc<LogState>, registry: Arc<SinkRegistry>) -> Self {
        Self {
            resolver: CallSiteResolver::new(Arc::clone(&state)),
            formatter: MessageFormatter::new(Arc::clone(&state)),
            state,
            registry,
            file: None,
        }
    }

    /// Builds a logger from settings: console, file sink, layout and stamp.
    pub fn from_config(config: &LogConfig) -> Result<Self, LogError> {
        let registry = SinkRegistry::empty();
        if config.console {
            registry.set_console(ConsoleSink::new().with_max_len(config.console_max_len));
        }
        registry.set_enabled(config.enabled);

        let file = FileLogger::from_config(config)?;
        if let Some(file) = &file {
            registry.register(Arc::new(file.handle()));
        }

        let state = Arc::new(LogState::from_config(config));
        let mut logger = Self::with_parts(state, Arc::new(registry));
        logger.file = file;
        Ok(logger)
    }

    /// Reads the `[Logging]` section of an INI file and builds a logger from it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let config = LogConfig::load(path)?;
        Self::from_config(&config)
    }

    /// The process-wide logger, built on first use.
    pub fn global() -> &'static Logger {
        &GLOBAL
    }

    /// Replaces which frames count as library code.
    #[must_use]
    pub fn with_filter(mut self, filter: FrameFilter) -> Self {
        self.resolver = self.resolver.with_filter(filter);
        self
    }

    #[must_use]
    pub fn state(&self) -> &Arc<LogState> {
        &self.state
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SinkRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn resolver(&self) -> &CallSiteResolver {
        &self.resolver
    }

    #[must_use]
    pub fn formatter(&self) -> &MessageFormatter {
        &self.formatter
    }

    /// The file sink started by [`from_config`](Self::from_config), if any.
    #[must_use]
    pub fn file_logger(&self) -> Option<&FileLogger> {
        self.file.as_ref()
    }

    pub fn set_stamp(&self, stamp: Option<&str>) {
        self.state.set_stamp(stamp);
    }

    pub fn set_boxed(&self, boxed: bool) {
        self.state.set_boxed(boxed);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.registry.set_enabled(enabled);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.registry.is_enabled()
    }

    /// Tags the following calls by `subject` instead of the literal call site.
    #[must_use]
    pub fn with(&self, subject: Subject) -> LogScope<'_> {
        self.scope().with(subject)
    }

    /// Routes the following calls through the chunk splitter.
    #[must_use]
    pub fn long(&self) -> LogScope<'_> {
        self.scope().long()
    }

    fn scope(&self) -> LogScope<'_> {
        LogScope {
            logger: self,
            subject: None,
            long: false,
        }
    }

    fn core(&self) -> &Logger {
        self
    }

    fn emit(
        &self,
        level: LogLevel,
        message: Option<&str>,
        error: Option<&ErrorReport>,
        title: Option<&str>,
        caller: &Location<'_>,
    ) {
        self.scope().emit(level, message, error, title, caller);
    }

    facade_methods!();
}

/// A borrowed logger with per-call options: a subject to tag by, and
/// whether to split long output into chunks.
#[derive(Debug, Clone, Copy)]
pub struct LogScope<'a> {
    logger: &'a Logger,
    subject: Option<Subject>,
    long: bool,
}

impl<'a> LogScope<'a> {
    #[must_use]
    pub fn with(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub fn long(mut self) -> Self {
        self.long = true;
        self
    }

    #[must_use]
    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    #[must_use]
    pub fn is_long(&self) -> bool {
        self.long
    }

    fn core(&self) -> &'a Logger {
        self.logger
    }

    fn emit(
        &self,
        level: LogLevel,
        message: Option<&str>,
        error: Option<&ErrorReport>,
        title: Option<&str>,
        caller: &Location<'_>,
    ) {
        let logger = self.logger;
        let registry = &logger.registry;
        if !registry.is_enabled() {
            return;
        }

        let state = &logger.state;
        let resolve = state.resolve_call_site();
        let want_trace = state.error_traces() && error.is_some_and(|r| r.frames().is_empty());
        let stack = (resolve || want_trace).then(CallStack::capture);

        let tag = logger.resolver.tag_for_call(
            stack.as_ref().filter(|_| resolve),
            self.subject.as_ref(),
            caller,
        );

        let traced;
        let error = match (error, &stack) {
            (Some(report), Some(stack)) if want_trace => {
                traced = report
                    .clone()
                    .with_frames(logger.resolver.trace_from_call_site(stack.frames()));
                Some(&traced)
            }
            _ => error,
        };

        let block = match error {
            Some(report) => logger.formatter.error(message, report),
            None => logger.formatter.message(message, title),
        };

        if self.long {
            ChunkSplitter::new(state.chunk_size()).dispatch(registry, level, &tag, &block, error);
        } else {
            registry.dispatch(level, &tag, &block.to_text(), error);
        }
    }

    facade_methods!();
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::{call_site::TAG_MARKER, memory_sink::MemorySink};
    use std::{fmt, io};

    fn logger() -> (Logger, Arc<MemorySink>) {
        let registry = Arc::new(SinkRegistry::empty());
        let sink = Arc::new(MemorySink::new(64));
        registry.register(sink.clone());
        (Logger::with_parts(Arc::new(LogState::new()), registry), sink)
    }

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl Error for Boom {}

    #[test]
    fn boxed_message_reaches_sink_with_tag() {
        let (log, sink) = logger();
        log.i("hello\nworld");
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Info);
        assert!(records[0].tag.ends_with(TAG_MARKER));
        let lines: Vec<&str> = records[0].text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "· hello");
        assert_eq!(lines[2], "· world");
    }

    #[test]
    fn missing_message_logs_null() {
        let (log, sink) = logger();
        log.set_boxed(false);
        log.log(LogLevel::Debug, None, None, None);
        assert_eq!(sink.records()[0].text, "null\n");
    }

    #[test]
    fn disabled_logger_delivers_nothing() {
        let (log, sink) = logger();
        log.set_enabled(false);
        log.e("dropped");
        assert!(sink.is_empty());
        log.set_enabled(true);
        log.e("kept");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn error_block_carries_report() {
        let (log, sink) = logger();
        log.set_boxed(false);
        log.e_err("write failed", &io::Error::other("disk full"));
        let text = &sink.records()[0].text;
        assert!(text.starts_with("write failed\n"));
        assert!(text.contains("Error: disk full"));
    }

    #[test]
    fn rt_returns_value_or_logs_error() {
        let (log, sink) = logger();
        assert_eq!(log.rt("never", || Ok::<_, Boom>(5)), Some(5));
        assert!(sink.is_empty());

        assert_eq!(log.rt("parse", || Err::<u8, _>(Boom)), None);
        let record = &sink.records()[0];
        assert_eq!(record.level, LogLevel::Error);
        assert!(record.text.contains("Boom: boom"));
    }

    #[test]
    fn rt_logs_then_resumes_panics() {
        let (log, sink) = logger();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            log.rt("worker", || -> Result<(), Boom> { panic!("bad state") })
        }));
        assert!(outcome.is_err());
        assert!(sink.records()[0].text.contains("panic: bad state"));
    }

    #[test]
    fn long_scope_splits_into_parts() {
        let (log, sink) = logger();
        log.set_boxed(false);
        log.state().set_chunk_size(10);
        log.long().d("aaaa\nbbbb\ncccc");
        let records = sink.records();
        let n = records.len();
        assert!(n >= 2);
        assert!(records.iter().all(|r| r.tag == records[0].tag));
        assert!(records[0].text.starts_with(&format!("(part 1 of {n})\n")));
        assert!(records[n - 1].text.starts_with(&format!("(part {n} of {n})\n…")));
    }

    #[test]
    fn null_subject_tags_null() {
        let (log, sink) = logger();
        log.with(Subject::Null).i("x");
        log.log(LogLevel::Info, Some(&Subject::Null), Some("y"), None);
        assert!(sink.records().iter().all(|r| r.tag.starts_with("null")));
    }

    #[test]
    fn stamp_prefixes_tag() {
        let (log, sink) = logger();
        log.set_stamp(Some("v1.2"));
        log.d("x");
        assert!(sink.records()[0].tag.starts_with("v1.2 ("));
    }

    #[test]
    fn dumps_are_titled() {
        let (log, sink) = logger();
        log.set_boxed(false);
        log.map([("k", 1)]);
        log.hex(&[0xAB, 0x01]);
        log.list(["a"]);
        let texts: Vec<String> = sink.records().into_iter().map(|r| r.text).collect();
        assert!(texts[0].starts_with("Map\n"));
        assert!(texts[0].contains("k = 1"));
        assert!(texts[1].starts_with("Hex (2 bytes)\n"));
        assert!(texts[1].contains("AB 01"));
        assert!(texts[2].starts_with("List\n"));
    }

    #[test]
    fn from_config_wires_console_and_state() {
        let config = LogConfig {
            boxed: false,
            stamp: Some("cfg".into()),
            chunk_size: 500,
            ..LogConfig::default()
        };
        let log = Logger::from_config(&config).unwrap();
        assert!(!log.state().is_boxed());
        assert_eq!(log.state().chunk_size(), 500);
        assert_eq!(log.state().stamp().as_deref(), Some("cfg"));
        let console = log.registry().console().unwrap();
        assert!(log.registry().contains(&console));
        assert!(log.file_logger().is_none());
    }
}
