//! The set of sinks every record is fanned out to.
//!
//! Mutation, the console slot and snapshotting share one mutex; sinks are always called
//! with the lock released, so a sink may itself log through the same registry.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};

use crate::log::{
    console_sink::ConsoleSink,
    error_report::ErrorReport,
    log_error::SinkError,
    log_level::LogLevel,
    log_sink::{LogSink, SinkId},
};

/// How repeated registrations of the same sink are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Registration {
    /// A sink is either present or not. Registering twice then unregistering
    /// once leaves it absent.
    #[default]
    Keyed,
    /// Each registration must be matched by an unregistration before the
    /// sink is removed. Delivery still happens once per dispatch.
    Counted,
}

/// One sink call that returned an error or panicked.
#[derive(Debug)]
pub struct DispatchFailure {
    pub sink: SinkId,
    pub name: String,
    pub error: SinkError,
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink `{}` failed: {}", self.name, self.error)
    }
}

/// Name reported for a sink whose `name()` panicked.
pub const UNNAMED_SINK: &str = "(unnamed)";

/// Called once for every [`DispatchFailure`].
pub type FailureHook = Arc<dyn Fn(&DispatchFailure) + Send + Sync>;

struct Entry {
    id: SinkId,
    sink: Arc<dyn LogSink>,
    refs: usize,
}

/// Everything guarded by the registry lock.
#[derive(Default)]
struct Sinks {
    entries: Vec<Entry>,
    console: Option<Arc<ConsoleSink>>,
}

impl Sinks {
    fn position(&self, id: SinkId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn find(&self, id: SinkId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn insert(&mut self, sink: Arc<dyn LogSink>, registration: Registration) -> SinkId {
        let id = SinkId::of(&sink);
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                if registration == Registration::Counted {
                    entry.refs += 1;
                }
            }
            None => self.entries.push(Entry { id, sink, refs: 1 }),
        }
        id
    }

    fn remove_all(&mut self, id: SinkId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }
}

pub struct SinkRegistry {
    sinks: Mutex<Sinks>,
    registration: Registration,
    enabled: AtomicBool,
    failure_hook: RwLock<FailureHook>,
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("sinks", &self.len())
            .field("registration", &self.registration)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_failure_hook() -> FailureHook {
    Arc::new(|failure: &DispatchFailure| {
        tracing::warn!(sink = %failure.name, error = %failure.error, "log sink failed");
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    ErrorReport::from_panic(payload).message().to_owned()
}

impl SinkRegistry {
    /// Registry with the console sink already registered.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.add_console();
        registry
    }

    /// Registry with no sinks at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sinks: Mutex::new(Sinks::default()),
            registration: Registration::default(),
            enabled: AtomicBool::new(true),
            failure_hook: RwLock::new(default_failure_hook()),
        }
    }

    #[must_use]
    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registration = registration;
        self
    }

    #[must_use]
    pub fn registration(&self) -> Registration {
        self.registration
    }

    /// Adds `sink`; what a repeated registration does depends on [`Registration`].
    pub fn register(&self, sink: Arc<dyn LogSink>) -> SinkId {
        self.sinks.lock().insert(sink, self.registration)
    }

    /// Returns `true` if the sink was registered. Never fails.
    pub fn unregister<S: LogSink + ?Sized>(&self, sink: &Arc<S>) -> bool {
        self.unregister_by_id(SinkId::of(sink))
    }

    pub fn unregister_by_id(&self, id: SinkId) -> bool {
        let mut sinks = self.sinks.lock();
        let Some(pos) = sinks.position(id) else {
            return false;
        };
        let entry = &mut sinks.entries[pos];
        entry.refs = entry.refs.saturating_sub(1);
        if self.registration == Registration::Keyed || entry.refs == 0 {
            sinks.entries.remove(pos);
        }
        true
    }

    /// Drops every sink, the console included.
    pub fn clear(&self) {
        self.sinks.lock().entries.clear();
    }

    #[must_use]
    pub fn contains<S: LogSink + ?Sized>(&self, sink: &Arc<S>) -> bool {
        self.contains_id(SinkId::of(sink))
    }

    #[must_use]
    pub fn contains_id(&self, id: SinkId) -> bool {
        self.sinks.lock().find(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: SinkId) -> Option<Arc<dyn LogSink>> {
        self.sinks.lock().find(id).map(|e| Arc::clone(&e.sink))
    }

    /// Registration count of a sink, 0 when absent.
    #[must_use]
    pub fn refs(&self, id: SinkId) -> usize {
        self.sinks.lock().find(id).map_or(0, |e| e.refs)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.lock().entries.is_empty()
    }

    /// Registered sink ids in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<SinkId> {
        self.sinks.lock().entries.iter().map(|e| e.id).collect()
    }

    /// Global switch: a disabled registry delivers nothing.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// The built-in console sink, whether or not it is currently registered.
    #[must_use]
    pub fn console(&self) -> Option<Arc<ConsoleSink>> {
        self.sinks.lock().console.clone()
    }

    /// Mutes or unmutes the console without unregistering it.
    pub fn set_console_enabled(&self, enabled: bool) {
        if let Some(console) = self.console() {
            console.set_enabled(enabled);
        }
    }

    /// (Re-)registers the built-in console, creating it on first use.
    pub fn add_console(&self) -> SinkId {
        let mut sinks = self.sinks.lock();
        let console = Arc::clone(
            sinks
                .console
                .get_or_insert_with(|| Arc::new(ConsoleSink::new())),
        );
        sinks.insert(console, self.registration)
    }

    /// Replaces the built-in console, e.g. with one writing elsewhere.
    pub fn set_console(&self, console: ConsoleSink) -> SinkId {
        let mut sinks = self.sinks.lock();
        if let Some(old) = sinks.console.take() {
            sinks.remove_all(SinkId::of(&old));
        }
        let console = Arc::new(console);
        sinks.console = Some(Arc::clone(&console));
        sinks.insert(console, self.registration)
    }

    /// Unregisters the console, leaving other sinks untouched.
    pub fn remove_console(&self) -> bool {
        let mut sinks = self.sinks.lock();
        let Some(id) = sinks.console.as_ref().map(SinkId::of) else {
            return false;
        };
        sinks.remove_all(id)
    }

    pub fn set_failure_hook(&self, hook: FailureHook) {
        *self.failure_hook.write() = hook;
    }

    /// Delivers one record to every enabled sink.
    ///
    /// Each sink is isolated: errors and panics from `is_enabled`, `log` or
    /// `name` are collected and reported through the failure hook, and do not
    /// stop delivery to the others. A panicking hook is swallowed.
    pub fn dispatch(
        &self,
        level: LogLevel,
        tag: &str,
        msg: &str,
        error: Option<&ErrorReport>,
    ) -> Vec<DispatchFailure> {
        if !self.is_enabled() {
            return Vec::new();
        }
        let snapshot: Vec<(SinkId, Arc<dyn LogSink>)> = self
            .sinks
            .lock()
            .entries
            .iter()
            .map(|e| (e.id, Arc::clone(&e.sink)))
            .collect();

        let mut failures = Vec::new();
        for (id, sink) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                if sink.is_enabled() {
                    sink.log(level, tag, msg, error)
                } else {
                    Ok(())
                }
            }));
            let cause = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(payload) => SinkError::Panicked(panic_message(payload.as_ref())),
            };
            let name = panic::catch_unwind(AssertUnwindSafe(|| sink.name().to_owned()))
                .unwrap_or_else(|_| UNNAMED_SINK.to_owned());
            failures.push(DispatchFailure {
                sink: id,
                name,
                error: cause,
            });
        }

        if !failures.is_empty() {
            let hook = self.failure_hook.read().clone();
            for failure in &failures {
                let _ = panic::catch_unwind(AssertUnwindSafe(|| hook(failure)));
            }
        }
        failures
    }
}
