//! Call-site resolution: turns the current call stack into a short,
//! column-aligned tag such as `build-42 (client.rs:88) connect      ⇛`.

use std::{any, borrow::Cow, panic::Location, sync::Arc};

use crate::log::{
    call_frame::{CallFrame, CallStack},
    log_state::LogState,
};

/// Glyph closing every tag, after the alignment padding.
pub const TAG_MARKER: char = '⇛';
/// Tag used when no frame outside the library can be found.
pub const UNKNOWN_TAG: &str = "(unknown)";
/// Location marker for frames without source information and closure subjects.
pub const ANONYMOUS: &str = "(anonymous)";
/// Tag used for an absent subject.
pub const NULL_TAG: &str = "null";

/// The logical owner of a log call, used to tag by type instead of by the
/// literal call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Type(&'static str),
    Null,
}

impl Subject {
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Subject::Type(any::type_name::<T>())
    }

    #[must_use]
    pub fn of_val<T: ?Sized>(_value: &T) -> Self {
        Self::of::<T>()
    }

    /// `None` becomes [`Subject::Null`].
    #[must_use]
    pub fn from_option<T: ?Sized>(value: Option<&T>) -> Self {
        match value {
            Some(_) => Self::of::<T>(),
            None => Subject::Null,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Subject::Type(name) => Some(name),
            Subject::Null => None,
        }
    }

    fn is_anonymous(&self) -> bool {
        self.type_name().is_some_and(|n| n.contains("{{closure}}"))
    }

    /// Type path without generic arguments (`app::Pool<u8>` -> `app::Pool`).
    fn path(&self) -> Option<&'static str> {
        self.type_name()
            .map(|n| n.split_once('<').map_or(n, |(head, _)| head))
    }
}

/// Decides which frames belong to the logging library and which to the
/// language runtime.
#[derive(Debug, Clone)]
pub struct FrameFilter {
    library: Vec<String>,
    runtime: Vec<String>,
}

impl Default for FrameFilter {
    fn default() -> Self {
        Self {
            library: vec![env!("CARGO_CRATE_NAME").to_owned()],
            runtime: ["std", "core", "alloc", "backtrace", "test"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl FrameFilter {
    /// Filter with an explicit set of library paths and the default runtime set.
    #[must_use]
    pub fn with_library<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            library: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Treats frames under `path` as library code too (e.g. a wrapper crate).
    #[must_use]
    pub fn add_library(mut self, path: impl Into<String>) -> Self {
        self.library.push(path.into());
        self
    }

    #[must_use]
    pub fn is_library(&self, frame: &CallFrame) -> bool {
        self.library
            .iter()
            .any(|p| under_path(&frame.declaring_type, p))
    }

    /// Runtime frames: the standard library and test harness, plus bare
    /// symbols without a module path (`main`, `_start`, `start_thread`, ...).
    #[must_use]
    pub fn is_runtime(&self, frame: &CallFrame) -> bool {
        if frame.declaring_type.is_empty() {
            return true;
        }
        self.runtime
            .iter()
            .any(|p| under_path(&frame.declaring_type, p))
    }
}

/// First frame declared under the subject's type path.
fn subject_index(frames: &[CallFrame], subject: Option<&Subject>) -> Option<usize> {
    let path = subject.and_then(Subject::path)?;
    frames
        .iter()
        .position(|f| f.declaring_type.starts_with(path))
}

fn under_path(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Resolves and renders caller tags.
#[derive(Debug, Clone)]
pub struct CallSiteResolver {
    filter: FrameFilter,
    state: Arc<LogState>,
}

impl CallSiteResolver {
    #[must_use]
    pub fn new(state: Arc<LogState>) -> Self {
        Self {
            filter: FrameFilter::default(),
            state,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FrameFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn filter(&self) -> &FrameFilter {
        &self.filter
    }

    /// Index of the call site within `frames` (innermost first).
    ///
    /// Skips up to the first library frame, then returns the first frame that
    /// is neither library nor runtime. With a subject, the first frame whose
    /// declaring type starts with the subject's type path wins instead.
    #[must_use]
    pub fn call_site_index(&self, frames: &[CallFrame], subject: Option<&Subject>) -> Option<usize> {
        subject_index(frames, subject).or_else(|| self.search(frames))
    }

    fn search(&self, frames: &[CallFrame]) -> Option<usize> {
        let start = frames
            .iter()
            .position(|f| self.filter.is_library(f))
            .unwrap_or(0);

        frames[start..]
            .iter()
            .position(|f| !self.filter.is_library(f) && !self.filter.is_runtime(f))
            .map(|i| start + i)
    }

    #[must_use]
    pub fn find_call_site<'a>(
        &self,
        frames: &'a [CallFrame],
        subject: Option<&Subject>,
    ) -> Option<&'a CallFrame> {
        self.call_site_index(frames, subject).map(|i| &frames[i])
    }

    /// Frames from the call site outwards, for printing "where was this logged".
    #[must_use]
    pub fn trace_from_call_site(&self, frames: &[CallFrame]) -> Vec<CallFrame> {
        match self.call_site_index(frames, None) {
            Some(i) => frames[i..]
                .iter()
                .filter(|f| !self.filter.is_runtime(f))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// `(file.rs:12) method`, `(anonymous) method` or the unknown placeholder.
    #[must_use]
    pub fn location(frame: Option<&CallFrame>) -> String {
        let Some(frame) = frame else {
            return UNKNOWN_TAG.to_owned();
        };
        let place = match frame.file_name() {
            Some(file) => format!("({file}:{})", frame.line),
            None => ANONYMOUS.to_owned(),
        };
        if frame.method.is_empty() {
            place
        } else {
            format!("{place} {}", frame.method)
        }
    }

    /// Prefixes the stamp, if one is set.
    #[must_use]
    pub fn stamped(&self, location: &str) -> String {
        match self.state.stamp() {
            Some(stamp) => format!("{stamp} {location}"),
            None => location.to_owned(),
        }
    }

    /// Pads `raw` to the running alignment width and appends [`TAG_MARKER`].
    pub fn align(&self, raw: String) -> String {
        let len = raw.chars().count();
        let width = self.state.observe_tag(len);
        let mut tag = raw;
        tag.extend(std::iter::repeat_n(' ', width - len));
        tag.push(TAG_MARKER);
        tag
    }

    /// Full tag for a given stack. Never fails: no call site gives the
    /// placeholder tag.
    pub fn tag(&self, frames: &[CallFrame], subject: Option<&Subject>) -> String {
        if subject == Some(&Subject::Null) {
            return self.align(NULL_TAG.to_owned());
        }
        if subject.is_some_and(Subject::is_anonymous) {
            return self.align(self.stamped(ANONYMOUS));
        }
        let frame = self.find_call_site(frames, subject);
        self.align(self.stamped(&Self::location(frame)))
    }

    /// Tag for a live call. `caller` is the `#[track_caller]` position of the
    /// public logging call and fills in file and line when the stack has none.
    pub fn tag_for_call(
        &self,
        stack: Option<&CallStack>,
        subject: Option<&Subject>,
        caller: &Location<'_>,
    ) -> String {
        if subject == Some(&Subject::Null) || subject.is_some_and(Subject::is_anonymous) {
            return self.tag(&[], subject);
        }

        let frames = stack.map(CallStack::frames).unwrap_or_default();
        // Only a frame found by the plain search is the literal caller.
        let frame: Cow<'_, CallFrame> = match subject_index(frames, subject) {
            Some(i) => Cow::Borrowed(&frames[i]),
            None => match self.search(frames) {
                Some(i) if frames[i].has_location() => Cow::Borrowed(&frames[i]),
                Some(i) => {
                    let mut merged = frames[i].clone();
                    merged.file = Some(caller.file().to_owned());
                    merged.line = caller.line();
                    Cow::Owned(merged)
                }
                None => Cow::Owned(CallFrame::from_location(caller)),
            },
        };
        self.align(self.stamped(&Self::location(Some(&frame))))
    }
}
