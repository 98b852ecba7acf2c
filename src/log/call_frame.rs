use std::{backtrace::Backtrace, fmt, panic::Location};

/// One frame of an execution call stack.
///
/// Frames are read-only snapshots: either parsed from the runtime backtrace
/// or built from a `#[track_caller]` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Path of the item that owns the function, e.g. `app::net::Client`.
    pub declaring_type: String,
    /// Function name without its path, e.g. `connect`.
    pub method: String,
    /// Source path as reported by the runtime, if known.
    pub file: Option<String>,
    /// 1-based source line, `0` when unknown.
    pub line: u32,
}

impl CallFrame {
    pub fn new(
        declaring_type: impl Into<String>,
        method: impl Into<String>,
        file: Option<&str>,
        line: u32,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            method: method.into(),
            file: file.map(str::to_owned),
            line,
        }
    }

    /// Builds a frame from a demangled symbol such as
    /// `<app::Foo as core::fmt::Debug>::fmt`, `app::run::{{closure}}` or,
    /// with v0 mangling, `app::run::<u8>::{closure#0}`.
    pub fn from_symbol(symbol: &str, file: Option<&str>, line: u32) -> Self {
        let (declaring_type, method) = split_symbol(symbol);
        Self {
            declaring_type,
            method,
            file: file.map(str::to_owned),
            line,
        }
    }

    /// Frame carrying only a source position (no symbol information).
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            declaring_type: String::new(),
            method: String::new(),
            file: Some(location.file().to_owned()),
            line: location.line(),
        }
    }

    /// File name without its directories (`src/net/client.rs` -> `client.rs`).
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file
            .as_deref()
            .map(|f| f.rsplit(['/', '\\']).next().unwrap_or(f))
    }

    #[must_use]
    pub fn has_location(&self) -> bool {
        self.file.is_some()
    }

    /// `declaring_type::method`, or whichever half is known.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match (self.declaring_type.is_empty(), self.method.is_empty()) {
            (false, false) => format!("{}::{}", self.declaring_type, self.method),
            (true, false) => self.method.clone(),
            (false, true) => self.declaring_type.clone(),
            (true, true) => String::from("<unknown>"),
        }
    }
}

impl fmt::Display for CallFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_name() {
            Some(file) => write!(f, "{}({}:{})", self.qualified_name(), file, self.line),
            None => write!(f, "{}(Unknown Source)", self.qualified_name()),
        }
    }
}

/// Ordered call stack, innermost frame first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    /// Captures the current thread's stack regardless of `RUST_BACKTRACE`.
    ///
    /// Returns an empty stack when the platform cannot symbolize frames.
    #[must_use]
    pub fn capture() -> Self {
        Self::parse(&Backtrace::force_capture().to_string())
    }

    #[must_use]
    pub fn from_frames(frames: Vec<CallFrame>) -> Self {
        Self { frames }
    }

    /// Parses the `Display` output of [`std::backtrace::Backtrace`]:
    ///
    /// ```text
    ///    3: app::net::Client::connect
    ///              at ./src/net/client.rs:42:9
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut frames: Vec<CallFrame> = Vec::new();
        let mut located = true;

        for raw in text.lines() {
            let line = raw.trim();
            if let Some(rest) = line.strip_prefix("at ") {
                // Inlined frames may list several positions; keep the first.
                if !located {
                    if let (Some(frame), Some((file, line_no))) =
                        (frames.last_mut(), parse_position(rest))
                    {
                        frame.file = Some(file.to_owned());
                        frame.line = line_no;
                        located = true;
                    }
                }
                continue;
            }
            if let Some((index, symbol)) = line.split_once(": ") {
                if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                    frames.push(CallFrame::from_symbol(symbol.trim(), None, 0));
                    located = false;
                }
            }
        }

        Self { frames }
    }

    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<CallFrame> {
        self.frames
    }
}

/// `path:line:column` or `path:line`; the path itself may contain colons.
fn parse_position(text: &str) -> Option<(&str, u32)> {
    let mut parts = text.rsplitn(3, ':');
    let last = parts.next()?;
    let middle = parts.next()?;
    match (parts.next(), middle.parse::<u32>()) {
        (Some(path), Ok(line)) if last.parse::<u32>().is_ok() => Some((path, line)),
        _ => {
            let (path, line) = text.rsplit_once(':')?;
            Some((path, line.parse().ok()?))
        }
    }
}

/// Splits a demangled symbol into `(declaring_type, method)`.
fn split_symbol(symbol: &str) -> (String, String) {
    let mut segments = top_level_segments(strip_hash(symbol));

    if let Some(first) = segments.first_mut() {
        if first.starts_with('<') && first.ends_with('>') {
            let inner = &first[1..first.len() - 1];
            *first = self_type_of(inner).to_owned();
        }
    }

    // `f::<T>` belongs to `f`; the arguments are dropped with the `::`.
    let mut index = 0;
    segments.retain(|s| {
        index += 1;
        index == 1 || !s.starts_with('<')
    });

    // `{{closure}}`, `{closure#0}`, `{shim:vtable#0}`: named by the enclosing function.
    while segments
        .last()
        .is_some_and(|s| s.starts_with('{') && s.ends_with('}'))
    {
        segments.pop();
    }

    let method = segments.pop().unwrap_or_default();
    (segments.join("::"), method)
}

/// Removes the `::h0123456789abcdef` suffix of non-pretty symbols.
fn strip_hash(symbol: &str) -> &str {
    match symbol.rsplit_once("::") {
        Some((head, tail))
            if tail.len() == 17
                && tail.starts_with('h')
                && tail[1..].bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => symbol,
    }
}

/// For `X as Trait`, returns `X`.
fn self_type_of(qualified: &str) -> &str {
    let mut depth = 0usize;
    let bytes = qualified.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] != b'-' => depth = depth.saturating_sub(1),
            b' ' if depth == 0 && qualified[i..].starts_with(" as ") => return &qualified[..i],
            _ => {}
        }
    }
    qualified
}

/// Splits on `::` outside of generic brackets.
fn top_level_segments(symbol: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let bytes = symbol.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] != b'-' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(symbol[start..i].to_owned());
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(symbol[start..].to_owned());
    segments.retain(|s| !s.is_empty());
    segments
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn splits_plain_path() {
        let f = CallFrame::from_symbol("app::net::Client::connect", None, 0);
        assert_eq!(f.declaring_type, "app::net::Client");
        assert_eq!(f.method, "connect");
    }

    #[test]
    fn v0_closures_and_shims_name_the_enclosing_function() {
        let f = CallFrame::from_symbol("test::run_test::{closure#0}", None, 0);
        assert_eq!(f.declaring_type, "test");
        assert_eq!(f.method, "run_test");

        let f = CallFrame::from_symbol("app::Worker::run::{closure#1}::{closure#0}", None, 0);
        assert_eq!(f.declaring_type, "app::Worker");
        assert_eq!(f.method, "run");

        let shim = "core::ops::function::FnOnce::call_once::{shim:vtable#0}";
        let f = CallFrame::from_symbol(shim, None, 0);
        assert_eq!(f.declaring_type, "core::ops::function::FnOnce");
        assert_eq!(f.method, "call_once");
    }

    #[test]
    fn v0_turbofish_stays_with_its_segment() {
        let f = CallFrame::from_symbol(
            "std::sys::backtrace::__rust_begin_short_backtrace::<fn(), core::result::Result<(), ()>>",
            None,
            0,
        );
        assert_eq!(f.declaring_type, "std::sys::backtrace");
        assert_eq!(f.method, "__rust_begin_short_backtrace");

        let f = CallFrame::from_symbol("app::Pool::<u8>::spawn::<app::Job>::{closure#0}", None, 0);
        assert_eq!(f.declaring_type, "app::Pool");
        assert_eq!(f.method, "spawn");
    }

    #[test]
    fn splits_trait_impl_and_generics() {
        let f = CallFrame::from_symbol(
            "<alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once",
            None,
            0,
        );
        assert_eq!(f.declaring_type, "alloc::boxed::Box<F,A>");
        assert_eq!(f.method, "call_once");
    }

    #[test]
    fn drops_closure_segments_and_hash() {
        let f = CallFrame::from_symbol("app::run::{{closure}}::h0123456789abcdef", None, 0);
        assert_eq!(f.declaring_type, "app");
        assert_eq!(f.method, "run");
    }

    #[test]
    fn free_function_has_empty_declaring_type() {
        let f = CallFrame::from_symbol("main", None, 0);
        assert_eq!(f.declaring_type, "");
        assert_eq!(f.qualified_name(), "main");
    }

    #[test]
    fn parses_backtrace_text() {
        let text = "   0: std::backtrace::Backtrace::create\n             at /rustc/abc/library/std/src/backtrace.rs:331:13\n   1: app::worker::run\n             at ./src/worker.rs:17:5\n             at ./src/inlined.rs:3:1\n   2: main\n";
        let stack = CallStack::parse(text);
        assert_eq!(stack.len(), 3);

        let run = &stack.frames()[1];
        assert_eq!(run.declaring_type, "app::worker");
        assert_eq!(run.file_name(), Some("worker.rs"));
        assert_eq!(run.line, 17);

        assert!(!stack.frames()[2].has_location());
    }

    #[test]
    fn parses_windows_paths() {
        let text = "   0: app::main\n             at C:\\src\\app\\main.rs:8:2\n";
        let stack = CallStack::parse(text);
        assert_eq!(stack.frames()[0].file_name(), Some("main.rs"));
        assert_eq!(stack.frames()[0].line, 8);
    }

    #[test]
    fn display_mimics_stack_trace_element() {
        let f = CallFrame::new("app::Foo", "bar", Some("src/foo.rs"), 9);
        assert_eq!(f.to_string(), "app::Foo::bar(foo.rs:9)");
        let g = CallFrame::new("app::Foo", "bar", None, 0);
        assert_eq!(g.to_string(), "app::Foo::bar(Unknown Source)");
    }

    #[test]
    fn unsupported_backtrace_yields_empty_stack() {
        assert!(CallStack::parse("disabled backtrace").is_empty());
        assert!(CallStack::parse("unsupported backtrace").is_empty());
    }
}
