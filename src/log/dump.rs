//! Text dumps of common values: maps, lists, byte buffers, objects, threads
//! and stack traces. Each returns a message body ready for the formatter.

use std::{
    fmt::{Display, Write as _},
    thread::Thread,
};

use crate::log::{
    call_frame::CallFrame,
    formatter::{AT, FRAME_INDENT, NULL},
};

/// Bytes per line used by [`hex`] when none is given.
pub const HEX_PER_LINE: usize = 16;

/// Field-wise description of a value, the replacement for reflective dumps.
///
/// ```rust,ignore
/// impl Describable for Session {
///     fn fields(&self) -> Vec<(String, String)> {
///         vec![("id".into(), self.id.to_string()), ("peer".into(), self.peer.clone())]
///     }
/// }
/// ```
pub trait Describable {
    fn fields(&self) -> Vec<(String, String)>;
}

/// `key = value` lines with keys left-aligned to the widest one.
pub fn map<K, V, I>(entries: I) -> String
where
    K: Display,
    V: Display,
    I: IntoIterator<Item = (K, V)>,
{
    let rows: Vec<(String, String)> = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    aligned_rows(&rows)
}

/// One item per line.
pub fn list<T, I>(items: I) -> String
where
    T: Display,
    I: IntoIterator<Item = T>,
{
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{item}");
    }
    out
}

/// `[index] value` per line, for arrays whose index matters.
pub fn indexed<T, I>(items: I) -> String
where
    T: Display,
    I: IntoIterator<Item = T>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        let _ = writeln!(out, "[{i}] {item}");
    }
    out
}

/// Upper-case hex pairs (`0F CD AD `), `per_line` bytes per line.
pub fn hex(data: &[u8], per_line: usize) -> String {
    let per_line = per_line.max(1);
    let mut out = String::with_capacity(data.len() * 3 + data.len() / per_line);
    for (i, byte) in data.iter().enumerate() {
        let _ = write!(out, "{byte:02X} ");
        if (i + 1) % per_line == 0 {
            out.push('\n');
        }
    }
    out
}

/// Field dump of a describable value; `None` renders as `null`.
pub fn describe(value: Option<&dyn Describable>) -> String {
    match value {
        Some(v) => aligned_rows(&v.fields()),
        None => NULL.to_owned(),
    }
}

/// `Thread Name:<name>|Id:<id>`.
pub fn thread_info(thread: &Thread) -> String {
    format!(
        "Thread Name:{}|Id:{:?}",
        thread.name().unwrap_or("<unnamed>"),
        thread.id()
    )
}

/// One `    at <frame>` line per frame.
pub fn stack_trace(frames: &[CallFrame]) -> String {
    let mut out = String::new();
    for frame in frames {
        let _ = writeln!(out, "{FRAME_INDENT}{AT}{frame}");
    }
    out
}

fn aligned_rows(rows: &[(String, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in rows {
        let _ = writeln!(out, "{key:<width$} = {value}");
    }
    out
}
