//! Message and error rendering.
//!
//! Boxed layout:
//!
//! ```text
//! ··························· title ····························
//! · first line
//! · second line
//! ····························································
//! ```
//!
//! Compact layout prints the lines bare and indents continuation lines so
//! they start under the first message column of a console sink.

use std::{fmt, sync::Arc};

use crate::log::{error_report::ErrorReport, log_state::LogState};

/// Width of a delimiter line, in characters.
pub const DELIMITER_WIDTH: usize = 76;
pub const CHAR_DELIMITER: char = '·';
pub const DELIMITER_START: &str = "· ";
pub const CHAR_ERROR_DELIMITER: char = '=';
pub const ERROR_DELIMITER_START: &str = "‖ ";
/// Indent in front of every stack frame line of an error block.
pub const FRAME_INDENT: &str = "    ";
pub const AT: &str = "at ";
pub const CAUSED_BY: &str = "Caused by: ";
/// Text printed for an absent or empty message.
pub const NULL: &str = "null";

/// Which glyph set frames a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Message,
    Error,
}

impl Framing {
    #[must_use]
    pub const fn delimiter_char(self) -> char {
        match self {
            Framing::Message => CHAR_DELIMITER,
            Framing::Error => CHAR_ERROR_DELIMITER,
        }
    }

    #[must_use]
    pub const fn line_start(self) -> &'static str {
        match self {
            Framing::Message => DELIMITER_START,
            Framing::Error => ERROR_DELIMITER_START,
        }
    }

    #[must_use]
    pub fn delimiter(self) -> String {
        std::iter::repeat_n(self.delimiter_char(), DELIMITER_WIDTH).collect()
    }
}

/// Per-call layout choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Boxed,
    /// Continuation lines are indented by this many spaces.
    Compact { indent: usize },
}

/// Rendered lines of a single log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedBlock {
    lines: Vec<String>,
    title: Option<String>,
    framing: Framing,
    boxed: bool,
}

impl FormattedBlock {
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn framing(&self) -> Framing {
        self.framing
    }

    #[must_use]
    pub fn is_boxed(&self) -> bool {
        self.boxed
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Glyph that starts each content line, only for boxed blocks.
    #[must_use]
    pub fn line_start(&self) -> Option<&'static str> {
        self.boxed.then(|| self.framing.line_start())
    }

    /// Joins the lines, each terminated by exactly one `\n`.
    #[must_use]
    pub fn to_text(&self) -> String {
        let capacity = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = String::with_capacity(capacity);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for FormattedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Renders messages and errors using the layout currently set in [`LogState`].
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    state: Arc<LogState>,
}

impl MessageFormatter {
    #[must_use]
    pub fn new(state: Arc<LogState>) -> Self {
        Self { state }
    }

    /// Layout from the shared state; compact indentation follows the current tag width.
    #[must_use]
    pub fn layout(&self) -> Layout {
        if self.state.is_boxed() {
            Layout::Boxed
        } else {
            Layout::Compact {
                indent: self.state.continuation_indent(),
            }
        }
    }

    pub fn message(&self, message: Option<&str>, title: Option<&str>) -> FormattedBlock {
        format_message(self.layout(), message, title)
    }

    pub fn error(&self, message: Option<&str>, report: &ErrorReport) -> FormattedBlock {
        format_error(self.layout(), message, report)
    }
}

/// Formats a plain message. A missing or empty message renders as `null`.
pub fn format_message(layout: Layout, message: Option<&str>, title: Option<&str>) -> FormattedBlock {
    let body = split_lines(message.filter(|m| !m.is_empty()).unwrap_or(NULL));
    let framing = Framing::Message;

    let lines = match layout {
        Layout::Boxed => {
            let mut lines = Vec::with_capacity(body.len() + 2);
            lines.push(match title {
                Some(t) => title_line(t, framing.delimiter_char()),
                None => framing.delimiter(),
            });
            lines.extend(body.iter().map(|l| format!("{DELIMITER_START}{l}")));
            lines.push(framing.delimiter());
            lines
        }
        Layout::Compact { indent } => {
            let mut lines: Vec<String> = title.map(str::to_owned).into_iter().collect();
            lines.extend(body.iter().map(|l| (*l).to_owned()));
            indent_continuations(&mut lines, indent);
            lines
        }
    };

    FormattedBlock {
        lines,
        title: title.map(str::to_owned),
        framing,
        boxed: layout == Layout::Boxed,
    }
}

/// Formats an error: explanatory message lines, `<type>: <message>`, the
/// cause chain, then one indented line per frame.
pub fn format_error(layout: Layout, message: Option<&str>, report: &ErrorReport) -> FormattedBlock {
    let mut body: Vec<String> = message
        .filter(|m| !m.is_empty())
        .map(|m| split_lines(m).into_iter().map(str::to_owned).collect())
        .unwrap_or_default();
    body.push(report.headline());
    body.extend(report.causes().iter().map(|c| format!("{CAUSED_BY}{c}")));
    body.extend(
        report
            .frames()
            .iter()
            .map(|frame| format!("{FRAME_INDENT}{AT}{frame}")),
    );

    let framing = Framing::Error;
    let lines = match layout {
        Layout::Boxed => {
            let mut lines = Vec::with_capacity(body.len() + 2);
            lines.push(framing.delimiter());
            lines.extend(body.iter().map(|l| format!("{ERROR_DELIMITER_START}{l}")));
            lines.push(framing.delimiter());
            lines
        }
        Layout::Compact { indent } => {
            indent_continuations(&mut body, indent);
            body
        }
    };

    FormattedBlock {
        lines,
        title: None,
        framing,
        boxed: layout == Layout::Boxed,
    }
}

/// Splits on `\n` / `\r\n` and drops trailing empty lines. Never empty.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        lines.push("");
    }
    lines
}

fn indent_continuations(lines: &mut [String], indent: usize) {
    if indent == 0 {
        return;
    }
    let pad = " ".repeat(indent);
    for line in lines.iter_mut().skip(1) {
        line.insert_str(0, &pad);
    }
}

/// Centres ` title ` inside a delimiter-wide run of `fill`.
fn title_line(title: &str, fill: char) -> String {
    let long_title = format!(" {title} ");
    let len = long_title.chars().count();
    let lead = ((DELIMITER_WIDTH + len) / 2).saturating_sub(len);
    let tail = DELIMITER_WIDTH.saturating_sub(lead + len);

    let mut line = String::with_capacity(DELIMITER_WIDTH * fill.len_utf8() + long_title.len());
    line.extend(std::iter::repeat_n(fill, lead));
    line.push_str(&long_title);
    line.extend(std::iter::repeat_n(fill, tail));
    line
}
