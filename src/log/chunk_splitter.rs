//! Splits long formatted blocks into pieces a size-limited sink accepts.
//!
//! A block of `N > 1` chunks is delivered as:
//!
//! ```text
//! (part 1 of 3)
//! · first lines…
//! (part 2 of 3)
//! …· middle lines…
//! (part 3 of 3)
//! …· last lines
//! ```
//!
//! Removing the markers and concatenating the bodies gives back the block.

use crate::log::{
    error_report::ErrorReport,
    formatter::{FormattedBlock, Framing},
    log_level::LogLevel,
    log_state::DEFAULT_CHUNK_SIZE,
    sink_registry::{DispatchFailure, SinkRegistry},
};

/// Continuation marker between chunks.
pub const ELLIPSIS: &str = "…";

/// Reads the `(part i of N)` marker heading a decorated chunk.
#[must_use]
pub fn part_of(chunk: &str) -> Option<(usize, usize)> {
    let first = chunk.lines().next()?;
    let inner = first.strip_prefix("(part ")?.strip_suffix(')')?;
    let (part, total) = inner.split_once(" of ")?;
    Some((part.parse().ok()?, total.parse().ok()?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSplitter {
    budget: usize,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkSplitter {
    /// Splitter with a budget of `budget` characters per chunk (at least one).
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            budget: budget.max(1),
        }
    }

    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Cuts `text` into undecorated bodies of at most `budget` characters.
    ///
    /// A cut goes right after the last `\n` inside the window, or at exactly
    /// `budget` characters when the window holds no line break.
    #[must_use]
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut chunks = Vec::new();
        let mut rest = text;
        while let Some((window_end, _)) = rest.char_indices().nth(self.budget) {
            let window = &rest[..window_end];
            let cut = window.rfind('\n').map_or(window_end, |pos| pos + 1);
            let (chunk, tail) = rest.split_at(cut);
            chunks.push(chunk);
            rest = tail;
        }
        chunks.push(rest);
        chunks
    }

    /// Adds part counters and continuation markers. `framing` is the glyph set
    /// of a boxed block, restored at the start of chunks after the first.
    /// A single chunk is returned unchanged.
    #[must_use]
    pub fn decorate(bodies: &[&str], framing: Option<Framing>) -> Vec<String> {
        let total = bodies.len();
        if total <= 1 {
            return bodies.iter().map(|b| (*b).to_owned()).collect();
        }

        bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                let part = i + 1;
                let mut chunk = format!("(part {part} of {total})\n");
                if i > 0 {
                    chunk.push_str(ELLIPSIS);
                    if let Some(framing) = framing {
                        let framed = body.starts_with(framing.line_start())
                            || body.starts_with(framing.delimiter_char());
                        if !framed {
                            chunk.push_str(framing.line_start());
                        }
                    }
                }
                chunk.push_str(body);
                let interior = part < total;
                if interior && (i > 0 || !body.ends_with('\n')) {
                    chunk.push_str(ELLIPSIS);
                }
                chunk
            })
            .collect()
    }

    /// Split and decorate a rendered block.
    #[must_use]
    pub fn chunks(&self, block: &FormattedBlock) -> Vec<String> {
        let text = block.to_text();
        let framing = block.is_boxed().then(|| block.framing());
        Self::decorate(&self.split(&text), framing)
    }

    /// Dispatches every chunk of `block` with the same level and tag, in
    /// order. The error report travels with the last chunk only.
    pub fn dispatch(
        &self,
        registry: &SinkRegistry,
        level: LogLevel,
        tag: &str,
        block: &FormattedBlock,
        error: Option<&ErrorReport>,
    ) -> Vec<DispatchFailure> {
        let chunks = self.chunks(block);
        let last = chunks.len().saturating_sub(1);
        let mut failures = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let attached = if i == last { error } else { None };
            failures.extend(registry.dispatch(level, tag, chunk, attached));
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::{
        formatter::{Layout, format_message},
        memory_sink::MemorySink,
    };
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn budget_one_hard_cuts_every_character() {
        let splitter = ChunkSplitter::new(1);
        assert_eq!(splitter.split("A\nB"), ["A", "\n", "B"]);
    }

    #[test]
    fn large_budget_keeps_one_chunk() {
        let splitter = ChunkSplitter::new(1000);
        assert_eq!(splitter.split("A\nB"), ["A\nB"]);
        assert_eq!(ChunkSplitter::decorate(&["A\nB"], None), ["A\nB"]);
    }

    #[test]
    fn cuts_after_last_line_break_in_window() {
        let splitter = ChunkSplitter::new(8);
        assert_eq!(splitter.split("ab\ncd\nefgh\nij"), ["ab\ncd\n", "efgh\nij"]);
    }

    #[test]
    fn cuts_on_char_boundaries() {
        let splitter = ChunkSplitter::new(2);
        assert_eq!(splitter.split("ééé"), ["éé", "é"]);
    }

    #[test]
    fn zero_budget_is_raised() {
        assert_eq!(ChunkSplitter::new(0).budget(), 1);
    }

    #[test]
    fn decorates_first_interior_and_last() {
        let bodies = ["· a\n", "· b\n", "c"];
        let chunks = ChunkSplitter::decorate(&bodies, Some(Framing::Message));
        assert_eq!(
            chunks,
            [
                "(part 1 of 3)\n· a\n",
                "(part 2 of 3)\n…· b\n…",
                "(part 3 of 3)\n…· c",
            ]
        );
    }

    #[test]
    fn first_chunk_gets_ellipsis_when_cut_mid_line() {
        let chunks = ChunkSplitter::decorate(&["ab", "cd"], None);
        assert_eq!(chunks, ["(part 1 of 2)\nab…", "(part 2 of 2)\n…cd"]);
    }

    #[test]
    fn delimiter_chunks_keep_their_own_glyph() {
        let chunks = ChunkSplitter::decorate(&["x\n", "====\n"], Some(Framing::Error));
        assert_eq!(chunks[1], "(part 2 of 2)\n…====\n");
    }

    #[test]
    fn same_tag_and_level_for_all_chunks_and_error_on_last() {
        let registry = SinkRegistry::empty();
        let sink = Arc::new(MemorySink::new(16));
        registry.register(sink.clone());

        let block = format_message(Layout::Boxed, Some("one\ntwo\nthree\nfour"), None);
        let report = ErrorReport::custom("E", "x");
        let splitter = ChunkSplitter::new(90);
        let failures =
            splitter.dispatch(&registry, LogLevel::Warning, "tag⇛", &block, Some(&report));
        assert!(failures.is_empty());

        let records = sink.records();
        assert!(records.len() > 1);
        assert!(records.iter().all(|r| r.tag == "tag⇛" && r.level == LogLevel::Warning));
        assert!(records[0].text.starts_with("(part 1 of "));
        assert!(records.last().unwrap().text.starts_with(&format!("(part {} of ", records.len())));
    }

    #[test]
    fn reads_part_markers() {
        let chunks = ChunkSplitter::decorate(&["ab", "cd"], None);
        assert_eq!(part_of(&chunks[0]), Some((1, 2)));
        assert_eq!(part_of(&chunks[1]), Some((2, 2)));
        assert_eq!(part_of("plain text"), None);
        assert_eq!(part_of("(part x of 2)\n"), None);
    }

    #[test]
    fn short_block_is_byte_identical() {
        let block = format_message(Layout::Boxed, Some("short"), None);
        let chunks = ChunkSplitter::default().chunks(&block);
        assert_eq!(chunks, [block.to_text()]);
    }

    proptest! {
        #[test]
        fn bodies_concatenate_to_input(text in "[a-z\\n é]{0,300}", budget in 1usize..64) {
            let splitter = ChunkSplitter::new(budget);
            let bodies = splitter.split(&text);
            prop_assert_eq!(bodies.concat(), text.clone());
            for body in &bodies {
                prop_assert!(body.chars().count() <= budget);
            }
            if text.chars().count() <= budget {
                prop_assert_eq!(bodies, vec![text.as_str()]);
            }
        }
    }
}
