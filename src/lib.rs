//! taglog is a logging front-end that tags every record with the place it was
//! logged from.
//!
//! A call such as `logger.d("connected")` walks the call stack to the first
//! frame outside this crate, renders it as an aligned tag like
//! `(client.rs:42) connect      ⇛`, formats the message into a boxed or
//! compact block, and hands the result to every registered sink. Long blocks
//! can be split into numbered chunks for sinks with a message size limit.

/// INI configuration loading and the `[Logging]` settings.
pub mod config;
/// Call-site resolution, formatting, chunking, sinks and the logging facade.
pub mod log;

pub use log::{LogLevel, Logger, Subject};
