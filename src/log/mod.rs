pub mod call_frame;
pub mod call_site;
pub mod chunk_splitter;
pub mod console_sink;
pub mod dump;
pub mod error_report;
pub mod file_logger;
pub mod formatter;
pub mod log_error;
pub mod log_level;
pub mod log_macros;
pub mod log_msg;
pub mod log_sink;
pub mod log_state;
pub mod logger;
pub mod logger_handle;
pub mod memory_sink;
pub mod noop_log_sink;
pub mod sink_registry;
pub mod tracing_sink;

pub use call_frame::{CallFrame, CallStack};
pub use call_site::{CallSiteResolver, FrameFilter, Subject};
pub use chunk_splitter::ChunkSplitter;
pub use console_sink::ConsoleSink;
pub use dump::Describable;
pub use error_report::ErrorReport;
pub use file_logger::FileLogger;
pub use formatter::{FormattedBlock, Framing, Layout, MessageFormatter};
pub use log_error::{ConfigError, LogError, SinkError};
pub use log_level::LogLevel;
pub use log_msg::LogMsg;
pub use log_sink::{LogSink, SinkId};
pub use log_state::LogState;
pub use logger::{LogScope, Logger};
pub use logger_handle::LoggerHandle;
pub use memory_sink::MemorySink;
pub use noop_log_sink::NoopLogSink;
pub use sink_registry::{DispatchFailure, Registration, SinkRegistry};
pub use tracing_sink::TracingSink;
