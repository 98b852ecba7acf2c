//! Leveled logging macros with `format!` arguments.
//!
//! `log_v!` … `log_wtf!` go through [`Logger::global`](crate::log::Logger::global);
//! `logger_log!` takes any logger or scope; `sink_log!` writes straight to
//! one sink, tagged with the module path, bypassing call-site resolution.

// ============================================================================
// 1. GENERIC MACROS
// ============================================================================

#[macro_export]
macro_rules! logger_log {
    ($logger:expr, $lvl:expr, $($arg:tt)*) => {{
        let __msg = format!($($arg)*);
        $logger.log($lvl, None, Some(&__msg), None);
    }};
}

#[macro_export]
macro_rules! sink_log {
    ($sink:expr, $lvl:expr, $($arg:tt)*) => {{
        let __msg = format!($($arg)*);
        $crate::log::LogSink::log(&*$sink, $lvl, module_path!(), &__msg, None)
    }};
}

// ============================================================================
// 2. LEVEL-SPECIFIC MACROS (global logger)
// ============================================================================

#[macro_export]
macro_rules! log_v   { ($($arg:tt)*) => { $crate::logger_log!($crate::log::Logger::global(), $crate::log::LogLevel::Verbose, $($arg)*) } }
#[macro_export]
macro_rules! log_d   { ($($arg:tt)*) => { $crate::logger_log!($crate::log::Logger::global(), $crate::log::LogLevel::Debug, $($arg)*) } }
#[macro_export]
macro_rules! log_i   { ($($arg:tt)*) => { $crate::logger_log!($crate::log::Logger::global(), $crate::log::LogLevel::Info, $($arg)*) } }
#[macro_export]
macro_rules! log_w   { ($($arg:tt)*) => { $crate::logger_log!($crate::log::Logger::global(), $crate::log::LogLevel::Warning, $($arg)*) } }
#[macro_export]
macro_rules! log_e   { ($($arg:tt)*) => { $crate::logger_log!($crate::log::Logger::global(), $crate::log::LogLevel::Error, $($arg)*) } }
#[macro_export]
macro_rules! log_wtf { ($($arg:tt)*) => { $crate::logger_log!($crate::log::Logger::global(), $crate::log::LogLevel::Fatal, $($arg)*) } }
