use std::{
    any::{self, Any},
    error::Error,
    fmt,
};

use crate::log::call_frame::CallFrame;

/// A printable snapshot of an error: its type, message, cause chain and the
/// stack it was logged from.
///
/// This is what sinks receive alongside a formatted error block, so they
/// don't need to know the concrete error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    kind: String,
    message: String,
    causes: Vec<String>,
    frames: Vec<CallFrame>,
}

impl ErrorReport {
    /// Captures `err`, naming it after its concrete type.
    pub fn new<E: Error + 'static>(err: &E) -> Self {
        Self::with_kind(any::type_name::<E>(), err)
    }

    /// Captures a type-erased error. The kind is taken from `kind`.
    pub fn with_kind(kind: impl Into<String>, err: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: kind.into(),
            message: err.to_string(),
            causes,
            frames: Vec::new(),
        }
    }

    /// Report for a caught panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("Box<dyn Any>")
        };
        Self::custom("panic", message)
    }

    /// Report built from plain parts.
    pub fn custom(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
            frames: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_frames(mut self, frames: Vec<CallFrame>) -> Self {
        self.frames = frames;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// `<type>: <message>`, the head line of a formatted error block.
    #[must_use]
    pub fn headline(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug)]
    struct Outer(io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn records_type_and_cause_chain() {
        let err = Outer(io::Error::new(io::ErrorKind::TimedOut, "socket timed out"));
        let report = ErrorReport::new(&err);
        assert!(report.kind().ends_with("Outer"));
        assert_eq!(report.message(), "request failed");
        assert_eq!(report.causes(), ["socket timed out"]);
        assert!(report.headline().ends_with("Outer: request failed"));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(ErrorReport::from_panic(payload.as_ref()).headline(), "panic: boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(ErrorReport::from_panic(payload.as_ref()).message(), "bang");
    }
}
