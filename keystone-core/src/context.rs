//! Context - correlation token threaded through lifecycle calls

use std::fmt;

/// Opaque trace token. Only used for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    trace_id: Option<String>,
}

impl Context {
    /// Create a context with a fresh trace id
    pub fn new() -> Self {
        Self {
            trace_id: Some(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Context without a trace id
    pub fn empty() -> Self {
        Self { trace_id: None }
    }

    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: Some(trace_id.into()),
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.trace_id.as_deref().unwrap_or("-"))
    }
}
