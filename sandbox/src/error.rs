//! Sandbox error types.

use std::fmt;

use scripthost_hostapi::HostError;

/// How a guest script failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptErrorKind {
    /// The chunk did not compile.
    Compile,
    /// The guest raised an error while running.
    Runtime,
    /// The runtime allocator refused an allocation.
    Memory,
    /// The error handler itself raised.
    ErrorInErrorHandler,
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Compile => "compile error",
            Self::Runtime => "runtime error",
            Self::Memory => "memory error",
            Self::ErrorInErrorHandler => "error in error handler",
        };
        f.write_str(s)
    }
}

/// A failed guest compile or call.
///
/// `message` is the error value as text after the error handler ran, so it
/// includes the traceback when one was attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub message: String,
}

impl ScriptError {
    pub fn new(kind: ScriptErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Compile, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::Runtime, message)
    }

    /// Classify an `mlua::Error` that escaped a host-side call.
    pub fn from_lua(err: &mlua::Error) -> Self {
        match err {
            mlua::Error::SyntaxError { message, .. } => Self::compile(message.clone()),
            mlua::Error::MemoryError(message) => {
                Self::new(ScriptErrorKind::Memory, message.clone())
            }
            other => {
                let message = other.to_string();
                if message.contains(ERROR_IN_ERROR_HANDLING) {
                    Self::new(ScriptErrorKind::ErrorInErrorHandler, message)
                } else {
                    Self::runtime(message)
                }
            }
        }
    }
}

/// Error object Lua produces when the message handler itself fails.
pub(crate) const ERROR_IN_ERROR_HANDLING: &str = "error in error handling";

/// Error object Lua produces for allocation failures.
pub(crate) const NOT_ENOUGH_MEMORY: &str = "not enough memory";

/// Top-level error type for the sandbox crate.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Lua runtime error surfaced through the embedding API.
    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// Virtual filesystem error.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// A guest script failed to compile or run.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// The bootstrapped environment does not match the sandbox policy.
    #[error("validation error: {0}")]
    ValidationError(String),
}
