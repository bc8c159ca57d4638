//! Error types for debugger operations.

use thiserror::Error;

/// Errors a `DebuggerSession` can return to its caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DebuggerError {
    #[error("no breakpoint with id {0}")]
    UnknownBreakpoint(u32),

    #[error("breakpoint at {0} could not be resolved to an instruction")]
    UnresolvedBreakpoint(String),

    #[error("no value registered under handle {0}")]
    UnknownHandle(i64),

    #[error("frame index {0} is out of range")]
    InvalidFrameIndex(usize),

    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("no active execution to operate on")]
    NoActiveExecution,
}
