//! Custom errors types for sqldeploy
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Boxed error used to carry the original driver failure back to the caller.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The step of a script execution that was running when a failure occurred.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ExecutionPhase {
    /// Opening the connection.
    Connect,
    /// Starting the transaction.
    Begin,
    /// Executing the batch at the given zero-based index.
    Batch { index: usize },
    /// Committing the transaction after every batch succeeded.
    Commit,
}

impl ExecutionPhase {
    /// The zero-based index of the failing batch, if the failure happened inside a batch.
    pub fn batch_index(&self) -> Option<usize> {
        match self {
            ExecutionPhase::Batch { index } => Some(*index),
            _ => None,
        }
    }
}

impl Display for ExecutionPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionPhase::Connect => write!(f, "connect"),
            ExecutionPhase::Begin => write!(f, "begin transaction"),
            ExecutionPhase::Batch { index } => write!(f, "batch {index}"),
            ExecutionPhase::Commit => write!(f, "commit"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExecutionError {
    /// a failure reported by the database engine itself
    #[error("engine error in script '{script}' during {phase}: {message}")]
    EngineExecutionError {
        script: String,
        phase: ExecutionPhase,
        /// line inside the failing batch, as reported by the engine
        line: Option<u32>,
        /// line inside the whole script, derived from `line` and the batch position
        script_line: Option<usize>,
        procedure: Option<String>,
        code: Option<String>,
        message: String,
        #[source]
        source: BoxError,
    },

    /// any other failure: connectivity, I/O, driver or runtime errors
    #[error("execution of script '{script}' failed during {phase}: {message}")]
    GenericExecutionError {
        script: String,
        phase: ExecutionPhase,
        message: String,
        #[source]
        source: BoxError,
    },
}

/// Rejected executor settings.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// separators must be a single non-blank line
    #[error("invalid batch separator: '{separator}'")]
    InvalidSeparator { separator: String },
}

impl ExecutionError {
    pub fn script_name(&self) -> &str {
        match self {
            ExecutionError::EngineExecutionError { script, .. }
            | ExecutionError::GenericExecutionError { script, .. } => script,
        }
    }

    pub fn phase(&self) -> ExecutionPhase {
        match self {
            ExecutionError::EngineExecutionError { phase, .. }
            | ExecutionError::GenericExecutionError { phase, .. } => *phase,
        }
    }

    /// Zero-based index of the batch that failed, if any batch was running.
    pub fn batch_index(&self) -> Option<usize> {
        self.phase().batch_index()
    }

    /// The original failure produced by the driver. Downcast it to recover the driver's
    /// own error type, e.g. `sqlx::Error`.
    pub fn driver_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            ExecutionError::EngineExecutionError { source, .. }
            | ExecutionError::GenericExecutionError { source, .. } => &**source,
        }
    }
}
