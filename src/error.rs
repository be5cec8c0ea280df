use thiserror::Error;

use crate::syntax::SyntaxId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Construction of a control flow graph is the only stage that can fail: a procedure whose
/// jumps cannot be resolved is rejected as a whole. The lowering stage never fails and instead
/// degrades precision for anything it does not understand.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::Malformed`] - An internal invariant of a graph under construction was violated
/// - [`Error::GraphError`] - Graph storage rejected an operation (bad node or edge id)
///
/// ## Jump Resolution Errors
/// - [`Error::UndeclaredLabel`] - `goto` names a label that the procedure never declares
/// - [`Error::UnresolvedJump`] - `break`/`continue` outside of any enclosing target
/// - [`Error::UnknownSwitchCase`] - `goto case`/`goto default` without a matching section
///
/// ## Orchestration Errors
/// - [`Error::Procedure`] - Wraps any of the above with the name of the failing procedure
/// - [`Error::Cancelled`] - A batch run observed its cancellation flag
///
/// `Error` is [`Clone`] so that one failed build can be handed to every caller that was waiting
/// on the same cache entry.
///
/// # Examples
///
/// ```rust
/// use flowscope::{Error, analysis::ControlFlowGraph, semantic::MemorySemanticModel, syntax::SyntaxFactory};
///
/// let mut f = SyntaxFactory::new();
/// let body = vec![f.goto_label("missing")];
/// let procedure = f.method("C.M()", Vec::new(), body);
///
/// match ControlFlowGraph::build(&procedure, &MemorySemanticModel::new()) {
///     Err(Error::Procedure { procedure, source }) => {
///         assert_eq!(procedure, "C.M()");
///         assert!(matches!(*source, Error::UndeclaredLabel(_)));
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An internal invariant was violated while assembling a graph.
    ///
    /// This indicates a bug in a builder rather than a problem with the input, for example a
    /// placeholder block that was never linked to its target. The error includes the source
    /// location where the violation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
    /// A `goto` statement references a label that is not declared in the procedure.
    ///
    /// Labels are collected before the body is traversed, so forward and backward jumps
    /// resolve equally. Labels declared inside lambdas or local functions are not visible.
    #[error("Undeclared label '{0}'")]
    UndeclaredLabel(String),
    /// A `break` or `continue` has no enclosing loop or switch to jump to.
    ///
    /// The associated [`SyntaxId`] identifies the offending statement.
    #[error("Jump statement {statement} has no enclosing target")]
    UnresolvedJump {
        /// The `break` or `continue` statement that could not be resolved
        statement: SyntaxId,
    },
    /// A `goto case` or `goto default` names a section the enclosing switch does not have.
    ///
    /// The associated value is the rendered case expression, or `default`.
    #[error("No switch section matches 'goto case {0}'")]
    UnknownSwitchCase(String),
    /// Graph storage error.
    ///
    /// Raised by [`crate::utils::graph::DirectedGraph`] when an edge references a node that
    /// does not exist.
    #[error("{0}")]
    GraphError(String),
    /// Graph construction failed for a specific procedure.
    ///
    /// Every error leaving the CFG builder is wrapped in this variant so that batch callers
    /// can attribute the failure without inspecting the inner cause.
    #[error("Failed to build control flow graph for '{procedure}': {source}")]
    Procedure {
        /// Qualified name of the procedure that failed
        procedure: String,
        /// The underlying cause
        source: Box<Error>,
    },
    /// The batch was cancelled before this procedure was processed.
    #[error("Operation was cancelled")]
    Cancelled,
}

impl Error {
    /// Wraps this error with the name of the procedure in which it occured.
    ///
    /// Errors that already carry a procedure name are returned unchanged.
    #[must_use]
    pub fn in_procedure(self, procedure: &str) -> Self {
        match self {
            Error::Procedure { .. } | Error::Cancelled => self,
            other => Error::Procedure {
                procedure: procedure.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost cause, looking through [`Error::Procedure`] wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Procedure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
