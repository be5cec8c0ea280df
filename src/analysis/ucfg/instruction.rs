//! UCFG instruction vocabulary.
//!
//! Every lowered instruction either binds the result of a call to a target, or allocates an
//! object:
//!
//! ```text
//! %0 := System.String.ToLower() [ a ]
//! %1 := new Foo
//! %2 := Foo.Foo(string) [ %1 s ]
//! x := __id [ %0 ]
//! ```
//!
//! Arguments are [`Expression`]s: variables (including temporaries), `this`, constants,
//! class names for static receivers, and field accesses. Operations without a call symbol are
//! expressed as [`PseudoOp`] calls.

use std::fmt;

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// A value reference used as an argument or assignment target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// A local, parameter or temporary (`%n`)
    Variable(String),
    /// The current instance
    This,
    /// An opaque constant. `None` when the value is not tracked.
    Constant(Option<String>),
    /// The receiver of a static member
    ClassName(String),
    /// A field of an object
    FieldAccess {
        /// Owning object: a variable, `this` or a class name
        object: Box<Expression>,
        /// Field name
        field: String,
    },
}

impl Expression {
    /// The untracked constant.
    #[must_use]
    pub const fn constant() -> Self {
        Expression::Constant(None)
    }

    /// A variable reference.
    #[must_use]
    pub fn variable(name: &str) -> Self {
        Expression::Variable(name.to_string())
    }

    /// `true` for compiler temporaries (`%n`).
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        matches!(self, Expression::Variable(name) if name.starts_with('%'))
    }

    /// `true` for expressions that can own a field: variables, `this` and class names.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Expression::Variable(_) | Expression::This | Expression::ClassName(_)
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Variable(name) => f.write_str(name),
            Expression::This => f.write_str("this"),
            Expression::Constant(None) => f.write_str("const"),
            Expression::Constant(Some(value)) => write!(f, "\"{}\"", value.escape_default()),
            Expression::ClassName(name) => f.write_str(name),
            Expression::FieldAccess { object, field } => write!(f, "{object}.{field}"),
        }
    }
}

/// Builtin operations with no ordinary call symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, AsRefStr,
)]
pub enum PseudoOp {
    /// Copies a value into a target
    #[strum(serialize = "__id")]
    Id,
    /// String concatenation
    #[strum(serialize = "__concat")]
    Concat,
    /// Element read of an array or indexer
    #[strum(serialize = "__arrayGet")]
    ArrayGet,
    /// Element write of an array or indexer
    #[strum(serialize = "__arraySet")]
    ArraySet,
    /// Applies a parameter annotation
    #[strum(serialize = "__annotate")]
    Annotate,
    /// Binds an annotated value back to its parameter
    #[strum(serialize = "__annotation")]
    Annotation,
    /// Marks untrusted parameters of an entry point
    #[strum(serialize = "__entrypoint")]
    EntryPoint,
    /// A call whose target could not be resolved
    #[strum(serialize = "__unknown")]
    Unknown,
}

/// One lowered instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `target := method [ arguments ]`
    Assign {
        /// Receives the call result
        target: Expression,
        /// Qualified method id or pseudo-op name
        method: String,
        /// Receiver first (for instance and static calls), then arguments
        arguments: Vec<Expression>,
    },
    /// `target := new type_name`
    NewObject {
        /// Receives the new object
        target: Expression,
        /// Allocated type
        type_name: String,
    },
}

impl Instruction {
    /// Builds an assignment through a pseudo-op.
    #[must_use]
    pub fn pseudo(target: Expression, op: PseudoOp, arguments: Vec<Expression>) -> Self {
        Instruction::Assign {
            target,
            method: op.to_string(),
            arguments,
        }
    }

    /// The assigned expression.
    #[must_use]
    pub fn target(&self) -> &Expression {
        match self {
            Instruction::Assign { target, .. } | Instruction::NewObject { target, .. } => target,
        }
    }

    /// Arguments read by the instruction.
    #[must_use]
    pub fn arguments(&self) -> &[Expression] {
        match self {
            Instruction::Assign { arguments, .. } => arguments,
            Instruction::NewObject { .. } => &[],
        }
    }

    /// The pseudo-op this instruction calls, if any.
    #[must_use]
    pub fn pseudo_op(&self) -> Option<PseudoOp> {
        match self {
            Instruction::Assign { method, .. } => method.parse().ok(),
            Instruction::NewObject { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign {
                target,
                method,
                arguments,
            } => {
                write!(f, "{target} := {method} [")?;
                for argument in arguments {
                    write!(f, " {argument}")?;
                }
                f.write_str(" ]")
            }
            Instruction::NewObject { target, type_name } => {
                write!(f, "{target} := new {type_name}")
            }
        }
    }
}
