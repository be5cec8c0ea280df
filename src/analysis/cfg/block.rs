//! Basic blocks of a procedure-level control flow graph.
//!
//! A [`BasicBlock`] holds a straight-line sequence of [`CfgNode`]s that execute in order, and
//! a [`BlockKind`] that explains how control leaves it. Successor edges live in the owning
//! [`ControlFlowGraph`](crate::analysis::ControlFlowGraph); the kind determines how many there
//! are and what they mean:
//!
//! | Kind | Successors |
//! |------|------------|
//! | `Simple` | exactly one |
//! | `Jump` | the jump target, plus the `finally` entry when leaving a guarded region |
//! | `BinaryBranch` | true target, then false target |
//! | `Branch` | normal continuation, then exceptional target |
//! | `ForInitializer`, `ForeachCollectionProducer`, `Lock`, `UsingEnd` | exactly one |
//! | `Exit` | none |
//!
//! Blocks borrow the syntax nodes they reference, so a graph never outlives its procedure.

use std::fmt;

use strum::{Display, EnumIter, IntoStaticStr};

use crate::syntax::{
    CatchClause, Expr, GotoTarget, Stmt, StmtKind, SwitchArm, SwitchLabel, SyntaxId,
    VariableDeclarator,
};

/// The statement family a `Jump` block was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum JumpKind {
    /// `return`
    Return,
    /// `throw` statement or expression
    Throw,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `goto label`
    GotoLabel,
    /// `goto case`
    GotoCase,
    /// `goto default`
    GotoDefault,
    /// `yield break`
    YieldBreak,
}

/// The syntax node that produced a `Jump` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpNode<'a> {
    /// A jump statement
    Statement(&'a Stmt),
    /// A `throw` expression, or the body of an expression-bodied procedure
    Expression(&'a Expr),
}

/// The syntax construct a branching block decides on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchingConstruct<'a> {
    /// `if`, `while`, `do`, `for`, `foreach`, `try`, ...
    Statement(&'a Stmt),
    /// `&&`, `||`, `??`, `?.`, `??=`, `?:`
    Expression(&'a Expr),
    /// A switch statement label test
    CaseLabel(&'a SwitchLabel),
    /// A switch expression arm test
    SwitchArm(&'a SwitchArm),
    /// A catch clause test
    Catch(&'a CatchClause),
}

impl fmt::Display for BranchingConstruct<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchingConstruct::Statement(statement) => write!(f, "{statement}"),
            BranchingConstruct::Expression(expression) => write!(f, "{expression}"),
            BranchingConstruct::CaseLabel(label) => write!(f, "{label}"),
            BranchingConstruct::SwitchArm(arm) => write!(f, "{} =>", arm.pattern),
            BranchingConstruct::Catch(catch) => match &catch.exception_type {
                Some(exception_type) => write!(f, "catch ({exception_type})"),
                None => f.write_str("catch"),
            },
        }
    }
}

/// How control leaves a block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind<'a> {
    /// Falls through to a single successor.
    Simple,
    /// Unconditional transfer caused by a jump statement.
    Jump {
        /// Jump family
        kind: JumpKind,
        /// Originating node
        node: JumpNode<'a>,
    },
    /// Two-way branch. `condition` is the leaf expression tested, when there is one.
    BinaryBranch {
        /// Construct being decided
        construct: BranchingConstruct<'a>,
        /// Tested leaf expression
        condition: Option<&'a Expr>,
    },
    /// Start of a `try` with catch clauses, or the end of a `finally` block. Control either
    /// continues normally or takes the exception edge.
    Branch {
        /// The `try` statement or `finally` block
        construct: BranchingConstruct<'a>,
    },
    /// Evaluates the declarations and initializers of a `for` statement.
    ForInitializer(&'a Stmt),
    /// Evaluates the enumerated collection of a `foreach` statement.
    ForeachCollectionProducer(&'a Stmt),
    /// Evaluates the lock object of a `lock` statement.
    Lock(&'a Stmt),
    /// Disposal point at the end of a `using` body.
    UsingEnd {
        /// The `using` statement
        statement: &'a Stmt,
        /// Names of the disposed resources
        disposed: Vec<String>,
    },
    /// The unique exit of the procedure.
    Exit,
}

impl BlockKind<'_> {
    /// Target label of a `goto label` jump.
    #[must_use]
    pub fn jump_label(&self) -> Option<&str> {
        match self {
            BlockKind::Jump {
                node: JumpNode::Statement(statement),
                ..
            } => match &statement.kind {
                StmtKind::Goto(GotoTarget::Label(label)) => Some(label),
                _ => None,
            },
            _ => None,
        }
    }

    /// Short name of the kind, without payload.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            BlockKind::Simple => "Simple",
            BlockKind::Jump { .. } => "Jump",
            BlockKind::BinaryBranch { .. } => "BinaryBranch",
            BlockKind::Branch { .. } => "Branch",
            BlockKind::ForInitializer(_) => "ForInitializer",
            BlockKind::ForeachCollectionProducer(_) => "ForeachCollectionProducer",
            BlockKind::Lock(_) => "Lock",
            BlockKind::UsingEnd { .. } => "UsingEnd",
            BlockKind::Exit => "Exit",
        }
    }
}

impl fmt::Display for BlockKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Jump { kind, .. } => match self.jump_label() {
                Some(label) => write!(f, "Jump({kind} {label})"),
                None => write!(f, "Jump({kind})"),
            },
            BlockKind::BinaryBranch { construct, .. } => write!(f, "BinaryBranch({construct})"),
            BlockKind::Branch { construct } => write!(f, "Branch({construct})"),
            BlockKind::UsingEnd { disposed, .. } => write!(f, "UsingEnd({})", disposed.join(", ")),
            other => f.write_str(other.name()),
        }
    }
}

/// One instruction of a basic block: a syntax node evaluated at that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CfgNode<'a> {
    /// An expression, evaluated after its operands
    Expression(&'a Expr),
    /// A local variable declaration, evaluated after its initializer
    Declarator(&'a VariableDeclarator),
    /// Binding of a `foreach` iteration variable to the next element
    ForeachVariable {
        /// Iteration variable
        variable: &'a VariableDeclarator,
        /// Enumerated collection
        collection: &'a Expr,
    },
    /// A switch statement label test against the discriminant
    CaseLabel {
        /// Tested label
        label: &'a SwitchLabel,
        /// Switch discriminant
        discriminant: &'a Expr,
    },
    /// A switch expression arm test against the governing value
    SwitchArm {
        /// Tested arm
        arm: &'a SwitchArm,
        /// Governing expression
        governing: &'a Expr,
    },
}

impl CfgNode<'_> {
    /// Id of the underlying syntax node.
    #[must_use]
    pub fn id(&self) -> SyntaxId {
        match self {
            CfgNode::Expression(expression) => expression.id,
            CfgNode::Declarator(declarator) | CfgNode::ForeachVariable { variable: declarator, .. } => {
                declarator.id
            }
            CfgNode::CaseLabel { label, .. } => label.id,
            CfgNode::SwitchArm { arm, .. } => arm.id,
        }
    }
}

impl fmt::Display for CfgNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgNode::Expression(expression) => write!(f, "{expression}"),
            CfgNode::Declarator(declarator) => match &declarator.initializer {
                Some(initializer) => write!(f, "var {} = {initializer}", declarator.name),
                None => write!(f, "var {}", declarator.name),
            },
            CfgNode::ForeachVariable {
                variable,
                collection,
            } => write!(f, "var {} in {collection}", variable.name),
            CfgNode::CaseLabel { label, .. } => write!(f, "{label}"),
            CfgNode::SwitchArm { arm, .. } => write!(f, "{} =>", arm.pattern),
        }
    }
}

/// A basic block: straight-line instructions plus the reason control leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock<'a> {
    /// Dense id; equal to the block's node index in its graph
    pub id: usize,
    /// Exit semantics
    pub kind: BlockKind<'a>,
    /// Instructions in execution order
    pub instructions: Vec<CfgNode<'a>>,
}

impl BasicBlock<'_> {
    /// `true` for the procedure exit block.
    #[must_use]
    pub fn is_exit(&self) -> bool {
        matches!(self.kind, BlockKind::Exit)
    }

    /// `true` if the block has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxFactory;

    #[test]
    fn test_jump_label_and_display() {
        let mut f = SyntaxFactory::new();
        let statement = f.goto_label("retry");
        let kind = BlockKind::Jump {
            kind: JumpKind::GotoLabel,
            node: JumpNode::Statement(&statement),
        };

        assert_eq!(kind.jump_label(), Some("retry"));
        assert_eq!(kind.to_string(), "Jump(GotoLabel retry)");
        assert_eq!(kind.name(), "Jump");
    }

    #[test]
    fn test_node_ids_follow_syntax() {
        let mut f = SyntaxFactory::new();
        let value = f.int(1);
        let declarator = f.declarator("x", Some(value));

        let node = CfgNode::Declarator(&declarator);
        assert_eq!(node.id(), declarator.id);
        assert_eq!(node.to_string(), "var x = 1");
    }

    #[test]
    fn test_using_end_display() {
        let mut f = SyntaxFactory::new();
        let body = f.block(Vec::new());
        let statement = f.using_stmt(Vec::new(), None, body);
        let kind = BlockKind::UsingEnd {
            statement: &statement,
            disposed: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(kind.to_string(), "UsingEnd(a, b)");
    }
}
