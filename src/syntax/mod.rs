//! Typed syntax tree for C#-style procedure bodies.
//!
//! This module defines the input consumed by the control flow graph builder: a closed set of
//! statement, expression and pattern nodes covering the constructs that shape intraprocedural
//! control flow. Trees are produced by an external front end (or by [`SyntaxFactory`] in tests)
//! and are never mutated by this crate.
//!
//! # Identity
//!
//! Every node carries a [`SyntaxId`]. Ids are the keys under which the
//! [`crate::semantic::SemanticModel`] answers symbol and type queries, under which the
//! [`crate::analysis::CfgCache`] memoizes graphs, and under which the UCFG lowering memoizes
//! already translated expressions. Ids must therefore be unique within one tree.
//!
//! # Layout
//!
//! - [`Procedure`] - A method, constructor, accessor, local function or lambda
//! - [`Stmt`] / [`StmtKind`] - Statements, including every structured jump construct
//! - [`Expr`] / [`ExprKind`] - Expressions, including short-circuit and null-conditional forms
//! - [`Pattern`] / [`PatternKind`] - Patterns used by `case`, `is` and switch expressions
//!
//! # Thread Safety
//!
//! All types in this module are `Send` and `Sync`.

mod display;
mod factory;
mod walk;

pub use factory::SyntaxFactory;
pub use walk::{walk_expression, walk_statement, Visit};

use std::fmt;

/// Unique identifier of a syntax node within one tree.
///
/// Displayed as `#n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxId(pub u32);

impl SyntaxId {
    /// Creates a new `SyntaxId`.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The flavour of code unit a [`Procedure`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureKind {
    /// An ordinary method
    Method,
    /// An instance or static constructor
    Constructor,
    /// A property or indexer accessor
    Accessor,
    /// A local function declared inside another body
    LocalFunction,
    /// A lambda expression or anonymous method
    Lambda,
}

/// A single code unit: the granularity at which graphs are built and cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    /// Node id of the declaration
    pub id: SyntaxId,
    /// Qualified display name, used for diagnostics and as a fallback method id
    pub name: String,
    /// What kind of code unit this is
    pub kind: ProcedureKind,
    /// Declared parameters in order
    pub parameters: Vec<Parameter>,
    /// The body
    pub body: ProcedureBody,
}

impl Procedure {
    /// Returns every lambda and local function declared anywhere inside this body.
    ///
    /// Nested procedures are reported in source order, outer before inner. They are
    /// independent code units and get their own graphs.
    #[must_use]
    pub fn nested(&self) -> Vec<&Procedure> {
        struct Collector<'a> {
            found: Vec<&'a Procedure>,
        }

        impl<'a> Visit<'a> for Collector<'a> {
            fn visit_procedure(&mut self, procedure: &'a Procedure) -> bool {
                self.found.push(procedure);
                true
            }
        }

        let mut collector = Collector { found: Vec::new() };
        match &self.body {
            ProcedureBody::Block(statements) => {
                for statement in statements {
                    walk_statement(statement, &mut collector);
                }
            }
            ProcedureBody::Expression(expression) => walk_expression(expression, &mut collector),
        }
        collector.found
    }
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Node id of the parameter declaration
    pub id: SyntaxId,
    /// Parameter name
    pub name: String,
}

/// Body of a [`Procedure`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureBody {
    /// A statement block
    Block(Vec<Stmt>),
    /// An expression body (`=> expr`)
    Expression(Expr),
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// Node id
    pub id: SyntaxId,
    /// The statement itself
    pub kind: StmtKind,
}

/// A local variable declarator (`name = initializer`).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// Node id of the declarator
    pub id: SyntaxId,
    /// Declared name
    pub name: String,
    /// Optional initializer
    pub initializer: Option<Expr>,
}

/// Every statement form understood by the graph builder.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// An expression evaluated for its effect
    Expression(Expr),
    /// `var a = 1, b;`
    LocalDeclaration(Vec<VariableDeclarator>),
    /// `if (condition) then else otherwise`
    If {
        /// Branch condition
        condition: Expr,
        /// Taken when the condition holds
        then_branch: Box<Stmt>,
        /// Taken otherwise
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (condition) body`
    While {
        /// Loop condition
        condition: Expr,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `do body while (condition);`
    Do {
        /// Loop body
        body: Box<Stmt>,
        /// Loop condition, checked after each iteration
        condition: Expr,
    },
    /// `for (declarations | initializers; condition; incrementors) body`
    For {
        /// Declared loop variables
        declarators: Vec<VariableDeclarator>,
        /// Initializer expressions, used when nothing is declared
        initializers: Vec<Expr>,
        /// Loop condition, absent for `for (;;)`
        condition: Option<Expr>,
        /// Incrementor expressions
        incrementors: Vec<Expr>,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `foreach (var variable in collection) body`
    Foreach {
        /// Iteration variable
        variable: VariableDeclarator,
        /// Enumerated collection
        collection: Expr,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `switch (expression) { sections }`
    Switch {
        /// Discriminant
        expression: Expr,
        /// Sections in source order
        sections: Vec<SwitchSection>,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `return;` or `return expr;`
    Return(Option<Expr>),
    /// `throw;` or `throw expr;`
    Throw(Option<Expr>),
    /// `yield return expr;`
    YieldReturn(Expr),
    /// `yield break;`
    YieldBreak,
    /// `goto label;`, `goto case expr;` or `goto default;`
    Goto(GotoTarget),
    /// `label: statement`
    Labeled {
        /// Label name
        label: String,
        /// The labeled statement
        statement: Box<Stmt>,
    },
    /// `try { } catch { } finally { }`
    Try {
        /// Protected block
        block: Box<Stmt>,
        /// Catch clauses in source order
        catches: Vec<CatchClause>,
        /// Optional finally block
        finally: Option<Box<Stmt>>,
    },
    /// `using (declarations | expression) body`
    Using {
        /// Declared resources
        declarators: Vec<VariableDeclarator>,
        /// Resource expression, used when nothing is declared
        expression: Option<Expr>,
        /// Guarded body
        body: Box<Stmt>,
    },
    /// `lock (expression) body`
    Lock {
        /// Lock object
        expression: Expr,
        /// Guarded body
        body: Box<Stmt>,
    },
    /// `fixed (declarations) body`
    Fixed {
        /// Pinned declarations
        declarators: Vec<VariableDeclarator>,
        /// Guarded body
        body: Box<Stmt>,
    },
    /// `checked { }`
    Checked(Box<Stmt>),
    /// `unchecked { }`
    Unchecked(Box<Stmt>),
    /// `unsafe { }`
    Unsafe(Box<Stmt>),
    /// A local function declaration, analyzed as its own procedure
    LocalFunction(Box<Procedure>),
    /// `;`
    Empty,
}

/// Target of a `goto` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum GotoTarget {
    /// `goto name;`
    Label(String),
    /// `goto case expr;`
    Case(Expr),
    /// `goto default;`
    Default,
}

/// One `case ...: case ...: statements` section of a switch statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSection {
    /// Node id of the section
    pub id: SyntaxId,
    /// Labels in source order
    pub labels: Vec<SwitchLabel>,
    /// Section body
    pub statements: Vec<Stmt>,
}

/// One label of a [`SwitchSection`].
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchLabel {
    /// Node id of the label
    pub id: SyntaxId,
    /// Label form
    pub kind: SwitchLabelKind,
}

/// Label forms of a switch section.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchLabelKind {
    /// `case constant:`
    Case(Expr),
    /// `case pattern when guard:`
    Pattern {
        /// Matched pattern
        pattern: Pattern,
        /// Optional `when` clause
        guard: Option<Expr>,
    },
    /// `default:`
    Default,
}

/// A `catch` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Node id of the clause
    pub id: SyntaxId,
    /// Caught exception type, absent for a bare `catch`
    pub exception_type: Option<String>,
    /// Name bound to the exception, if any
    pub name: Option<String>,
    /// Optional `when` filter
    pub filter: Option<Expr>,
    /// Handler body
    pub block: Box<Stmt>,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Node id
    pub id: SyntaxId,
    /// The expression itself
    pub kind: ExprKind,
}

impl Expr {
    /// Returns the expression with any enclosing parentheses removed.
    #[must_use]
    pub fn unparenthesized(&self) -> &Expr {
        let mut current = self;
        while let ExprKind::Parenthesized(inner) = &current.kind {
            current = inner;
        }
        current
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integral literal
    Integer(i64),
    /// Floating point literal, kept as written
    Real(String),
    /// Character literal
    Character(char),
    /// String literal, unescaped
    String(String),
}

impl Literal {
    /// Returns the literal's value as plain text, without quoting.
    #[must_use]
    pub fn value_text(&self) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Boolean(value) => value.to_string(),
            Literal::Integer(value) => value.to_string(),
            Literal::Real(text) => text.clone(),
            Literal::Character(value) => value.to_string(),
            Literal::String(value) => value.clone(),
        }
    }
}

/// Passing mode of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefKind {
    /// By value
    #[default]
    None,
    /// `ref`
    Ref,
    /// `out`
    Out,
    /// `in`
    In,
}

/// An argument of an invocation, object creation or element access.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Name for `name: value` arguments
    pub name: Option<String>,
    /// Passing mode
    pub ref_kind: RefKind,
    /// Argument value
    pub expression: Expr,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LeftShift,
    RightShift,
    BitAnd,
    BitOr,
    BitXor,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `??`
    Coalesce,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    /// `expr as Type`, right operand is a type name
    As,
    /// `expr is Type`, right operand is a type name
    Is,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum UnaryOperator {
    Not,
    Negate,
    Plus,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    AddressOf,
    Dereference,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    /// `=`
    Simple,
    /// `op=` such as `+=`
    Compound(BinaryOperator),
    /// `??=`
    Coalesce,
}

/// A piece of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolationPart {
    /// Literal text
    Text(String),
    /// `{expr}`
    Interpolation(Expr),
}

/// One arm of a switch expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchArm {
    /// Node id of the arm
    pub id: SyntaxId,
    /// Matched pattern
    pub pattern: Pattern,
    /// Optional `when` clause
    pub guard: Option<Expr>,
    /// Arm result
    pub result: Expr,
}

/// Every expression form understood by the graph builder and lowering.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal value
    Literal(Literal),
    /// A simple name
    Identifier(String),
    /// `this`
    This,
    /// `base`
    Base,
    /// `target.name`
    MemberAccess {
        /// Accessed object, type or namespace
        target: Box<Expr>,
        /// Member name
        name: String,
    },
    /// `target?.access`, where `access` is rooted in a binding node
    ConditionalAccess {
        /// Null-checked receiver
        target: Box<Expr>,
        /// Access applied when the receiver is non-null
        access: Box<Expr>,
    },
    /// `.name` inside a conditional access
    MemberBinding(String),
    /// `[args]` inside a conditional access
    ElementBinding(Vec<Argument>),
    /// `target(arguments)`
    Invocation {
        /// Invoked expression
        target: Box<Expr>,
        /// Arguments in source order
        arguments: Vec<Argument>,
    },
    /// `new Type(arguments) { initializer }`
    ObjectCreation {
        /// Created type as written
        type_name: String,
        /// Constructor arguments
        arguments: Vec<Argument>,
        /// Object or collection initializer elements
        initializer: Vec<Expr>,
    },
    /// `new Type[sizes] { initializer }`
    ArrayCreation {
        /// Element type as written
        element_type: String,
        /// Rank sizes
        sizes: Vec<Expr>,
        /// Initializer elements
        initializer: Vec<Expr>,
    },
    /// `target[arguments]`
    ElementAccess {
        /// Indexed expression
        target: Box<Expr>,
        /// Index arguments
        arguments: Vec<Argument>,
    },
    /// `left op right`
    Assignment {
        /// Assignment form
        operator: AssignmentOperator,
        /// Written location
        left: Box<Expr>,
        /// Assigned value
        right: Box<Expr>,
    },
    /// `left op right`
    Binary {
        /// Operator
        operator: BinaryOperator,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `op operand` or `operand op`
    Unary {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        operand: Box<Expr>,
    },
    /// `condition ? when_true : when_false`
    Conditional {
        /// Condition
        condition: Box<Expr>,
        /// Value when the condition holds
        when_true: Box<Expr>,
        /// Value otherwise
        when_false: Box<Expr>,
    },
    /// A lambda or anonymous method, analyzed as its own procedure
    Lambda(Box<Procedure>),
    /// `(Type)operand`
    Cast {
        /// Target type as written
        type_name: String,
        /// Converted value
        operand: Box<Expr>,
    },
    /// `(inner)`
    Parenthesized(Box<Expr>),
    /// `await operand`
    Await(Box<Expr>),
    /// `expression is pattern`
    IsPattern {
        /// Tested value
        expression: Box<Expr>,
        /// Pattern
        pattern: Box<Pattern>,
    },
    /// `governing switch { arms }`
    SwitchExpression {
        /// Governing value
        governing: Box<Expr>,
        /// Arms in source order
        arms: Vec<SwitchArm>,
    },
    /// `throw expr` in expression position
    Throw(Box<Expr>),
    /// `$"text{expr}"`
    InterpolatedString(Vec<InterpolationPart>),
    /// `typeof(Type)`
    TypeOf(String),
    /// `default` or `default(Type)`
    Default(Option<String>),
}

/// A pattern node.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// Node id
    pub id: SyntaxId,
    /// The pattern itself
    pub kind: PatternKind,
}

impl Pattern {
    /// Returns the variable this pattern binds, if it binds exactly one at its top level.
    #[must_use]
    pub fn binding(&self) -> Option<&str> {
        match &self.kind {
            PatternKind::Declaration { name, .. } | PatternKind::Var(name) => Some(name),
            _ => None,
        }
    }
}

/// Pattern forms.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    /// A constant value
    Constant(Expr),
    /// `Type name`
    Declaration {
        /// Tested type
        type_name: String,
        /// Bound variable
        name: String,
    },
    /// `Type`
    Type(String),
    /// `var name`
    Var(String),
    /// `_`
    Discard,
    /// `< value`, `>= value`, ...
    Relational {
        /// Comparison operator
        operator: BinaryOperator,
        /// Compared value
        value: Expr,
    },
    /// `not pattern`
    Not(Box<Pattern>),
    /// `left and right`
    And(Box<Pattern>, Box<Pattern>),
    /// `left or right`
    Or(Box<Pattern>, Box<Pattern>),
}
