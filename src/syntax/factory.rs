//! Convenience constructors for syntax trees.
//!
//! [`SyntaxFactory`] hands out fresh [`SyntaxId`]s while building nodes, which keeps ids unique
//! within every tree it produces. Front ends that already own an id scheme can construct the
//! node structs directly instead.
//!
//! # Examples
//!
//! ```rust
//! use flowscope::syntax::SyntaxFactory;
//!
//! let mut f = SyntaxFactory::new();
//! // if (true) { x = 10; }
//! let condition = f.boolean(true);
//! let target = f.ident("x");
//! let value = f.int(10);
//! let assignment = f.assign(target, value);
//! let body = f.expr_stmt(assignment);
//! let then_branch = f.block(vec![body]);
//! let statement = f.if_stmt(condition, then_branch, None);
//! let procedure = f.method("C.M()", Vec::new(), vec![statement]);
//! assert_eq!(procedure.name, "C.M()");
//! ```

use crate::syntax::{
    Argument, AssignmentOperator, BinaryOperator, CatchClause, Expr, ExprKind, GotoTarget,
    InterpolationPart, Literal, Parameter, Pattern, PatternKind, Procedure, ProcedureBody,
    ProcedureKind, RefKind, Stmt, StmtKind, SwitchArm, SwitchLabel, SwitchLabelKind,
    SwitchSection, SyntaxId, UnaryOperator, VariableDeclarator,
};

/// Builds syntax nodes with automatically assigned, unique ids.
#[derive(Debug, Default)]
pub struct SyntaxFactory {
    next: u32,
}

impl SyntaxFactory {
    /// Creates a factory whose first id is `#0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory whose first id is `start`, for trees that must not collide with
    /// another factory's ids.
    #[must_use]
    pub fn starting_at(start: u32) -> Self {
        Self { next: start }
    }

    /// Reserves and returns the next id.
    pub fn next_id(&mut self) -> SyntaxId {
        let id = SyntaxId(self.next);
        self.next += 1;
        id
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.next_id(),
            kind,
        }
    }

    fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.next_id(),
            kind,
        }
    }

    fn pattern(&mut self, kind: PatternKind) -> Pattern {
        Pattern {
            id: self.next_id(),
            kind,
        }
    }

    // ============================================================================================
    // Procedures
    // ============================================================================================

    /// A parameter declaration.
    pub fn param(&mut self, name: &str) -> Parameter {
        Parameter {
            id: self.next_id(),
            name: name.to_string(),
        }
    }

    /// A procedure of arbitrary kind.
    pub fn procedure(
        &mut self,
        name: &str,
        kind: ProcedureKind,
        parameters: Vec<Parameter>,
        body: ProcedureBody,
    ) -> Procedure {
        Procedure {
            id: self.next_id(),
            name: name.to_string(),
            kind,
            parameters,
            body,
        }
    }

    /// A method with a block body.
    pub fn method(&mut self, name: &str, parameters: Vec<Parameter>, body: Vec<Stmt>) -> Procedure {
        self.procedure(
            name,
            ProcedureKind::Method,
            parameters,
            ProcedureBody::Block(body),
        )
    }

    /// A method with an expression body.
    pub fn method_expr(&mut self, name: &str, parameters: Vec<Parameter>, body: Expr) -> Procedure {
        self.procedure(
            name,
            ProcedureKind::Method,
            parameters,
            ProcedureBody::Expression(body),
        )
    }

    /// A lambda expression with a block body.
    pub fn lambda(&mut self, name: &str, parameters: Vec<Parameter>, body: Vec<Stmt>) -> Expr {
        let procedure = self.procedure(
            name,
            ProcedureKind::Lambda,
            parameters,
            ProcedureBody::Block(body),
        );
        self.expr(ExprKind::Lambda(Box::new(procedure)))
    }

    /// A local function declaration statement.
    pub fn local_function(
        &mut self,
        name: &str,
        parameters: Vec<Parameter>,
        body: Vec<Stmt>,
    ) -> Stmt {
        let procedure = self.procedure(
            name,
            ProcedureKind::LocalFunction,
            parameters,
            ProcedureBody::Block(body),
        );
        self.stmt(StmtKind::LocalFunction(Box::new(procedure)))
    }

    // ============================================================================================
    // Expressions
    // ============================================================================================

    /// A literal of any kind.
    pub fn literal(&mut self, literal: Literal) -> Expr {
        self.expr(ExprKind::Literal(literal))
    }

    /// A string literal.
    pub fn string(&mut self, value: &str) -> Expr {
        self.literal(Literal::String(value.to_string()))
    }

    /// An integer literal.
    pub fn int(&mut self, value: i64) -> Expr {
        self.literal(Literal::Integer(value))
    }

    /// A boolean literal.
    pub fn boolean(&mut self, value: bool) -> Expr {
        self.literal(Literal::Boolean(value))
    }

    /// `null`
    pub fn null(&mut self) -> Expr {
        self.literal(Literal::Null)
    }

    /// A simple name.
    pub fn ident(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Identifier(name.to_string()))
    }

    /// `this`
    pub fn this(&mut self) -> Expr {
        self.expr(ExprKind::This)
    }

    /// `base`
    pub fn base(&mut self) -> Expr {
        self.expr(ExprKind::Base)
    }

    /// `target.name`
    pub fn member(&mut self, target: Expr, name: &str) -> Expr {
        self.expr(ExprKind::MemberAccess {
            target: Box::new(target),
            name: name.to_string(),
        })
    }

    /// `target?.access`
    pub fn conditional_access(&mut self, target: Expr, access: Expr) -> Expr {
        self.expr(ExprKind::ConditionalAccess {
            target: Box::new(target),
            access: Box::new(access),
        })
    }

    /// `.name` inside a conditional access.
    pub fn member_binding(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::MemberBinding(name.to_string()))
    }

    /// `[args]` inside a conditional access.
    pub fn element_binding(&mut self, arguments: Vec<Argument>) -> Expr {
        self.expr(ExprKind::ElementBinding(arguments))
    }

    /// A positional by-value argument.
    #[must_use]
    pub fn arg(&self, expression: Expr) -> Argument {
        Argument {
            name: None,
            ref_kind: RefKind::None,
            expression,
        }
    }

    /// A `name: value` argument.
    #[must_use]
    pub fn named_arg(&self, name: &str, expression: Expr) -> Argument {
        Argument {
            name: Some(name.to_string()),
            ref_kind: RefKind::None,
            expression,
        }
    }

    /// A `ref`/`out`/`in` argument.
    #[must_use]
    pub fn ref_arg(&self, ref_kind: RefKind, expression: Expr) -> Argument {
        Argument {
            name: None,
            ref_kind,
            expression,
        }
    }

    /// `target(arguments)`
    pub fn invoke(&mut self, target: Expr, arguments: Vec<Argument>) -> Expr {
        self.expr(ExprKind::Invocation {
            target: Box::new(target),
            arguments,
        })
    }

    /// `new Type(arguments)`
    pub fn new_object(&mut self, type_name: &str, arguments: Vec<Argument>) -> Expr {
        self.new_object_with(type_name, arguments, Vec::new())
    }

    /// `new Type(arguments) { initializer }`
    pub fn new_object_with(
        &mut self,
        type_name: &str,
        arguments: Vec<Argument>,
        initializer: Vec<Expr>,
    ) -> Expr {
        self.expr(ExprKind::ObjectCreation {
            type_name: type_name.to_string(),
            arguments,
            initializer,
        })
    }

    /// `new Type[sizes] { initializer }`
    pub fn new_array(&mut self, element_type: &str, sizes: Vec<Expr>, initializer: Vec<Expr>) -> Expr {
        self.expr(ExprKind::ArrayCreation {
            element_type: element_type.to_string(),
            sizes,
            initializer,
        })
    }

    /// `target[arguments]`
    pub fn element(&mut self, target: Expr, arguments: Vec<Argument>) -> Expr {
        self.expr(ExprKind::ElementAccess {
            target: Box::new(target),
            arguments,
        })
    }

    /// `left = right`
    pub fn assign(&mut self, left: Expr, right: Expr) -> Expr {
        self.assignment(AssignmentOperator::Simple, left, right)
    }

    /// `left op= right`
    pub fn compound_assign(&mut self, operator: BinaryOperator, left: Expr, right: Expr) -> Expr {
        self.assignment(AssignmentOperator::Compound(operator), left, right)
    }

    /// `left ??= right`
    pub fn coalesce_assign(&mut self, left: Expr, right: Expr) -> Expr {
        self.assignment(AssignmentOperator::Coalesce, left, right)
    }

    fn assignment(&mut self, operator: AssignmentOperator, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Assignment {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `left op right`
    pub fn binary(&mut self, operator: BinaryOperator, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `left && right`
    pub fn and(&mut self, left: Expr, right: Expr) -> Expr {
        self.binary(BinaryOperator::LogicalAnd, left, right)
    }

    /// `left || right`
    pub fn or(&mut self, left: Expr, right: Expr) -> Expr {
        self.binary(BinaryOperator::LogicalOr, left, right)
    }

    /// `left ?? right`
    pub fn coalesce(&mut self, left: Expr, right: Expr) -> Expr {
        self.binary(BinaryOperator::Coalesce, left, right)
    }

    /// `left + right`
    pub fn add(&mut self, left: Expr, right: Expr) -> Expr {
        self.binary(BinaryOperator::Add, left, right)
    }

    /// A unary operation.
    pub fn unary(&mut self, operator: UnaryOperator, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    /// `condition ? when_true : when_false`
    pub fn conditional(&mut self, condition: Expr, when_true: Expr, when_false: Expr) -> Expr {
        self.expr(ExprKind::Conditional {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        })
    }

    /// `(Type)operand`
    pub fn cast(&mut self, type_name: &str, operand: Expr) -> Expr {
        self.expr(ExprKind::Cast {
            type_name: type_name.to_string(),
            operand: Box::new(operand),
        })
    }

    /// `(inner)`
    pub fn paren(&mut self, inner: Expr) -> Expr {
        self.expr(ExprKind::Parenthesized(Box::new(inner)))
    }

    /// `await operand`
    pub fn await_expr(&mut self, operand: Expr) -> Expr {
        self.expr(ExprKind::Await(Box::new(operand)))
    }

    /// `expression is pattern`
    pub fn is_pattern(&mut self, expression: Expr, pattern: Pattern) -> Expr {
        self.expr(ExprKind::IsPattern {
            expression: Box::new(expression),
            pattern: Box::new(pattern),
        })
    }

    /// `governing switch { arms }`
    pub fn switch_expr(&mut self, governing: Expr, arms: Vec<SwitchArm>) -> Expr {
        self.expr(ExprKind::SwitchExpression {
            governing: Box::new(governing),
            arms,
        })
    }

    /// `pattern when guard => result`
    pub fn arm(&mut self, pattern: Pattern, guard: Option<Expr>, result: Expr) -> SwitchArm {
        SwitchArm {
            id: self.next_id(),
            pattern,
            guard,
            result,
        }
    }

    /// `throw expr` in expression position.
    pub fn throw_expr(&mut self, operand: Expr) -> Expr {
        self.expr(ExprKind::Throw(Box::new(operand)))
    }

    /// `$"..."`
    pub fn interpolated(&mut self, parts: Vec<InterpolationPart>) -> Expr {
        self.expr(ExprKind::InterpolatedString(parts))
    }

    /// `typeof(Type)`
    pub fn type_of(&mut self, type_name: &str) -> Expr {
        self.expr(ExprKind::TypeOf(type_name.to_string()))
    }

    /// `default(Type)` or `default`
    pub fn default_value(&mut self, type_name: Option<&str>) -> Expr {
        self.expr(ExprKind::Default(type_name.map(str::to_string)))
    }

    // ============================================================================================
    // Patterns
    // ============================================================================================

    /// A constant pattern.
    pub fn constant_pattern(&mut self, value: Expr) -> Pattern {
        self.pattern(PatternKind::Constant(value))
    }

    /// `Type name`
    pub fn declaration_pattern(&mut self, type_name: &str, name: &str) -> Pattern {
        self.pattern(PatternKind::Declaration {
            type_name: type_name.to_string(),
            name: name.to_string(),
        })
    }

    /// `Type`
    pub fn type_pattern(&mut self, type_name: &str) -> Pattern {
        self.pattern(PatternKind::Type(type_name.to_string()))
    }

    /// `var name`
    pub fn var_pattern(&mut self, name: &str) -> Pattern {
        self.pattern(PatternKind::Var(name.to_string()))
    }

    /// `_`
    pub fn discard_pattern(&mut self) -> Pattern {
        self.pattern(PatternKind::Discard)
    }

    /// `< value`, `>= value`, ...
    pub fn relational_pattern(&mut self, operator: BinaryOperator, value: Expr) -> Pattern {
        self.pattern(PatternKind::Relational { operator, value })
    }

    /// `not pattern`
    pub fn not_pattern(&mut self, inner: Pattern) -> Pattern {
        self.pattern(PatternKind::Not(Box::new(inner)))
    }

    // ============================================================================================
    // Statements
    // ============================================================================================

    /// An expression statement.
    pub fn expr_stmt(&mut self, expression: Expr) -> Stmt {
        self.stmt(StmtKind::Expression(expression))
    }

    /// `{ statements }`
    pub fn block(&mut self, statements: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(statements))
    }

    /// A declarator for use in multi-variable declarations, `for`, `using` and `fixed`.
    pub fn declarator(&mut self, name: &str, initializer: Option<Expr>) -> VariableDeclarator {
        VariableDeclarator {
            id: self.next_id(),
            name: name.to_string(),
            initializer,
        }
    }

    /// `var name = initializer;`
    pub fn local(&mut self, name: &str, initializer: Option<Expr>) -> Stmt {
        let declarator = self.declarator(name, initializer);
        self.locals(vec![declarator])
    }

    /// `var a = .., b = ..;`
    pub fn locals(&mut self, declarators: Vec<VariableDeclarator>) -> Stmt {
        self.stmt(StmtKind::LocalDeclaration(declarators))
    }

    /// `if (condition) then_branch else else_branch`
    pub fn if_stmt(&mut self, condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    /// `while (condition) body`
    pub fn while_stmt(&mut self, condition: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    /// `do body while (condition);`
    pub fn do_stmt(&mut self, body: Stmt, condition: Expr) -> Stmt {
        self.stmt(StmtKind::Do {
            body: Box::new(body),
            condition,
        })
    }

    /// `for (declarators | initializers; condition; incrementors) body`
    pub fn for_stmt(
        &mut self,
        declarators: Vec<VariableDeclarator>,
        initializers: Vec<Expr>,
        condition: Option<Expr>,
        incrementors: Vec<Expr>,
        body: Stmt,
    ) -> Stmt {
        self.stmt(StmtKind::For {
            declarators,
            initializers,
            condition,
            incrementors,
            body: Box::new(body),
        })
    }

    /// `foreach (var name in collection) body`
    pub fn foreach_stmt(&mut self, name: &str, collection: Expr, body: Stmt) -> Stmt {
        let variable = self.declarator(name, None);
        self.stmt(StmtKind::Foreach {
            variable,
            collection,
            body: Box::new(body),
        })
    }

    /// `switch (expression) { sections }`
    pub fn switch_stmt(&mut self, expression: Expr, sections: Vec<SwitchSection>) -> Stmt {
        self.stmt(StmtKind::Switch {
            expression,
            sections,
        })
    }

    /// A switch section.
    pub fn section(&mut self, labels: Vec<SwitchLabel>, statements: Vec<Stmt>) -> SwitchSection {
        SwitchSection {
            id: self.next_id(),
            labels,
            statements,
        }
    }

    /// `case value:`
    pub fn case(&mut self, value: Expr) -> SwitchLabel {
        SwitchLabel {
            id: self.next_id(),
            kind: SwitchLabelKind::Case(value),
        }
    }

    /// `case pattern when guard:`
    pub fn case_pattern(&mut self, pattern: Pattern, guard: Option<Expr>) -> SwitchLabel {
        SwitchLabel {
            id: self.next_id(),
            kind: SwitchLabelKind::Pattern { pattern, guard },
        }
    }

    /// `default:`
    pub fn default_label(&mut self) -> SwitchLabel {
        SwitchLabel {
            id: self.next_id(),
            kind: SwitchLabelKind::Default,
        }
    }

    /// `break;`
    pub fn break_stmt(&mut self) -> Stmt {
        self.stmt(StmtKind::Break)
    }

    /// `continue;`
    pub fn continue_stmt(&mut self) -> Stmt {
        self.stmt(StmtKind::Continue)
    }

    /// `return value;`
    pub fn return_stmt(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    /// `throw value;`
    pub fn throw_stmt(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Throw(value))
    }

    /// `yield return value;`
    pub fn yield_return(&mut self, value: Expr) -> Stmt {
        self.stmt(StmtKind::YieldReturn(value))
    }

    /// `yield break;`
    pub fn yield_break(&mut self) -> Stmt {
        self.stmt(StmtKind::YieldBreak)
    }

    /// `goto label;`
    pub fn goto_label(&mut self, label: &str) -> Stmt {
        self.stmt(StmtKind::Goto(GotoTarget::Label(label.to_string())))
    }

    /// `goto case value;`
    pub fn goto_case(&mut self, value: Expr) -> Stmt {
        self.stmt(StmtKind::Goto(GotoTarget::Case(value)))
    }

    /// `goto default;`
    pub fn goto_default(&mut self) -> Stmt {
        self.stmt(StmtKind::Goto(GotoTarget::Default))
    }

    /// `label: statement`
    pub fn labeled(&mut self, label: &str, statement: Stmt) -> Stmt {
        self.stmt(StmtKind::Labeled {
            label: label.to_string(),
            statement: Box::new(statement),
        })
    }

    /// `try block catches finally`
    pub fn try_stmt(&mut self, block: Stmt, catches: Vec<CatchClause>, finally: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::Try {
            block: Box::new(block),
            catches,
            finally: finally.map(Box::new),
        })
    }

    /// `catch (Type name) when (filter) block`
    pub fn catch(
        &mut self,
        exception_type: Option<&str>,
        name: Option<&str>,
        filter: Option<Expr>,
        block: Stmt,
    ) -> CatchClause {
        CatchClause {
            id: self.next_id(),
            exception_type: exception_type.map(str::to_string),
            name: name.map(str::to_string),
            filter,
            block: Box::new(block),
        }
    }

    /// `using (declarators | expression) body`
    pub fn using_stmt(
        &mut self,
        declarators: Vec<VariableDeclarator>,
        expression: Option<Expr>,
        body: Stmt,
    ) -> Stmt {
        self.stmt(StmtKind::Using {
            declarators,
            expression,
            body: Box::new(body),
        })
    }

    /// `lock (expression) body`
    pub fn lock_stmt(&mut self, expression: Expr, body: Stmt) -> Stmt {
        self.stmt(StmtKind::Lock {
            expression,
            body: Box::new(body),
        })
    }

    /// `fixed (declarators) body`
    pub fn fixed_stmt(&mut self, declarators: Vec<VariableDeclarator>, body: Stmt) -> Stmt {
        self.stmt(StmtKind::Fixed {
            declarators,
            body: Box::new(body),
        })
    }

    /// `checked body`
    pub fn checked_stmt(&mut self, body: Stmt) -> Stmt {
        self.stmt(StmtKind::Checked(Box::new(body)))
    }

    /// `unchecked body`
    pub fn unchecked_stmt(&mut self, body: Stmt) -> Stmt {
        self.stmt(StmtKind::Unchecked(Box::new(body)))
    }

    /// `unsafe body`
    pub fn unsafe_stmt(&mut self, body: Stmt) -> Stmt {
        self.stmt(StmtKind::Unsafe(Box::new(body)))
    }

    /// `;`
    pub fn empty_stmt(&mut self) -> Stmt {
        self.stmt(StmtKind::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut f = SyntaxFactory::new();
        let a = f.ident("a");
        let b = f.ident("b");
        let sum = f.add(a, b);

        match &sum.kind {
            ExprKind::Binary { left, right, .. } => {
                assert_eq!(left.id, SyntaxId(0));
                assert_eq!(right.id, SyntaxId(1));
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(sum.id, SyntaxId(2));
    }

    #[test]
    fn test_starting_at_offsets_ids() {
        let mut f = SyntaxFactory::starting_at(100);
        assert_eq!(f.next_id(), SyntaxId(100));
        assert_eq!(f.this().id, SyntaxId(101));
    }

    #[test]
    fn test_nested_procedures_are_collected() {
        let mut f = SyntaxFactory::new();
        let inner_body = f.return_stmt(None);
        let inner = f.local_function("Outer.Inner()", Vec::new(), vec![inner_body]);
        let lambda = f.lambda("Outer.<lambda0>", Vec::new(), vec![inner]);
        let declaration = f.local("callback", Some(lambda));
        let procedure = f.method("Outer.M()", Vec::new(), vec![declaration]);

        let nested = procedure.nested();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].name, "Outer.<lambda0>");
        assert_eq!(nested[1].name, "Outer.Inner()");
    }
}
