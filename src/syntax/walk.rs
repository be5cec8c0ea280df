//! Read-only traversal over syntax trees.
//!
//! The walkers visit nodes in source order, parents before children. Nested procedures
//! (lambdas and local functions) are only entered when [`Visit::visit_procedure`] asks for it,
//! because they are independent code units for every analysis in this crate.

use crate::syntax::{
    Argument, Expr, ExprKind, GotoTarget, InterpolationPart, Pattern, PatternKind, Procedure,
    ProcedureBody, Stmt, StmtKind, SwitchLabelKind, VariableDeclarator,
};

/// Callbacks invoked by [`walk_statement`] and [`walk_expression`].
///
/// Each callback returns whether the walker should descend into the node's children.
pub trait Visit<'a> {
    /// Called for every statement.
    fn visit_statement(&mut self, _statement: &'a Stmt) -> bool {
        true
    }

    /// Called for every expression.
    fn visit_expression(&mut self, _expression: &'a Expr) -> bool {
        true
    }

    /// Called for every nested lambda or local function. Not entered by default.
    fn visit_procedure(&mut self, _procedure: &'a Procedure) -> bool {
        false
    }
}

/// Walks a statement and everything below it.
pub fn walk_statement<'a, V: Visit<'a> + ?Sized>(statement: &'a Stmt, visitor: &mut V) {
    if !visitor.visit_statement(statement) {
        return;
    }

    match &statement.kind {
        StmtKind::Block(statements) => {
            for inner in statements {
                walk_statement(inner, visitor);
            }
        }
        StmtKind::Expression(expression)
        | StmtKind::YieldReturn(expression)
        | StmtKind::Return(Some(expression))
        | StmtKind::Throw(Some(expression))
        | StmtKind::Goto(GotoTarget::Case(expression)) => walk_expression(expression, visitor),
        StmtKind::LocalDeclaration(declarators) => walk_declarators(declarators, visitor),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            walk_expression(condition, visitor);
            walk_statement(then_branch, visitor);
            if let Some(otherwise) = else_branch {
                walk_statement(otherwise, visitor);
            }
        }
        StmtKind::While { condition, body } => {
            walk_expression(condition, visitor);
            walk_statement(body, visitor);
        }
        StmtKind::Do { body, condition } => {
            walk_statement(body, visitor);
            walk_expression(condition, visitor);
        }
        StmtKind::For {
            declarators,
            initializers,
            condition,
            incrementors,
            body,
        } => {
            walk_declarators(declarators, visitor);
            for initializer in initializers {
                walk_expression(initializer, visitor);
            }
            if let Some(condition) = condition {
                walk_expression(condition, visitor);
            }
            for incrementor in incrementors {
                walk_expression(incrementor, visitor);
            }
            walk_statement(body, visitor);
        }
        StmtKind::Foreach {
            collection, body, ..
        } => {
            walk_expression(collection, visitor);
            walk_statement(body, visitor);
        }
        StmtKind::Switch {
            expression,
            sections,
        } => {
            walk_expression(expression, visitor);
            for section in sections {
                for label in &section.labels {
                    match &label.kind {
                        SwitchLabelKind::Case(value) => walk_expression(value, visitor),
                        SwitchLabelKind::Pattern { pattern, guard } => {
                            walk_pattern(pattern, visitor);
                            if let Some(guard) = guard {
                                walk_expression(guard, visitor);
                            }
                        }
                        SwitchLabelKind::Default => {}
                    }
                }
                for inner in &section.statements {
                    walk_statement(inner, visitor);
                }
            }
        }
        StmtKind::Labeled { statement, .. } => walk_statement(statement, visitor),
        StmtKind::Try {
            block,
            catches,
            finally,
        } => {
            walk_statement(block, visitor);
            for catch in catches {
                if let Some(filter) = &catch.filter {
                    walk_expression(filter, visitor);
                }
                walk_statement(&catch.block, visitor);
            }
            if let Some(finally) = finally {
                walk_statement(finally, visitor);
            }
        }
        StmtKind::Using {
            declarators,
            expression,
            body,
        } => {
            walk_declarators(declarators, visitor);
            if let Some(expression) = expression {
                walk_expression(expression, visitor);
            }
            walk_statement(body, visitor);
        }
        StmtKind::Lock { expression, body } => {
            walk_expression(expression, visitor);
            walk_statement(body, visitor);
        }
        StmtKind::Fixed { declarators, body } => {
            walk_declarators(declarators, visitor);
            walk_statement(body, visitor);
        }
        StmtKind::Checked(body) | StmtKind::Unchecked(body) | StmtKind::Unsafe(body) => {
            walk_statement(body, visitor);
        }
        StmtKind::LocalFunction(procedure) => walk_procedure(procedure, visitor),
        StmtKind::Return(None)
        | StmtKind::Throw(None)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::YieldBreak
        | StmtKind::Goto(_)
        | StmtKind::Empty => {}
    }
}

/// Walks an expression and everything below it.
pub fn walk_expression<'a, V: Visit<'a> + ?Sized>(expression: &'a Expr, visitor: &mut V) {
    if !visitor.visit_expression(expression) {
        return;
    }

    match &expression.kind {
        ExprKind::MemberAccess { target, .. }
        | ExprKind::Cast {
            operand: target, ..
        }
        | ExprKind::Parenthesized(target)
        | ExprKind::Await(target)
        | ExprKind::Throw(target)
        | ExprKind::Unary {
            operand: target, ..
        } => walk_expression(target, visitor),
        ExprKind::ConditionalAccess { target, access } => {
            walk_expression(target, visitor);
            walk_expression(access, visitor);
        }
        ExprKind::ElementBinding(arguments) => walk_arguments(arguments, visitor),
        ExprKind::Invocation { target, arguments } | ExprKind::ElementAccess { target, arguments } => {
            walk_expression(target, visitor);
            walk_arguments(arguments, visitor);
        }
        ExprKind::ObjectCreation {
            arguments,
            initializer,
            ..
        } => {
            walk_arguments(arguments, visitor);
            for element in initializer {
                walk_expression(element, visitor);
            }
        }
        ExprKind::ArrayCreation {
            sizes, initializer, ..
        } => {
            for element in sizes.iter().chain(initializer) {
                walk_expression(element, visitor);
            }
        }
        ExprKind::Assignment { left, right, .. } | ExprKind::Binary { left, right, .. } => {
            walk_expression(left, visitor);
            walk_expression(right, visitor);
        }
        ExprKind::Conditional {
            condition,
            when_true,
            when_false,
        } => {
            walk_expression(condition, visitor);
            walk_expression(when_true, visitor);
            walk_expression(when_false, visitor);
        }
        ExprKind::Lambda(procedure) => walk_procedure(procedure, visitor),
        ExprKind::IsPattern {
            expression,
            pattern,
        } => {
            walk_expression(expression, visitor);
            walk_pattern(pattern, visitor);
        }
        ExprKind::SwitchExpression { governing, arms } => {
            walk_expression(governing, visitor);
            for arm in arms {
                walk_pattern(&arm.pattern, visitor);
                if let Some(guard) = &arm.guard {
                    walk_expression(guard, visitor);
                }
                walk_expression(&arm.result, visitor);
            }
        }
        ExprKind::InterpolatedString(parts) => {
            for part in parts {
                if let InterpolationPart::Interpolation(inner) = part {
                    walk_expression(inner, visitor);
                }
            }
        }
        ExprKind::Literal(_)
        | ExprKind::Identifier(_)
        | ExprKind::This
        | ExprKind::Base
        | ExprKind::MemberBinding(_)
        | ExprKind::TypeOf(_)
        | ExprKind::Default(_) => {}
    }
}

fn walk_procedure<'a, V: Visit<'a> + ?Sized>(procedure: &'a Procedure, visitor: &mut V) {
    if !visitor.visit_procedure(procedure) {
        return;
    }

    match &procedure.body {
        ProcedureBody::Block(statements) => {
            for statement in statements {
                walk_statement(statement, visitor);
            }
        }
        ProcedureBody::Expression(expression) => walk_expression(expression, visitor),
    }
}

fn walk_pattern<'a, V: Visit<'a> + ?Sized>(pattern: &'a Pattern, visitor: &mut V) {
    match &pattern.kind {
        PatternKind::Constant(value) | PatternKind::Relational { value, .. } => {
            walk_expression(value, visitor);
        }
        PatternKind::Not(inner) => walk_pattern(inner, visitor),
        PatternKind::And(left, right) | PatternKind::Or(left, right) => {
            walk_pattern(left, visitor);
            walk_pattern(right, visitor);
        }
        PatternKind::Declaration { .. }
        | PatternKind::Type(_)
        | PatternKind::Var(_)
        | PatternKind::Discard => {}
    }
}

fn walk_declarators<'a, V: Visit<'a> + ?Sized>(
    declarators: &'a [VariableDeclarator],
    visitor: &mut V,
) {
    for declarator in declarators {
        if let Some(initializer) = &declarator.initializer {
            walk_expression(initializer, visitor);
        }
    }
}

fn walk_arguments<'a, V: Visit<'a> + ?Sized>(arguments: &'a [Argument], visitor: &mut V) {
    for argument in arguments {
        walk_expression(&argument.expression, visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxFactory;

    struct Counter {
        statements: usize,
        expressions: usize,
        enter_procedures: bool,
    }

    impl<'a> Visit<'a> for Counter {
        fn visit_statement(&mut self, _statement: &'a Stmt) -> bool {
            self.statements += 1;
            true
        }

        fn visit_expression(&mut self, _expression: &'a Expr) -> bool {
            self.expressions += 1;
            true
        }

        fn visit_procedure(&mut self, _procedure: &'a Procedure) -> bool {
            self.enter_procedures
        }
    }

    #[test]
    fn test_walk_skips_lambda_bodies_by_default() {
        let mut f = SyntaxFactory::new();
        let inner = f.ident("y");
        let inner_stmt = f.expr_stmt(inner);
        let lambda_body = f.lambda("Outer.<lambda0>", Vec::new(), vec![inner_stmt]);
        let statement = f.local("x", Some(lambda_body));

        let mut shallow = Counter {
            statements: 0,
            expressions: 0,
            enter_procedures: false,
        };
        walk_statement(&statement, &mut shallow);
        assert_eq!(shallow.statements, 1);
        assert_eq!(shallow.expressions, 1);

        let mut deep = Counter {
            statements: 0,
            expressions: 0,
            enter_procedures: true,
        };
        walk_statement(&statement, &mut deep);
        assert_eq!(deep.statements, 2);
        assert_eq!(deep.expressions, 2);
    }
}
