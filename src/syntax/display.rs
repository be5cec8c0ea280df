//! Source-like rendering of syntax nodes.
//!
//! Used for graph dumps, diagnostics and as the fallback key when matching `goto case`
//! targets against case labels.

use std::fmt;

use crate::syntax::{
    Argument, AssignmentOperator, BinaryOperator, Expr, ExprKind, GotoTarget, InterpolationPart,
    Literal, Pattern, PatternKind, RefKind, Stmt, StmtKind, SwitchLabel, SwitchLabelKind,
    UnaryOperator,
};

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => write!(f, "\"{value}\""),
            Literal::Character(value) => write!(f, "'{value}'"),
            other => f.write_str(&other.value_text()),
        }
    }
}

impl BinaryOperator {
    /// Returns the operator token.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
            BinaryOperator::Coalesce => "??",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessOrEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterOrEqual => ">=",
            BinaryOperator::As => "as",
            BinaryOperator::Is => "is",
        }
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Argument]) -> fmt::Result {
    for (index, argument) in arguments.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        if let Some(name) = &argument.name {
            write!(f, "{name}: ")?;
        }
        match argument.ref_kind {
            RefKind::None => {}
            RefKind::Ref => f.write_str("ref ")?,
            RefKind::Out => f.write_str("out ")?,
            RefKind::In => f.write_str("in ")?,
        }
        write!(f, "{}", argument.expression)?;
    }
    Ok(())
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(literal) => write!(f, "{literal}"),
            ExprKind::Identifier(name) => f.write_str(name),
            ExprKind::This => f.write_str("this"),
            ExprKind::Base => f.write_str("base"),
            ExprKind::MemberAccess { target, name } => write!(f, "{target}.{name}"),
            ExprKind::ConditionalAccess { target, access } => write!(f, "{target}?{access}"),
            ExprKind::MemberBinding(name) => write!(f, ".{name}"),
            ExprKind::ElementBinding(arguments) => {
                f.write_str("[")?;
                write_arguments(f, arguments)?;
                f.write_str("]")
            }
            ExprKind::Invocation { target, arguments } => {
                write!(f, "{target}(")?;
                write_arguments(f, arguments)?;
                f.write_str(")")
            }
            ExprKind::ObjectCreation {
                type_name,
                arguments,
                initializer,
            } => {
                write!(f, "new {type_name}(")?;
                write_arguments(f, arguments)?;
                f.write_str(")")?;
                if !initializer.is_empty() {
                    f.write_str(" { ")?;
                    write_list(f, initializer)?;
                    f.write_str(" }")?;
                }
                Ok(())
            }
            ExprKind::ArrayCreation {
                element_type,
                sizes,
                initializer,
            } => {
                write!(f, "new {element_type}[")?;
                write_list(f, sizes)?;
                f.write_str("]")?;
                if !initializer.is_empty() {
                    f.write_str(" { ")?;
                    write_list(f, initializer)?;
                    f.write_str(" }")?;
                }
                Ok(())
            }
            ExprKind::ElementAccess { target, arguments } => {
                write!(f, "{target}[")?;
                write_arguments(f, arguments)?;
                f.write_str("]")
            }
            ExprKind::Assignment {
                operator,
                left,
                right,
            } => match operator {
                AssignmentOperator::Simple => write!(f, "{left} = {right}"),
                AssignmentOperator::Compound(op) => write!(f, "{left} {}= {right}", op.symbol()),
                AssignmentOperator::Coalesce => write!(f, "{left} ??= {right}"),
            },
            ExprKind::Binary {
                operator,
                left,
                right,
            } => write!(f, "{left} {} {right}", operator.symbol()),
            ExprKind::Unary { operator, operand } => match operator {
                UnaryOperator::Not => write!(f, "!{operand}"),
                UnaryOperator::Negate => write!(f, "-{operand}"),
                UnaryOperator::Plus => write!(f, "+{operand}"),
                UnaryOperator::BitNot => write!(f, "~{operand}"),
                UnaryOperator::PreIncrement => write!(f, "++{operand}"),
                UnaryOperator::PreDecrement => write!(f, "--{operand}"),
                UnaryOperator::PostIncrement => write!(f, "{operand}++"),
                UnaryOperator::PostDecrement => write!(f, "{operand}--"),
                UnaryOperator::AddressOf => write!(f, "&{operand}"),
                UnaryOperator::Dereference => write!(f, "*{operand}"),
            },
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => write!(f, "{condition} ? {when_true} : {when_false}"),
            ExprKind::Lambda(procedure) => write!(f, "{} => ...", procedure.name),
            ExprKind::Cast { type_name, operand } => write!(f, "({type_name}){operand}"),
            ExprKind::Parenthesized(inner) => write!(f, "({inner})"),
            ExprKind::Await(inner) => write!(f, "await {inner}"),
            ExprKind::IsPattern {
                expression,
                pattern,
            } => write!(f, "{expression} is {pattern}"),
            ExprKind::SwitchExpression { governing, arms } => {
                write!(f, "{governing} switch {{ ")?;
                for (index, arm) in arms.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arm.pattern)?;
                    if let Some(guard) = &arm.guard {
                        write!(f, " when {guard}")?;
                    }
                    write!(f, " => {}", arm.result)?;
                }
                f.write_str(" }")
            }
            ExprKind::Throw(inner) => write!(f, "throw {inner}"),
            ExprKind::InterpolatedString(parts) => {
                f.write_str("$\"")?;
                for part in parts {
                    match part {
                        InterpolationPart::Text(text) => f.write_str(text)?,
                        InterpolationPart::Interpolation(inner) => write!(f, "{{{inner}}}")?,
                    }
                }
                f.write_str("\"")
            }
            ExprKind::TypeOf(name) => write!(f, "typeof({name})"),
            ExprKind::Default(Some(name)) => write!(f, "default({name})"),
            ExprKind::Default(None) => f.write_str("default"),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PatternKind::Constant(value) => write!(f, "{value}"),
            PatternKind::Declaration { type_name, name } => write!(f, "{type_name} {name}"),
            PatternKind::Type(type_name) => f.write_str(type_name),
            PatternKind::Var(name) => write!(f, "var {name}"),
            PatternKind::Discard => f.write_str("_"),
            PatternKind::Relational { operator, value } => {
                write!(f, "{} {value}", operator.symbol())
            }
            PatternKind::Not(inner) => write!(f, "not {inner}"),
            PatternKind::And(left, right) => write!(f, "{left} and {right}"),
            PatternKind::Or(left, right) => write!(f, "{left} or {right}"),
        }
    }
}

impl fmt::Display for SwitchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SwitchLabelKind::Case(value) => write!(f, "case {value}:"),
            SwitchLabelKind::Pattern { pattern, guard } => {
                write!(f, "case {pattern}")?;
                if let Some(guard) = guard {
                    write!(f, " when {guard}")?;
                }
                f.write_str(":")
            }
            SwitchLabelKind::Default => f.write_str("default:"),
        }
    }
}

/// Statements render as their leading keyword only; bodies are shown by the graph itself.
impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Block(_) => f.write_str("{ }"),
            StmtKind::Expression(expression) => write!(f, "{expression};"),
            StmtKind::LocalDeclaration(declarators) => {
                f.write_str("var ")?;
                for (index, declarator) in declarators.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&declarator.name)?;
                }
                f.write_str(";")
            }
            StmtKind::If { .. } => f.write_str("if"),
            StmtKind::While { .. } => f.write_str("while"),
            StmtKind::Do { .. } => f.write_str("do"),
            StmtKind::For { .. } => f.write_str("for"),
            StmtKind::Foreach { .. } => f.write_str("foreach"),
            StmtKind::Switch { .. } => f.write_str("switch"),
            StmtKind::Break => f.write_str("break;"),
            StmtKind::Continue => f.write_str("continue;"),
            StmtKind::Return(Some(value)) => write!(f, "return {value};"),
            StmtKind::Return(None) => f.write_str("return;"),
            StmtKind::Throw(Some(value)) => write!(f, "throw {value};"),
            StmtKind::Throw(None) => f.write_str("throw;"),
            StmtKind::YieldReturn(value) => write!(f, "yield return {value};"),
            StmtKind::YieldBreak => f.write_str("yield break;"),
            StmtKind::Goto(GotoTarget::Label(label)) => write!(f, "goto {label};"),
            StmtKind::Goto(GotoTarget::Case(value)) => write!(f, "goto case {value};"),
            StmtKind::Goto(GotoTarget::Default) => f.write_str("goto default;"),
            StmtKind::Labeled { label, .. } => write!(f, "{label}:"),
            StmtKind::Try { .. } => f.write_str("try"),
            StmtKind::Using { .. } => f.write_str("using"),
            StmtKind::Lock { .. } => f.write_str("lock"),
            StmtKind::Fixed { .. } => f.write_str("fixed"),
            StmtKind::Checked(_) => f.write_str("checked"),
            StmtKind::Unchecked(_) => f.write_str("unchecked"),
            StmtKind::Unsafe(_) => f.write_str("unsafe"),
            StmtKind::LocalFunction(procedure) => write!(f, "local function {}", procedure.name),
            StmtKind::Empty => f.write_str(";"),
        }
    }
}
