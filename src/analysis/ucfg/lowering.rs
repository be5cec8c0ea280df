//! Expression lowering into the UCFG instruction vocabulary.
//!
//! Blocks are lowered in id order; inside a block every [`CfgNode`] is lowered in execution
//! order. Because the CFG already places operands before their parents, the children of a
//! node have normally been lowered by the time the node itself is reached. Results are
//! memoized per [`SyntaxId`], so a node is translated exactly once and later readers pick up
//! the same [`Expression`].
//!
//! Before lowering, the block contents are scanned once to record:
//!
//! - **destinations**: the right side of `local = call(...)` (and of declarators) writes its
//!   call result straight into the local instead of a temporary
//! - **receivers**: the receiver of every `?.` / `?[]` binding
//! - **skipped nodes**: invocation targets and conditional-access write targets, which only
//!   name a callee or location and have no value of their own
//!
//! Nothing here fails. Unresolved calls lower to `__unknown`, opaque values to `const`.

use std::collections::{HashMap, HashSet};

use crate::{
    analysis::{
        cfg::{BasicBlock, CfgNode},
        ucfg::{
            builder::UcfgOptions,
            instruction::{Expression, Instruction, PseudoOp},
            naming::{self, Accessor, TempAllocator},
        },
    },
    semantic::{MemberFlags, MethodSymbol, SemanticModel, Symbol},
    syntax::{
        Argument, AssignmentOperator, BinaryOperator, Expr, ExprKind, InterpolationPart, Literal,
        RefKind, SwitchLabelKind, SyntaxId,
    },
};

/// Per-procedure lowering state.
pub(crate) struct Lowering<'a, 'm> {
    semantic: &'m dyn SemanticModel,
    options: &'m UcfgOptions,
    temps: TempAllocator,
    memo: HashMap<SyntaxId, Expression>,
    destinations: HashMap<SyntaxId, Expression>,
    receivers: HashMap<SyntaxId, &'a Expr>,
    skipped: HashSet<SyntaxId>,
    emitted: Vec<Instruction>,
}

/// `this`, or the declaring class for static members.
fn owner(flags: MemberFlags, containing_type: &str) -> Expression {
    if flags.contains(MemberFlags::STATIC) {
        Expression::ClassName(containing_type.to_string())
    } else {
        Expression::This
    }
}

/// Finds the `.name` / `[args]` binding a conditional access applies its receiver to.
fn find_binding(access: &Expr) -> Option<SyntaxId> {
    let mut current = access.unparenthesized();
    loop {
        match &current.kind {
            ExprKind::MemberBinding(_) | ExprKind::ElementBinding(_) => return Some(current.id),
            ExprKind::MemberAccess { target, .. }
            | ExprKind::Invocation { target, .. }
            | ExprKind::ElementAccess { target, .. }
            | ExprKind::ConditionalAccess { target, .. } => current = target.unparenthesized(),
            ExprKind::Assignment { left, .. } => current = left.unparenthesized(),
            _ => return None,
        }
    }
}

impl<'a, 'm> Lowering<'a, 'm> {
    pub(crate) fn new(semantic: &'m dyn SemanticModel, options: &'m UcfgOptions) -> Self {
        Self {
            semantic,
            options,
            temps: TempAllocator::new(),
            memo: HashMap::new(),
            destinations: HashMap::new(),
            receivers: HashMap::new(),
            skipped: HashSet::new(),
            emitted: Vec::new(),
        }
    }

    /// Records destinations, binding receivers and skipped nodes of one block.
    pub(crate) fn prepare(&mut self, block: &BasicBlock<'a>) {
        for node in &block.instructions {
            match *node {
                CfgNode::Declarator(declarator) => {
                    if let Some(initializer) = &declarator.initializer {
                        self.destinations.insert(
                            initializer.unparenthesized().id,
                            Expression::Variable(declarator.name.clone()),
                        );
                    }
                }
                CfgNode::Expression(expression) => match &expression.kind {
                    ExprKind::Assignment {
                        operator: AssignmentOperator::Simple,
                        left,
                        right,
                    } => {
                        if let Some(target) = self.local_target(left) {
                            self.destinations.insert(right.unparenthesized().id, target);
                        }
                        let left = left.unparenthesized();
                        if matches!(
                            left.kind,
                            ExprKind::MemberBinding(_) | ExprKind::ElementBinding(_)
                        ) {
                            self.skipped.insert(left.id);
                        }
                    }
                    ExprKind::Invocation { target, .. } => {
                        self.skipped.insert(target.unparenthesized().id);
                    }
                    ExprKind::ConditionalAccess { target, access } => {
                        if let Some(binding) = find_binding(access) {
                            self.receivers.insert(binding, &**target);
                        }
                    }
                    _ => {}
                },
                CfgNode::ForeachVariable { .. }
                | CfgNode::CaseLabel { .. }
                | CfgNode::SwitchArm { .. } => {}
            }
        }
    }

    /// Lowers one block instruction, appending to the pending output.
    pub(crate) fn lower_node(&mut self, node: CfgNode<'a>) {
        match node {
            CfgNode::Expression(expression) => {
                if !self.skipped.contains(&expression.id) {
                    self.lower(expression);
                }
            }
            CfgNode::Declarator(declarator) => {
                if let Some(initializer) = &declarator.initializer {
                    let value = self.lower(initializer);
                    self.copy(Expression::Variable(declarator.name.clone()), value);
                }
            }
            CfgNode::ForeachVariable {
                variable,
                collection,
            } => {
                let collection = self.lower(collection);
                self.emit(Instruction::pseudo(
                    Expression::Variable(variable.name.clone()),
                    PseudoOp::ArrayGet,
                    vec![collection],
                ));
            }
            CfgNode::CaseLabel {
                label,
                discriminant,
            } => {
                if let SwitchLabelKind::Pattern { pattern, .. } = &label.kind {
                    if let Some(name) = pattern.binding() {
                        let value = self.lower(discriminant);
                        self.copy(Expression::variable(name), value);
                    }
                }
            }
            CfgNode::SwitchArm { arm, governing } => {
                if let Some(name) = arm.pattern.binding() {
                    let value = self.lower(governing);
                    self.copy(Expression::variable(name), value);
                }
            }
        }
    }

    /// The value of `expression`, lowering it on first use.
    pub(crate) fn lower(&mut self, expression: &'a Expr) -> Expression {
        let expression = expression.unparenthesized();
        if let Some(value) = self.memo.get(&expression.id) {
            return value.clone();
        }
        let value = self.lower_uncached(expression);
        self.memo.insert(expression.id, value.clone());
        value
    }

    pub(crate) fn fresh(&mut self) -> Expression {
        self.temps.fresh()
    }

    pub(crate) fn emit(&mut self, instruction: Instruction) {
        self.emitted.push(instruction);
    }

    /// Hands out everything emitted since the last call.
    pub(crate) fn take_instructions(&mut self) -> Vec<Instruction> {
        std::mem::take(&mut self.emitted)
    }

    pub(crate) fn temporaries(&self) -> usize {
        self.temps.allocated()
    }

    fn call(&mut self, target: Expression, method: String, arguments: Vec<Expression>) -> Expression {
        self.emit(Instruction::Assign {
            target: target.clone(),
            method,
            arguments,
        });
        target
    }

    fn pseudo(&mut self, target: Expression, op: PseudoOp, arguments: Vec<Expression>) -> Expression {
        self.emit(Instruction::pseudo(target.clone(), op, arguments));
        target
    }

    fn array_set(&mut self, array: Expression, value: Expression) {
        let result = self.temps.fresh();
        self.emit(Instruction::pseudo(result, PseudoOp::ArraySet, vec![array, value]));
    }

    fn copy(&mut self, target: Expression, value: Expression) {
        if target != value {
            self.emit(Instruction::pseudo(target, PseudoOp::Id, vec![value]));
        }
    }

    /// Variables, `this` and class names can own fields; anything else goes through a temporary.
    fn materialize(&mut self, value: Expression) -> Expression {
        if value.is_object() {
            value
        } else {
            let target = self.temps.fresh();
            self.pseudo(target, PseudoOp::Id, vec![value])
        }
    }

    fn destination(&mut self, id: SyntaxId) -> Expression {
        self.destinations
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.temps.fresh())
    }

    /// Like [`Self::destination`], but refuses a local that the allocation itself reads.
    fn allocation_target<'e>(
        &mut self,
        id: SyntaxId,
        mut reads: impl Iterator<Item = &'e Expression>,
    ) -> Expression {
        if let Some(hint) = self.destinations.get(&id).cloned() {
            if reads.all(|read| *read != hint) {
                return hint;
            }
        }
        self.temps.fresh()
    }

    /// `Some(Variable)` when `left` names a local, a parameter or something unresolved.
    fn local_target(&self, left: &Expr) -> Option<Expression> {
        let left = left.unparenthesized();
        let ExprKind::Identifier(name) = &left.kind else {
            return None;
        };
        match self.semantic.symbol(left.id).as_deref() {
            None | Some(Symbol::Local(_) | Symbol::Parameter(_)) => {
                Some(Expression::Variable(name.clone()))
            }
            Some(_) => None,
        }
    }

    fn binding_receiver(&mut self, binding: SyntaxId) -> Expression {
        match self.receivers.get(&binding).copied() {
            Some(receiver) => self.lower(receiver),
            None => Expression::constant(),
        }
    }

    fn is_string(&self, expression: &Expr) -> bool {
        let expression = expression.unparenthesized();
        match &expression.kind {
            ExprKind::Literal(Literal::String(_)) | ExprKind::InterpolatedString(_) => true,
            _ => self
                .semantic
                .type_of(expression.id)
                .is_some_and(|ty| self.options.is_string_like(self.semantic, &ty)),
        }
    }

    fn is_concatenation(&self, expression: &Expr, left: &Expr, right: &Expr) -> bool {
        self.is_string(expression) || self.is_string(left) || self.is_string(right)
    }

    fn lower_uncached(&mut self, expression: &'a Expr) -> Expression {
        match &expression.kind {
            ExprKind::Literal(Literal::Null) => Expression::constant(),
            ExprKind::Literal(literal) => Expression::Constant(Some(literal.value_text())),
            ExprKind::Identifier(name) => self.lower_name(expression, name),
            ExprKind::This | ExprKind::Base => Expression::This,
            ExprKind::MemberAccess { target, name } => {
                let receiver = self.lower(target);
                self.read_member(expression, receiver, name)
            }
            ExprKind::MemberBinding(name) => {
                let receiver = self.binding_receiver(expression.id);
                self.read_member(expression, receiver, name)
            }
            ExprKind::ElementBinding(_) => {
                let receiver = self.binding_receiver(expression.id);
                let target = self.destination(expression.id);
                self.pseudo(target, PseudoOp::ArrayGet, vec![receiver])
            }
            ExprKind::ElementAccess { target, .. } => {
                let array = self.lower(target);
                let target = self.destination(expression.id);
                self.pseudo(target, PseudoOp::ArrayGet, vec![array])
            }
            ExprKind::Invocation { target, arguments } => {
                self.lower_invocation(expression, target, arguments)
            }
            ExprKind::ObjectCreation {
                type_name,
                arguments,
                initializer,
            } => self.lower_object_creation(expression, type_name, arguments, initializer),
            ExprKind::ArrayCreation {
                element_type,
                initializer,
                ..
            } => self.lower_array_creation(expression, element_type, initializer),
            ExprKind::Assignment {
                operator,
                left,
                right,
            } => self.lower_assignment(expression, *operator, left, right),
            ExprKind::Binary {
                operator: BinaryOperator::Add,
                left,
                right,
            } if self.is_concatenation(expression, left, right) => {
                let left = self.lower(left);
                let right = self.lower(right);
                let target = self.destination(expression.id);
                self.pseudo(target, PseudoOp::Concat, vec![left, right])
            }
            ExprKind::Binary {
                operator: BinaryOperator::As,
                left,
                ..
            } => self.lower(left),
            ExprKind::Cast { operand, .. }
            | ExprKind::Await(operand)
            | ExprKind::Parenthesized(operand) => self.lower(operand),
            ExprKind::IsPattern {
                expression: tested,
                pattern,
            } => {
                if let Some(name) = pattern.binding() {
                    let value = self.lower(tested);
                    self.copy(Expression::variable(name), value);
                }
                Expression::constant()
            }
            ExprKind::InterpolatedString(parts) => self.lower_interpolation(expression, parts),
            ExprKind::Binary { .. }
            | ExprKind::Unary { .. }
            | ExprKind::Conditional { .. }
            | ExprKind::ConditionalAccess { .. }
            | ExprKind::Lambda(_)
            | ExprKind::SwitchExpression { .. }
            | ExprKind::Throw(_)
            | ExprKind::TypeOf(_)
            | ExprKind::Default(_) => Expression::constant(),
        }
    }

    fn lower_name(&mut self, expression: &'a Expr, name: &str) -> Expression {
        match self.semantic.symbol(expression.id).as_deref() {
            None | Some(Symbol::Local(_) | Symbol::Parameter(_)) => {
                Expression::Variable(name.to_string())
            }
            Some(Symbol::Field(field)) => Expression::FieldAccess {
                object: Box::new(owner(field.flags, &field.containing_type)),
                field: field.name.clone(),
            },
            Some(Symbol::Property(property)) => {
                let receiver = owner(property.flags, &property.containing_type);
                let target = self.destination(expression.id);
                self.call(
                    target,
                    naming::accessor_id(property, Accessor::Get),
                    vec![receiver],
                )
            }
            Some(Symbol::Type(ty)) => Expression::ClassName(ty.name.clone()),
            Some(Symbol::Method(_) | Symbol::Namespace(_)) => Expression::constant(),
        }
    }

    fn read_member(&mut self, expression: &'a Expr, receiver: Expression, name: &str) -> Expression {
        match self.semantic.symbol(expression.id).as_deref() {
            Some(Symbol::Field(field)) => {
                let object = if field.flags.contains(MemberFlags::STATIC) {
                    Expression::ClassName(field.containing_type.clone())
                } else {
                    self.materialize(receiver)
                };
                Expression::FieldAccess {
                    object: Box::new(object),
                    field: field.name.clone(),
                }
            }
            Some(Symbol::Property(property)) => {
                let receiver = if property.flags.contains(MemberFlags::STATIC) {
                    Expression::ClassName(property.containing_type.clone())
                } else {
                    receiver
                };
                let target = self.destination(expression.id);
                self.call(
                    target,
                    naming::accessor_id(property, Accessor::Get),
                    vec![receiver],
                )
            }
            Some(Symbol::Type(ty)) => Expression::ClassName(ty.name.clone()),
            Some(Symbol::Local(_) | Symbol::Parameter(_)) => Expression::variable(name),
            Some(Symbol::Method(_) | Symbol::Namespace(_)) => Expression::constant(),
            None => {
                let target = self.destination(expression.id);
                self.pseudo(target, PseudoOp::Unknown, vec![receiver])
            }
        }
    }

    /// Arguments in parameter order, with `ref` and `out` arguments last.
    fn lower_arguments(&mut self, method: &MethodSymbol, arguments: &'a [Argument]) -> Vec<Expression> {
        let mut ordered: Vec<(bool, usize, &'a Argument)> = arguments
            .iter()
            .enumerate()
            .map(|(position, argument)| {
                let index = argument
                    .name
                    .as_deref()
                    .and_then(|name| {
                        method
                            .parameters
                            .iter()
                            .position(|parameter| parameter.name == name)
                    })
                    .unwrap_or(position);
                let by_reference = matches!(argument.ref_kind, RefKind::Ref | RefKind::Out);
                (by_reference, index, argument)
            })
            .collect();
        ordered.sort_by_key(|(by_reference, index, _)| (*by_reference, *index));

        ordered
            .into_iter()
            .map(|(_, _, argument)| self.lower(&argument.expression))
            .collect()
    }

    fn lower_invocation(
        &mut self,
        expression: &'a Expr,
        callee: &'a Expr,
        arguments: &'a [Argument],
    ) -> Expression {
        let callee = callee.unparenthesized();
        let receiver = match &callee.kind {
            ExprKind::MemberAccess { target, .. } => Some(self.lower(target)),
            ExprKind::MemberBinding(_) => Some(self.binding_receiver(callee.id)),
            ExprKind::Identifier(_) => None,
            _ => Some(self.lower(callee)),
        };

        let symbol = self
            .semantic
            .symbol(expression.id)
            .filter(|symbol| matches!(**symbol, Symbol::Method(_)))
            .or_else(|| self.semantic.symbol(callee.id));
        let Some(Symbol::Method(method)) = symbol.as_deref() else {
            let mut values: Vec<Expression> = receiver.into_iter().collect();
            for argument in arguments {
                values.push(self.lower(&argument.expression));
            }
            let target = self.destination(expression.id);
            return self.pseudo(target, PseudoOp::Unknown, values);
        };

        let mut values = Vec::with_capacity(arguments.len() + 2);
        if method.is_extension() {
            let class = Expression::ClassName(method.containing_type.clone());
            values.push(class.clone());
            if let Some(receiver) = receiver.filter(|receiver| *receiver != class) {
                values.push(receiver);
            }
        } else if method.is_static() {
            values.push(Expression::ClassName(method.containing_type.clone()));
        } else {
            values.push(receiver.unwrap_or(Expression::This));
        }
        values.extend(self.lower_arguments(method, arguments));

        let target = self.destination(expression.id);
        self.call(target, naming::method_id(method), values)
    }

    fn lower_object_creation(
        &mut self,
        expression: &'a Expr,
        type_name: &str,
        arguments: &'a [Argument],
        initializer: &'a [Expr],
    ) -> Expression {
        let symbol = self.semantic.symbol(expression.id);
        let constructor = match symbol.as_deref() {
            Some(Symbol::Method(method)) => Some(method),
            _ => None,
        };

        let values = match constructor {
            Some(constructor) => self.lower_arguments(constructor, arguments),
            None => arguments
                .iter()
                .map(|argument| self.lower(&argument.expression))
                .collect(),
        };

        let mut members: Vec<(Option<&'a Expr>, Expression)> = Vec::with_capacity(initializer.len());
        for element in initializer {
            match &element.kind {
                ExprKind::Assignment {
                    operator: AssignmentOperator::Simple,
                    left,
                    right,
                } => {
                    let value = self.lower(right);
                    members.push((Some(&**left), value));
                }
                _ => {
                    let value = self.lower(element);
                    members.push((None, value));
                }
            }
        }

        let target = self.allocation_target(
            expression.id,
            values.iter().chain(members.iter().map(|(_, value)| value)),
        );
        let allocated = self
            .semantic
            .type_of(expression.id)
            .map(|ty| ty.name)
            .or_else(|| constructor.map(|constructor| constructor.containing_type.clone()))
            .unwrap_or_else(|| type_name.to_string());
        self.emit(Instruction::NewObject {
            target: target.clone(),
            type_name: allocated,
        });

        match constructor {
            Some(constructor) => {
                let mut arguments = Vec::with_capacity(values.len() + 1);
                arguments.push(target.clone());
                arguments.extend(values);
                let result = self.temps.fresh();
                self.call(result, naming::method_id(constructor), arguments);
            }
            None if !values.is_empty() => {
                let mut arguments = Vec::with_capacity(values.len() + 1);
                arguments.push(target.clone());
                arguments.extend(values);
                let result = self.temps.fresh();
                self.pseudo(result, PseudoOp::Unknown, arguments);
            }
            None => {}
        }

        for (member, value) in members {
            match member.map(Expr::unparenthesized) {
                Some(left) => match &left.kind {
                    ExprKind::Identifier(name) => {
                        self.write_member(left, target.clone(), name, value);
                    }
                    _ => self.array_set(target.clone(), value),
                },
                None => self.array_set(target.clone(), value),
            }
        }
        target
    }

    fn lower_array_creation(
        &mut self,
        expression: &'a Expr,
        element_type: &str,
        initializer: &'a [Expr],
    ) -> Expression {
        let values: Vec<Expression> = initializer
            .iter()
            .map(|element| self.lower(element))
            .collect();

        let target = self.allocation_target(expression.id, values.iter());
        let type_name = self
            .semantic
            .type_of(expression.id)
            .map_or_else(|| format!("{element_type}[]"), |ty| ty.name);
        self.emit(Instruction::NewObject {
            target: target.clone(),
            type_name,
        });

        for value in values {
            self.array_set(target.clone(), value);
        }
        target
    }

    fn lower_assignment(
        &mut self,
        expression: &'a Expr,
        operator: AssignmentOperator,
        left: &'a Expr,
        right: &'a Expr,
    ) -> Expression {
        match operator {
            AssignmentOperator::Simple | AssignmentOperator::Coalesce => {
                let value = self.lower(right);
                self.write(left, value)
            }
            AssignmentOperator::Compound(BinaryOperator::Add)
                if self.is_concatenation(expression, left, right) =>
            {
                let previous = self.lower(left);
                let addend = self.lower(right);
                let target = self
                    .local_target(left)
                    .unwrap_or_else(|| self.temps.fresh());
                let value = self.pseudo(target, PseudoOp::Concat, vec![previous, addend]);
                self.write(left, value)
            }
            AssignmentOperator::Compound(_) => self.write(left, Expression::constant()),
        }
    }

    /// Stores `value` into the location `left`; returns the written location.
    fn write(&mut self, left: &'a Expr, value: Expression) -> Expression {
        let left = left.unparenthesized();
        match &left.kind {
            ExprKind::Identifier(name) => match self.semantic.symbol(left.id).as_deref() {
                Some(Symbol::Property(property)) => {
                    let receiver = owner(property.flags, &property.containing_type);
                    let result = self.temps.fresh();
                    self.call(
                        result,
                        naming::accessor_id(property, Accessor::Set),
                        vec![receiver, value.clone()],
                    );
                    value
                }
                Some(Symbol::Field(field)) => {
                    let location = Expression::FieldAccess {
                        object: Box::new(owner(field.flags, &field.containing_type)),
                        field: field.name.clone(),
                    };
                    self.copy(location.clone(), value);
                    location
                }
                _ => {
                    let location = Expression::Variable(name.clone());
                    self.copy(location.clone(), value);
                    location
                }
            },
            ExprKind::MemberAccess { target, name } => {
                let object = self.lower(target);
                self.write_member(left, object, name, value)
            }
            ExprKind::MemberBinding(name) => {
                let object = self.binding_receiver(left.id);
                self.write_member(left, object, name, value)
            }
            ExprKind::ElementAccess { target, .. } => {
                let array = self.lower(target);
                self.array_set(array, value.clone());
                value
            }
            ExprKind::ElementBinding(_) => {
                let array = self.binding_receiver(left.id);
                self.array_set(array, value.clone());
                value
            }
            _ => value,
        }
    }

    fn write_member(
        &mut self,
        left: &'a Expr,
        object: Expression,
        name: &str,
        value: Expression,
    ) -> Expression {
        match self.semantic.symbol(left.id).as_deref() {
            Some(Symbol::Property(property)) => {
                let receiver = if property.flags.contains(MemberFlags::STATIC) {
                    Expression::ClassName(property.containing_type.clone())
                } else {
                    object
                };
                let result = self.temps.fresh();
                self.call(
                    result,
                    naming::accessor_id(property, Accessor::Set),
                    vec![receiver, value.clone()],
                );
                value
            }
            Some(Symbol::Field(field)) => {
                let object = if field.flags.contains(MemberFlags::STATIC) {
                    Expression::ClassName(field.containing_type.clone())
                } else {
                    self.materialize(object)
                };
                let location = Expression::FieldAccess {
                    object: Box::new(object),
                    field: field.name.clone(),
                };
                self.copy(location.clone(), value);
                location
            }
            _ => {
                let location = Expression::FieldAccess {
                    object: Box::new(self.materialize(object)),
                    field: name.to_string(),
                };
                self.copy(location.clone(), value);
                location
            }
        }
    }

    /// `$"a{b}c"` becomes a left-associative `__concat` chain.
    fn lower_interpolation(&mut self, expression: &'a Expr, parts: &'a [InterpolationPart]) -> Expression {
        let values: Vec<Expression> = parts
            .iter()
            .map(|part| match part {
                InterpolationPart::Text(text) => Expression::Constant(Some(text.clone())),
                InterpolationPart::Interpolation(inner) => self.lower(inner),
            })
            .collect();

        let count = values.len();
        let mut values = values.into_iter();
        let Some(mut accumulated) = values.next() else {
            return Expression::Constant(Some(String::new()));
        };
        for (index, value) in values.enumerate() {
            let target = if index + 2 == count {
                self.destination(expression.id)
            } else {
                self.temps.fresh()
            };
            accumulated = self.pseudo(target, PseudoOp::Concat, vec![accumulated, value]);
        }
        accumulated
    }
}
