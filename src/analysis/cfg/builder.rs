//! Backward construction of procedure control flow graphs.
//!
//! The builder starts from the exit block and walks the body from the last statement to the
//! first. At every step `current` is the block that will execute *next*; visiting a node either
//! prepends it to `current` or creates a new block whose successors are blocks that already
//! exist. This is what makes every forward edge trivially known, leaving only loop heads and
//! labels as placeholders to be linked afterwards.
//!
//! Instructions are pushed in reverse and flipped once when the graph is assembled. An
//! expression is pushed before its operands, so operands precede their consumer in execution
//! order.
//!
//! After the walk, empty `Simple` blocks (placeholders and construct scaffolding) are
//! bypassed and the surviving blocks are renumbered: the entry gets the lowest id, the exit
//! the highest, and the remaining blocks follow reverse build order.

use log::{debug, trace};

use crate::{
    analysis::cfg::{
        block::{BasicBlock, BlockKind, BranchingConstruct, CfgNode, JumpKind, JumpNode},
        context::{JumpContext, JumpTarget},
        edge::CfgEdgeKind,
        graph::ControlFlowGraph,
    },
    semantic::SemanticModel,
    syntax::{
        walk_statement, Argument, AssignmentOperator, BinaryOperator, CatchClause, Expr, ExprKind,
        GotoTarget, InterpolationPart, Pattern, PatternKind, Procedure, ProcedureBody, Stmt,
        StmtKind, SwitchLabelKind, SwitchSection, VariableDeclarator, Visit,
    },
    utils::graph::{DirectedGraph, NodeId},
    Result,
};

struct BuildBlock<'a> {
    kind: BlockKind<'a>,
    reversed: Vec<CfgNode<'a>>,
    successors: Vec<(usize, CfgEdgeKind)>,
}

struct LabelCollector<'a> {
    labels: Vec<&'a str>,
}

impl<'a> Visit<'a> for LabelCollector<'a> {
    fn visit_statement(&mut self, statement: &'a Stmt) -> bool {
        if let StmtKind::Labeled { label, .. } = &statement.kind {
            self.labels.push(label);
        }
        true
    }

    fn visit_expression(&mut self, _expression: &'a Expr) -> bool {
        false
    }
}

/// Builds a [`ControlFlowGraph`] for one procedure.
///
/// The semantic model is only consulted to match `goto case` targets against case labels by
/// constant value.
pub struct CfgBuilder<'a, 'm> {
    procedure: &'a Procedure,
    semantic: &'m dyn SemanticModel,
    blocks: Vec<BuildBlock<'a>>,
    current: usize,
    exit: usize,
    context: JumpContext,
}

impl<'a, 'm> CfgBuilder<'a, 'm> {
    /// Builds the control flow graph of `procedure`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Procedure`] wrapping the cause when a jump cannot be resolved:
    /// an undeclared label, a `break`/`continue` outside any loop or switch, or a
    /// `goto case` without a matching section.
    pub fn build(
        procedure: &'a Procedure,
        semantic: &'m dyn SemanticModel,
    ) -> Result<ControlFlowGraph<'a>> {
        let exit_block = BuildBlock {
            kind: BlockKind::Exit,
            reversed: Vec::new(),
            successors: Vec::new(),
        };
        let builder = CfgBuilder {
            procedure,
            semantic,
            blocks: vec![exit_block],
            current: 0,
            exit: 0,
            context: JumpContext::new(0),
        };

        builder
            .run()
            .map_err(|error| error.in_procedure(&procedure.name))
    }

    fn run(mut self) -> Result<ControlFlowGraph<'a>> {
        self.current = self.simple(self.exit);

        match &self.procedure.body {
            ProcedureBody::Block(statements) => {
                self.collect_labels(statements);
                self.build_statements(statements)?;
            }
            ProcedureBody::Expression(expression) => {
                let target = JumpTarget {
                    target: self.exit,
                    through_finally: None,
                };
                self.current =
                    self.jump(JumpKind::Return, JumpNode::Expression(expression), target);
                self.build_expression(expression)?;
            }
        }

        let entry = self.current;
        self.finish(entry)
    }

    fn collect_labels(&mut self, statements: &'a [Stmt]) {
        let mut collector = LabelCollector { labels: Vec::new() };
        for statement in statements {
            walk_statement(statement, &mut collector);
        }
        for label in collector.labels {
            if self.context.label_placeholder(label).is_none() {
                let placeholder = self.placeholder();
                self.context.declare_label(label, placeholder);
            }
        }
    }

    // ============================================================================================
    // Block arena
    // ============================================================================================

    fn add_block(&mut self, kind: BlockKind<'a>, successors: Vec<(usize, CfgEdgeKind)>) -> usize {
        self.blocks.push(BuildBlock {
            kind,
            reversed: Vec::new(),
            successors,
        });
        self.blocks.len() - 1
    }

    fn simple(&mut self, successor: usize) -> usize {
        self.add_block(
            BlockKind::Simple,
            vec![(successor, CfgEdgeKind::Unconditional)],
        )
    }

    fn placeholder(&mut self) -> usize {
        self.add_block(BlockKind::Simple, Vec::new())
    }

    fn link(&mut self, placeholder: usize, target: usize) {
        self.blocks[placeholder].successors = vec![(target, CfgEdgeKind::Unconditional)];
    }

    fn binary(
        &mut self,
        construct: BranchingConstruct<'a>,
        condition: Option<&'a Expr>,
        when_true: usize,
        when_false: usize,
    ) -> usize {
        self.add_block(
            BlockKind::BinaryBranch {
                construct,
                condition,
            },
            vec![
                (when_true, CfgEdgeKind::ConditionalTrue),
                (when_false, CfgEdgeKind::ConditionalFalse),
            ],
        )
    }

    fn jump(&mut self, kind: JumpKind, node: JumpNode<'a>, target: JumpTarget) -> usize {
        let mut successors = vec![(target.target, CfgEdgeKind::Unconditional)];
        if let Some(finally) = target.through_finally {
            successors.push((finally, CfgEdgeKind::Finally));
        }
        self.add_block(BlockKind::Jump { kind, node }, successors)
    }

    fn add(&mut self, node: CfgNode<'a>) {
        self.blocks[self.current].reversed.push(node);
    }

    // ============================================================================================
    // Statements
    // ============================================================================================

    fn build_statements(&mut self, statements: &'a [Stmt]) -> Result<()> {
        for statement in statements.iter().rev() {
            self.build_statement(statement)?;
        }
        Ok(())
    }

    fn build_statement(&mut self, statement: &'a Stmt) -> Result<()> {
        match &statement.kind {
            StmtKind::Block(statements) => self.build_statements(statements)?,
            StmtKind::Expression(expression) | StmtKind::YieldReturn(expression) => {
                self.build_expression(expression)?;
            }
            StmtKind::LocalDeclaration(declarators) => self.build_declarators(declarators)?,
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let after = self.current;
                let when_false = match else_branch {
                    Some(otherwise) => {
                        self.current = self.simple(after);
                        self.build_statement(otherwise)?;
                        self.current
                    }
                    None => after,
                };
                self.current = self.simple(after);
                self.build_statement(then_branch)?;
                let when_true = self.current;
                self.build_condition(
                    BranchingConstruct::Statement(statement),
                    condition,
                    when_true,
                    when_false,
                )?;
            }
            StmtKind::While { condition, body } => {
                let after = self.current;
                let head = self.placeholder();

                self.context.push_loop(after, head);
                self.current = self.simple(head);
                self.build_statement(body)?;
                self.context.pop_scope();
                let body_entry = self.current;

                self.build_condition(
                    BranchingConstruct::Statement(statement),
                    condition,
                    body_entry,
                    after,
                )?;
                let condition_entry = self.current;
                self.link(head, condition_entry);
                self.current = self.simple(condition_entry);
            }
            StmtKind::Do { body, condition } => {
                let after = self.current;
                let head = self.placeholder();

                self.context.push_loop(after, head);
                self.current = self.simple(head);
                self.build_statement(body)?;
                self.context.pop_scope();
                let body_entry = self.current;

                self.build_condition(
                    BranchingConstruct::Statement(statement),
                    condition,
                    body_entry,
                    after,
                )?;
                let condition_entry = self.current;
                self.link(head, condition_entry);
                self.current = self.simple(body_entry);
            }
            StmtKind::For {
                declarators,
                initializers,
                condition,
                incrementors,
                body,
            } => {
                let after = self.current;
                let head = self.placeholder();

                self.current = self.simple(head);
                for incrementor in incrementors.iter().rev() {
                    self.build_expression(incrementor)?;
                }
                let increment_entry = self.current;

                self.context.push_loop(after, increment_entry);
                self.current = self.simple(increment_entry);
                self.build_statement(body)?;
                self.context.pop_scope();
                let body_entry = self.current;

                let condition_entry = match condition {
                    Some(condition) => {
                        self.build_condition(
                            BranchingConstruct::Statement(statement),
                            condition,
                            body_entry,
                            after,
                        )?;
                        self.current
                    }
                    None => self.simple(body_entry),
                };
                self.link(head, condition_entry);

                self.current = self.add_block(
                    BlockKind::ForInitializer(statement),
                    vec![(condition_entry, CfgEdgeKind::Unconditional)],
                );
                for initializer in initializers.iter().rev() {
                    self.build_expression(initializer)?;
                }
                self.build_declarators(declarators)?;
                self.current = self.simple(self.current);
            }
            StmtKind::Foreach {
                variable,
                collection,
                body,
            } => {
                let after = self.current;
                let head = self.placeholder();

                self.context.push_loop(after, head);
                self.current = self.simple(head);
                self.build_statement(body)?;
                self.add(CfgNode::ForeachVariable {
                    variable,
                    collection,
                });
                self.context.pop_scope();
                let body_entry = self.current;

                let branch = self.binary(
                    BranchingConstruct::Statement(statement),
                    None,
                    body_entry,
                    after,
                );
                self.link(head, branch);

                self.current = self.add_block(
                    BlockKind::ForeachCollectionProducer(statement),
                    vec![(branch, CfgEdgeKind::Unconditional)],
                );
                self.build_expression(collection)?;
                self.current = self.simple(self.current);
            }
            StmtKind::Switch {
                expression,
                sections,
            } => self.build_switch(expression, sections)?,
            StmtKind::Break => {
                let target = self.context.break_target(statement.id)?;
                self.current = self.jump(JumpKind::Break, JumpNode::Statement(statement), target);
            }
            StmtKind::Continue => {
                let target = self.context.continue_target(statement.id)?;
                self.current =
                    self.jump(JumpKind::Continue, JumpNode::Statement(statement), target);
            }
            StmtKind::Return(value) => {
                let target = JumpTarget {
                    target: self.context.return_target(),
                    through_finally: None,
                };
                self.current = self.jump(JumpKind::Return, JumpNode::Statement(statement), target);
                if let Some(value) = value {
                    self.build_expression(value)?;
                }
            }
            StmtKind::Throw(value) => {
                let target = JumpTarget {
                    target: self.context.throw_target(),
                    through_finally: None,
                };
                self.current = self.jump(JumpKind::Throw, JumpNode::Statement(statement), target);
                if let Some(value) = value {
                    self.build_expression(value)?;
                }
            }
            StmtKind::YieldBreak => {
                let target = JumpTarget {
                    target: self.context.return_target(),
                    through_finally: None,
                };
                self.current =
                    self.jump(JumpKind::YieldBreak, JumpNode::Statement(statement), target);
            }
            StmtKind::Goto(goto) => {
                let (kind, target) = match goto {
                    GotoTarget::Label(label) => (JumpKind::GotoLabel, self.context.goto_label(label)?),
                    GotoTarget::Case(value) => {
                        let key = self.case_key(value);
                        (JumpKind::GotoCase, self.context.goto_case(&key)?)
                    }
                    GotoTarget::Default => (JumpKind::GotoDefault, self.context.goto_default()?),
                };
                self.current = self.jump(kind, JumpNode::Statement(statement), target);
            }
            StmtKind::Labeled {
                label,
                statement: inner,
            } => {
                self.build_statement(inner)?;
                let entry = self.current;
                if let Some(placeholder) = self.context.label_placeholder(label) {
                    self.link(placeholder, entry);
                }
                self.current = self.simple(entry);
            }
            StmtKind::Try {
                block,
                catches,
                finally,
            } => self.build_try(statement, block, catches, finally.as_deref())?,
            StmtKind::Using {
                declarators,
                expression,
                body,
            } => {
                let after = self.current;
                let mut disposed: Vec<String> = declarators
                    .iter()
                    .map(|declarator| declarator.name.clone())
                    .collect();
                if let Some(resource) = expression {
                    disposed.push(resource.unparenthesized().to_string());
                }

                let end = self.add_block(
                    BlockKind::UsingEnd {
                        statement,
                        disposed,
                    },
                    vec![(after, CfgEdgeKind::Unconditional)],
                );
                self.current = self.simple(end);
                self.build_statement(body)?;

                self.current = self.simple(self.current);
                if let Some(resource) = expression {
                    self.build_expression(resource)?;
                }
                self.build_declarators(declarators)?;
            }
            StmtKind::Lock { expression, body } => {
                let after = self.current;
                self.current = self.simple(after);
                self.build_statement(body)?;
                let body_entry = self.current;

                self.current = self.add_block(
                    BlockKind::Lock(statement),
                    vec![(body_entry, CfgEdgeKind::Unconditional)],
                );
                self.build_expression(expression)?;
                self.current = self.simple(self.current);
            }
            StmtKind::Fixed { declarators, body } => {
                let after = self.current;
                self.current = self.simple(after);
                self.build_statement(body)?;
                self.current = self.simple(self.current);
                self.build_declarators(declarators)?;
            }
            StmtKind::Checked(body) | StmtKind::Unchecked(body) | StmtKind::Unsafe(body) => {
                self.build_statement(body)?;
            }
            StmtKind::LocalFunction(_) | StmtKind::Empty => {}
        }
        Ok(())
    }

    fn build_declarators(&mut self, declarators: &'a [VariableDeclarator]) -> Result<()> {
        for declarator in declarators.iter().rev() {
            self.add(CfgNode::Declarator(declarator));
            if let Some(initializer) = &declarator.initializer {
                self.build_expression(initializer)?;
            }
        }
        Ok(())
    }

    fn build_switch(
        &mut self,
        discriminant: &'a Expr,
        sections: &'a [SwitchSection],
    ) -> Result<()> {
        let after = self.current;
        self.context.push_switch(after);

        let placeholders: Vec<usize> = sections.iter().map(|_| self.placeholder()).collect();
        let mut default_section = None;
        for (index, section) in sections.iter().enumerate() {
            for label in &section.labels {
                match &label.kind {
                    SwitchLabelKind::Case(value)
                    | SwitchLabelKind::Pattern {
                        pattern:
                            Pattern {
                                kind: PatternKind::Constant(value),
                                ..
                            },
                        guard: None,
                    } => {
                        let key = self.case_key(value);
                        self.context.add_case(key, placeholders[index]);
                    }
                    SwitchLabelKind::Default => {
                        self.context.set_default(placeholders[index]);
                        default_section = Some(index);
                    }
                    SwitchLabelKind::Pattern { .. } => {}
                }
            }
        }

        let mut entries = vec![after; sections.len()];
        for (index, section) in sections.iter().enumerate().rev() {
            self.current = self.simple(after);
            self.build_statements(&section.statements)?;
            entries[index] = self.current;
            self.link(placeholders[index], self.current);
        }
        self.context.pop_scope();

        let mut next = default_section.map_or(after, |index| entries[index]);
        for (index, section) in sections.iter().enumerate().rev() {
            for label in section.labels.iter().rev() {
                let mut target = entries[index];
                match &label.kind {
                    SwitchLabelKind::Default => continue,
                    SwitchLabelKind::Case(value) => {
                        self.current = self.binary(
                            BranchingConstruct::CaseLabel(label),
                            Some(value),
                            target,
                            next,
                        );
                        self.add(CfgNode::CaseLabel {
                            label,
                            discriminant,
                        });
                        self.build_expression(value)?;
                    }
                    SwitchLabelKind::Pattern { pattern, guard } => {
                        if let Some(guard) = guard {
                            self.build_condition(
                                BranchingConstruct::CaseLabel(label),
                                guard,
                                target,
                                next,
                            )?;
                            target = self.current;
                        }
                        self.current =
                            self.binary(BranchingConstruct::CaseLabel(label), None, target, next);
                        self.add(CfgNode::CaseLabel {
                            label,
                            discriminant,
                        });
                        self.build_pattern(pattern)?;
                    }
                }
                next = self.current;
            }
        }

        self.current = self.simple(next);
        self.build_expression(discriminant)
    }

    fn build_try(
        &mut self,
        statement: &'a Stmt,
        block: &'a Stmt,
        catches: &'a [CatchClause],
        finally: Option<&'a Stmt>,
    ) -> Result<()> {
        let after = self.current;

        let finally_entry = match finally {
            Some(finally) => {
                let outward = self.context.throw_target();
                let mut successors = vec![(after, CfgEdgeKind::Unconditional)];
                if outward != after {
                    successors.push((outward, CfgEdgeKind::Exception));
                }
                self.current = self.add_block(
                    BlockKind::Branch {
                        construct: BranchingConstruct::Statement(finally),
                    },
                    successors,
                );
                self.build_statement(finally)?;
                let entry = self.current;
                self.context.push_finally(entry);
                Some(entry)
            }
            None => None,
        };
        let continuation = finally_entry.unwrap_or(after);

        let mut next = self.context.throw_target();
        for catch in catches.iter().rev() {
            self.current = self.simple(continuation);
            self.build_statement(&catch.block)?;
            let mut target = self.current;
            if let Some(filter) = &catch.filter {
                self.build_condition(BranchingConstruct::Catch(catch), filter, target, next)?;
                target = self.current;
            }
            next = self.binary(BranchingConstruct::Catch(catch), None, target, next);
        }
        let first_catch = (!catches.is_empty()).then_some(next);
        if let Some(handler) = first_catch {
            self.context.push_catch(handler);
        }

        self.current = self.simple(continuation);
        self.build_statement(block)?;

        // the protected body may leave through a jump, so the handler hangs off its start
        if let Some(handler) = first_catch {
            self.context.pop_handler();
            let body_entry = self.current;
            self.current = self.add_block(
                BlockKind::Branch {
                    construct: BranchingConstruct::Statement(statement),
                },
                vec![
                    (body_entry, CfgEdgeKind::Unconditional),
                    (handler, CfgEdgeKind::Exception),
                ],
            );
        }
        if finally_entry.is_some() {
            self.context.pop_handler();
        }
        self.current = self.simple(self.current);
        Ok(())
    }

    fn case_key(&self, value: &Expr) -> String {
        let value = value.unparenthesized();
        if let Some(constant) = self.semantic.constant_value(value.id) {
            return constant.value_text();
        }
        match &value.kind {
            ExprKind::Literal(literal) => literal.value_text(),
            _ => value.to_string(),
        }
    }

    // ============================================================================================
    // Expressions
    // ============================================================================================

    /// Builds a branch on `condition`, splitting `&&` and `||` into chained tests.
    fn build_condition(
        &mut self,
        construct: BranchingConstruct<'a>,
        condition: &'a Expr,
        when_true: usize,
        when_false: usize,
    ) -> Result<()> {
        let condition = condition.unparenthesized();
        match &condition.kind {
            ExprKind::Binary {
                operator: BinaryOperator::LogicalAnd,
                left,
                right,
            } => {
                self.build_condition(construct, right, when_true, when_false)?;
                let right_entry = self.current;
                self.build_condition(construct, left, right_entry, when_false)
            }
            ExprKind::Binary {
                operator: BinaryOperator::LogicalOr,
                left,
                right,
            } => {
                self.build_condition(construct, right, when_true, when_false)?;
                let right_entry = self.current;
                self.build_condition(construct, left, when_true, right_entry)
            }
            _ => {
                self.current = self.binary(construct, Some(condition), when_true, when_false);
                self.build_expression(condition)
            }
        }
    }

    fn build_expression(&mut self, expression: &'a Expr) -> Result<()> {
        match &expression.kind {
            ExprKind::Literal(_)
            | ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Base
            | ExprKind::MemberBinding(_)
            | ExprKind::TypeOf(_)
            | ExprKind::Default(_)
            | ExprKind::Lambda(_) => self.add(CfgNode::Expression(expression)),
            ExprKind::MemberAccess { target, .. }
            | ExprKind::Unary {
                operand: target, ..
            }
            | ExprKind::Cast {
                operand: target, ..
            }
            | ExprKind::Await(target) => {
                self.add(CfgNode::Expression(expression));
                self.build_expression(target)?;
            }
            ExprKind::Parenthesized(inner) => self.build_expression(inner)?,
            ExprKind::ConditionalAccess { target, access } => {
                let after = self.current;
                self.add(CfgNode::Expression(expression));

                self.current = self.simple(after);
                self.build_expression(access)?;
                let access_entry = self.current;

                self.current = self.binary(
                    BranchingConstruct::Expression(expression),
                    Some(&**target),
                    after,
                    access_entry,
                );
                self.build_expression(target)?;
            }
            ExprKind::ElementBinding(arguments) => {
                self.add(CfgNode::Expression(expression));
                self.build_arguments(arguments)?;
            }
            ExprKind::Invocation { target, arguments }
            | ExprKind::ElementAccess { target, arguments } => {
                self.add(CfgNode::Expression(expression));
                self.build_arguments(arguments)?;
                self.build_expression(target)?;
            }
            ExprKind::ObjectCreation {
                arguments,
                initializer,
                ..
            } => {
                self.add(CfgNode::Expression(expression));
                for element in initializer.iter().rev() {
                    match &element.kind {
                        ExprKind::Assignment {
                            operator: AssignmentOperator::Simple,
                            right,
                            ..
                        } => self.build_expression(right)?,
                        _ => self.build_expression(element)?,
                    }
                }
                self.build_arguments(arguments)?;
            }
            ExprKind::ArrayCreation {
                sizes, initializer, ..
            } => {
                self.add(CfgNode::Expression(expression));
                for element in initializer.iter().rev() {
                    self.build_expression(element)?;
                }
                for size in sizes.iter().rev() {
                    self.build_expression(size)?;
                }
            }
            ExprKind::Assignment {
                operator: AssignmentOperator::Coalesce,
                left,
                right,
            } => {
                let after = self.current;
                self.current = self.simple(after);
                self.add(CfgNode::Expression(expression));
                self.build_expression(right)?;
                let assign_entry = self.current;

                self.current = self.binary(
                    BranchingConstruct::Expression(expression),
                    Some(&**left),
                    assign_entry,
                    after,
                );
                self.build_expression(left)?;
            }
            ExprKind::Assignment { left, right, .. } => {
                self.add(CfgNode::Expression(expression));
                self.build_expression(right)?;
                self.build_assignment_target(left)?;
            }
            ExprKind::Binary {
                operator:
                    operator @ (BinaryOperator::LogicalAnd
                    | BinaryOperator::LogicalOr
                    | BinaryOperator::Coalesce),
                left,
                right,
            } => {
                let after = self.current;
                self.add(CfgNode::Expression(expression));

                self.current = self.simple(after);
                self.build_expression(right)?;
                let right_entry = self.current;

                let (when_true, when_false) = match operator {
                    BinaryOperator::LogicalOr => (after, right_entry),
                    _ => (right_entry, after),
                };
                self.current = self.binary(
                    BranchingConstruct::Expression(expression),
                    Some(&**left),
                    when_true,
                    when_false,
                );
                self.build_expression(left)?;
            }
            ExprKind::Binary {
                operator: BinaryOperator::As | BinaryOperator::Is,
                left,
                ..
            } => {
                self.add(CfgNode::Expression(expression));
                self.build_expression(left)?;
            }
            ExprKind::Binary { left, right, .. } => {
                self.add(CfgNode::Expression(expression));
                self.build_expression(right)?;
                self.build_expression(left)?;
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                let after = self.current;
                self.add(CfgNode::Expression(expression));

                self.current = self.simple(after);
                self.build_expression(when_false)?;
                let false_entry = self.current;

                self.current = self.simple(after);
                self.build_expression(when_true)?;
                let true_entry = self.current;

                self.build_condition(
                    BranchingConstruct::Expression(expression),
                    condition,
                    true_entry,
                    false_entry,
                )?;
            }
            ExprKind::IsPattern {
                expression: tested,
                pattern,
            } => {
                self.add(CfgNode::Expression(expression));
                self.build_pattern(pattern)?;
                self.build_expression(tested)?;
            }
            ExprKind::SwitchExpression { governing, arms } => {
                let after = self.current;
                self.add(CfgNode::Expression(expression));

                let mut next = self.context.throw_target();
                for arm in arms.iter().rev() {
                    self.current = self.simple(after);
                    self.build_expression(&arm.result)?;
                    let mut target = self.current;
                    if let Some(guard) = &arm.guard {
                        self.build_condition(
                            BranchingConstruct::SwitchArm(arm),
                            guard,
                            target,
                            next,
                        )?;
                        target = self.current;
                    }
                    self.current =
                        self.binary(BranchingConstruct::SwitchArm(arm), None, target, next);
                    self.add(CfgNode::SwitchArm { arm, governing });
                    self.build_pattern(&arm.pattern)?;
                    next = self.current;
                }

                self.current = self.simple(next);
                self.build_expression(governing)?;
            }
            ExprKind::Throw(operand) => {
                let target = JumpTarget {
                    target: self.context.throw_target(),
                    through_finally: None,
                };
                self.current = self.jump(JumpKind::Throw, JumpNode::Expression(expression), target);
                self.build_expression(operand)?;
            }
            ExprKind::InterpolatedString(parts) => {
                self.add(CfgNode::Expression(expression));
                for part in parts.iter().rev() {
                    if let InterpolationPart::Interpolation(inner) = part {
                        self.build_expression(inner)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Builds the operands of a written location, without reading the location itself.
    fn build_assignment_target(&mut self, target: &'a Expr) -> Result<()> {
        let target = target.unparenthesized();
        match &target.kind {
            ExprKind::Identifier(_) => Ok(()),
            ExprKind::MemberAccess { target: object, .. } => self.build_expression(object),
            ExprKind::ElementAccess {
                target: object,
                arguments,
            } => {
                self.build_arguments(arguments)?;
                self.build_expression(object)
            }
            _ => self.build_expression(target),
        }
    }

    fn build_arguments(&mut self, arguments: &'a [Argument]) -> Result<()> {
        for argument in arguments.iter().rev() {
            self.build_expression(&argument.expression)?;
        }
        Ok(())
    }

    fn build_pattern(&mut self, pattern: &'a Pattern) -> Result<()> {
        match &pattern.kind {
            PatternKind::Constant(value) | PatternKind::Relational { value, .. } => {
                self.build_expression(value)
            }
            PatternKind::Not(inner) => self.build_pattern(inner),
            PatternKind::And(left, right) | PatternKind::Or(left, right) => {
                self.build_pattern(right)?;
                self.build_pattern(left)
            }
            PatternKind::Declaration { .. }
            | PatternKind::Type(_)
            | PatternKind::Var(_)
            | PatternKind::Discard => Ok(()),
        }
    }

    // ============================================================================================
    // Assembly
    // ============================================================================================

    fn is_bypassable(&self, block: usize) -> bool {
        let data = &self.blocks[block];
        matches!(data.kind, BlockKind::Simple)
            && data.reversed.is_empty()
            && data.successors.len() == 1
    }

    /// Follows chains of empty `Simple` blocks to the first block that does real work.
    ///
    /// A cycle made only of empty blocks (`for (;;) { }`) resolves to its lowest member, which
    /// is kept.
    fn resolve(&self, block: usize) -> usize {
        let mut chain = Vec::new();
        let mut current = block;
        while self.is_bypassable(current) {
            if let Some(position) = chain.iter().position(|&seen| seen == current) {
                return chain[position..]
                    .iter()
                    .copied()
                    .min()
                    .unwrap_or(current);
            }
            chain.push(current);
            current = self.blocks[current].successors[0].0;
        }
        current
    }

    fn finish(self, entry: usize) -> Result<ControlFlowGraph<'a>> {
        if let Some(orphan) = self.blocks.iter().position(|block| {
            matches!(block.kind, BlockKind::Simple) && block.successors.is_empty()
        }) {
            return Err(malformed_error!("placeholder block {} was never linked", orphan));
        }

        let count = self.blocks.len();
        let resolved: Vec<usize> = (0..count).map(|block| self.resolve(block)).collect();
        let entry = resolved[entry];

        let mut order: Vec<usize> = (0..count)
            .rev()
            .filter(|&block| resolved[block] == block && block != entry)
            .collect();
        order.insert(0, entry);

        let mut new_ids = vec![usize::MAX; count];
        for (id, &block) in order.iter().enumerate() {
            new_ids[block] = id;
        }
        trace!(
            "{}: {} build blocks, {} after bypassing empty blocks",
            self.procedure.name,
            count,
            order.len()
        );

        let mut slots: Vec<Option<BuildBlock<'a>>> = self.blocks.into_iter().map(Some).collect();
        let mut graph = DirectedGraph::with_capacity(order.len(), order.len() * 2);
        let mut edges = Vec::new();

        for (id, &block) in order.iter().enumerate() {
            let data = slots[block]
                .take()
                .ok_or_else(|| malformed_error!("block {} emitted twice", block))?;
            for (successor, kind) in &data.successors {
                edges.push((id, new_ids[resolved[*successor]], *kind));
            }
            let mut instructions = data.reversed;
            instructions.reverse();
            graph.add_node(BasicBlock {
                id,
                kind: data.kind,
                instructions,
            });
        }

        for (source, target, kind) in edges {
            graph.add_edge(NodeId::new(source), NodeId::new(target), kind)?;
        }

        let exit = NodeId::new(new_ids[resolved[self.exit]]);
        debug!(
            "built CFG for {} with {} blocks and {} edges",
            self.procedure.name,
            graph.node_count(),
            graph.edge_count()
        );

        Ok(ControlFlowGraph::new(
            self.procedure,
            graph,
            NodeId::new(0),
            exit,
        ))
    }
}
