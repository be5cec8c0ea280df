//! Control flow graph integration tests.
//!
//! These tests build procedures with `SyntaxFactory`, construct their graphs through the public
//! API and check the resulting block structure:
//! 1. Block count and id layout (entry first, exit last)
//! 2. Edge targets and edge kinds per construct
//! 3. Jump resolution through loops, switches and exception handlers
//! 4. Error reporting for unresolvable jumps

use flowscope::{
    analysis::{BlockKind, CfgCache, CfgEdgeKind, ControlFlowGraph, JumpKind},
    semantic::MemorySemanticModel,
    syntax::{BinaryOperator, Procedure, Stmt, SyntaxFactory, UnaryOperator},
    utils::{graph::NodeId, DotGraph},
    Error, Result,
};

fn build(procedure: &Procedure) -> Result<ControlFlowGraph<'_>> {
    ControlFlowGraph::build(procedure, &MemorySemanticModel::new())
}

fn call(f: &mut SyntaxFactory, name: &str) -> Stmt {
    let callee = f.ident(name);
    let invocation = f.invoke(callee, Vec::new());
    f.expr_stmt(invocation)
}

fn edges(cfg: &ControlFlowGraph<'_>, block: usize) -> Vec<(usize, CfgEdgeKind)> {
    cfg.outgoing_edges(NodeId::new(block))
        .map(|(target, kind)| (target.index(), kind))
        .collect()
}

fn rendered(cfg: &ControlFlowGraph<'_>, block: usize) -> Vec<String> {
    cfg.block(NodeId::new(block))
        .map(|block| block.instructions.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Entry is block 0, the exit is the single successor-less block with the highest id, and
/// every binary branch has exactly one true and one false edge.
fn assert_well_formed(cfg: &ControlFlowGraph<'_>) {
    let last = cfg.block_count() - 1;
    assert_eq!(cfg.entry().index(), 0);
    assert_eq!(cfg.exit().index(), last);

    for block in cfg.blocks() {
        let out = edges(cfg, block.id);
        if block.is_exit() {
            assert_eq!(block.id, last);
            assert!(out.is_empty());
            continue;
        }
        assert!(!out.is_empty(), "block {} has no successors", block.id);
        if let BlockKind::BinaryBranch { .. } = block.kind {
            let kinds: Vec<CfgEdgeKind> = out.iter().map(|(_, kind)| *kind).collect();
            assert_eq!(
                kinds,
                [CfgEdgeKind::ConditionalTrue, CfgEdgeKind::ConditionalFalse]
            );
        }
    }
}

#[test]
fn test_if_without_else() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let condition = f.boolean(true);
    let x = f.ident("x");
    let ten = f.int(10);
    let assign = f.assign(x, ten);
    let then_branch = f.expr_stmt(assign);
    let body = vec![f.if_stmt(condition, then_branch, None)];
    let procedure = f.method("C.M()", Vec::new(), body);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 3);
    assert!(matches!(
        cfg.entry_block().kind,
        BlockKind::BinaryBranch { .. }
    ));
    assert_eq!(rendered(&cfg, 0), ["true"]);
    assert_eq!(
        edges(&cfg, 0),
        [
            (1, CfgEdgeKind::ConditionalTrue),
            (2, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 1), ["10", "x = 10"]);
    assert_eq!(edges(&cfg, 1), [(2, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_logical_and_condition_is_split() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let a = f.ident("a");
    let b = f.ident("b");
    let condition = f.and(a, b);
    let then_branch = call(&mut f, "Work");
    let body = vec![f.if_stmt(condition, then_branch, None)];
    let procedure = f.method("C.M()", Vec::new(), body);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(rendered(&cfg, 0), ["a"]);
    assert_eq!(rendered(&cfg, 1), ["b"]);
    // a false skips b entirely
    assert_eq!(
        edges(&cfg, 0),
        [
            (1, CfgEdgeKind::ConditionalTrue),
            (3, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(
        edges(&cfg, 1),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (3, CfgEdgeKind::ConditionalFalse)
        ]
    );
    Ok(())
}

#[test]
fn test_coalesce_true_edge_evaluates_right() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let x = f.ident("x");
    let a = f.ident("a");
    let b = f.ident("b");
    let coalesce = f.coalesce(a, b);
    let assign = f.assign(x, coalesce);
    let body = vec![f.expr_stmt(assign)];
    let procedure = f.method("C.M()", Vec::new(), body);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(rendered(&cfg, 0), ["a"]);
    assert_eq!(rendered(&cfg, 1), ["b"]);
    assert_eq!(
        edges(&cfg, 0),
        [
            (1, CfgEdgeKind::ConditionalTrue),
            (2, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 2).len(), 2);
    Ok(())
}

#[test]
fn test_while_with_break() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let c = f.ident("c");
    let d = f.ident("d");
    let exit_loop = f.break_stmt();
    let guard = f.if_stmt(d, exit_loop, None);
    let work = call(&mut f, "Work");
    let body = f.block(vec![guard, work]);
    let statements = vec![f.while_stmt(c, body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 5);
    assert_eq!(rendered(&cfg, 0), ["c"]);
    assert!(matches!(
        cfg.block(NodeId::new(2)).map(|block| &block.kind),
        Some(BlockKind::Jump {
            kind: JumpKind::Break,
            ..
        })
    ));
    assert_eq!(edges(&cfg, 2), [(4, CfgEdgeKind::Unconditional)]);
    // end of the body loops back to the condition
    assert_eq!(rendered(&cfg, 3), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 3), [(0, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_continue_targets_loop_condition() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let c = f.ident("c");
    let d = f.ident("d");
    let next = f.continue_stmt();
    let guard = f.if_stmt(d, next, None);
    let work = call(&mut f, "Work");
    let body = f.block(vec![guard, work]);
    let statements = vec![f.while_stmt(c, body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert!(matches!(
        cfg.block(NodeId::new(2)).map(|block| &block.kind),
        Some(BlockKind::Jump {
            kind: JumpKind::Continue,
            ..
        })
    ));
    assert_eq!(edges(&cfg, 2), [(0, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_break_through_finally() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let c = f.ident("c");
    let exit_loop = f.break_stmt();
    let protected = f.block(vec![exit_loop]);
    let cleanup = call(&mut f, "Cleanup");
    let cleanup = f.block(vec![cleanup]);
    let guarded = f.try_stmt(protected, Vec::new(), Some(cleanup));
    let body = f.block(vec![guarded]);
    let statements = vec![f.while_stmt(c, body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(
        edges(&cfg, 1),
        [(3, CfgEdgeKind::Unconditional), (2, CfgEdgeKind::Finally)]
    );
    assert!(matches!(
        cfg.block(NodeId::new(2)).map(|block| &block.kind),
        Some(BlockKind::Branch { .. })
    ));
    assert_eq!(rendered(&cfg, 2), ["Cleanup", "Cleanup()"]);
    assert_eq!(
        edges(&cfg, 2),
        [(0, CfgEdgeKind::Unconditional), (3, CfgEdgeKind::Exception)]
    );
    Ok(())
}

#[test]
fn test_try_finally_continues_after_statement() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let work = call(&mut f, "Work");
    let protected = f.block(vec![work]);
    let cleanup = call(&mut f, "Cleanup");
    let cleanup = f.block(vec![cleanup]);
    let guarded = f.try_stmt(protected, Vec::new(), Some(cleanup));
    let after = call(&mut f, "After");
    let procedure = f.method("C.M()", Vec::new(), vec![guarded, after]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(rendered(&cfg, 0), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    assert_eq!(
        edges(&cfg, 1),
        [(2, CfgEdgeKind::Unconditional), (3, CfgEdgeKind::Exception)]
    );
    assert_eq!(rendered(&cfg, 2), ["After", "After()"]);
    Ok(())
}

#[test]
fn test_try_catch_routes_exceptions_to_catch_test() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let work = call(&mut f, "Work");
    let protected = f.block(vec![work]);
    let handle = call(&mut f, "Handle");
    let handler = f.block(vec![handle]);
    let catch = f.catch(Some("System.Exception"), Some("e"), None, handler);
    let guarded = f.try_stmt(protected, vec![catch], None);
    let after = call(&mut f, "After");
    let procedure = f.method("C.M()", Vec::new(), vec![guarded, after]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 6);
    assert!(matches!(cfg.entry_block().kind, BlockKind::Branch { .. }));
    assert!(cfg.entry_block().is_empty());
    assert_eq!(
        edges(&cfg, 0),
        [(1, CfgEdgeKind::Unconditional), (2, CfgEdgeKind::Exception)]
    );
    assert_eq!(rendered(&cfg, 1), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 1), [(4, CfgEdgeKind::Unconditional)]);
    // unmatched exceptions leave the procedure
    assert_eq!(
        edges(&cfg, 2),
        [
            (3, CfgEdgeKind::ConditionalTrue),
            (5, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 3), ["Handle", "Handle()"]);
    assert_eq!(edges(&cfg, 3), [(4, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 4), ["After", "After()"]);
    Ok(())
}

#[test]
fn test_catch_reachable_when_try_body_returns() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let callee = f.ident("Compute");
    let compute = f.invoke(callee, Vec::new());
    let leave = f.return_stmt(Some(compute));
    let protected = f.block(vec![leave]);
    let log = call(&mut f, "Log");
    let handler = f.block(vec![log]);
    let catch = f.catch(None, None, None, handler);
    let guarded = f.try_stmt(protected, vec![catch], None);
    let procedure = f.method("C.M()", Vec::new(), vec![guarded]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 5);
    assert_eq!(
        edges(&cfg, 0),
        [(1, CfgEdgeKind::Unconditional), (2, CfgEdgeKind::Exception)]
    );
    assert!(matches!(
        cfg.block(NodeId::new(1)).map(|block| &block.kind),
        Some(BlockKind::Jump {
            kind: JumpKind::Return,
            ..
        })
    ));
    assert_eq!(rendered(&cfg, 1), ["Compute", "Compute()"]);
    assert_eq!(rendered(&cfg, 3), ["Log", "Log()"]);
    assert_eq!(cfg.reachable_blocks().len(), cfg.block_count());
    assert!(cfg.reachable_blocks().contains(&NodeId::new(3)));
    Ok(())
}

#[test]
fn test_switch_sections() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let one = f.int(1);
    let case = f.case(one);
    let first = call(&mut f, "First");
    let first_break = f.break_stmt();
    let first_section = f.section(vec![case], vec![first, first_break]);
    let default = f.default_label();
    let other = call(&mut f, "Other");
    let other_break = f.break_stmt();
    let default_section = f.section(vec![default], vec![other, other_break]);
    let k = f.ident("k");
    let switch = f.switch_stmt(k, vec![first_section, default_section]);
    let procedure = f.method("C.M(int)", Vec::new(), vec![switch]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 5);
    assert_eq!(rendered(&cfg, 0), ["k"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    // no match falls to the default section
    assert_eq!(
        edges(&cfg, 1),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (3, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 2), ["First", "First()"]);
    assert_eq!(rendered(&cfg, 3), ["Other", "Other()"]);
    assert_eq!(edges(&cfg, 2), [(4, CfgEdgeKind::Unconditional)]);
    assert_eq!(edges(&cfg, 3), [(4, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_backward_goto_forms_loop() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let work = call(&mut f, "Work");
    let labeled = f.labeled("again", work);
    let jump = f.goto_label("again");
    let procedure = f.method("C.M()", Vec::new(), vec![labeled, jump]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 2);
    assert_eq!(edges(&cfg, 0), [(0, CfgEdgeKind::Unconditional)]);
    assert_eq!(cfg.entry_block().kind.jump_label(), Some("again"));
    // the exit is never reached
    assert_eq!(cfg.reachable_blocks(), [cfg.entry()]);
    Ok(())
}

#[test]
fn test_expression_body_returns() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let value = f.ident("value");
    let procedure = f.method_expr("C.Get()", Vec::new(), value);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 2);
    assert!(matches!(
        cfg.entry_block().kind,
        BlockKind::Jump {
            kind: JumpKind::Return,
            ..
        }
    ));
    assert_eq!(rendered(&cfg, 0), ["value"]);
    Ok(())
}

#[test]
fn test_jump_errors_name_the_procedure() {
    let mut f = SyntaxFactory::new();
    let body = vec![f.continue_stmt()];
    let stray = f.method("C.Stray()", Vec::new(), body);
    let body = vec![f.goto_label("missing")];
    let undeclared = f.method("C.Undeclared()", Vec::new(), body);

    match build(&stray) {
        Err(Error::Procedure { procedure, source }) => {
            assert_eq!(procedure, "C.Stray()");
            assert!(matches!(*source, Error::UnresolvedJump { .. }));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    match build(&undeclared) {
        Err(Error::Procedure { procedure, source }) => {
            assert_eq!(procedure, "C.Undeclared()");
            assert_eq!(*source, Error::UndeclaredLabel("missing".to_string()));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_build_is_deterministic() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let c = f.ident("c");
    let d = f.ident("d");
    let exit_loop = f.break_stmt();
    let guard = f.if_stmt(d, exit_loop, None);
    let work = call(&mut f, "Work");
    let body = f.block(vec![guard, work]);
    let statements = vec![f.while_stmt(c, body)];
    let procedure = f.method("C.M()", Vec::new(), statements);

    let first = build(&procedure)?.to_dot(None);
    let second = build(&procedure)?.to_dot(None);
    assert_eq!(first, second);

    let parsed = DotGraph::parse(&first)?;
    assert_eq!(parsed.nodes.len(), 5);
    assert_eq!(parsed.out_degree("B4"), 0);
    Ok(())
}

#[test]
fn test_cache_shares_graphs_across_threads() -> Result<()> {
    use rayon::prelude::*;
    use std::sync::Arc;

    let mut f = SyntaxFactory::new();
    let first = call(&mut f, "First");
    let one = f.method("C.One()", Vec::new(), vec![first]);
    let second = call(&mut f, "Second");
    let two = f.method("C.Two()", Vec::new(), vec![second]);
    let procedures = [one, two];
    let semantic = MemorySemanticModel::new();
    let cache = CfgCache::new();

    let graphs: Vec<_> = (0..16)
        .into_par_iter()
        .map(|index| cache.get_or_build(&procedures[index % 2], &semantic))
        .collect::<Result<_>>()?;

    assert_eq!(cache.build_count(), 2);
    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(&graphs[0], &graphs[2]));
    assert!(!Arc::ptr_eq(&graphs[0], &graphs[1]));
    Ok(())
}

#[test]
fn test_goto_case_jumps_to_matching_section() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let one = f.int(1);
    let first_label = f.case(one);
    let two = f.int(2);
    let jump = f.goto_case(two);
    let first = f.section(vec![first_label], vec![jump]);
    let two = f.int(2);
    let second_label = f.case(two);
    let work = call(&mut f, "Work");
    let done = f.break_stmt();
    let second = f.section(vec![second_label], vec![work, done]);
    let k = f.ident("k");
    let switch = f.switch_stmt(k, vec![first, second]);
    let procedure = f.method("C.M(int)", Vec::new(), vec![switch]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    let jump = cfg
        .blocks()
        .find(|block| {
            matches!(
                block.kind,
                BlockKind::Jump {
                    kind: JumpKind::GotoCase,
                    ..
                }
            )
        })
        .map(|block| block.id);
    let section = cfg
        .blocks()
        .find(|block| rendered(&cfg, block.id) == ["Work", "Work()"])
        .map(|block| block.id);
    assert!(jump.is_some() && section.is_some());
    assert_eq!(
        jump.map(|id| edges(&cfg, id)),
        section.map(|id| vec![(id, CfgEdgeKind::Unconditional)])
    );
    Ok(())
}

#[test]
fn test_goto_case_without_match_fails() {
    let mut f = SyntaxFactory::new();
    let one = f.int(1);
    let label = f.case(one);
    let three = f.int(3);
    let jump = f.goto_case(three);
    let section = f.section(vec![label], vec![jump]);
    let k = f.ident("k");
    let switch = f.switch_stmt(k, vec![section]);
    let procedure = f.method("C.M(int)", Vec::new(), vec![switch]);

    let error = build(&procedure).err().map(|error| error.root_cause().clone());
    assert_eq!(error, Some(Error::UnknownSwitchCase("3".to_string())));
}

#[test]
fn test_for_continue_targets_increment() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let zero = f.int(0);
    let counter = f.declarator("i", Some(zero));
    let i = f.ident("i");
    let n = f.ident("n");
    let condition = f.binary(BinaryOperator::Less, i, n);
    let i = f.ident("i");
    let step = f.unary(UnaryOperator::PostIncrement, i);
    let d = f.ident("d");
    let next = f.continue_stmt();
    let guard = f.if_stmt(d, next, None);
    let work = call(&mut f, "Work");
    let body = f.block(vec![guard, work]);
    let statements = vec![f.for_stmt(vec![counter], Vec::new(), Some(condition), vec![step], body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 7);
    assert!(matches!(
        cfg.entry_block().kind,
        BlockKind::ForInitializer(_)
    ));
    assert_eq!(rendered(&cfg, 0), ["0", "var i = 0"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 1), ["i", "n", "i < n"]);
    assert_eq!(
        edges(&cfg, 1),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (6, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert!(matches!(
        cfg.block(NodeId::new(3)).map(|block| &block.kind),
        Some(BlockKind::Jump {
            kind: JumpKind::Continue,
            ..
        })
    ));
    // continue and the end of the body both run the incrementor
    assert_eq!(edges(&cfg, 3), [(5, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 4), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 4), [(5, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 5), ["i", "i++"]);
    assert_eq!(edges(&cfg, 5), [(1, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_do_while_body_runs_first() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let work = call(&mut f, "Work");
    let body = f.block(vec![work]);
    let c = f.ident("c");
    let statements = vec![f.do_stmt(body, c)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 3);
    assert_eq!(rendered(&cfg, 0), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 1), ["c"]);
    assert_eq!(
        edges(&cfg, 1),
        [
            (0, CfgEdgeKind::ConditionalTrue),
            (2, CfgEdgeKind::ConditionalFalse)
        ]
    );
    Ok(())
}

#[test]
fn test_foreach_collection_producer() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let items = f.ident("items");
    let work = call(&mut f, "Work");
    let body = f.block(vec![work]);
    let statements = vec![f.foreach_stmt("item", items, body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert!(matches!(
        cfg.entry_block().kind,
        BlockKind::ForeachCollectionProducer(_)
    ));
    assert_eq!(rendered(&cfg, 0), ["items"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    // the "has next element" test carries no expression of its own
    assert!(rendered(&cfg, 1).is_empty());
    assert_eq!(
        edges(&cfg, 1),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (3, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 2), ["var item in items", "Work", "Work()"]);
    assert_eq!(edges(&cfg, 2), [(1, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_using_ends_with_disposal_block() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let callee = f.ident("Open");
    let open = f.invoke(callee, Vec::new());
    let resource = f.declarator("r", Some(open));
    let work = call(&mut f, "Work");
    let body = f.block(vec![work]);
    let statements = vec![f.using_stmt(vec![resource], None, body)];
    let declared = f.method("C.Declared()", Vec::new(), statements);

    let stream = f.ident("stream");
    let work = call(&mut f, "Work");
    let body = f.block(vec![work]);
    let statements = vec![f.using_stmt(Vec::new(), Some(stream), body)];
    let existing = f.method("C.Existing()", Vec::new(), statements);

    let cfg = build(&declared)?;
    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(rendered(&cfg, 0), ["Open", "Open()", "var r = Open()"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 1), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 1), [(2, CfgEdgeKind::Unconditional)]);
    assert_eq!(
        cfg.block(NodeId::new(2)).map(|block| block.kind.to_string()),
        Some("UsingEnd(r)".to_string())
    );
    assert_eq!(edges(&cfg, 2), [(3, CfgEdgeKind::Unconditional)]);

    let cfg = build(&existing)?;
    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(rendered(&cfg, 0), ["stream"]);
    assert_eq!(
        cfg.block(NodeId::new(2)).map(|block| block.kind.to_string()),
        Some("UsingEnd(stream)".to_string())
    );
    Ok(())
}

#[test]
fn test_lock_evaluates_gate_before_body() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let gate = f.ident("gate");
    let work = call(&mut f, "Work");
    let body = f.block(vec![work]);
    let statements = vec![f.lock_stmt(gate, body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 3);
    assert!(matches!(cfg.entry_block().kind, BlockKind::Lock(_)));
    assert_eq!(rendered(&cfg, 0), ["gate"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 1), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 1), [(2, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_fixed_declares_before_body() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let buffer = f.ident("buffer");
    let pinned = f.declarator("p", Some(buffer));
    let work = call(&mut f, "Work");
    let body = f.block(vec![work]);
    let statements = vec![f.fixed_stmt(vec![pinned], body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 3);
    assert_eq!(rendered(&cfg, 0), ["buffer", "var p = buffer"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 1), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 1), [(2, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_switch_pattern_case_with_guard() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let pattern = f.declaration_pattern("int", "n");
    let n = f.ident("n");
    let zero = f.int(0);
    let guard = f.binary(BinaryOperator::Greater, n, zero);
    let label = f.case_pattern(pattern, Some(guard));
    let positive = call(&mut f, "Positive");
    let done = f.break_stmt();
    let matched = f.section(vec![label], vec![positive, done]);
    let default = f.default_label();
    let other = call(&mut f, "Other");
    let done = f.break_stmt();
    let fallback = f.section(vec![default], vec![other, done]);
    let o = f.ident("o");
    let switch = f.switch_stmt(o, vec![matched, fallback]);
    let procedure = f.method("C.M(object)", Vec::new(), vec![switch]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 6);
    assert_eq!(rendered(&cfg, 0), ["o"]);
    assert_eq!(edges(&cfg, 0), [(1, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 1), ["case int n when n > 0:"]);
    assert_eq!(
        edges(&cfg, 1),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (4, CfgEdgeKind::ConditionalFalse)
        ]
    );
    // the guard is its own test, failing into the default section
    assert_eq!(rendered(&cfg, 2), ["n", "0", "n > 0"]);
    assert_eq!(
        edges(&cfg, 2),
        [
            (3, CfgEdgeKind::ConditionalTrue),
            (4, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 3), ["Positive", "Positive()"]);
    assert_eq!(edges(&cfg, 3), [(5, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 4), ["Other", "Other()"]);
    assert_eq!(edges(&cfg, 4), [(5, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_switch_expression_without_default_throws() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let one = f.int(1);
    let first = f.constant_pattern(one);
    let a = f.ident("a");
    let first = f.arm(first, None, a);
    let two = f.int(2);
    let second = f.constant_pattern(two);
    let b = f.ident("b");
    let second = f.arm(second, None, b);
    let k = f.ident("k");
    let switch = f.switch_expr(k, vec![first, second]);
    let r = f.ident("r");
    let assign = f.assign(r, switch);
    let body = vec![f.expr_stmt(assign)];
    let procedure = f.method("C.M(int)", Vec::new(), body);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 7);
    assert_eq!(rendered(&cfg, 0), ["k"]);
    assert_eq!(rendered(&cfg, 1), ["1", "1 =>"]);
    assert_eq!(
        edges(&cfg, 1),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (3, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 2), ["a"]);
    assert_eq!(edges(&cfg, 2), [(5, CfgEdgeKind::Unconditional)]);
    // no arm matched: the switch expression throws out of the procedure
    assert_eq!(rendered(&cfg, 3), ["2", "2 =>"]);
    assert_eq!(
        edges(&cfg, 3),
        [
            (4, CfgEdgeKind::ConditionalTrue),
            (6, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(edges(&cfg, 4), [(5, CfgEdgeKind::Unconditional)]);
    assert_eq!(
        rendered(&cfg, 5),
        ["k switch { 1 => a, 2 => b }", "r = k switch { 1 => a, 2 => b }"]
    );
    Ok(())
}

#[test]
fn test_conditional_value_converges() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let c = f.ident("c");
    let a = f.ident("a");
    let b = f.ident("b");
    let choice = f.conditional(c, a, b);
    let x = f.ident("x");
    let assign = f.assign(x, choice);
    let body = vec![f.expr_stmt(assign)];
    let procedure = f.method("C.M()", Vec::new(), body);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 5);
    assert_eq!(rendered(&cfg, 0), ["c"]);
    assert_eq!(
        edges(&cfg, 0),
        [
            (1, CfgEdgeKind::ConditionalTrue),
            (2, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 1), ["a"]);
    assert_eq!(rendered(&cfg, 2), ["b"]);
    assert_eq!(edges(&cfg, 1), [(3, CfgEdgeKind::Unconditional)]);
    assert_eq!(edges(&cfg, 2), [(3, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 3), ["c ? a : b", "x = c ? a : b"]);
    Ok(())
}

#[test]
fn test_conditional_access_value_skips_access_on_null() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let user = f.ident("user");
    let name = f.member_binding("Name");
    let access = f.conditional_access(user, name);
    let x = f.ident("x");
    let assign = f.assign(x, access);
    let body = vec![f.expr_stmt(assign)];
    let procedure = f.method("C.M()", Vec::new(), body);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(rendered(&cfg, 0), ["user"]);
    // true means the receiver is null
    assert_eq!(
        edges(&cfg, 0),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (1, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 1), [".Name"]);
    assert_eq!(edges(&cfg, 1), [(2, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 2), ["user?.Name", "x = user?.Name"]);
    Ok(())
}

#[test]
fn test_coalesce_assignment_only_assigns_on_null() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let x = f.ident("x");
    let y = f.ident("y");
    let assign = f.coalesce_assign(x, y);
    let body = vec![f.expr_stmt(assign)];
    let procedure = f.method("C.M()", Vec::new(), body);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 3);
    assert_eq!(rendered(&cfg, 0), ["x"]);
    assert_eq!(
        edges(&cfg, 0),
        [
            (1, CfgEdgeKind::ConditionalTrue),
            (2, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 1), ["y", "x ??= y"]);
    assert_eq!(edges(&cfg, 1), [(2, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_yield_return_continues_and_yield_break_exits() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let a = f.ident("a");
    let first = f.yield_return(a);
    let d = f.ident("d");
    let stop = f.yield_break();
    let guard = f.if_stmt(d, stop, None);
    let b = f.ident("b");
    let last = f.yield_return(b);
    let procedure = f.method("C.Items()", Vec::new(), vec![first, guard, last]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(rendered(&cfg, 0), ["a", "d"]);
    assert_eq!(
        edges(&cfg, 0),
        [
            (1, CfgEdgeKind::ConditionalTrue),
            (2, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert!(matches!(
        cfg.block(NodeId::new(1)).map(|block| &block.kind),
        Some(BlockKind::Jump {
            kind: JumpKind::YieldBreak,
            ..
        })
    ));
    assert_eq!(edges(&cfg, 1), [(3, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 2), ["b"]);
    assert_eq!(edges(&cfg, 2), [(3, CfgEdgeKind::Unconditional)]);
    Ok(())
}

#[test]
fn test_forward_goto_skips_statements() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let jump = f.goto_label("done");
    let skipped = call(&mut f, "Skipped");
    let work = call(&mut f, "Work");
    let labeled = f.labeled("done", work);
    let procedure = f.method("C.M()", Vec::new(), vec![jump, skipped, labeled]);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 4);
    assert_eq!(cfg.entry_block().kind.jump_label(), Some("done"));
    assert_eq!(edges(&cfg, 0), [(2, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 1), ["Skipped", "Skipped()"]);
    assert_eq!(rendered(&cfg, 2), ["Work", "Work()"]);
    assert_eq!(
        cfg.reachable_blocks(),
        [NodeId::new(0), NodeId::new(2), NodeId::new(3)]
    );
    Ok(())
}

#[test]
fn test_break_leaves_innermost_loop_only() -> Result<()> {
    let mut f = SyntaxFactory::new();
    let b = f.ident("b");
    let exit_inner = f.break_stmt();
    let inner_body = f.block(vec![exit_inner]);
    let inner = f.while_stmt(b, inner_body);
    let work = call(&mut f, "Work");
    let outer_body = f.block(vec![inner, work]);
    let a = f.ident("a");
    let statements = vec![f.while_stmt(a, outer_body)];
    let procedure = f.method("C.M()", Vec::new(), statements);
    let cfg = build(&procedure)?;

    assert_well_formed(&cfg);
    assert_eq!(cfg.block_count(), 5);
    assert_eq!(rendered(&cfg, 0), ["a"]);
    assert_eq!(
        edges(&cfg, 0),
        [
            (1, CfgEdgeKind::ConditionalTrue),
            (4, CfgEdgeKind::ConditionalFalse)
        ]
    );
    assert_eq!(rendered(&cfg, 1), ["b"]);
    assert_eq!(
        edges(&cfg, 1),
        [
            (2, CfgEdgeKind::ConditionalTrue),
            (3, CfgEdgeKind::ConditionalFalse)
        ]
    );
    // the break resumes the outer body, not the statement after the outer loop
    assert_eq!(edges(&cfg, 2), [(3, CfgEdgeKind::Unconditional)]);
    assert_eq!(rendered(&cfg, 3), ["Work", "Work()"]);
    assert_eq!(edges(&cfg, 3), [(0, CfgEdgeKind::Unconditional)]);
    Ok(())
}
