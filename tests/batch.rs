//! Batch processing integration tests.
//!
//! Verifies ordering, per-procedure failure isolation, nested procedure expansion and
//! cancellation of `analyze_procedures`, in both sequential and parallel mode.

use std::sync::{atomic::AtomicBool, Arc};

use flowscope::{
    analysis::{analyze_procedures, BatchOptions, CfgCache, ProcedureReport},
    semantic::{MemorySemanticModel, NoEntryPoints},
    syntax::{Procedure, SyntaxFactory},
    Error,
};

/// `count` procedures; every third one contains a stray `break`.
fn corpus(count: usize) -> Vec<Procedure> {
    let mut f = SyntaxFactory::new();
    (0..count)
        .map(|index| {
            let body = if index % 3 == 2 {
                vec![f.break_stmt()]
            } else {
                let x = f.ident("x");
                let value = f.int(i64::try_from(index).unwrap_or_default());
                let assign = f.assign(x, value);
                vec![f.expr_stmt(assign)]
            };
            f.method(&format!("App.C.M{index}()"), Vec::new(), body)
        })
        .collect()
}

fn names(reports: &[ProcedureReport<'_>]) -> Vec<String> {
    reports.iter().map(|report| report.name.clone()).collect()
}

#[test]
fn test_failures_are_isolated() {
    let procedures = corpus(9);
    let semantic = MemorySemanticModel::new();
    let cache = CfgCache::new();

    let reports = analyze_procedures(
        &procedures,
        &semantic,
        &NoEntryPoints,
        &cache,
        &BatchOptions::default().with_parallel(false),
    );

    assert_eq!(reports.len(), 9);
    for (index, report) in reports.iter().enumerate() {
        assert_eq!(report.id, procedures[index].id);
        if index % 3 == 2 {
            assert!(matches!(
                &report.result,
                Err(Error::Procedure { procedure, .. }) if *procedure == report.name
            ));
            assert!(report.ucfg().is_none());
        } else {
            let ucfg = report.ucfg().map(|ucfg| ucfg.instruction_count());
            assert_eq!(ucfg, Some(1));
        }
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let procedures = corpus(32);
    let semantic = MemorySemanticModel::new();

    let sequential_cache = CfgCache::new();
    let sequential = analyze_procedures(
        &procedures,
        &semantic,
        &NoEntryPoints,
        &sequential_cache,
        &BatchOptions::default().with_parallel(false),
    );
    let parallel_cache = CfgCache::new();
    let parallel = analyze_procedures(
        &procedures,
        &semantic,
        &NoEntryPoints,
        &parallel_cache,
        &BatchOptions::default(),
    );

    assert_eq!(names(&sequential), names(&parallel));
    for (left, right) in sequential.iter().zip(&parallel) {
        assert_eq!(left.ucfg(), right.ucfg());
        assert_eq!(left.is_ok(), right.is_ok());
    }
    assert_eq!(parallel_cache.build_count(), 32);
}

#[test]
fn test_second_run_reuses_cache() {
    let procedures = corpus(6);
    let semantic = MemorySemanticModel::new();
    let cache = CfgCache::new();
    let options = BatchOptions::default();

    let first = analyze_procedures(&procedures, &semantic, &NoEntryPoints, &cache, &options);
    let second = analyze_procedures(&procedures, &semantic, &NoEntryPoints, &cache, &options);

    assert_eq!(cache.build_count(), 6);
    for (left, right) in first.iter().zip(&second) {
        if let (Ok((a, _)), Ok((b, _))) = (&left.result, &right.result) {
            assert!(Arc::ptr_eq(a, b));
        }
    }
}

#[test]
fn test_nested_lambda_follows_its_parent() {
    let mut f = SyntaxFactory::new();
    let inner = f.break_stmt();
    let lambda = f.lambda("App.C.Outer.<lambda>", Vec::new(), vec![inner]);
    let handler = f.local("handler", Some(lambda));
    let outer = f.method("App.C.Outer()", Vec::new(), vec![handler]);
    let last = f.method("App.C.Last()", Vec::new(), Vec::new());
    let procedures = vec![outer, last];
    let semantic = MemorySemanticModel::new();
    let cache = CfgCache::new();

    let reports = analyze_procedures(
        &procedures,
        &semantic,
        &NoEntryPoints,
        &cache,
        &BatchOptions::default(),
    );

    assert_eq!(
        names(&reports),
        ["App.C.Outer()", "App.C.Outer.<lambda>", "App.C.Last()"]
    );
    // a broken lambda does not break the procedure declaring it
    assert!(reports[0].is_ok());
    assert!(!reports[1].is_ok());
    assert!(reports[2].is_ok());
}

#[test]
fn test_cancelled_run_builds_nothing() {
    let procedures = corpus(4);
    let semantic = MemorySemanticModel::new();
    let cache = CfgCache::new();
    let flag = Arc::new(AtomicBool::new(true));

    let reports = analyze_procedures(
        &procedures,
        &semantic,
        &NoEntryPoints,
        &cache,
        &BatchOptions::default().with_cancel_flag(flag),
    );

    assert_eq!(reports.len(), 4);
    assert!(reports
        .iter()
        .all(|report| matches!(report.result, Err(Error::Cancelled))));
    assert_eq!(cache.build_count(), 0);
}
