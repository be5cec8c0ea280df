//! Corpus processing with per-procedure failure isolation.
//!
//! [`analyze_procedures`] builds the control flow graph and the UCFG of every procedure it is
//! given, and of every lambda and local function nested inside them. Each procedure gets its
//! own [`ProcedureReport`]; a procedure whose graph cannot be built is reported as an error
//! and does not affect the others.
//!
//! Procedures are independent, so they are processed in parallel with `rayon` unless
//! [`BatchOptions::parallel`] is switched off. A cancellation flag is checked before each
//! procedure starts; a procedure that has started always runs to completion.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::warn;
use rayon::prelude::*;

use crate::{
    analysis::{
        cfg::{CfgCache, ControlFlowGraph},
        ucfg::{Ucfg, UcfgBuilder, UcfgOptions},
    },
    semantic::{EntryPointClassifier, SemanticModel},
    syntax::{Procedure, SyntaxId},
    Error, Result,
};

/// Configuration of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Process procedures on the `rayon` thread pool
    pub parallel: bool,
    /// Also analyze lambdas and local functions declared inside the procedures
    pub include_nested: bool,
    /// Lowering options
    pub ucfg: UcfgOptions,
    /// Checked before each procedure; once set, remaining procedures report
    /// [`Error::Cancelled`]
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            include_nested: true,
            ucfg: UcfgOptions::default(),
            cancel: None,
        }
    }
}

impl BatchOptions {
    /// Returns these options with parallel processing switched on or off.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns these options with nested procedures included or skipped.
    #[must_use]
    pub fn with_nested(mut self, include_nested: bool) -> Self {
        self.include_nested = include_nested;
        self
    }

    /// Returns these options observing `flag` for cancellation.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Outcome for one procedure.
#[derive(Debug)]
pub struct ProcedureReport<'a> {
    /// Qualified name of the procedure
    pub name: String,
    /// Node id of the procedure
    pub id: SyntaxId,
    /// Both graphs, or the reason they could not be built
    pub result: Result<(Arc<ControlFlowGraph<'a>>, Ucfg)>,
}

impl ProcedureReport<'_> {
    /// `true` if both graphs were built.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The lowered graph, if the build succeeded.
    #[must_use]
    pub fn ucfg(&self) -> Option<&Ucfg> {
        self.result.as_ref().ok().map(|(_, ucfg)| ucfg)
    }
}

/// Builds graphs for `procedures` and their nested procedures.
///
/// Reports are returned in input order, each top-level procedure followed by its nested
/// procedures. Graphs are taken from `cache` when already built and inserted into it
/// otherwise.
///
/// # Examples
///
/// ```rust
/// use flowscope::{
///     analysis::{analyze_procedures, BatchOptions, CfgCache},
///     semantic::{MemorySemanticModel, NoEntryPoints},
///     syntax::SyntaxFactory,
/// };
///
/// let mut f = SyntaxFactory::new();
/// let good = f.method("C.Good()", Vec::new(), Vec::new());
/// let body = vec![f.goto_label("nowhere")];
/// let bad = f.method("C.Bad()", Vec::new(), body);
/// let procedures = vec![good, bad];
///
/// let semantic = MemorySemanticModel::new();
/// let cache = CfgCache::new();
/// let reports = analyze_procedures(
///     &procedures,
///     &semantic,
///     &NoEntryPoints,
///     &cache,
///     &BatchOptions::default(),
/// );
///
/// assert!(reports[0].is_ok());
/// assert!(!reports[1].is_ok());
/// ```
pub fn analyze_procedures<'a>(
    procedures: &'a [Procedure],
    semantic: &dyn SemanticModel,
    classifier: &dyn EntryPointClassifier,
    cache: &CfgCache<'a>,
    options: &BatchOptions,
) -> Vec<ProcedureReport<'a>> {
    let units: Vec<&'a Procedure> = procedures
        .iter()
        .flat_map(|procedure| {
            let mut units = vec![procedure];
            if options.include_nested {
                units.extend(procedure.nested());
            }
            units
        })
        .collect();

    let lowering = UcfgBuilder::new(semantic)
        .with_classifier(classifier)
        .with_options(options.ucfg.clone());
    let analyze = |procedure: &'a Procedure| {
        let result = if options.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            cache
                .get_or_build(procedure, semantic)
                .map(|cfg| {
                    let ucfg = lowering.build(&cfg);
                    (cfg, ucfg)
                })
        };
        if let Err(error) = &result {
            if !matches!(error, Error::Cancelled) {
                warn!("skipping {}: {error}", procedure.name);
            }
        }
        ProcedureReport {
            name: procedure.name.clone(),
            id: procedure.id,
            result,
        }
    };

    if options.parallel {
        units.into_par_iter().map(analyze).collect()
    } else {
        units.into_iter().map(analyze).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{semantic::{MemorySemanticModel, NoEntryPoints}, syntax::SyntaxFactory};

    #[test]
    fn test_nested_procedures_are_reported() {
        let mut f = SyntaxFactory::new();
        let lambda = f.lambda("C.M.<lambda>", Vec::new(), Vec::new());
        let handler = f.local("handler", Some(lambda));
        let procedure = f.method("C.M()", Vec::new(), vec![handler]);
        let procedures = vec![procedure];
        let semantic = MemorySemanticModel::new();
        let cache = CfgCache::new();

        let options = BatchOptions::default().with_parallel(false);
        let reports = analyze_procedures(&procedures, &semantic, &NoEntryPoints, &cache, &options);
        let names: Vec<&str> = reports.iter().map(|report| report.name.as_str()).collect();
        assert_eq!(names, ["C.M()", "C.M.<lambda>"]);
        assert!(reports.iter().all(ProcedureReport::is_ok));
        assert_eq!(cache.build_count(), 2);

        let top_level = analyze_procedures(
            &procedures,
            &semantic,
            &NoEntryPoints,
            &cache,
            &options.with_nested(false),
        );
        assert_eq!(top_level.len(), 1);
        assert_eq!(cache.build_count(), 2);
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut f = SyntaxFactory::new();
        let procedures = vec![f.method("C.M()", Vec::new(), Vec::new())];
        let semantic = MemorySemanticModel::new();
        let cache = CfgCache::new();

        let flag = Arc::new(AtomicBool::new(true));
        let options = BatchOptions::default().with_cancel_flag(flag);
        let reports = analyze_procedures(&procedures, &semantic, &NoEntryPoints, &cache, &options);

        assert!(matches!(reports[0].result, Err(Error::Cancelled)));
        assert!(cache.is_empty());
    }
}
