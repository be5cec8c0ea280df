//! Lowering of a finished [`ControlFlowGraph`] into a [`Ucfg`].

use log::debug;

use crate::{
    analysis::{
        cfg::{BasicBlock, BlockKind, ControlFlowGraph, JumpKind, JumpNode},
        ucfg::{
            function::{Terminator, Ucfg, UcfgBlock},
            instruction::{Expression, Instruction, PseudoOp},
            lowering::Lowering,
            naming,
        },
    },
    semantic::{
        EntryPointClassifier, MethodSymbol, NoEntryPoints, SemanticModel, Symbol, TypeSymbol,
    },
    syntax::{Procedure, StmtKind},
    utils::graph::NodeId,
};

/// Configuration of the lowering.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::UcfgOptions;
///
/// let options = UcfgOptions::default()
///     .with_track_entry_points(false)
///     .with_string_type("App.SafeString");
/// assert!(!options.track_entry_points);
/// assert_eq!(options.string_type_names.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UcfgOptions {
    /// Emit the `__entrypoint` / `__annotate` prologue for trust boundaries
    pub track_entry_points: bool,
    /// Types treated as strings for `__concat` and entry-point parameter selection
    pub string_type_names: Vec<String>,
}

impl Default for UcfgOptions {
    fn default() -> Self {
        Self {
            track_entry_points: true,
            string_type_names: vec!["string".to_string(), "System.String".to_string()],
        }
    }
}

impl UcfgOptions {
    /// Returns these options with entry-point tracking switched on or off.
    #[must_use]
    pub fn with_track_entry_points(mut self, track: bool) -> Self {
        self.track_entry_points = track;
        self
    }

    /// Returns these options with one more string-like type.
    #[must_use]
    pub fn with_string_type(mut self, type_name: &str) -> Self {
        self.string_type_names.push(type_name.to_string());
        self
    }

    /// Whether `ty` is, or derives from, one of the string-like types.
    #[must_use]
    pub fn is_string_like(&self, semantic: &dyn SemanticModel, ty: &TypeSymbol) -> bool {
        self.string_type_names
            .iter()
            .any(|known| semantic.is_subtype_of(ty, known))
    }
}

/// Lowers control flow graphs into UCFGs.
///
/// The builder is stateless between calls; every [`UcfgBuilder::build`] starts a fresh
/// temporary counter, so the same graph always lowers to the same UCFG.
///
/// # Examples
///
/// ```rust
/// use flowscope::{
///     analysis::{ControlFlowGraph, UcfgBuilder},
///     semantic::{MemorySemanticModel, MethodSymbol, Symbol},
///     syntax::SyntaxFactory,
/// };
///
/// let mut f = SyntaxFactory::new();
/// let a = f.ident("a");
/// let callee = f.member(a, "ToLower");
/// let call = f.invoke(callee, Vec::new());
/// let call_id = call.id;
/// let body = vec![f.expr_stmt(call)];
/// let procedure = f.method("C.M()", Vec::new(), body);
///
/// let mut semantic = MemorySemanticModel::new();
/// semantic.bind(call_id, Symbol::Method(MethodSymbol::new("Type", "ToLower", Vec::new())));
///
/// let cfg = ControlFlowGraph::build(&procedure, &semantic)?;
/// let ucfg = UcfgBuilder::new(&semantic).build(&cfg);
/// let lowered: Vec<String> = ucfg.instructions().map(ToString::to_string).collect();
/// assert_eq!(lowered, ["%0 := Type.ToLower() [ a ]"]);
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct UcfgBuilder<'m> {
    semantic: &'m dyn SemanticModel,
    classifier: &'m dyn EntryPointClassifier,
    options: UcfgOptions,
}

impl<'m> UcfgBuilder<'m> {
    /// Creates a builder with default options and no entry points.
    #[must_use]
    pub fn new(semantic: &'m dyn SemanticModel) -> Self {
        Self {
            semantic,
            classifier: &NoEntryPoints,
            options: UcfgOptions::default(),
        }
    }

    /// Uses `classifier` to detect trust boundaries and parameter annotations.
    #[must_use]
    pub fn with_classifier(mut self, classifier: &'m dyn EntryPointClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: UcfgOptions) -> Self {
        self.options = options;
        self
    }

    /// The active options.
    #[must_use]
    pub fn options(&self) -> &UcfgOptions {
        &self.options
    }

    /// Lowers `cfg`. Never fails; anything unresolved degrades to `const` or `__unknown`.
    #[must_use]
    pub fn build(&self, cfg: &ControlFlowGraph<'_>) -> Ucfg {
        let procedure = cfg.procedure();
        let symbol = self.semantic.symbol(procedure.id);
        let method = match symbol.as_deref() {
            Some(Symbol::Method(method)) => Some(method),
            _ => None,
        };

        let mut lowering = Lowering::new(self.semantic, &self.options);
        for block in cfg.blocks() {
            lowering.prepare(block);
        }

        let mut prologue = match method {
            Some(method) if self.options.track_entry_points => {
                self.entry_point(method, procedure, &mut lowering)
            }
            _ => Vec::new(),
        };
        let entry_point_len = prologue.len();

        let mut blocks = Vec::with_capacity(cfg.block_count());
        for block in cfg.blocks() {
            for node in &block.instructions {
                lowering.lower_node(*node);
            }
            let terminator = Self::terminator(cfg, block, &mut lowering);

            let mut instructions = lowering.take_instructions();
            if NodeId::new(block.id) == cfg.entry() && !prologue.is_empty() {
                prologue.append(&mut instructions);
                instructions = std::mem::take(&mut prologue);
            }
            blocks.push(UcfgBlock::new(block.id, instructions, terminator));
        }

        let method_id = method.map_or_else(|| procedure.name.clone(), naming::method_id);
        debug!(
            "lowered {}: {} blocks, {} temporaries",
            method_id,
            blocks.len(),
            lowering.temporaries()
        );

        let parameters = procedure
            .parameters
            .iter()
            .map(|parameter| parameter.name.clone())
            .collect();
        Ucfg::new(
            method_id,
            parameters,
            blocks,
            cfg.entry().index(),
            entry_point_len,
        )
    }

    /// `%0 := __entrypoint [ strings ]`, then one `__annotate` / `__annotation` pair per
    /// parameter annotation.
    fn entry_point<'a>(
        &self,
        method: &MethodSymbol,
        procedure: &Procedure,
        lowering: &mut Lowering<'a, '_>,
    ) -> Vec<Instruction> {
        let parameters: Vec<_> = procedure
            .parameters
            .iter()
            .enumerate()
            .filter_map(|(index, parameter)| {
                method
                    .parameters
                    .get(index)
                    .map(|symbol| (parameter.name.as_str(), symbol))
            })
            .collect();

        if self.classifier.is_trust_boundary(method) {
            let untrusted = parameters
                .iter()
                .filter(|(_, symbol)| {
                    self.options
                        .is_string_like(self.semantic, &TypeSymbol::new(&symbol.type_name))
                })
                .map(|(name, _)| Expression::variable(name))
                .collect();
            let target = lowering.fresh();
            lowering.emit(Instruction::pseudo(target, PseudoOp::EntryPoint, untrusted));
        }

        for (name, symbol) in parameters {
            for annotation in self.classifier.parameter_annotations(symbol) {
                let annotated = lowering.fresh();
                lowering.emit(Instruction::pseudo(
                    annotated.clone(),
                    PseudoOp::Annotate,
                    vec![Expression::Constant(Some(annotation)), Expression::variable(name)],
                ));
                lowering.emit(Instruction::pseudo(
                    Expression::variable(name),
                    PseudoOp::Annotation,
                    vec![annotated],
                ));
            }
        }

        lowering.take_instructions()
    }

    /// Returns go straight to the exit as `ret`; everything else jumps to its successors.
    fn terminator<'a>(
        cfg: &ControlFlowGraph<'a>,
        block: &BasicBlock<'a>,
        lowering: &mut Lowering<'a, '_>,
    ) -> Terminator {
        if block.is_exit() {
            return Terminator::Ret(Expression::constant());
        }

        let successors: Vec<usize> = cfg
            .successors(NodeId::new(block.id))
            .map(NodeId::index)
            .collect();

        if let BlockKind::Jump {
            kind: JumpKind::Return,
            node,
        } = &block.kind
        {
            if successors.as_slice() == [cfg.exit().index()] {
                let value = match *node {
                    JumpNode::Statement(statement) => match &statement.kind {
                        StmtKind::Return(Some(value)) => lowering.lower(value),
                        _ => Expression::constant(),
                    },
                    JumpNode::Expression(body) => lowering.lower(body),
                };
                return Terminator::Ret(value);
            }
        }

        Terminator::Jump(successors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{semantic::MemorySemanticModel, syntax::SyntaxFactory};

    #[test]
    fn test_empty_procedure_returns_const() {
        let mut f = SyntaxFactory::new();
        let procedure = f.method("C.M()", Vec::new(), Vec::new());
        let semantic = MemorySemanticModel::new();

        let cfg = ControlFlowGraph::build(&procedure, &semantic).unwrap();
        let ucfg = UcfgBuilder::new(&semantic).build(&cfg);

        assert_eq!(ucfg.method_id(), "C.M()");
        assert_eq!(ucfg.blocks().len(), 1);
        assert_eq!(ucfg.blocks()[0].terminator, Terminator::Ret(Expression::constant()));
        assert!(!ucfg.is_entry_point());
    }

    #[test]
    fn test_return_value_terminates_block() {
        let mut f = SyntaxFactory::new();
        let s = f.ident("s");
        let body = vec![f.return_stmt(Some(s))];
        let parameter = f.param("s");
        let procedure = f.method("C.Echo(string)", vec![parameter], body);
        let semantic = MemorySemanticModel::new();

        let cfg = ControlFlowGraph::build(&procedure, &semantic).unwrap();
        let ucfg = UcfgBuilder::new(&semantic).build(&cfg);

        let entry = ucfg.entry_block().unwrap();
        assert!(entry.instructions.is_empty());
        assert_eq!(entry.terminator, Terminator::Ret(Expression::variable("s")));
        assert_eq!(ucfg.parameters(), ["s".to_string()]);
    }

    #[test]
    fn test_options_string_like() {
        let mut semantic = MemorySemanticModel::new();
        semantic.add_subtype("App.Html", "System.String");
        let options = UcfgOptions::default();

        assert!(options.is_string_like(&semantic, &TypeSymbol::new("string")));
        assert!(options.is_string_like(&semantic, &TypeSymbol::new("App.Html")));
        assert!(!options.is_string_like(&semantic, &TypeSymbol::new("int")));
    }
}
