//! Map-backed [`SemanticModel`].

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    semantic::{SemanticModel, Symbol, TypeSymbol},
    syntax::{Literal, SyntaxId},
};

/// A [`SemanticModel`] whose answers are registered up front.
///
/// Nodes that were never bound resolve to `None`. Subtype relations are registered per pair
/// and followed transitively.
///
/// # Examples
///
/// ```rust
/// use flowscope::semantic::{MemorySemanticModel, SemanticModel, TypeSymbol};
/// use flowscope::syntax::SyntaxFactory;
///
/// let mut f = SyntaxFactory::new();
/// let name = f.ident("s");
///
/// let mut model = MemorySemanticModel::new();
/// model.bind_type(name.id, "System.String");
/// assert_eq!(model.type_of(name.id), Some(TypeSymbol::new("System.String")));
/// ```
#[derive(Debug, Default)]
pub struct MemorySemanticModel {
    symbols: HashMap<SyntaxId, Arc<Symbol>>,
    types: HashMap<SyntaxId, TypeSymbol>,
    constants: HashMap<SyntaxId, Literal>,
    supertypes: HashMap<String, HashSet<String>>,
}

impl MemorySemanticModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `node` to `symbol`, replacing any previous binding.
    pub fn bind(&mut self, node: SyntaxId, symbol: Symbol) -> &mut Self {
        self.symbols.insert(node, Arc::new(symbol));
        self
    }

    /// Binds `node` to an already shared symbol.
    pub fn bind_shared(&mut self, node: SyntaxId, symbol: Arc<Symbol>) -> &mut Self {
        self.symbols.insert(node, symbol);
        self
    }

    /// Records the static type of `node`.
    pub fn bind_type(&mut self, node: SyntaxId, type_name: &str) -> &mut Self {
        self.types.insert(node, TypeSymbol::new(type_name));
        self
    }

    /// Records the constant value of `node`.
    pub fn bind_constant(&mut self, node: SyntaxId, value: Literal) -> &mut Self {
        self.constants.insert(node, value);
        self
    }

    /// Records that `subtype` directly derives from `supertype`.
    pub fn add_subtype(&mut self, subtype: &str, supertype: &str) -> &mut Self {
        self.supertypes
            .entry(subtype.to_string())
            .or_default()
            .insert(supertype.to_string());
        self
    }

    /// Number of nodes with a bound symbol.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

impl SemanticModel for MemorySemanticModel {
    fn symbol(&self, node: SyntaxId) -> Option<Arc<Symbol>> {
        self.symbols.get(&node).cloned()
    }

    fn type_of(&self, node: SyntaxId) -> Option<TypeSymbol> {
        self.types.get(&node).cloned()
    }

    fn constant_value(&self, node: SyntaxId) -> Option<Literal> {
        self.constants.get(&node).cloned()
    }

    fn is_subtype_of(&self, ty: &TypeSymbol, known: &str) -> bool {
        let mut pending = vec![ty.name.as_str()];
        let mut seen = HashSet::new();

        while let Some(current) = pending.pop() {
            if current == known {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(parents) = self.supertypes.get(current) {
                pending.extend(parents.iter().map(String::as_str));
            }
        }
        false
    }
}
