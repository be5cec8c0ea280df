//! Method identifiers and temporary names.
//!
//! Every call in a UCFG names its callee by a stable textual id built from the resolved
//! symbol:
//!
//! | Symbol | Id |
//! |--------|----|
//! | Method | `Namespace.Type.Name(param types)` |
//! | Constructor | `Namespace.Type.Type(param types)` |
//! | Property getter / setter | `Namespace.Type.Property.get` / `.set` |

use crate::{
    analysis::ucfg::instruction::Expression,
    semantic::{MethodSymbol, PropertySymbol},
};

/// The two accessors of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// `get`
    Get,
    /// `set`
    Set,
}

/// Hands out `%0, %1, ...` in allocation order.
#[derive(Debug, Default)]
pub struct TempAllocator {
    next: usize,
}

impl TempAllocator {
    /// Creates an allocator starting at `%0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next temporary.
    pub fn fresh(&mut self) -> Expression {
        let name = format!("%{}", self.next);
        self.next += 1;
        Expression::Variable(name)
    }

    /// Number of temporaries allocated so far.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.next
    }
}

/// Last segment of a qualified type name, without generic arity.
fn simple_type_name(qualified: &str) -> &str {
    let name = qualified.rsplit('.').next().unwrap_or(qualified);
    name.split('`').next().unwrap_or(name)
}

/// Id of a method or constructor.
#[must_use]
pub fn method_id(method: &MethodSymbol) -> String {
    let parameters = method
        .parameters
        .iter()
        .map(|parameter| parameter.type_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let name = if method.is_constructor() {
        simple_type_name(&method.containing_type)
    } else {
        method.name.as_str()
    };
    format!("{}.{name}({parameters})", method.containing_type)
}

/// Id of a property accessor.
#[must_use]
pub fn accessor_id(property: &PropertySymbol, accessor: Accessor) -> String {
    let suffix = match accessor {
        Accessor::Get => "get",
        Accessor::Set => "set",
    };
    format!("{}.{}.{suffix}", property.containing_type, property.name)
}
