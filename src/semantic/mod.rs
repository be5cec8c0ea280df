//! Semantic facts consumed by graph construction and lowering.
//!
//! Neither the CFG builder nor the UCFG lowering performs name resolution. They ask a
//! [`SemanticModel`] for the symbol, static type or constant value behind a [`SyntaxId`] and
//! degrade gracefully when it has no answer: unresolved invocations become `__unknown` calls,
//! unresolved member reads keep their receiver's provenance, and anything else collapses to a
//! constant.
//!
//! # Key Components
//!
//! - [`Symbol`] - Resolved declaration behind a node (local, parameter, field, property,
//!   method, type, namespace)
//! - [`MemberFlags`] - Static/extension/indexer/... modifiers shared by member symbols
//! - [`SemanticModel`] - The resolver interface
//! - [`EntryPointClassifier`] - Decides which procedures receive untrusted input
//! - [`MemorySemanticModel`] - A map-backed resolver, used by tests and simple front ends
//!
//! # Thread Safety
//!
//! Resolvers are shared by reference across the worker threads of a batch run and must be
//! `Send + Sync`.

mod memory;

pub use memory::MemorySemanticModel;

use std::{collections::HashSet, fmt, sync::Arc};

use bitflags::bitflags;

use crate::syntax::{Literal, RefKind, SyntaxId};

bitflags! {
    /// Modifiers of member symbols.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u16 {
        /// Member is `static`
        const STATIC = 0x0001;
        /// Method is an extension method; its first parameter is the receiver
        const EXTENSION = 0x0002;
        /// Property is an indexer (`this[...]`)
        const INDEXER = 0x0004;
        /// Method is an instance or static constructor
        const CONSTRUCTOR = 0x0008;
        /// Method is a user-defined operator
        const OPERATOR = 0x0010;
        /// Method is a local function
        const LOCAL_FUNCTION = 0x0020;
        /// Member is `virtual`, `abstract` or `override`
        const VIRTUAL = 0x0040;
    }
}

/// A named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSymbol {
    /// Fully qualified name, e.g. `System.String`
    pub name: String,
}

impl TypeSymbol {
    /// Creates a new `TypeSymbol`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// A local variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSymbol {
    /// Variable name
    pub name: String,
    /// Declared type, if known
    pub type_name: Option<String>,
}

/// A method or lambda parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSymbol {
    /// Parameter name
    pub name: String,
    /// Declared type, fully qualified
    pub type_name: String,
    /// Passing mode
    pub ref_kind: RefKind,
    /// Fully qualified attribute type names applied to the parameter
    pub attributes: Vec<String>,
}

impl ParameterSymbol {
    /// Creates a by-value parameter without attributes.
    #[must_use]
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            ref_kind: RefKind::None,
            attributes: Vec::new(),
        }
    }
}

/// A field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSymbol {
    /// Field name
    pub name: String,
    /// Fully qualified declaring type
    pub containing_type: String,
    /// Field type, if known
    pub type_name: Option<String>,
    /// Modifiers
    pub flags: MemberFlags,
}

/// A property or indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySymbol {
    /// Property name (`this[]` for indexers by convention)
    pub name: String,
    /// Fully qualified declaring type
    pub containing_type: String,
    /// Property type, if known
    pub type_name: Option<String>,
    /// Modifiers
    pub flags: MemberFlags,
}

/// A method, constructor, operator or local function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSymbol {
    /// Simple method name
    pub name: String,
    /// Fully qualified declaring type
    pub containing_type: String,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterSymbol>,
    /// Return type, absent for `void` and constructors
    pub return_type: Option<String>,
    /// Modifiers
    pub flags: MemberFlags,
    /// Fully qualified attribute type names applied to the method
    pub attributes: Vec<String>,
}

impl MethodSymbol {
    /// Creates an instance method without attributes.
    #[must_use]
    pub fn new(containing_type: &str, name: &str, parameters: Vec<ParameterSymbol>) -> Self {
        Self {
            name: name.to_string(),
            containing_type: containing_type.to_string(),
            parameters,
            return_type: None,
            flags: MemberFlags::empty(),
            attributes: Vec::new(),
        }
    }

    /// Returns this symbol with `flags` added.
    #[must_use]
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Returns this symbol with the given return type.
    #[must_use]
    pub fn returning(mut self, type_name: &str) -> Self {
        self.return_type = Some(type_name.to_string());
        self
    }

    /// Returns this symbol with an attribute added.
    #[must_use]
    pub fn with_attribute(mut self, attribute: &str) -> Self {
        self.attributes.push(attribute.to_string());
        self
    }

    /// `true` for static methods, including extension methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags
            .intersects(MemberFlags::STATIC | MemberFlags::EXTENSION)
    }

    /// `true` for constructors.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(MemberFlags::CONSTRUCTOR)
    }

    /// `true` for extension methods.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        self.flags.contains(MemberFlags::EXTENSION)
    }
}

/// The declaration a node resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// A local variable
    Local(LocalSymbol),
    /// A parameter
    Parameter(ParameterSymbol),
    /// A field
    Field(FieldSymbol),
    /// A property or indexer
    Property(PropertySymbol),
    /// A method, constructor or local function
    Method(MethodSymbol),
    /// A type
    Type(TypeSymbol),
    /// A namespace, fully qualified
    Namespace(String),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Local(local) => write!(f, "local {}", local.name),
            Symbol::Parameter(parameter) => write!(f, "parameter {}", parameter.name),
            Symbol::Field(field) => write!(f, "field {}.{}", field.containing_type, field.name),
            Symbol::Property(property) => {
                write!(f, "property {}.{}", property.containing_type, property.name)
            }
            Symbol::Method(method) => write!(f, "method {}.{}", method.containing_type, method.name),
            Symbol::Type(ty) => write!(f, "type {}", ty.name),
            Symbol::Namespace(name) => write!(f, "namespace {name}"),
        }
    }
}

/// Answers symbol, type and constant queries for syntax nodes.
///
/// Every query may return `None`; callers must treat a missing answer as "unknown" rather
/// than as an error.
pub trait SemanticModel: Send + Sync {
    /// The declaration `node` refers to.
    ///
    /// For invocations and object creations this is the invoked method or constructor; for
    /// procedures it is the declared method; for names and member accesses it is the named
    /// symbol.
    fn symbol(&self, node: SyntaxId) -> Option<Arc<Symbol>>;

    /// The static type of the expression `node`.
    fn type_of(&self, node: SyntaxId) -> Option<TypeSymbol>;

    /// The compile-time constant value of the expression `node`.
    fn constant_value(&self, node: SyntaxId) -> Option<Literal>;

    /// Whether `ty` is `known` or derives from it.
    fn is_subtype_of(&self, ty: &TypeSymbol, known: &str) -> bool {
        ty.name == known
    }
}

/// Decides which procedures are trust boundaries and how their parameters are annotated.
pub trait EntryPointClassifier: Send + Sync {
    /// Whether untrusted input enters the program through `method`'s parameters.
    fn is_trust_boundary(&self, method: &MethodSymbol) -> bool;

    /// Annotation type names to attach to `parameter` in the lowered graph.
    fn parameter_annotations(&self, parameter: &ParameterSymbol) -> Vec<String>;
}

/// A classifier that never reports entry points or annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntryPoints;

impl EntryPointClassifier for NoEntryPoints {
    fn is_trust_boundary(&self, _method: &MethodSymbol) -> bool {
        false
    }

    fn parameter_annotations(&self, _parameter: &ParameterSymbol) -> Vec<String> {
        Vec::new()
    }
}

/// Classifies entry points by the attributes applied to methods and parameters.
///
/// A method is a trust boundary when it carries any of the configured boundary attributes,
/// for example an HTTP routing attribute. Parameter attributes found in the annotation set are
/// reported as annotations.
///
/// # Examples
///
/// ```rust
/// use flowscope::semantic::{AttributeClassifier, EntryPointClassifier, MethodSymbol};
///
/// let classifier = AttributeClassifier::new(["Microsoft.AspNetCore.Mvc.HttpGetAttribute"], []);
/// let action = MethodSymbol::new("Shop.Controller", "Index", Vec::new())
///     .with_attribute("Microsoft.AspNetCore.Mvc.HttpGetAttribute");
/// assert!(classifier.is_trust_boundary(&action));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttributeClassifier {
    boundary_attributes: HashSet<String>,
    annotation_attributes: HashSet<String>,
}

impl AttributeClassifier {
    /// Creates a classifier from boundary and annotation attribute names.
    pub fn new<'s>(
        boundary_attributes: impl IntoIterator<Item = &'s str>,
        annotation_attributes: impl IntoIterator<Item = &'s str>,
    ) -> Self {
        Self {
            boundary_attributes: boundary_attributes.into_iter().map(str::to_string).collect(),
            annotation_attributes: annotation_attributes
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl EntryPointClassifier for AttributeClassifier {
    fn is_trust_boundary(&self, method: &MethodSymbol) -> bool {
        method
            .attributes
            .iter()
            .any(|attribute| self.boundary_attributes.contains(attribute))
    }

    fn parameter_annotations(&self, parameter: &ParameterSymbol) -> Vec<String> {
        parameter
            .attributes
            .iter()
            .filter(|attribute| self.annotation_attributes.contains(*attribute))
            .cloned()
            .collect()
    }
}
