//! Control flow edge types for the CFG.
//!
//! Edges carry the reason control moves from one block to the next. The builder assigns the
//! kind from the source block's shape: binary branches emit a true and a false edge, the end
//! of a protected region emits a normal and an exceptional edge, and jumps leaving a region
//! guarded by `finally` emit an extra edge into that `finally`.

use strum::{Display, EnumIter};

/// Classification of a control flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CfgEdgeKind {
    /// Fall-through or jump to the single (or normal) successor.
    #[strum(to_string = "")]
    Unconditional,

    /// Taken when the branch condition holds.
    ///
    /// For null-coalescing constructs (`??`, `?.`, `??=`) the condition is "the left operand
    /// is null".
    #[strum(to_string = "T")]
    ConditionalTrue,

    /// Taken when the branch condition does not hold.
    #[strum(to_string = "F")]
    ConditionalFalse,

    /// An exception leaving a protected region, either to the first catch test or onward
    /// from a `finally` to the next enclosing handler or the exit.
    #[strum(to_string = "exception")]
    Exception,

    /// A `break`, `continue` or `goto` that leaves a region guarded by `finally` and therefore
    /// runs it first.
    #[strum(to_string = "finally")]
    Finally,
}

impl CfgEdgeKind {
    /// `true` for the two edges of a binary branch.
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::ConditionalTrue | Self::ConditionalFalse)
    }

    /// `true` for edges that model exception propagation or `finally` routing.
    #[must_use]
    pub const fn is_exceptional(&self) -> bool {
        matches!(self, Self::Exception | Self::Finally)
    }
}
