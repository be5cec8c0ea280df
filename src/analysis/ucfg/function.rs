//! UCFG container: the lowered form of one procedure.
//!
//! # Structure
//!
//! ```text
//! Ucfg
//! ├── method_id: String         // Qualified id of the lowered procedure
//! ├── parameters: Vec<String>   // Parameter names in order
//! ├── blocks: Vec<UcfgBlock>    // 1:1 with CFG blocks, same ids
//! │   ├── instructions          // Lowered instructions in execution order
//! │   └── terminator            // Jump to successors, or return a value
//! ├── entry: usize              // Entry block id
//! └── entry_point_len: usize    // Synthetic instructions at the start of the entry block
//! ```
//!
//! # Thread Safety
//!
//! `Ucfg` owns all of its data and is `Send` and `Sync`.

use std::fmt::{self, Write};

use crate::{
    analysis::ucfg::instruction::{Expression, Instruction},
    utils::escape_dot,
};

/// How control leaves a UCFG block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// Continue at any of the listed blocks
    Jump(Vec<usize>),
    /// Return the given value
    Ret(Expression),
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Jump(targets) => {
                f.write_str("jump")?;
                for target in targets {
                    write!(f, " B{target}")?;
                }
                Ok(())
            }
            Terminator::Ret(value) => write!(f, "ret {value}"),
        }
    }
}

/// One lowered basic block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UcfgBlock {
    /// Id of the CFG block this was lowered from
    pub id: usize,
    /// Instructions in execution order
    pub instructions: Vec<Instruction>,
    /// Exit of the block
    pub terminator: Terminator,
}

impl UcfgBlock {
    /// Creates a block.
    #[must_use]
    pub fn new(id: usize, instructions: Vec<Instruction>, terminator: Terminator) -> Self {
        Self {
            id,
            instructions,
            terminator,
        }
    }

    /// Successor block ids; empty for returning blocks.
    #[must_use]
    pub fn successors(&self) -> &[usize] {
        match &self.terminator {
            Terminator::Jump(targets) => targets,
            Terminator::Ret(_) => &[],
        }
    }
}

impl fmt::Display for UcfgBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "B{}:", self.id)?;
        for instruction in &self.instructions {
            writeln!(f, "  {instruction}")?;
        }
        writeln!(f, "  {}", self.terminator)
    }
}

/// The lowered form of one procedure.
///
/// Block ids match the ids of the [`ControlFlowGraph`](crate::analysis::ControlFlowGraph) the
/// UCFG was built from, so analyses can move between both views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ucfg {
    method_id: String,
    parameters: Vec<String>,
    blocks: Vec<UcfgBlock>,
    entry: usize,
    entry_point_len: usize,
}

impl Ucfg {
    pub(crate) fn new(
        method_id: String,
        parameters: Vec<String>,
        blocks: Vec<UcfgBlock>,
        entry: usize,
        entry_point_len: usize,
    ) -> Self {
        Self {
            method_id,
            parameters,
            blocks,
            entry,
            entry_point_len,
        }
    }

    /// Qualified id of the lowered procedure.
    #[must_use]
    pub fn method_id(&self) -> &str {
        &self.method_id
    }

    /// Parameter names in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Blocks ordered by id.
    #[must_use]
    pub fn blocks(&self) -> &[UcfgBlock] {
        &self.blocks
    }

    /// Returns the block with the given id.
    #[must_use]
    pub fn block(&self, id: usize) -> Option<&UcfgBlock> {
        self.blocks.get(id)
    }

    /// Entry block id.
    #[must_use]
    pub const fn entry(&self) -> usize {
        self.entry
    }

    /// The entry block, if the UCFG has any blocks.
    #[must_use]
    pub fn entry_block(&self) -> Option<&UcfgBlock> {
        self.blocks.get(self.entry)
    }

    /// The synthetic `__entrypoint` / `__annotate` / `__annotation` prologue.
    #[must_use]
    pub fn entry_point_instructions(&self) -> &[Instruction] {
        self.entry_block()
            .map_or(&[], |block| &block.instructions[..self.entry_point_len])
    }

    /// `true` if the prologue marks untrusted parameters.
    #[must_use]
    pub fn is_entry_point(&self) -> bool {
        !self.entry_point_instructions().is_empty()
    }

    /// All instructions, block by block.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }

    /// Total number of instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|block| block.instructions.len()).sum()
    }

    /// Generates a DOT format representation of this UCFG.
    ///
    /// Same layout as [`ControlFlowGraph::to_dot`](crate::analysis::ControlFlowGraph::to_dot):
    /// nodes are `B{id}`, each label lists the instructions followed by the terminator.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();

        dot.push_str("digraph UCFG {\n");
        let _ = writeln!(dot, "    label=\"UCFG: {}\";", escape_dot(&self.method_id));
        dot.push_str("    labelloc=t;\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n\n");

        for block in &self.blocks {
            let mut label = format!("B{}", block.id);
            if block.id == self.entry {
                label.push_str(" (entry)");
            }
            label.push_str("\\l");
            for instruction in &block.instructions {
                label.push_str(&escape_dot(&instruction.to_string()));
                label.push_str("\\l");
            }
            label.push_str(&escape_dot(&block.terminator.to_string()));
            label.push_str("\\l");

            let style = if block.id == self.entry {
                ", style=filled, fillcolor=lightgreen"
            } else {
                ""
            };
            let _ = writeln!(dot, "    B{} [label=\"{label}\"{style}];", block.id);
        }

        dot.push('\n');

        for block in &self.blocks {
            for target in block.successors() {
                let _ = writeln!(dot, "    B{} -> B{target};", block.id);
            }
        }

        dot.push_str("}\n");
        dot
    }
}

impl fmt::Display for Ucfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "UCFG {} ({}):", self.method_id, self.parameters.join(", "))?;
        writeln!(f, "  Blocks: {}", self.blocks.len())?;
        writeln!(f)?;

        for block in &self.blocks {
            write!(f, "{block}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::ucfg::PseudoOp, utils::DotGraph};

    fn sample() -> Ucfg {
        let entry = Instruction::pseudo(
            Expression::variable("%0"),
            PseudoOp::EntryPoint,
            vec![Expression::variable("s")],
        );
        let call = Instruction::Assign {
            target: Expression::variable("%1"),
            method: "System.String.Trim()".to_string(),
            arguments: vec![Expression::variable("s")],
        };
        Ucfg::new(
            "C.M(string)".to_string(),
            vec!["s".to_string()],
            vec![
                UcfgBlock::new(0, vec![entry, call], Terminator::Jump(vec![1])),
                UcfgBlock::new(1, Vec::new(), Terminator::Ret(Expression::constant())),
            ],
            0,
            1,
        )
    }

    #[test]
    fn test_accessors() {
        let ucfg = sample();
        assert_eq!(ucfg.method_id(), "C.M(string)");
        assert_eq!(ucfg.instruction_count(), 2);
        assert!(ucfg.is_entry_point());
        assert_eq!(ucfg.entry_point_instructions().len(), 1);
        assert_eq!(ucfg.block(1).map(UcfgBlock::successors), Some(&[][..]));
        assert!(ucfg.block(2).is_none());
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.starts_with("UCFG C.M(string) (s):"));
        assert!(text.contains("B0:\n  %0 := __entrypoint [ s ]\n  %1 := System.String.Trim() [ s ]\n  jump B1\n"));
        assert!(text.contains("B1:\n  ret const\n"));
    }

    #[test]
    fn test_dot_round_trip() {
        let dot = sample().to_dot();
        let parsed = DotGraph::parse(&dot).unwrap();
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.edges, vec![("B0".to_string(), "B1".to_string())]);
    }
}
