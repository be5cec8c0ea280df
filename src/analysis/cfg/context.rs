//! Jump resolution state for the CFG builder.
//!
//! Because the builder walks statements back to front, every jump target already exists as a
//! block when the jump is visited, except for loop heads and labels. Those are represented by
//! placeholder blocks that the builder links up once the real target has been built.
//!
//! [`JumpContext`] tracks, at any point of the walk:
//!
//! - the stack of enclosing loops and switches (targets for `break`/`continue`)
//! - the stack of enclosing exception handlers (targets for `return`/`throw`)
//! - the label table (targets for `goto`)
//! - the sections of enclosing switch statements (targets for `goto case`/`goto default`)

use std::collections::HashMap;

use crate::{syntax::SyntaxId, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Loop,
    Switch,
}

#[derive(Debug, Clone, Copy)]
struct JumpScope {
    kind: ScopeKind,
    break_target: usize,
    continue_target: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    Catch,
    Finally,
}

#[derive(Debug, Clone, Copy)]
struct Handler {
    kind: HandlerKind,
    entry: usize,
    // Number of jump scopes open when the handler was entered.
    scope_depth: usize,
}

#[derive(Debug, Default)]
struct SwitchTargets {
    scope_depth: usize,
    cases: Vec<(String, usize)>,
    default: Option<usize>,
}

/// A resolved jump: where control goes, and the `finally` it must pass through first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JumpTarget {
    pub target: usize,
    pub through_finally: Option<usize>,
}

/// Targets of structured jumps at the current point of a backward walk.
#[derive(Debug)]
pub(crate) struct JumpContext {
    exit: usize,
    scopes: Vec<JumpScope>,
    handlers: Vec<Handler>,
    labels: HashMap<String, usize>,
    switches: Vec<SwitchTargets>,
}

impl JumpContext {
    pub fn new(exit: usize) -> Self {
        Self {
            exit,
            scopes: Vec::new(),
            handlers: Vec::new(),
            labels: HashMap::new(),
            switches: Vec::new(),
        }
    }

    pub fn declare_label(&mut self, label: &str, placeholder: usize) {
        self.labels.entry(label.to_string()).or_insert(placeholder);
    }

    pub fn label_placeholder(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn push_loop(&mut self, break_target: usize, continue_target: usize) {
        self.scopes.push(JumpScope {
            kind: ScopeKind::Loop,
            break_target,
            continue_target: Some(continue_target),
        });
    }

    pub fn push_switch(&mut self, break_target: usize) {
        self.scopes.push(JumpScope {
            kind: ScopeKind::Switch,
            break_target,
            continue_target: None,
        });
        self.switches.push(SwitchTargets {
            scope_depth: self.scopes.len(),
            ..SwitchTargets::default()
        });
    }

    pub fn pop_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            if scope.kind == ScopeKind::Switch {
                self.switches.pop();
            }
        }
    }

    /// Registers the placeholder of a switch section under a case key.
    pub fn add_case(&mut self, key: String, placeholder: usize) {
        if let Some(switch) = self.switches.last_mut() {
            switch.cases.push((key, placeholder));
        }
    }

    pub fn set_default(&mut self, placeholder: usize) {
        if let Some(switch) = self.switches.last_mut() {
            switch.default = Some(placeholder);
        }
    }

    pub fn push_finally(&mut self, entry: usize) {
        self.handlers.push(Handler {
            kind: HandlerKind::Finally,
            entry,
            scope_depth: self.scopes.len(),
        });
    }

    pub fn push_catch(&mut self, entry: usize) {
        self.handlers.push(Handler {
            kind: HandlerKind::Catch,
            entry,
            scope_depth: self.scopes.len(),
        });
    }

    pub fn pop_handler(&mut self) {
        self.handlers.pop();
    }

    /// The innermost `finally` entered after `depth` scopes were open.
    fn finally_above(&self, depth: usize) -> Option<usize> {
        self.handlers
            .iter()
            .rev()
            .find(|handler| handler.kind == HandlerKind::Finally && handler.scope_depth >= depth)
            .map(|handler| handler.entry)
    }

    pub fn break_target(&self, statement: SyntaxId) -> Result<JumpTarget> {
        let index = self
            .scopes
            .len()
            .checked_sub(1)
            .ok_or(Error::UnresolvedJump { statement })?;
        Ok(JumpTarget {
            target: self.scopes[index].break_target,
            through_finally: self.finally_above(index + 1),
        })
    }

    pub fn continue_target(&self, statement: SyntaxId) -> Result<JumpTarget> {
        let (index, target) = self
            .scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, scope)| scope.continue_target.map(|target| (index, target)))
            .ok_or(Error::UnresolvedJump { statement })?;
        Ok(JumpTarget {
            target,
            through_finally: self.finally_above(index + 1),
        })
    }

    pub fn goto_label(&self, label: &str) -> Result<JumpTarget> {
        let target = self
            .label_placeholder(label)
            .ok_or_else(|| Error::UndeclaredLabel(label.to_string()))?;
        Ok(JumpTarget {
            target,
            through_finally: self.finally_above(0),
        })
    }

    pub fn goto_case(&self, key: &str) -> Result<JumpTarget> {
        let switch = self
            .switches
            .last()
            .ok_or_else(|| Error::UnknownSwitchCase(key.to_string()))?;
        let target = switch
            .cases
            .iter()
            .find(|(case, _)| case == key)
            .map(|(_, placeholder)| *placeholder)
            .ok_or_else(|| Error::UnknownSwitchCase(key.to_string()))?;
        Ok(JumpTarget {
            target,
            through_finally: self.finally_above(switch.scope_depth),
        })
    }

    pub fn goto_default(&self) -> Result<JumpTarget> {
        let switch = self
            .switches
            .last()
            .ok_or_else(|| Error::UnknownSwitchCase("default".to_string()))?;
        let target = switch
            .default
            .ok_or_else(|| Error::UnknownSwitchCase("default".to_string()))?;
        Ok(JumpTarget {
            target,
            through_finally: self.finally_above(switch.scope_depth),
        })
    }

    /// Where `return` and `yield break` go: the innermost `finally`, or the exit.
    pub fn return_target(&self) -> usize {
        self.finally_above(0).unwrap_or(self.exit)
    }

    /// Where exceptions go: the innermost handler of any kind, or the exit.
    pub fn throw_target(&self) -> usize {
        self.handlers.last().map_or(self.exit, |handler| handler.entry)
    }
}
