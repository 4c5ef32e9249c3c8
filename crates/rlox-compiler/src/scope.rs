//! Lexical scope stack for the resolver.
//!
//! [`ScopeStack`] mirrors the environments the interpreter will create:
//! one frame per block and per function body, none for the top level.

use std::collections::HashMap;

// ══════════════════════════════════════════════════════════════════════════════
// Function Kind
// ══════════════════════════════════════════════════════════════════════════════

/// What kind of function body the resolver is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Top-level code.
    None,
    Function,
}

// ══════════════════════════════════════════════════════════════════════════════
// Lookup
// ══════════════════════════════════════════════════════════════════════════════

/// Outcome of looking a name up from the innermost scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Bound in a scope this many frames out.
    Local(usize),
    /// Not in any scope: a global, looked up by name at runtime.
    Global,
    /// Only found declared-but-uninitialized, so the read is inside the
    /// name's own initializer and no enclosing scope has it.
    OwnInitializer,
}

// ══════════════════════════════════════════════════════════════════════════════
// ScopeStack
// ══════════════════════════════════════════════════════════════════════════════

/// A stack of scopes, each mapping a name to whether its initializer has
/// finished (`true`) or is still running (`false`).
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, bool>>,
}

impl ScopeStack {
    /// An empty stack (top level).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        debug_assert!(!self.scopes.is_empty(), "cannot pop the top level");
        self.scopes.pop();
    }

    /// `true` when no scope is open, i.e. at top level.
    pub fn is_global(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare `name` as uninitialized in the innermost scope.
    ///
    /// Returns `false` if the innermost scope already has it; the earlier
    /// binding is left as it was. At top level this is a no-op.
    pub fn declare(&mut self, name: &str) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return true;
        };
        if scope.contains_key(name) {
            return false;
        }
        scope.insert(name.to_string(), false);
        true
    }

    /// Mark `name` initialized in the innermost scope.
    pub fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    /// Find the nearest initialized binding of `name`, innermost first.
    ///
    /// Uninitialized entries are skipped, so a read inside `var a = a;`
    /// reaches past the `a` being declared to any outer `a`.
    pub fn lookup(&self, name: &str) -> Lookup {
        let Some(innermost) = self.scopes.len().checked_sub(1) else {
            return Lookup::Global;
        };
        let mut skipped = false;
        for (index, scope) in self.scopes.iter().enumerate().rev() {
            match scope.get(name) {
                Some(true) => return Lookup::Local(innermost - index),
                Some(false) => skipped = true,
                None => {}
            }
        }
        if skipped {
            Lookup::OwnInitializer
        } else {
            Lookup::Global
        }
    }
}
