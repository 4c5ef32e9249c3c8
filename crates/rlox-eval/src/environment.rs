//! Chained variable environments.
//!
//! Each block and call gets its own [`Environment`] linked to the one it
//! was created in. Closures keep their defining environment alive through
//! the shared [`EnvRef`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// Shared handle to an environment.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root environment with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// A child of `enclosing`.
    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this environment, replacing any existing binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look `name` up here, then in each enclosing environment.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.enclosing.as_ref()?.borrow().get(name)
    }

    /// Overwrite the nearest existing binding of `name`. Returns `false`
    /// when no environment in the chain binds it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => false,
        }
    }

    /// Names bound directly in this environment, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }
}

/// The environment `hops` links above `env`.
pub fn ancestor(env: &EnvRef, hops: usize) -> Option<EnvRef> {
    let mut current = Rc::clone(env);
    for _ in 0..hops {
        let next = current.borrow().enclosing.clone()?;
        current = next;
    }
    Some(current)
}

/// Read `name` from exactly the environment `hops` links up.
pub fn get_at(env: &EnvRef, hops: usize, name: &str) -> Option<Value> {
    let target = ancestor(env, hops)?;
    let value = target.borrow().values.get(name).cloned();
    value
}

/// Write `name` in exactly the environment `hops` links up. Returns
/// `false` when that environment does not bind it.
pub fn assign_at(env: &EnvRef, hops: usize, name: &str, value: Value) -> bool {
    let Some(target) = ancestor(env, hops) else {
        return false;
    };
    let mut target = target.borrow_mut();
    match target.values.get_mut(name) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}
