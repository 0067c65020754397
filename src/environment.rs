use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// Shared handle to a scope frame. Frames outlive the call that created them
/// whenever a closure captured them.
pub type Env = Rc<RefCell<Environment>>;

/// One scope frame: name → value bindings plus a link to the enclosing frame.
/// The link is fixed at construction.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh frame enclosed by `enclosing` in a shared handle.
    pub fn child_of(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<&Env> {
        self.enclosing.as_ref()
    }

    /// Binds `name` in this frame, replacing any existing binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up in this frame only.
    pub fn fetch(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Reassigns the nearest existing binding of `name`. Returns `false` when
    /// no frame in the chain binds it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }
}

/// Walks `distance` links up from `env`.
pub fn ancestor(env: &Env, distance: usize) -> Option<Env> {
    let mut frame: Env = Rc::clone(env);

    for _ in 0..distance {
        let next: Env = Rc::clone(frame.borrow().enclosing()?);
        frame = next;
    }

    Some(frame)
}

/// Reads `name` from the frame exactly `distance` links up.
pub fn get_at(env: &Env, distance: usize, name: &str) -> Option<Value> {
    ancestor(env, distance)?.borrow().fetch(name)
}

/// Writes `name` in the frame exactly `distance` links up.
pub fn assign_at(env: &Env, distance: usize, name: &str, value: Value) -> bool {
    match ancestor(env, distance) {
        Some(frame) => {
            frame.borrow_mut().define(name, value);
            true
        }
        None => false,
    }
}
