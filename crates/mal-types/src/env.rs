//! Lexical environment chain.

use crate::{EvalError, EvalResult, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A single scope level.
struct Frame {
    bindings: RefCell<BTreeMap<Rc<str>, Value>>,
    outer: Option<Env>,
}

/// A shared handle to one frame of the environment tree.
///
/// Cloning is cheap and yields another handle to the same frame. A frame
/// lives as long as its longest holder: the root, a closure that captured
/// it, or an evaluation still running inside it.
///
/// Variables are looked up from the innermost frame outward.
/// `define` always writes to the frame it is called on.
#[derive(Clone)]
pub struct Env(Rc<Frame>);

impl Env {
    /// Create an empty root environment.
    pub fn root() -> Self {
        Self(Rc::new(Frame {
            bindings: RefCell::new(BTreeMap::new()),
            outer: None,
        }))
    }

    /// Create an empty environment enclosed by `outer`.
    pub fn child(outer: &Env) -> Self {
        Self(Rc::new(Frame {
            bindings: RefCell::new(BTreeMap::new()),
            outer: Some(outer.clone()),
        }))
    }

    /// Bind `name` in this frame, shadowing any binding in an outer frame.
    pub fn define(&self, name: impl Into<Rc<str>>, value: Value) {
        self.0.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Look up a variable, searching from this frame to the root.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.0.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            env = env.0.outer.as_ref()?;
        }
    }

    /// Like [`Env::get`], failing with `UnboundSymbol` when no frame binds `name`.
    pub fn lookup(&self, name: &str) -> EvalResult<Value> {
        self.get(name)
            .ok_or_else(|| EvalError::UnboundSymbol(name.to_string()))
    }

    pub fn outer(&self) -> Option<&Env> {
        self.0.outer.as_ref()
    }

    /// Number of frames between this one and the root.
    pub fn depth(&self) -> usize {
        std::iter::successors(self.outer(), |env| env.outer()).count()
    }

    /// Names bound directly in this frame, sorted.
    pub fn local_names(&self) -> Vec<Rc<str>> {
        self.0.bindings.borrow().keys().cloned().collect()
    }

    #[cfg(test)]
    fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Env {
    // Values are omitted: closures bound here may capture this frame.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("names", &self.local_names())
            .field("depth", &self.depth())
            .finish()
    }
}
