//! The runtime value model.
//!
//! Programs are read into [`Value`] trees and evaluated as [`Value`]s; there
//! is no separate AST type.

use crate::{Env, EvalResult};
use std::fmt;
use std::io::Write;
use std::ops::Deref;
use std::rc::Rc;

/// Maximum list nesting, for lists read from source and built by `list`.
pub const MAX_NESTING: usize = 512;

/// A runtime value. The set of variants is closed.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    /// String literal. Self-evaluating.
    Str(Rc<str>),
    /// An identifier, resolved through the environment when evaluated.
    Symbol(Rc<str>),
    List(List),
    Function(Function),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(List::new(items))
    }

    pub fn empty_list() -> Self {
        Value::List(List::new(Vec::new()))
    }

    pub fn symbol(name: &str) -> Self {
        Value::Symbol(name.into())
    }

    pub fn string(s: &str) -> Self {
        Value::Str(s.into())
    }

    /// Only `nil` and `false` are falsy. `0` and `()` are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_symbol(&self) -> Option<&Rc<str>> {
        match self {
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Number of lists on the deepest path through this value. Atoms are 0.
    pub fn nesting(&self) -> usize {
        match self {
            Value::List(list) => list.depth,
            _ => 0,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Function(_) => "function",
        }
    }
}

/// Structural equality. Mismatched variants are unequal; functions compare
/// by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Function(a), Value::Function(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::pr_str(self, true))
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Lists
// ──────────────────────────────────────────────────────────────────────────────

/// Shared, immutable list contents with their nesting depth.
///
/// The depth is computed once at construction from the direct children, so
/// callers can bound nesting without walking the whole structure.
#[derive(Clone)]
pub struct List {
    items: Rc<[Value]>,
    depth: usize,
}

impl List {
    pub fn new(items: Vec<Value>) -> Self {
        let depth = 1 + items.iter().map(Value::nesting).max().unwrap_or(0);
        Self {
            items: items.into(),
            depth,
        }
    }
}

impl Deref for List {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.items
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Functions
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Function {
    Native(&'static NativeFn),
    Closure(Rc<Closure>),
}

impl Function {
    fn same(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => std::ptr::eq(*a, *b),
            (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(native) => fmt::Debug::fmt(native, f),
            Function::Closure(closure) => fmt::Debug::fmt(closure, f),
        }
    }
}

/// Host function signature. Output written by the native goes to `out`.
pub type NativeFnPtr = fn(out: &mut dyn Write, args: &[Value]) -> EvalResult<Value>;

/// Accepted argument counts of a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == expected,
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Any => f.write_str("any number of"),
        }
    }
}

/// An entry of the builtin table.
pub struct NativeFn {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFnPtr,
}

impl NativeFn {
    pub const fn new(name: &'static str, arity: Arity, func: NativeFnPtr) -> Self {
        Self { name, arity, func }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}>", self.name)
    }
}

/// A user function created by `fn*`.
///
/// `env` is the environment the closure was defined in, never the caller's.
pub struct Closure {
    pub params: Vec<Rc<str>>,
    pub body: Value,
    pub env: Env,
}

impl fmt::Debug for Closure {
    // The captured env is omitted: it may hold this closure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
