//! Builtin function registry.
//!
//! The table is immutable and shared by every interpreter; [`install`]
//! binds each entry into a root environment. Arity is checked by the
//! evaluator before an entry runs.

use mal_types::{
    pr_str, Arity, Env, EvalError, EvalResult, Function, NativeFn, Value, MAX_NESTING,
};
use std::io::Write;

static BUILTINS: [NativeFn; 14] = [
    // ── Arithmetic ──
    NativeFn::new("+", Arity::Exact(2), add),
    NativeFn::new("-", Arity::Exact(2), sub),
    NativeFn::new("*", Arity::Exact(2), mul),
    NativeFn::new("/", Arity::Exact(2), div),
    // ── Lists ──
    NativeFn::new("list", Arity::Any, list),
    NativeFn::new("list?", Arity::Exact(1), is_list),
    NativeFn::new("empty?", Arity::Exact(1), is_empty),
    NativeFn::new("count", Arity::Exact(1), count),
    // ── Comparison ──
    NativeFn::new("=", Arity::Exact(2), equal),
    NativeFn::new("<", Arity::Exact(2), less),
    NativeFn::new("<=", Arity::Exact(2), less_equal),
    NativeFn::new(">", Arity::Exact(2), greater),
    NativeFn::new(">=", Arity::Exact(2), greater_equal),
    // ── Output ──
    NativeFn::new("prn", Arity::Exact(1), prn),
];

/// Every builtin, in table order.
pub fn registry() -> &'static [NativeFn] {
    &BUILTINS
}

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<&'static NativeFn> {
    BUILTINS.iter().find(|native| native.name == name)
}

/// Bind every builtin into `env`.
pub fn install(env: &Env) {
    for native in registry() {
        env.define(native.name, Value::Function(Function::Native(native)));
    }
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn one<'a>(callee: &str, args: &'a [Value]) -> EvalResult<&'a Value> {
    match args {
        [arg] => Ok(arg),
        _ => Err(EvalError::arity(callee, "1", args.len())),
    }
}

fn two<'a>(callee: &str, args: &'a [Value]) -> EvalResult<(&'a Value, &'a Value)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(EvalError::arity(callee, "2", args.len())),
    }
}

fn int(callee: &str, value: &Value) -> EvalResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::type_error(callee, "integer", other.type_name())),
    }
}

fn ints(callee: &str, args: &[Value]) -> EvalResult<(i64, i64)> {
    let (a, b) = two(callee, args)?;
    Ok((int(callee, a)?, int(callee, b)?))
}

fn overflow_checked(result: Option<i64>) -> EvalResult<Value> {
    result
        .map(Value::Int)
        .ok_or_else(|| EvalError::Arithmetic("integer overflow".into()))
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

fn add(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints("+", args)?;
    overflow_checked(a.checked_add(b))
}

fn sub(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints("-", args)?;
    overflow_checked(a.checked_sub(b))
}

fn mul(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints("*", args)?;
    overflow_checked(a.checked_mul(b))
}

/// Integer division, truncating toward zero.
fn div(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints("/", args)?;
    if b == 0 {
        return Err(EvalError::Arithmetic("division by zero".into()));
    }
    overflow_checked(a.checked_div(b))
}

// ── Lists ─────────────────────────────────────────────────────────────────────

/// Fails past [`MAX_NESTING`] so no value is too deep to print, compare, or drop.
fn list(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let list = Value::list(args.to_vec());
    if list.nesting() > MAX_NESTING {
        return Err(EvalError::NestingLimit(MAX_NESTING));
    }
    Ok(list)
}

fn is_list(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let arg = one("list?", args)?;
    Ok(Value::Bool(matches!(arg, Value::List(_))))
}

fn is_empty(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    match one("empty?", args)? {
        Value::List(items) => Ok(Value::Bool(items.is_empty())),
        other => Err(EvalError::type_error("empty?", "list", other.type_name())),
    }
}

fn count(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    match one("count", args)? {
        Value::Nil => Ok(Value::Int(0)),
        Value::List(items) => Ok(Value::Int(items.len() as i64)),
        other => Err(EvalError::type_error("count", "list or nil", other.type_name())),
    }
}

// ── Comparison ────────────────────────────────────────────────────────────────

fn equal(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = two("=", args)?;
    Ok(Value::Bool(a == b))
}

fn less(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints("<", args)?;
    Ok(Value::Bool(a < b))
}

fn less_equal(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints("<=", args)?;
    Ok(Value::Bool(a <= b))
}

fn greater(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints(">", args)?;
    Ok(Value::Bool(a > b))
}

fn greater_equal(_out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let (a, b) = ints(">=", args)?;
    Ok(Value::Bool(a >= b))
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Write the readable form of the argument and a newline.
fn prn(out: &mut dyn Write, args: &[Value]) -> EvalResult<Value> {
    let arg = one("prn", args)?;
    writeln!(out, "{}", pr_str(arg, true))
        .and_then(|()| out.flush())
        .map_err(|err| EvalError::Output(err.to_string()))?;
    Ok(Value::Nil)
}
