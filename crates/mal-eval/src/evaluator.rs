//! Trampoline evaluator and special forms.

use mal_types::{Closure, Env, EvalError, EvalResult, Function, Value};
use std::io::{self, Write};
use std::rc::Rc;
use tracing::{debug, trace};

/// Default limit on non-tail evaluation nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Evaluator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum nesting of non-tail evaluations before `RecursionLimit`.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Outcome of one evaluation step.
enum Step {
    /// Evaluation finished with a value.
    Done(Value),
    /// Continue the loop with a new form and environment (tail position).
    TailCall(Value, Env),
}

/// The evaluator. Holds the nesting guard and the sink `prn` writes to.
pub struct Evaluator {
    config: EvalConfig,
    /// Current non-tail nesting depth.
    depth: usize,
    out: Box<dyn Write>,
}

impl Evaluator {
    /// Create an evaluator writing to standard output.
    pub fn new(config: EvalConfig) -> Self {
        Self::with_output(config, io::stdout())
    }

    /// Create an evaluator writing to `out`.
    pub fn with_output(config: EvalConfig, out: impl Write + 'static) -> Self {
        Self {
            config,
            depth: 0,
            out: Box::new(out),
        }
    }

    /// Current nesting depth. Zero between top-level evaluations.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Evaluate `ast` in `env`.
    ///
    /// Every call nests one level; tail positions inside the form do not.
    pub fn eval(&mut self, ast: &Value, env: &Env) -> EvalResult<Value> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::RecursionLimit(self.config.max_depth));
        }
        self.depth += 1;
        let result = self.run(ast.clone(), env.clone());
        self.depth -= 1;
        result
    }

    fn run(&mut self, mut ast: Value, mut env: Env) -> EvalResult<Value> {
        loop {
            match self.step(&ast, &env)? {
                Step::Done(value) => return Ok(value),
                Step::TailCall(next_ast, next_env) => {
                    trace!(depth = self.depth, env_depth = next_env.depth(), "tail call");
                    ast = next_ast;
                    env = next_env;
                }
            }
        }
    }

    fn step(&mut self, ast: &Value, env: &Env) -> EvalResult<Step> {
        let items = match ast {
            Value::Symbol(name) => return env.lookup(name).map(Step::Done),
            Value::List(items) if !items.is_empty() => items,
            // Atoms, functions, and the empty list evaluate to themselves.
            _ => return Ok(Step::Done(ast.clone())),
        };

        let args = &items[1..];
        if let Some(head) = items[0].as_symbol() {
            if matches!(&**head, "def!" | "let*" | "if" | "do" | "fn*") {
                trace!(form = %head, depth = self.depth, "special form");
            }
            match &**head {
                "def!" => return self.eval_def(args, env).map(Step::Done),
                "let*" => return self.eval_let(args, env),
                "if" => return self.eval_if(args, env),
                "do" => return self.eval_do(args, env),
                "fn*" => return make_closure(args, env).map(Step::Done),
                _ => {}
            }
        }

        self.apply(items, env)
    }

    // ── Special forms ─────────────────────────────────────────────────────

    fn eval_def(&mut self, args: &[Value], env: &Env) -> EvalResult<Value> {
        let [target, expr] = args else {
            return Err(EvalError::arity("def!", "2", args.len()));
        };
        let name = target.as_symbol().ok_or_else(|| {
            EvalError::malformed(
                "def!",
                format!("name must be a symbol, got {}", target.type_name()),
            )
        })?;

        let value = self.eval(expr, env)?;
        debug!(name = %name, kind = value.type_name(), "def!");
        env.define(name.clone(), value.clone());
        Ok(value)
    }

    fn eval_let(&mut self, args: &[Value], env: &Env) -> EvalResult<Step> {
        let [bindings, body] = args else {
            return Err(EvalError::arity("let*", "2", args.len()));
        };
        let Value::List(bindings) = bindings else {
            return Err(EvalError::malformed(
                "let*",
                format!("bindings must be a list, got {}", bindings.type_name()),
            ));
        };
        if bindings.len() % 2 != 0 {
            return Err(EvalError::malformed("let*", "odd number of binding forms"));
        }

        let scope = Env::child(env);
        for pair in bindings.chunks_exact(2) {
            let name = pair[0].as_symbol().ok_or_else(|| {
                EvalError::malformed(
                    "let*",
                    format!("binding name must be a symbol, got {}", pair[0].type_name()),
                )
            })?;
            // Later bindings see earlier ones.
            let value = self.eval(&pair[1], &scope)?;
            scope.define(name.clone(), value);
        }

        Ok(Step::TailCall(body.clone(), scope))
    }

    fn eval_if(&mut self, args: &[Value], env: &Env) -> EvalResult<Step> {
        let (cond, then, otherwise) = match args {
            [cond, then] => (cond, then, None),
            [cond, then, otherwise] => (cond, then, Some(otherwise)),
            _ => return Err(EvalError::arity("if", "2 or 3", args.len())),
        };

        if self.eval(cond, env)?.is_truthy() {
            Ok(Step::TailCall(then.clone(), env.clone()))
        } else {
            match otherwise {
                Some(branch) => Ok(Step::TailCall(branch.clone(), env.clone())),
                None => Ok(Step::Done(Value::Nil)),
            }
        }
    }

    fn eval_do(&mut self, args: &[Value], env: &Env) -> EvalResult<Step> {
        let Some((last, init)) = args.split_last() else {
            return Ok(Step::Done(Value::Nil));
        };
        for form in init {
            self.eval(form, env)?;
        }
        Ok(Step::TailCall(last.clone(), env.clone()))
    }

    // ── Application ───────────────────────────────────────────────────────

    fn apply(&mut self, items: &[Value], env: &Env) -> EvalResult<Step> {
        let callee = self.eval(&items[0], env)?;
        let mut args = Vec::with_capacity(items.len() - 1);
        for item in &items[1..] {
            args.push(self.eval(item, env)?);
        }

        match callee {
            Value::Function(Function::Native(native)) => {
                if !native.arity.accepts(args.len()) {
                    return Err(EvalError::arity(
                        native.name,
                        native.arity.to_string(),
                        args.len(),
                    ));
                }
                (native.func)(&mut *self.out, &args).map(Step::Done)
            }
            Value::Function(Function::Closure(closure)) => {
                if args.len() != closure.params.len() {
                    return Err(EvalError::arity(
                        callee_name(&items[0]),
                        closure.params.len().to_string(),
                        args.len(),
                    ));
                }
                let scope = Env::child(&closure.env);
                for (param, arg) in closure.params.iter().zip(args) {
                    scope.define(param.clone(), arg);
                }
                Ok(Step::TailCall(closure.body.clone(), scope))
            }
            other => Err(EvalError::NotCallable(other.type_name().to_string())),
        }
    }
}

fn make_closure(args: &[Value], env: &Env) -> EvalResult<Value> {
    let [params, body] = args else {
        return Err(EvalError::arity("fn*", "2", args.len()));
    };
    let Value::List(params) = params else {
        return Err(EvalError::malformed(
            "fn*",
            format!("parameters must be a list, got {}", params.type_name()),
        ));
    };

    let mut names: Vec<Rc<str>> = Vec::with_capacity(params.len());
    for param in params.iter() {
        let name = param.as_symbol().ok_or_else(|| {
            EvalError::malformed(
                "fn*",
                format!("parameter must be a symbol, got {}", param.type_name()),
            )
        })?;
        if names.contains(name) {
            return Err(EvalError::malformed(
                "fn*",
                format!("duplicate parameter '{name}'"),
            ));
        }
        names.push(name.clone());
    }

    debug!(params = names.len(), env_depth = env.depth(), "closure created");
    Ok(Value::Function(Function::Closure(Rc::new(Closure {
        params: names,
        body: body.clone(),
        env: env.clone(),
    }))))
}

/// Name used in closure arity errors.
fn callee_name(head: &Value) -> String {
    match head.as_symbol() {
        Some(name) => name.to_string(),
        None => "#<function>".to_string(),
    }
}
