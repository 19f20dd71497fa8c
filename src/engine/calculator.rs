//! Bundled calculator evaluator
//!
//! A small expression language: numbers, text and booleans, variables,
//! `let`/`return`, arithmetic and comparisons, math builtins, and the I/O
//! builtins that exercise the console (`print`, `write`, `read`, `readline`,
//! `readchar`, `confirm`, `clear`, `exit`, `run`).

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use super::parser::{parse, BinOp, Expr, Stmt};
use super::pool::WorkerPool;
use super::value::{Number, Value};
use super::{
    ConfirmVocabulary, EngineEvent, EngineHost, EvalError, EvalMode, Evaluator, InputRequest,
    InputValue,
};
use crate::config::EngineConfig;

struct Inner {
    scope: RwLock<BTreeMap<String, Value>>,
    config: RwLock<EngineConfig>,
    pool: WorkerPool,
}

/// Thread-safe calculator; clones share definitions and settings
#[derive(Clone)]
pub struct Calculator {
    inner: Arc<Inner>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("variables", &self.scope().len())
            .field("config", &*self.settings())
            .finish()
    }
}

struct Context<'a> {
    config: &'a EngineConfig,
    host: &'a Arc<dyn EngineHost>,
}

impl Calculator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                scope: RwLock::new(BTreeMap::new()),
                config: RwLock::new(config),
                pool: WorkerPool::default(),
            }),
        }
    }

    /// Current value of a variable
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.scope().get(name).cloned()
    }

    /// Forget every definition, keeping settings
    pub fn clear_definitions(&self) {
        self.scope_mut().clear();
    }

    /// Background evaluations currently running
    pub fn active_background(&self) -> usize {
        self.inner.pool.active()
    }

    fn scope(&self) -> RwLockReadGuard<'_, BTreeMap<String, Value>> {
        self.inner.scope.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn scope_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Value>> {
        self.inner.scope.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn settings(&self) -> RwLockReadGuard<'_, EngineConfig> {
        self.inner.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, statement: &Stmt, ctx: &Context<'_>) -> Result<Value, EvalError> {
        match statement {
            Stmt::Let(name, expr) => {
                let value = self.evaluate(expr, ctx)?;
                self.scope_mut().insert(name.clone(), value.clone());
                Ok(value)
            }
            Stmt::Assign(name, expr) => {
                let value = self.evaluate(expr, ctx)?;
                let mut scope = self.scope_mut();
                if ctx.config.explicit && !scope.contains_key(name) {
                    return Err(EvalError::Undeclared(name.clone()));
                }
                scope.insert(name.clone(), value.clone());
                Ok(value)
            }
            Stmt::Return(expr) | Stmt::Expr(expr) => self.evaluate(expr, ctx),
        }
    }

    fn evaluate(&self, expr: &Expr, ctx: &Context<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Number { value, sigfigs } => Ok(Value::Number(Number {
                value: *value,
                sigfigs: ctx.config.significant_figures.then_some(*sigfigs),
            })),
            Expr::Str(text) => Ok(Value::Text(text.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => self.lookup(name),
            Expr::Neg(inner) => match self.evaluate(inner, ctx)? {
                Value::Number(n) => Ok(Value::Number(Number {
                    value: -n.value,
                    sigfigs: n.sigfigs,
                })),
                other => Err(type_error("negate", &other)),
            },
            Expr::Not(inner) => match self.evaluate(inner, ctx)? {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(type_error("apply 'not' to", &other)),
            },
            Expr::Binary(BinOp::And, left, right) => {
                if !self.truth(left, ctx)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.truth(right, ctx)?))
            }
            Expr::Binary(BinOp::Or, left, right) => {
                if self.truth(left, ctx)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.truth(right, ctx)?))
            }
            Expr::Binary(op, left, right) => {
                let left = self.evaluate(left, ctx)?;
                let right = self.evaluate(right, ctx)?;
                binary(*op, left, right, ctx.config)
            }
            Expr::Call(name, args) => self.call(name, args, ctx),
        }
    }

    fn truth(&self, expr: &Expr, ctx: &Context<'_>) -> Result<bool, EvalError> {
        match self.evaluate(expr, ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_error("use as a condition", &other)),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.scope().get(name) {
            return Ok(value.clone());
        }
        match name {
            "pi" => Ok(Value::number(std::f64::consts::PI)),
            "e" => Ok(Value::number(std::f64::consts::E)),
            _ => Err(EvalError::Undefined(name.to_string())),
        }
    }

    fn call(&self, name: &str, args: &[Expr], ctx: &Context<'_>) -> Result<Value, EvalError> {
        let values = args
            .iter()
            .map(|arg| self.evaluate(arg, ctx))
            .collect::<Result<Vec<_>, _>>()?;

        match name {
            "print" | "write" => {
                let mut text = values
                    .iter()
                    .map(|v| v.render(ctx.config))
                    .collect::<Vec<_>>()
                    .join(" ");
                if name == "print" {
                    text.push('\n');
                }
                ctx.host.notify(EngineEvent::Output(text));
                Ok(Value::Unit)
            }
            "read" => {
                arity(name, &values, 0, 0)?;
                input_text(ctx, InputRequest::ReadWord)
            }
            "readline" => {
                arity(name, &values, 0, 0)?;
                input_text(ctx, InputRequest::ReadLine)
            }
            "readchar" => {
                arity(name, &values, 0, 0)?;
                input_text(ctx, InputRequest::ReadChar)
            }
            "confirm" => {
                arity(name, &values, 0, 2)?;
                let vocabulary = match values.get(1) {
                    Some(Value::Text(kind)) if kind.eq_ignore_ascii_case("ok") => {
                        ConfirmVocabulary::OkCancel
                    }
                    _ => ConfirmVocabulary::YesNo,
                };
                if let Some(message) = values.first() {
                    ctx.host
                        .notify(EngineEvent::Output(format!("{}\n", message.render(ctx.config))));
                }
                match request(ctx, InputRequest::Confirm(vocabulary))? {
                    InputValue::Bool(b) => Ok(Value::Bool(b)),
                    other => Err(EvalError::Input(format!("unexpected answer {:?}", other))),
                }
            }
            "clear" => {
                arity(name, &values, 0, 0)?;
                ctx.host.notify(EngineEvent::ClearConsole);
                Ok(Value::Unit)
            }
            "exit" => {
                arity(name, &values, 0, 0)?;
                ctx.host.notify(EngineEvent::ExitRequested);
                Ok(Value::Unit)
            }
            "run" => {
                arity(name, &values, 1, 1)?;
                match &values[0] {
                    Value::Text(source) => self.spawn_background(source.clone(), ctx),
                    other => Err(type_error("run", other)),
                }
            }
            "threads" => {
                arity(name, &values, 0, 0)?;
                Ok(Value::number(self.inner.pool.active() as f64))
            }
            "num" => {
                arity(name, &values, 1, 1)?;
                match &values[0] {
                    Value::Number(n) => Ok(Value::Number(*n)),
                    Value::Text(text) => text
                        .trim()
                        .parse::<f64>()
                        .map(Value::number)
                        .map_err(|_| EvalError::Type(format!("'{}' is not a number", text))),
                    other => Err(type_error("convert to number", other)),
                }
            }
            "str" => {
                arity(name, &values, 1, 1)?;
                Ok(Value::Text(values[0].render(ctx.config)))
            }
            _ => math(name, &values, ctx.config),
        }
    }

    fn spawn_background(&self, source: String, ctx: &Context<'_>) -> Result<Value, EvalError> {
        let limit = ctx.config.max_threads;
        let permit = self.inner.pool.acquire(limit);
        let calculator = self.clone();
        let host = Arc::clone(ctx.host);

        thread::Builder::new()
            .name("cantus-run".to_string())
            .spawn(move || {
                let _permit = permit;
                let text = match calculator.eval(&source, EvalMode::ReturnedOnly, &host) {
                    Ok(text) => text,
                    Err(e) => format!("Error: {}", e),
                };
                host.notify(EngineEvent::Output(format!("{}\n", text)));
            })
            .map_err(|e| EvalError::Internal(format!("could not start background run: {}", e)))?;

        Ok(Value::Unit)
    }
}

impl Evaluator for Calculator {
    fn eval(
        &self,
        source: &str,
        mode: EvalMode,
        host: &Arc<dyn EngineHost>,
    ) -> Result<String, EvalError> {
        let program = parse(source)?;
        let config = self.config();
        let ctx = Context {
            config: &config,
            host,
        };

        let mut shown = Vec::new();
        let mut last = Value::Unit;

        for statement in &program {
            last = self.execute(statement, &ctx)?;
            if mode == EvalMode::Direct && last != Value::Unit {
                shown.push(last.render(&config));
            }
            if matches!(statement, Stmt::Return(_)) {
                break;
            }
        }

        Ok(match mode {
            EvalMode::Direct => shown.join("\n"),
            EvalMode::ReturnedOnly => last.render(&config),
        })
    }

    fn to_script(&self) -> String {
        let scope = self.scope();
        let mut script = String::new();
        for (name, value) in scope.iter() {
            script.push_str(&format!("let {} = {}\n", name, value.to_literal()));
        }
        script
    }

    fn config(&self) -> EngineConfig {
        self.settings().clone()
    }

    fn set_config(&self, config: EngineConfig) {
        *self.inner.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }
}

fn type_error(action: &str, value: &Value) -> EvalError {
    EvalError::Type(format!("cannot {} a {}", action, value.type_name()))
}

fn arity(name: &str, values: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if values.len() < min || values.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        };
        return Err(EvalError::Arity {
            name: name.to_string(),
            expected,
            found: values.len(),
        });
    }
    Ok(())
}

fn request(ctx: &Context<'_>, request: InputRequest) -> Result<InputValue, EvalError> {
    ctx.host
        .request_input(request)
        .map_err(|e| EvalError::Input(e.to_string()))
}

fn input_text(ctx: &Context<'_>, kind: InputRequest) -> Result<Value, EvalError> {
    Ok(match request(ctx, kind)? {
        InputValue::Text(text) => Value::Text(text),
        InputValue::Char(c) => Value::Text(c.to_string()),
        InputValue::Bool(b) => Value::Bool(b),
    })
}

fn binary(op: BinOp, left: Value, right: Value, config: &EngineConfig) -> Result<Value, EvalError> {
    match (op, &left, &right) {
        (BinOp::Eq, _, _) => return Ok(Value::Bool(values_equal(&left, &right))),
        (BinOp::Ne, _, _) => return Ok(Value::Bool(!values_equal(&left, &right))),
        (BinOp::Add, Value::Text(_), _) | (BinOp::Add, _, Value::Text(_)) => {
            return Ok(Value::Text(format!(
                "{}{}",
                left.render(config),
                right.render(config)
            )));
        }
        (BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge, Value::Text(a), Value::Text(b)) => {
            return Ok(Value::Bool(compare(op, a.as_str().cmp(b.as_str()))));
        }
        _ => {}
    }

    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (a, b),
        (Value::Number(_), other) | (other, _) => {
            return Err(type_error("do arithmetic on", &other));
        }
    };

    let value = match op {
        BinOp::Add => a.value + b.value,
        BinOp::Sub => a.value - b.value,
        BinOp::Mul => a.value * b.value,
        BinOp::Div => {
            if b.value == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a.value / b.value
        }
        BinOp::Rem => {
            if b.value == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a.value % b.value
        }
        BinOp::Pow => a.value.powf(b.value),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = a
                .value
                .partial_cmp(&b.value)
                .ok_or_else(|| EvalError::Type("cannot compare NaN".to_string()))?;
            return Ok(Value::Bool(compare(op, ordering)));
        }
        BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or => {
            return Err(EvalError::Internal(format!("{:?} reached arithmetic", op)));
        }
    };

    Ok(Value::Number(a.combine(b, value)))
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.value == b.value,
        _ => left == right,
    }
}

fn compare(op: BinOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        BinOp::Lt => ordering == Less,
        BinOp::Le => ordering != Greater,
        BinOp::Gt => ordering == Greater,
        BinOp::Ge => ordering != Less,
        _ => false,
    }
}

fn math(name: &str, values: &[Value], config: &EngineConfig) -> Result<Value, EvalError> {
    let numbers = values
        .iter()
        .map(|v| match v {
            Value::Number(n) => Ok(*n),
            other => Err(type_error(&format!("pass to {}", name), other)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let unary = |f: fn(f64) -> f64| -> Result<Value, EvalError> {
        arity(name, values, 1, 1)?;
        let n = numbers[0];
        Ok(Value::Number(Number {
            value: f(n.value),
            sigfigs: n.sigfigs,
        }))
    };

    let angle = config.angle;
    let trig = |f: fn(f64) -> f64| -> Result<Value, EvalError> {
        arity(name, values, 1, 1)?;
        Ok(Value::Number(Number {
            value: f(angle.to_radians(numbers[0].value)),
            sigfigs: numbers[0].sigfigs,
        }))
    };
    let inverse_trig = |f: fn(f64) -> f64| -> Result<Value, EvalError> {
        arity(name, values, 1, 1)?;
        Ok(Value::Number(Number {
            value: angle.from_radians(f(numbers[0].value)),
            sigfigs: numbers[0].sigfigs,
        }))
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "abs" => unary(f64::abs),
        "ln" => unary(f64::ln),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "sin" => trig(f64::sin),
        "cos" => trig(f64::cos),
        "tan" => trig(f64::tan),
        "asin" => inverse_trig(f64::asin),
        "acos" => inverse_trig(f64::acos),
        "atan" => inverse_trig(f64::atan),
        "log" => {
            arity(name, values, 1, 2)?;
            let base = numbers.get(1).map_or(10.0, |b| b.value);
            Ok(Value::Number(Number {
                value: numbers[0].value.log(base),
                sigfigs: numbers[0].sigfigs,
            }))
        }
        "round" => {
            arity(name, values, 1, 2)?;
            let digits = numbers.get(1).map_or(0.0, |d| d.value.trunc());
            let factor = 10f64.powf(digits);
            Ok(Value::Number(Number {
                value: (numbers[0].value * factor).round() / factor,
                sigfigs: numbers[0].sigfigs,
            }))
        }
        "min" | "max" => {
            if numbers.is_empty() {
                return Err(EvalError::Arity {
                    name: name.to_string(),
                    expected: "at least 1".to_string(),
                    found: 0,
                });
            }
            let pick_max = name == "max";
            let best = numbers.iter().copied().fold(numbers[0], |best, n| {
                if (pick_max && n.value > best.value) || (!pick_max && n.value < best.value) {
                    n
                } else {
                    best
                }
            });
            Ok(Value::Number(best))
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}
