//! Tree-walking evaluator for toy script.
//!
//! The interpreter owns every scope in an arena, a budget [`Meter`], the
//! captured output lines, and a seeded generator behind `Math.random`.
//! Script has no way to reach the host: the only globals are `console`,
//! `Math` and `Error`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::SandboxError;
use crate::ast::{BinaryOp, Body, Expr, LogicalOp, Stmt, Target, UnaryOp};
use crate::budget::{Budget, Meter};
use crate::value::{
    Binding, Builtin, Closure, Scope, ScopeId, Value, as_index, format_log_args, format_number,
    length_number, loose_equals, strict_equals,
};

/// Longest string a run may build.
pub const MAX_STRING_LEN: usize = 1 << 20;

/// Longest array a run may build.
pub const MAX_ARRAY_LEN: usize = 1 << 20;

const GLOBAL: ScopeId = ScopeId(0);

/// How a statement finished.
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// A resolved assignment target.
enum Place {
    Var(String),
    Element(Rc<RefCell<Vec<Value>>>, usize),
    Field(Rc<RefCell<Vec<(String, Value)>>>, String),
}

/// One run's evaluator state.
pub struct Interpreter {
    meter: Meter,
    scopes: Vec<Scope>,
    output: Vec<String>,
    rng: StdRng,
}

impl Interpreter {
    /// A fresh interpreter with the host globals bound.
    pub fn new(budget: Budget, seed: u64) -> Self {
        let mut globals = Scope::default();
        for (name, builtin) in [
            ("console", Builtin::Console),
            ("Math", Builtin::Math),
            ("Error", Builtin::Error),
        ] {
            globals.vars.insert(
                name.to_owned(),
                Binding {
                    value: Value::Builtin(builtin),
                    constant: true,
                },
            );
        }
        Self {
            meter: Meter::start(budget),
            scopes: vec![globals],
            output: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Run a parsed program in the global scope.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), SandboxError> {
        // A top-level `return` ends the program, as in a function body.
        self.exec_block(program, GLOBAL).map(|_| ())
    }

    /// Consume the interpreter, returning its output lines.
    pub fn into_output(self) -> Vec<String> {
        self.output
    }

    /// Budget totals so far.
    pub const fn meter(&self) -> &Meter {
        &self.meter
    }

    // -----------------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------------

    fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            vars: std::collections::HashMap::new(),
            parent: Some(parent),
        });
        id
    }

    fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
        constant: bool,
    ) -> Result<(), SandboxError> {
        let scope = self
            .scopes
            .get_mut(scope.0)
            .ok_or_else(|| SandboxError::Internal("scope vanished".to_owned()))?;
        if scope.vars.contains_key(name) {
            return Err(SandboxError::Redeclared(name.to_owned()));
        }
        scope
            .vars
            .insert(name.to_owned(), Binding { value, constant });
        Ok(())
    }

    fn binding(&mut self, scope: ScopeId, name: &str) -> Option<&mut Binding> {
        let mut current = Some(scope);
        let mut owner = None;
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if scope.vars.contains_key(name) {
                owner = Some(id);
                break;
            }
            current = scope.parent;
        }
        self.scopes.get_mut(owner?.0)?.vars.get_mut(name)
    }

    fn lookup(&mut self, scope: ScopeId, name: &str) -> Result<Value, SandboxError> {
        self.binding(scope, name)
            .map(|b| b.value.clone())
            .ok_or_else(|| SandboxError::Reference(name.to_owned()))
    }

    fn assign(&mut self, scope: ScopeId, name: &str, value: Value) -> Result<(), SandboxError> {
        let binding = self
            .binding(scope, name)
            .ok_or_else(|| SandboxError::Reference(name.to_owned()))?;
        if binding.constant {
            return Err(SandboxError::Type(
                "Assignment to constant variable.".to_owned(),
            ));
        }
        binding.value = value;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    /// Run `stmts` directly in `scope`, function declarations hoisted first.
    fn exec_block(&mut self, stmts: &[Stmt], scope: ScopeId) -> Result<Flow, SandboxError> {
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                let name = def.name.clone().unwrap_or_default();
                let closure = Value::Function(Rc::new(Closure {
                    def: Rc::clone(def),
                    scope,
                }));
                self.declare(scope, &name, closure, false)?;
            }
        }
        for stmt in stmts {
            match self.exec(stmt, scope)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    #[allow(clippy::too_many_lines)]
    fn exec(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<Flow, SandboxError> {
        self.meter.tick()?;
        match stmt {
            Stmt::Declare { bindings, constant } => {
                for (name, init) in bindings {
                    let value = match init {
                        Some(expr) => self.eval(expr, scope)?,
                        None => Value::Undefined,
                    };
                    self.declare(scope, name, value, *constant)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test, scope)?.truthy() {
                    self.exec(then, scope)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { test, body } => {
                while self.eval(test, scope)?.truthy() {
                    match self.exec(body, scope)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                let scope = self.push_scope(scope);
                if let Some(init) = init {
                    self.exec(init, scope)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, scope)?.truthy() {
                            break;
                        }
                    } else {
                        self.meter.tick()?;
                    }
                    match self.exec(body, scope)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval(update, scope)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForOf {
                name,
                constant,
                iterable,
                body,
            } => {
                let items: Vec<Value> = match self.eval(iterable, scope)? {
                    Value::Array(items) => items.borrow().clone(),
                    Value::Str(s) => {
                        self.meter.allocate(s.len())?;
                        s.chars().map(|c| Value::Str(c.to_string())).collect()
                    }
                    other => {
                        return Err(SandboxError::Type(format!(
                            "{} is not iterable",
                            other.to_js_string()
                        )));
                    }
                };
                for item in items {
                    let iteration = self.push_scope(scope);
                    self.declare(iteration, name, item, *constant)?;
                    match self.exec(body, iteration)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => {
                let inner = self.push_scope(scope);
                self.exec_block(stmts, inner)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Throw(expr) => {
                let message = match self.eval(expr, scope)? {
                    Value::Error(message) => message,
                    other => other.to_js_string(),
                };
                Err(SandboxError::Thrown(message))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn eval(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value, SandboxError> {
        self.meter.tick()?;
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Name(name) => self.lookup(scope, name),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|e| self.eval(e, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                self.charge(Value::array(values))
            }
            Expr::Object(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for (key, expr) in fields {
                    let value = self.eval(expr, scope)?;
                    set_field(&mut values, key, value);
                }
                self.meter.allocate(values.len())?;
                Ok(Value::Object(Rc::new(RefCell::new(values))))
            }
            Expr::Unary { op, operand } => self.unary(*op, operand, scope),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                let result = binary(*op, &left, &right)?;
                self.charge(result)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, scope)?;
                match (op, left.truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right, scope),
                }
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test, scope)?.truthy() {
                    self.eval(then, scope)
                } else {
                    self.eval(otherwise, scope)
                }
            }
            Expr::Assign { target, op, value } => {
                let place = self.resolve(target, scope)?;
                let value = match op {
                    None => self.eval(value, scope)?,
                    Some(op) => {
                        let current = self.load(&place, scope)?;
                        let rhs = self.eval(value, scope)?;
                        binary(*op, &current, &rhs)?
                    }
                };
                self.store(&place, scope, value.clone())?;
                Ok(value)
            }
            Expr::Update {
                target,
                increment,
                prefix,
            } => {
                let place = self.resolve(target, scope)?;
                let old = self.load(&place, scope)?.to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                self.store(&place, scope, Value::Number(new))?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Member { object, property } => {
                let object = self.eval(object, scope)?;
                get_property(&object, property)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                get_index(&object, &index)
            }
            Expr::Call { callee, args } => self.call_expr(callee, args, scope),
            Expr::Function(def) => Ok(Value::Function(Rc::new(Closure {
                def: Rc::clone(def),
                scope,
            }))),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, scope: ScopeId) -> Result<Value, SandboxError> {
        if op == UnaryOp::TypeOf {
            // `typeof` tolerates undeclared names.
            if let Expr::Name(name) = operand {
                if self.binding(scope, name).is_none() {
                    return Ok(Value::Str("undefined".to_owned()));
                }
            }
        }
        let value = self.eval(operand, scope)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::Negate => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::Str(value.type_name().to_owned()),
        })
    }

    // -----------------------------------------------------------------------
    // Assignment targets
    // -----------------------------------------------------------------------

    fn resolve(&mut self, target: &Target, scope: ScopeId) -> Result<Place, SandboxError> {
        match target {
            Target::Name(name) => Ok(Place::Var(name.clone())),
            Target::Member { object, property } => {
                let object = self.eval(object, scope)?;
                place_in(object, &Value::Str(property.clone()))
            }
            Target::Index { object, index } => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                place_in(object, &index)
            }
        }
    }

    fn load(&mut self, place: &Place, scope: ScopeId) -> Result<Value, SandboxError> {
        Ok(match place {
            Place::Var(name) => return self.lookup(scope, name),
            Place::Element(items, i) => items.borrow().get(*i).cloned().unwrap_or_default(),
            Place::Field(fields, key) => get_field(&fields.borrow(), key),
        })
    }

    fn store(&mut self, place: &Place, scope: ScopeId, value: Value) -> Result<(), SandboxError> {
        match place {
            Place::Var(name) => self.assign(scope, name, value)?,
            Place::Element(items, i) => {
                let mut items = items.borrow_mut();
                if *i >= items.len() {
                    self.meter.allocate(i.saturating_add(1).saturating_sub(items.len()))?;
                    items.resize(i.saturating_add(1), Value::Undefined);
                }
                if let Some(slot) = items.get_mut(*i) {
                    *slot = value;
                }
            }
            Place::Field(fields, key) => set_field(&mut fields.borrow_mut(), key, value),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------------

    fn call_expr(&mut self, callee: &Expr, args: &[Expr], scope: ScopeId) -> Result<Value, SandboxError> {
        if let Expr::Member { object, property } = callee {
            let receiver = self.eval(object, scope)?;
            let args = self.eval_args(args, scope)?;
            return self.call_method(&receiver, property, args, callee);
        }
        let function = self.eval(callee, scope)?;
        if !is_callable(&function) {
            return Err(SandboxError::Type(format!(
                "{} is not a function",
                describe(callee)
            )));
        }
        let args = self.eval_args(args, scope)?;
        self.call_value(&function, args)
    }

    fn eval_args(&mut self, args: &[Expr], scope: ScopeId) -> Result<Vec<Value>, SandboxError> {
        args.iter().map(|a| self.eval(a, scope)).collect()
    }

    fn call_value(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, SandboxError> {
        match function {
            Value::Function(closure) => self.call_closure(closure, args),
            Value::Builtin(Builtin::Error) => Ok(Value::Error(match args.first() {
                None | Some(Value::Undefined) => String::new(),
                Some(message) => message.to_js_string(),
            })),
            other => Err(SandboxError::Type(format!(
                "{} is not a function",
                other.to_js_string()
            ))),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, SandboxError> {
        self.meter.enter_call()?;
        let result = self.invoke(closure, args);
        self.meter.exit_call();
        result
    }

    fn invoke(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, SandboxError> {
        let scope = self.push_scope(closure.scope);
        let mut args = args.into_iter();
        for param in &closure.def.params {
            self.declare(scope, param, args.next().unwrap_or_default(), false)?;
        }
        match &closure.def.body {
            Body::Expr(expr) => self.eval(expr, scope),
            Body::Block(stmts) => match self.exec_block(stmts, scope)? {
                Flow::Return(value) => Ok(value),
                Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Undefined),
            },
        }
    }

    /// Call a script-supplied callback such as the argument of `map`.
    fn callback(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, SandboxError> {
        if !is_callable(function) {
            return Err(SandboxError::Type(format!(
                "{} is not a function",
                function.to_js_string()
            )));
        }
        self.call_value(function, args)
    }

    fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
        callee: &Expr,
    ) -> Result<Value, SandboxError> {
        let handled = match receiver {
            Value::Builtin(Builtin::Console) => self.console(name, &args)?,
            Value::Builtin(Builtin::Math) => self.math(name, &args),
            Value::Array(items) => self.array_method(items, name, args)?,
            Value::Str(s) => string_method(s, name, &args)?
                .map(|v| self.charge(v))
                .transpose()?,
            Value::Number(n) => number_method(*n, name, &args)?,
            Value::Object(fields) => {
                let method = get_field(&fields.borrow(), name);
                if is_callable(&method) {
                    Some(self.call_value(&method, args)?)
                } else {
                    None
                }
            }
            Value::Undefined | Value::Null => {
                return Err(SandboxError::Type(format!(
                    "Cannot read properties of {} (reading '{name}')",
                    receiver.to_js_string()
                )));
            }
            Value::Bool(_) | Value::Function(_) | Value::Builtin(Builtin::Error) | Value::Error(_) => {
                None
            }
        };
        handled.ok_or_else(|| SandboxError::Type(format!("{} is not a function", describe(callee))))
    }

    fn console(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, SandboxError> {
        let line = match name {
            "log" => format_log_args(args)?,
            "error" => {
                let parts: Vec<String> = args.iter().map(Value::to_js_string).collect();
                format!("ERROR: {}", parts.join(" "))
            }
            _ => return Ok(None),
        };
        self.meter.emit_line()?;
        self.output.push(line);
        Ok(Some(Value::Undefined))
    }

    fn math(&mut self, name: &str, args: &[Value]) -> Option<Value> {
        let arg = |i: usize| args.get(i).map_or(f64::NAN, Value::to_number);
        let n = match name {
            "floor" => arg(0).floor(),
            "ceil" => arg(0).ceil(),
            "round" => (arg(0) + 0.5).floor(),
            "trunc" => arg(0).trunc(),
            "abs" => arg(0).abs(),
            "sqrt" => arg(0).sqrt(),
            "sign" => {
                let x = arg(0);
                if x.is_nan() || x == 0.0 { x } else { x.signum() }
            }
            "pow" => arg(0).powf(arg(1)),
            "min" => fold_numbers(args, f64::INFINITY, f64::min),
            "max" => fold_numbers(args, f64::NEG_INFINITY, f64::max),
            "random" => self.rng.random::<f64>(),
            _ => return None,
        };
        Some(Value::Number(n))
    }

    #[allow(clippy::too_many_lines)]
    fn array_method(
        &mut self,
        items: &Rc<RefCell<Vec<Value>>>,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>, SandboxError> {
        let snapshot = || items.borrow().clone();
        let value = match name {
            "push" => {
                let mut items = items.borrow_mut();
                if items.len().saturating_add(args.len()) > MAX_ARRAY_LEN {
                    return Err(SandboxError::Type("Invalid array length".to_owned()));
                }
                self.meter.allocate(args.len())?;
                items.extend(args);
                Value::Number(length_number(items.len()))
            }
            "pop" => items.borrow_mut().pop().unwrap_or_default(),
            "map" | "filter" | "forEach" => {
                let function = args.into_iter().next().unwrap_or_default();
                let mut out = Vec::new();
                for (i, item) in snapshot().into_iter().enumerate() {
                    let index = Value::Number(length_number(i));
                    let result = self.callback(&function, vec![item.clone(), index])?;
                    match name {
                        "map" => out.push(result),
                        "filter" if result.truthy() => out.push(item),
                        _ => {}
                    }
                }
                if name == "forEach" {
                    Value::Undefined
                } else {
                    self.charge(Value::array(out))?
                }
            }
            "reduce" => {
                let mut args = args.into_iter();
                let function = args.next().unwrap_or_default();
                let mut rest = snapshot().into_iter().enumerate();
                let mut acc = match args.next() {
                    Some(initial) => initial,
                    None => match rest.next() {
                        Some((_, first)) => first,
                        None => {
                            return Err(SandboxError::Type(
                                "Reduce of empty array with no initial value".to_owned(),
                            ));
                        }
                    },
                };
                for (i, item) in rest {
                    let index = Value::Number(length_number(i));
                    acc = self.callback(&function, vec![acc, item, index])?;
                }
                acc
            }
            "join" => {
                let separator = match args.first() {
                    None | Some(Value::Undefined) => ",".to_owned(),
                    Some(sep) => sep.to_js_string(),
                };
                let joined = snapshot()
                    .iter()
                    .map(|v| match v {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.to_js_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(&separator);
                self.charge(checked_string(joined)?)?
            }
            "includes" => {
                let needle = args.first().cloned().unwrap_or_default();
                Value::Bool(items.borrow().iter().any(|v| same_value_zero(v, &needle)))
            }
            "indexOf" => {
                let needle = args.first().cloned().unwrap_or_default();
                let position = items.borrow().iter().position(|v| strict_equals(v, &needle));
                Value::Number(position.map_or(-1.0, length_number))
            }
            "slice" => {
                let all = snapshot();
                let (start, end) = slice_bounds(all.len(), args.first(), args.get(1));
                self.charge(Value::array(
                    all.get(start..end).map(<[Value]>::to_vec).unwrap_or_default(),
                ))?
            }
            "reverse" => {
                items.borrow_mut().reverse();
                Value::Array(Rc::clone(items))
            }
            "sort" => {
                let comparator = args.into_iter().next();
                let sorted = self.sort(snapshot(), comparator.as_ref())?;
                *items.borrow_mut() = sorted;
                Value::Array(Rc::clone(items))
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Count a freshly built string or array against the allocation budget.
    fn charge(&mut self, value: Value) -> Result<Value, SandboxError> {
        let units = match &value {
            Value::Str(s) => s.len(),
            Value::Array(items) => items.borrow().len(),
            _ => 0,
        };
        self.meter.allocate(units)?;
        Ok(value)
    }

    /// Stable insertion sort driven by a script comparator, or by string
    /// order when none is given.
    fn sort(&mut self, mut values: Vec<Value>, comparator: Option<&Value>) -> Result<Vec<Value>, SandboxError> {
        for i in 1..values.len() {
            let mut j = i;
            while j > 0 {
                let before = j.saturating_sub(1);
                let (Some(a), Some(b)) = (values.get(before), values.get(j)) else {
                    break;
                };
                let ordering = match comparator {
                    Some(f) => {
                        let result = self.callback(f, vec![a.clone(), b.clone()])?.to_number();
                        if result > 0.0 { Ordering::Greater } else { Ordering::Less }
                    }
                    None => a.to_js_string().cmp(&b.to_js_string()),
                };
                if ordering != Ordering::Greater {
                    break;
                }
                values.swap(before, j);
                j = before;
            }
        }
        Ok(values)
    }
}

// ---------------------------------------------------------------------------
// Value operations
// ---------------------------------------------------------------------------

const fn is_callable(value: &Value) -> bool {
    matches!(value, Value::Function(_) | Value::Builtin(Builtin::Error))
}

fn checked_string(s: String) -> Result<Value, SandboxError> {
    if s.len() > MAX_STRING_LEN {
        return Err(SandboxError::Type("Invalid string length".to_owned()));
    }
    Ok(Value::Str(s))
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, SandboxError> {
    let numbers = || (left.to_number(), right.to_number());
    let compare = || match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => {
            let (a, b) = numbers();
            a.partial_cmp(&b)
        }
    };
    Ok(match op {
        BinaryOp::Add => {
            let stringy = |v: &Value| !matches!(v, Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_));
            if stringy(left) || stringy(right) {
                let mut s = left.to_js_string();
                s.push_str(&right.to_js_string());
                return checked_string(s);
            }
            let (a, b) = numbers();
            Value::Number(a + b)
        }
        BinaryOp::Sub => {
            let (a, b) = numbers();
            Value::Number(a - b)
        }
        BinaryOp::Mul => {
            let (a, b) = numbers();
            Value::Number(a * b)
        }
        BinaryOp::Div => {
            let (a, b) = numbers();
            Value::Number(a / b)
        }
        BinaryOp::Rem => {
            let (a, b) = numbers();
            Value::Number(a % b)
        }
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_equals(left, right)),
        BinaryOp::LooseEq => Value::Bool(loose_equals(left, right)),
        BinaryOp::LooseNe => Value::Bool(!loose_equals(left, right)),
        BinaryOp::Lt => Value::Bool(compare() == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(compare(), Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Gt => Value::Bool(compare() == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(compare(), Some(Ordering::Greater | Ordering::Equal))),
    })
}

fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(Value::to_number).fold(init, |acc, x| {
        if acc.is_nan() || x.is_nan() { f64::NAN } else { pick(acc, x) }
    })
}

/// Resolve `start`/`end` arguments of `slice` against `len`, negative values
/// counting from the end.
fn slice_bounds(len: usize, start: Option<&Value>, end: Option<&Value>) -> (usize, usize) {
    let resolve = |arg: Option<&Value>, default: usize| -> usize {
        let n = match arg {
            None | Some(Value::Undefined) => return default,
            Some(v) => v.to_number().trunc(),
        };
        if n.is_nan() {
            return 0;
        }
        let len_f = length_number(len);
        let absolute = if n < 0.0 { (len_f + n).max(0.0) } else { n.min(len_f) };
        as_index(absolute).unwrap_or(0).min(len)
    };
    let start = resolve(start, 0);
    let end = resolve(end, len).max(start);
    (start, end)
}

fn get_field(fields: &[(String, Value)], key: &str) -> Value {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn set_field(fields: &mut Vec<(String, Value)>, key: &str, value: Value) {
    match fields.iter_mut().find(|(k, _)| k == key) {
        Some((_, slot)) => *slot = value,
        None => fields.push((key.to_owned(), value)),
    }
}

fn get_property(object: &Value, name: &str) -> Result<Value, SandboxError> {
    Ok(match object {
        Value::Undefined | Value::Null => {
            return Err(SandboxError::Type(format!(
                "Cannot read properties of {} (reading '{name}')",
                object.to_js_string()
            )));
        }
        Value::Array(items) if name == "length" => Value::Number(length_number(items.borrow().len())),
        Value::Array(items) => match name.parse::<usize>() {
            Ok(i) => items.borrow().get(i).cloned().unwrap_or_default(),
            Err(_) => Value::Undefined,
        },
        Value::Str(s) if name == "length" => Value::Number(length_number(s.chars().count())),
        Value::Object(fields) => get_field(&fields.borrow(), name),
        Value::Builtin(Builtin::Math) => match name {
            "PI" => Value::Number(std::f64::consts::PI),
            "E" => Value::Number(std::f64::consts::E),
            _ => Value::Undefined,
        },
        Value::Error(message) => match name {
            "message" => Value::Str(message.clone()),
            "name" => Value::Str("Error".to_owned()),
            _ => Value::Undefined,
        },
        _ => Value::Undefined,
    })
}

fn get_index(object: &Value, index: &Value) -> Result<Value, SandboxError> {
    let position = match index {
        Value::Number(n) => as_index(*n),
        _ => None,
    };
    match (object, position) {
        (Value::Array(items), Some(i)) => Ok(items.borrow().get(i).cloned().unwrap_or_default()),
        (Value::Str(s), Some(i)) => Ok(s
            .chars()
            .nth(i)
            .map_or(Value::Undefined, |c| Value::Str(c.to_string()))),
        _ => get_property(object, &index.to_js_string()),
    }
}

fn place_in(object: Value, key: &Value) -> Result<Place, SandboxError> {
    match object {
        Value::Array(items) => {
            let Some(i) = (match key {
                Value::Number(n) => as_index(*n),
                Value::Str(s) => s.parse::<usize>().ok(),
                _ => None,
            }) else {
                return Err(SandboxError::Type(format!(
                    "Cannot set array property '{}'",
                    key.to_js_string()
                )));
            };
            if i >= MAX_ARRAY_LEN {
                return Err(SandboxError::Type("Invalid array length".to_owned()));
            }
            Ok(Place::Element(items, i))
        }
        Value::Object(fields) => Ok(Place::Field(fields, key.to_js_string())),
        other => Err(SandboxError::Type(format!(
            "Cannot set properties of {} (setting '{}')",
            other.to_js_string(),
            key.to_js_string()
        ))),
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Option<Value>, SandboxError> {
    let text_arg = |i: usize| args.get(i).map(Value::to_js_string).unwrap_or_default();
    Ok(Some(match name {
        "toUpperCase" => Value::Str(s.to_uppercase()),
        "toLowerCase" => Value::Str(s.to_lowercase()),
        "trim" => Value::Str(s.trim().to_owned()),
        "includes" => Value::Bool(s.contains(&text_arg(0))),
        "startsWith" => Value::Bool(s.starts_with(&text_arg(0))),
        "indexOf" => {
            let needle = text_arg(0);
            Value::Number(
                s.find(&needle)
                    .and_then(|byte| s.get(..byte))
                    .map_or(-1.0, |prefix| length_number(prefix.chars().count())),
            )
        }
        "charAt" => {
            let i = args.first().and_then(|v| as_index(v.to_number())).unwrap_or(0);
            Value::Str(s.chars().nth(i).map(String::from).unwrap_or_default())
        }
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::Str(s.to_owned())],
                Some(sep) => {
                    let sep = sep.to_js_string();
                    if sep.is_empty() {
                        s.chars().map(|c| Value::Str(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(|p| Value::Str(p.to_owned())).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "repeat" => {
            let count = args.first().and_then(|v| as_index(v.to_number())).unwrap_or(0);
            if s.len().saturating_mul(count) > MAX_STRING_LEN {
                return Err(SandboxError::Type("Invalid string length".to_owned()));
            }
            Value::Str(s.repeat(count))
        }
        _ => return Ok(None),
    }))
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Result<Option<Value>, SandboxError> {
    Ok(Some(match name {
        "toFixed" => {
            let digits = match args.first() {
                None | Some(Value::Undefined) => Some(0),
                Some(v) => as_index(v.to_number().trunc()).filter(|d| *d <= 100),
            };
            let Some(digits) = digits else {
                return Err(SandboxError::Type(
                    "toFixed() digits argument must be between 0 and 100".to_owned(),
                ));
            };
            if !n.is_finite() {
                Value::Str(format_number(n))
            } else {
                Value::Str(format!("{n:.digits$}"))
            }
        }
        "toString" => Value::Str(format_number(n)),
        _ => return Ok(None),
    }))
}

/// Source-like text for a callee, used in "is not a function" messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => name.clone(),
        Expr::Member { object, property } => format!("{}.{property}", describe(object)),
        Expr::Index { object, .. } => format!("{}[...]", describe(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_owned(),
    }
}
