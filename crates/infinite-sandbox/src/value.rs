//! Runtime values and their console rendering.
//!
//! Arrays and objects are shared, mutable references like their browser
//! counterparts; everything else is copied. Scopes live in an arena owned by
//! the interpreter, so closures refer to them by index and never form
//! reference cycles.
//!
//! Rendering follows the browser console: numbers without a trailing `.0`,
//! arrays joined by commas when converted to strings, and pretty JSON when
//! logged on their own.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::SandboxError;
use crate::ast::FunctionDef;

/// Deepest array or object nesting rendered before giving up.
const MAX_RENDER_DEPTH: u32 = 64;

/// Index of a scope in the interpreter's scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(pub usize);

/// A variable binding.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Current value.
    pub value: Value,
    /// Declared with `const`.
    pub constant: bool,
}

/// One lexical scope.
#[derive(Debug, Default)]
pub struct Scope {
    /// Names declared here.
    pub vars: HashMap<String, Binding>,
    /// Enclosing scope.
    pub parent: Option<ScopeId>,
}

/// A user function and the scope it closes over.
#[derive(Debug)]
pub struct Closure {
    /// The function's code.
    pub def: Rc<FunctionDef>,
    /// Captured scope.
    pub scope: ScopeId,
}

/// Host-provided objects reachable from script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `console.log` / `console.error`.
    Console,
    /// `Math.*`.
    Math,
    /// `Error(message)` constructor.
    Error,
}

/// A script value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// `undefined`.
    #[default]
    Undefined,
    /// `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// String.
    Str(String),
    /// Shared array.
    Array(Rc<RefCell<Vec<Self>>>),
    /// Shared object with keys in insertion order.
    Object(Rc<RefCell<Vec<(String, Self)>>>),
    /// User function.
    Function(Rc<Closure>),
    /// Host object.
    Builtin(Builtin),
    /// An `Error` instance carrying its message.
    Error(String),
}

impl Value {
    /// A new array value.
    pub fn array(items: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(items)))
    }

    /// Truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => !(n.is_nan() || *n == 0.0),
            Self::Str(s) => !s.is_empty(),
            Self::Array(_)
            | Self::Object(_)
            | Self::Function(_)
            | Self::Builtin(_)
            | Self::Error(_) => true,
        }
    }

    /// Numeric conversion.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Self::Array(items) => {
                let items = items.borrow();
                match items.as_slice() {
                    [] => 0.0,
                    [only] => only.to_number(),
                    _ => f64::NAN,
                }
            }
            Self::Undefined
            | Self::Object(_)
            | Self::Function(_)
            | Self::Builtin(_)
            | Self::Error(_) => f64::NAN,
        }
    }

    /// `typeof` result.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Function(_) | Self::Builtin(Builtin::Error) => "function",
            Self::Null | Self::Array(_) | Self::Object(_) | Self::Builtin(_) | Self::Error(_) => {
                "object"
            }
        }
    }

    /// Whether the console logs this value as JSON.
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Null | Self::Array(_) | Self::Object(_))
    }

    /// String conversion, as `String(value)` does.
    pub fn to_js_string(&self) -> String {
        self.render_string(0)
    }

    fn render_string(&self, depth: u32) -> String {
        match self {
            Self::Undefined => "undefined".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Str(s) => s.clone(),
            Self::Array(items) => {
                if depth >= MAX_RENDER_DEPTH {
                    return String::new();
                }
                items
                    .borrow()
                    .iter()
                    .map(|v| match v {
                        Self::Undefined | Self::Null => String::new(),
                        other => other.render_string(depth.saturating_add(1)),
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
            Self::Object(_) => "[object Object]".to_owned(),
            Self::Function(f) => {
                format!("function {}() {{ [code] }}", f.def.name.as_deref().unwrap_or_default())
            }
            Self::Builtin(b) => match b {
                Builtin::Console => "[object console]".to_owned(),
                Builtin::Math => "[object Math]".to_owned(),
                Builtin::Error => "function Error() { [native code] }".to_owned(),
            },
            Self::Error(message) if message.is_empty() => "Error".to_owned(),
            Self::Error(message) => format!("Error: {message}"),
        }
    }

    /// JSON conversion, as `JSON.stringify` does. `None` for values JSON
    /// omits (`undefined`, functions).
    pub fn to_json(&self) -> Result<Option<serde_json::Value>, SandboxError> {
        self.json_at(0)
    }

    fn json_at(&self, depth: u32) -> Result<Option<serde_json::Value>, SandboxError> {
        if depth > MAX_RENDER_DEPTH {
            return Err(SandboxError::Type(
                "Converting circular structure to JSON".to_owned(),
            ));
        }
        let next = depth.saturating_add(1);
        let json = match self {
            Self::Undefined | Self::Function(_) | Self::Builtin(Builtin::Error) => return Ok(None),
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_json(*n),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(
                items
                    .borrow()
                    .iter()
                    .map(|v| v.json_at(next).map(|j| j.unwrap_or(serde_json::Value::Null)))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Object(fields) => {
                let mut map = serde_json::Map::new();
                for (key, value) in fields.borrow().iter() {
                    if let Some(json) = value.json_at(next)? {
                        map.insert(key.clone(), json);
                    }
                }
                serde_json::Value::Object(map)
            }
            Self::Builtin(_) | Self::Error(_) => serde_json::Value::Object(serde_json::Map::new()),
        };
        Ok(Some(json))
    }
}

/// Integral numbers serialize without a fraction, as the browser does.
fn number_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if let Some(i) = exact_integer(n) {
        return serde_json::Value::from(i);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Largest integer every `f64` below it represents exactly.
const SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// `n` as an `i64` when it is integral and exactly representable.
#[allow(clippy::cast_possible_truncation)]
pub fn exact_integer(n: f64) -> Option<i64> {
    (n.fract() == 0.0 && n.abs() <= SAFE_INTEGER).then(|| n as i64)
}

/// `n` as an index when it is a non-negative integer.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn as_index(n: f64) -> Option<usize> {
    (n.fract() == 0.0 && (0.0..=SAFE_INTEGER).contains(&n)).then(|| n as usize)
}

/// A length as a script number.
pub fn length_number(len: usize) -> f64 {
    u32::try_from(len).map_or(f64::from(u32::MAX), f64::from)
}

/// Number to string, as the browser does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

/// Exact numeric equality.
#[allow(clippy::float_cmp)]
pub fn same_number(a: f64, b: f64) -> bool {
    a == b
}

/// `===`
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => same_number(*x, *y),
        (Value::Str(x), Value::Str(y)) | (Value::Error(x), Value::Error(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => x == y,
        _ => false,
    }
}

/// `==`
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(_) | Value::Str(_) | Value::Bool(_), Value::Number(_) | Value::Bool(_))
        | (Value::Number(_) | Value::Bool(_), Value::Str(_)) => {
            same_number(a.to_number(), b.to_number())
        }
        _ => strict_equals(a, b),
    }
}

/// Render `console.log` arguments: objects as pretty JSON, everything else
/// as its string form, separated by spaces.
pub fn format_log_args(args: &[Value]) -> Result<String, SandboxError> {
    let parts = args
        .iter()
        .map(|arg| {
            if arg.is_object() {
                let json = arg.to_json()?.unwrap_or(serde_json::Value::Null);
                serde_json::to_string_pretty(&json)
                    .map_err(|e| SandboxError::Type(format!("Unable to render value: {e}")))
            } else {
                Ok(arg.to_js_string())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(" "))
}
