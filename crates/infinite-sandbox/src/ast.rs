//! Syntax tree for toy script.

use std::rc::Rc;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `+`
    Plus,
    /// `typeof`
    TypeOf,
}

/// Binary operators that always evaluate both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNe,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl BinaryOp {
    /// The operator for a compound assignment token such as `+=`.
    pub fn compound(token: &str) -> Option<Self> {
        match token {
            "+=" => Some(Self::Add),
            "-=" => Some(Self::Sub),
            "*=" => Some(Self::Mul),
            "/=" => Some(Self::Div),
            "%=" => Some(Self::Rem),
            _ => None,
        }
    }
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Something that can be assigned to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A variable.
    Name(String),
    /// `object.property`
    Member {
        /// Object expression.
        object: Box<Expr>,
        /// Property name.
        property: String,
    },
    /// `object[index]`
    Index {
        /// Object expression.
        object: Box<Expr>,
        /// Index expression.
        index: Box<Expr>,
    },
}

/// A function body: a block, or the single expression of an arrow.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `x => expr`
    Expr(Expr),
}

/// A function literal or declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Declared name, if any.
    pub name: Option<String>,
    /// Parameter names.
    pub params: Vec<String>,
    /// The body.
    pub body: Body,
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Str(String),
    /// `true` / `false`.
    Bool(bool),
    /// `null`.
    Null,
    /// `undefined`.
    Undefined,
    /// Variable reference.
    Name(String),
    /// `[a, b, c]`
    Array(Vec<Self>),
    /// `{ key: value }`
    Object(Vec<(String, Self)>),
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Self>,
    },
    /// Arithmetic or comparison.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Self>,
        /// Right operand.
        right: Box<Self>,
    },
    /// `&&` / `||`.
    Logical {
        /// Operator.
        op: LogicalOp,
        /// Left operand.
        left: Box<Self>,
        /// Right operand, evaluated only when needed.
        right: Box<Self>,
    },
    /// `test ? then : otherwise`
    Conditional {
        /// Condition.
        test: Box<Self>,
        /// Value when truthy.
        then: Box<Self>,
        /// Value when falsy.
        otherwise: Box<Self>,
    },
    /// `target = value` or a compound assignment.
    Assign {
        /// Where the value goes.
        target: Target,
        /// Operator of a compound assignment.
        op: Option<BinaryOp>,
        /// Right-hand side.
        value: Box<Self>,
    },
    /// `++` / `--`.
    Update {
        /// Variable or element updated.
        target: Target,
        /// `++` when true.
        increment: bool,
        /// Prefix form yields the new value.
        prefix: bool,
    },
    /// `object.property`
    Member {
        /// Object expression.
        object: Box<Self>,
        /// Property name.
        property: String,
    },
    /// `object[index]`
    Index {
        /// Object expression.
        object: Box<Self>,
        /// Index expression.
        index: Box<Self>,
    },
    /// `callee(args)`
    Call {
        /// Function expression.
        callee: Box<Self>,
        /// Arguments.
        args: Vec<Self>,
    },
    /// Function or arrow literal.
    Function(Rc<FunctionDef>),
}

/// Statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let` / `const` / `var` declaration.
    Declare {
        /// Declared names and their initializers.
        bindings: Vec<(String, Option<Expr>)>,
        /// `const`.
        constant: bool,
    },
    /// Expression statement.
    Expr(Expr),
    /// `if (test) then else otherwise`
    If {
        /// Condition.
        test: Expr,
        /// Taken branch.
        then: Box<Self>,
        /// `else` branch.
        otherwise: Option<Box<Self>>,
    },
    /// `while (test) body`
    While {
        /// Condition.
        test: Expr,
        /// Loop body.
        body: Box<Self>,
    },
    /// `for (init; test; update) body`
    For {
        /// Runs once in the loop scope.
        init: Option<Box<Self>>,
        /// Checked before each iteration; absent means forever.
        test: Option<Expr>,
        /// Runs after each iteration.
        update: Option<Expr>,
        /// Loop body.
        body: Box<Self>,
    },
    /// `for (const name of iterable) body`
    ForOf {
        /// Loop variable, fresh per iteration.
        name: String,
        /// `const` binding.
        constant: bool,
        /// Array or string iterated.
        iterable: Expr,
        /// Loop body.
        body: Box<Self>,
    },
    /// `{ ... }`
    Block(Vec<Self>),
    /// `function name(...) { ... }`, hoisted within its block.
    Function(Rc<FunctionDef>),
    /// `return expr`
    Return(Option<Expr>),
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `throw expr`
    Throw(Expr),
    /// `;`
    Empty,
}
