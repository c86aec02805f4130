//! Recursive-descent parser for toy script.
//!
//! Semicolons are optional. Binary operators are parsed by precedence
//! level, lowest first; assignment and the conditional operator are right
//! associative. Nesting depth is capped so hostile input cannot exhaust the
//! interpreter thread's stack.

use std::rc::Rc;

use crate::SandboxError;
use crate::ast::{BinaryOp, Body, Expr, FunctionDef, LogicalOp, Stmt, Target, UnaryOp};
use crate::lexer::{Token, TokenKind, tokenize};

/// Deepest statement or expression nesting accepted.
pub const MAX_NESTING: u32 = 128;

const RESERVED: &[&str] = &[
    "let", "const", "var", "function", "if", "else", "while", "for", "return", "break",
    "continue", "throw", "new", "typeof", "true", "false", "null", "undefined", "of",
];

static END: Token = Token {
    kind: TokenKind::Eof,
    line: 0,
};

#[derive(Clone, Copy)]
enum Infix {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

impl Infix {
    fn build(self, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Self::Logical(op) => Expr::Logical { op, left, right },
            Self::Binary(op) => Expr::Binary { op, left, right },
        }
    }
}

/// Binary precedence levels, loosest first.
const LEVELS: &[&[(&str, Infix)]] = &[
    &[("||", Infix::Logical(LogicalOp::Or))],
    &[("&&", Infix::Logical(LogicalOp::And))],
    &[
        ("===", Infix::Binary(BinaryOp::StrictEq)),
        ("!==", Infix::Binary(BinaryOp::StrictNe)),
        ("==", Infix::Binary(BinaryOp::LooseEq)),
        ("!=", Infix::Binary(BinaryOp::LooseNe)),
    ],
    &[
        ("<", Infix::Binary(BinaryOp::Lt)),
        ("<=", Infix::Binary(BinaryOp::Le)),
        (">", Infix::Binary(BinaryOp::Gt)),
        (">=", Infix::Binary(BinaryOp::Ge)),
    ],
    &[("+", Infix::Binary(BinaryOp::Add)), ("-", Infix::Binary(BinaryOp::Sub))],
    &[
        ("*", Infix::Binary(BinaryOp::Mul)),
        ("/", Infix::Binary(BinaryOp::Div)),
        ("%", Infix::Binary(BinaryOp::Rem)),
    ],
];

/// Parse a whole program.
pub fn parse(src: &str) -> Result<Vec<Stmt>, SandboxError> {
    let mut parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
        depth: 0,
    };
    let mut program = Vec::new();
    while !parser.at_end() {
        program.push(parser.statement()?);
    }
    Ok(program)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
}

impl Parser {
    // -----------------------------------------------------------------------
    // Token cursor
    // -----------------------------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos.saturating_add(offset))
            .unwrap_or(&END)
    }

    fn previous_line(&self) -> u32 {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.line)
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos = self.pos.saturating_add(1);
        }
        token
    }

    fn eat(&mut self, p: &str) -> bool {
        let found = self.peek().is(p);
        if found {
            self.advance();
        }
        found
    }

    fn expect(&mut self, p: &str) -> Result<(), SandboxError> {
        if self.eat(p) {
            Ok(())
        } else {
            Err(unexpected(self.peek()))
        }
    }

    fn name(&mut self) -> Result<String, SandboxError> {
        match &self.peek().kind {
            TokenKind::Ident(w) if !RESERVED.contains(&w.as_str()) => {
                let w = w.clone();
                self.advance();
                Ok(w)
            }
            _ => Err(unexpected(self.peek())),
        }
    }

    fn enter(&mut self) -> Result<(), SandboxError> {
        self.depth = self.depth.saturating_add(1);
        if self.depth > MAX_NESTING {
            return Err(SandboxError::Syntax {
                line: self.peek().line,
                message: "Program nests too deeply".to_owned(),
            });
        }
        Ok(())
    }

    const fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn statement(&mut self) -> Result<Stmt, SandboxError> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> Result<Stmt, SandboxError> {
        let token = self.peek();
        if token.is("{") {
            return Ok(Stmt::Block(self.block()?));
        }
        if token.is(";") {
            self.advance();
            return Ok(Stmt::Empty);
        }
        let word = match &token.kind {
            TokenKind::Ident(w) => w.clone(),
            _ => String::new(),
        };
        let stmt = match word.as_str() {
            "let" | "const" | "var" => self.declaration()?,
            "function" => {
                self.advance();
                let name = self.name()?;
                Stmt::Function(Rc::new(self.function_rest(Some(name))?))
            }
            "if" => return self.if_statement(),
            "while" => {
                self.advance();
                self.expect("(")?;
                let test = self.expression()?;
                self.expect(")")?;
                let body = Box::new(self.statement()?);
                return Ok(Stmt::While { test, body });
            }
            "for" => return self.for_statement(),
            "return" => {
                let line = self.advance().line;
                let next = self.peek();
                let bare = next.is(";") || next.is("}") || self.at_end() || next.line != line;
                Stmt::Return(if bare { None } else { Some(self.expression()?) })
            }
            "break" => {
                self.advance();
                Stmt::Break
            }
            "continue" => {
                self.advance();
                Stmt::Continue
            }
            "throw" => {
                self.advance();
                Stmt::Throw(self.expression()?)
            }
            _ => Stmt::Expr(self.expression()?),
        };
        self.eat(";");
        Ok(stmt)
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SandboxError> {
        self.expect("{")?;
        let mut body = Vec::new();
        while !self.peek().is("}") {
            if self.at_end() {
                return Err(unexpected(self.peek()));
            }
            body.push(self.statement()?);
        }
        self.advance();
        Ok(body)
    }

    fn declaration(&mut self) -> Result<Stmt, SandboxError> {
        let constant = self.advance().is_word("const");
        let mut bindings = Vec::new();
        loop {
            let name = self.name()?;
            let init = if self.eat("=") {
                Some(self.expression()?)
            } else if constant {
                return Err(SandboxError::Syntax {
                    line: self.peek().line,
                    message: "Missing initializer in const declaration".to_owned(),
                });
            } else {
                None
            };
            bindings.push((name, init));
            if !self.eat(",") {
                return Ok(Stmt::Declare { bindings, constant });
            }
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, SandboxError> {
        self.advance();
        self.expect("(")?;
        let test = self.expression()?;
        self.expect(")")?;
        let then = Box::new(self.statement()?);
        let otherwise = if self.peek().is_word("else") {
            self.advance();
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            then,
            otherwise,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, SandboxError> {
        self.advance();
        self.expect("(")?;

        let declares = ["let", "const", "var"]
            .iter()
            .any(|w| self.peek().is_word(w));
        if declares && self.peek_at(2).is_word("of") {
            let constant = self.advance().is_word("const");
            let name = self.name()?;
            self.advance();
            let iterable = self.expression()?;
            self.expect(")")?;
            let body = Box::new(self.statement()?);
            return Ok(Stmt::ForOf {
                name,
                constant,
                iterable,
                body,
            });
        }

        let init = if self.eat(";") {
            None
        } else {
            let init = if declares {
                self.declaration()?
            } else {
                Stmt::Expr(self.expression()?)
            };
            self.expect(";")?;
            Some(Box::new(init))
        };
        let test = if self.peek().is(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(";")?;
        let update = if self.peek().is(")") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(")")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    /// Parameters and body after `function name`.
    fn function_rest(&mut self, name: Option<String>) -> Result<FunctionDef, SandboxError> {
        self.expect("(")?;
        let params = self.params()?;
        let body = Body::Block(self.block()?);
        Ok(FunctionDef { name, params, body })
    }

    /// A parameter list after its `(`, through the closing `)`.
    fn params(&mut self) -> Result<Vec<String>, SandboxError> {
        let mut params = Vec::new();
        while !self.eat(")") {
            params.push(self.name()?);
            if !self.eat(",") {
                self.expect(")")?;
                break;
            }
        }
        Ok(params)
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn expression(&mut self) -> Result<Expr, SandboxError> {
        self.enter()?;
        let expr = self.assignment();
        self.leave();
        expr
    }

    fn assignment(&mut self) -> Result<Expr, SandboxError> {
        if self.arrow_ahead() {
            return self.arrow();
        }
        let left = self.conditional()?;
        let TokenKind::Punct(p) = self.peek().kind else {
            return Ok(left);
        };
        let op = match p {
            "=" => None,
            other => match BinaryOp::compound(other) {
                Some(op) => Some(op),
                None => return Ok(left),
            },
        };
        let line = self.advance().line;
        let target = into_target(left, line, "assignment")?;
        let value = Box::new(self.expression()?);
        Ok(Expr::Assign { target, op, value })
    }

    fn arrow_ahead(&self) -> bool {
        let first = self.peek();
        if matches!(&first.kind, TokenKind::Ident(w) if !RESERVED.contains(&w.as_str())) {
            return self.peek_at(1).is("=>");
        }
        if !first.is("(") {
            return false;
        }
        let mut depth = 0_u32;
        let mut offset = 0_usize;
        loop {
            let token = self.peek_at(offset);
            if token.is("(") {
                depth = depth.saturating_add(1);
            } else if token.is(")") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return self.peek_at(offset.saturating_add(1)).is("=>");
                }
            } else if token.kind == TokenKind::Eof {
                return false;
            }
            offset = offset.saturating_add(1);
        }
    }

    fn arrow(&mut self) -> Result<Expr, SandboxError> {
        let params = if self.eat("(") {
            self.params()?
        } else {
            vec![self.name()?]
        };
        self.expect("=>")?;
        let body = if self.peek().is("{") {
            Body::Block(self.block()?)
        } else {
            Body::Expr(self.expression()?)
        };
        Ok(Expr::Function(Rc::new(FunctionDef {
            name: None,
            params,
            body,
        })))
    }

    fn conditional(&mut self) -> Result<Expr, SandboxError> {
        let test = self.binary(0)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let then = Box::new(self.expression()?);
        self.expect(":")?;
        let otherwise = Box::new(self.expression()?);
        Ok(Expr::Conditional {
            test: Box::new(test),
            then,
            otherwise,
        })
    }

    fn binary(&mut self, level: usize) -> Result<Expr, SandboxError> {
        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        let next = level.saturating_add(1);
        let mut left = self.binary(next)?;
        while let Some(&(_, infix)) = ops.iter().find(|(p, _)| self.peek().is(p)) {
            self.advance();
            let right = self.binary(next)?;
            left = infix.build(left, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, SandboxError> {
        self.enter()?;
        let expr = self.unary_inner();
        self.leave();
        expr
    }

    fn unary_inner(&mut self) -> Result<Expr, SandboxError> {
        let token = self.peek();
        let op = if token.is("!") {
            Some(UnaryOp::Not)
        } else if token.is("-") {
            Some(UnaryOp::Negate)
        } else if token.is("+") {
            Some(UnaryOp::Plus)
        } else if token.is_word("typeof") {
            Some(UnaryOp::TypeOf)
        } else {
            None
        };
        if let Some(op) = op {
            self.advance();
            return Ok(Expr::Unary {
                op,
                operand: Box::new(self.unary()?),
            });
        }

        if token.is("++") || token.is("--") {
            let token = self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Update {
                target: into_target(operand, token.line, "prefix operation")?,
                increment: token.is("++"),
                prefix: true,
            });
        }

        let expr = self.call_member()?;
        let next = self.peek();
        if (next.is("++") || next.is("--")) && next.line == self.previous_line() {
            let token = self.advance();
            return Ok(Expr::Update {
                target: into_target(expr, token.line, "postfix operation")?,
                increment: token.is("++"),
                prefix: false,
            });
        }
        Ok(expr)
    }

    fn call_member(&mut self) -> Result<Expr, SandboxError> {
        let mut expr = if self.peek().is_word("new") {
            self.advance();
            let callee = self.primary()?;
            let args = if self.eat("(") { self.arguments()? } else { Vec::new() };
            Expr::Call {
                callee: Box::new(callee),
                args,
            }
        } else {
            self.primary()?
        };

        loop {
            if self.eat(".") {
                let token = self.advance();
                let TokenKind::Ident(property) = token.kind else {
                    return Err(unexpected(&token));
                };
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat("[") {
                let index = Box::new(self.expression()?);
                self.expect("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index,
                };
            } else if self.eat("(") {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed.
    fn list(&mut self, close: &str) -> Result<Vec<Expr>, SandboxError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(",") {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, SandboxError> {
        self.list(")")
    }

    fn primary(&mut self) -> Result<Expr, SandboxError> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Number(n),
            TokenKind::Str(s) => Expr::Str(s),
            TokenKind::Punct("(") => {
                let inner = self.expression()?;
                self.expect(")")?;
                inner
            }
            TokenKind::Punct("[") => Expr::Array(self.list("]")?),
            TokenKind::Punct("{") => self.object()?,
            TokenKind::Ident(ref w) => match w.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                "function" => {
                    let name = if self.peek().is("(") { None } else { Some(self.name()?) };
                    Expr::Function(Rc::new(self.function_rest(name)?))
                }
                w if RESERVED.contains(&w) => return Err(unexpected(&token)),
                _ => Expr::Name(w.clone()),
            },
            _ => return Err(unexpected(&token)),
        };
        Ok(expr)
    }

    fn object(&mut self) -> Result<Expr, SandboxError> {
        let mut fields = Vec::new();
        while !self.eat("}") {
            let key_token = self.advance();
            let key = match &key_token.kind {
                TokenKind::Ident(w) | TokenKind::Str(w) => w.clone(),
                TokenKind::Number(n) => crate::value::format_number(*n),
                _ => return Err(unexpected(&key_token)),
            };
            let value = if self.eat(":") {
                self.expression()?
            } else {
                Expr::Name(key.clone())
            };
            fields.push((key, value));
            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        Ok(Expr::Object(fields))
    }
}

fn unexpected(token: &Token) -> SandboxError {
    let message = if token.kind == TokenKind::Eof {
        "Unexpected end of input".to_owned()
    } else {
        format!("Unexpected token '{}'", token.describe())
    };
    SandboxError::Syntax {
        line: token.line,
        message,
    }
}

fn into_target(expr: Expr, line: u32, context: &str) -> Result<Target, SandboxError> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Member { object, property } => Ok(Target::Member { object, property }),
        Expr::Index { object, index } => Ok(Target::Index { object, index }),
        _ => Err(SandboxError::Syntax {
            line,
            message: format!("Invalid left-hand side in {context}"),
        }),
    }
}
