//! Tokenizer for toy script.
//!
//! Produces a flat token list with line numbers. Line (`//`) and block
//! (`/* */`) comments are skipped. Keywords are lexed as identifiers and
//! recognized by the parser.

use crate::SandboxError;

/// Operators and punctuation, longest first so greedy matching works.
const PUNCTUATION: &[&str] = &[
    "===", "!==", "=>", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=",
    "%=", "+", "-", "*", "/", "%", "<", ">", "=", "!", "(", ")", "{", "}", "[", "]", ",", ";",
    ".", ":", "?",
];

/// What a token is.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal.
    Number(f64),
    /// String literal, escapes resolved.
    Str(String),
    /// Identifier or keyword.
    Ident(String),
    /// Operator or punctuation.
    Punct(&'static str),
    /// End of input.
    Eof,
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: u32,
}

impl Token {
    /// Whether this is the punctuation `p`.
    pub fn is(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }

    /// Whether this is the identifier or keyword `word`.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(w) if w == word)
    }

    /// Source-like rendering for error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Number(n) => crate::value::format_number(*n),
            TokenKind::Str(s) => format!("\"{s}\""),
            TokenKind::Ident(w) => w.clone(),
            TokenKind::Punct(p) => (*p).to_owned(),
            TokenKind::Eof => "end of input".to_owned(),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    fn rest(&self) -> &'a str {
        self.src.get(self.pos..).unwrap_or_default()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos = self.pos.saturating_add(c.len_utf8());
        if c == '\n' {
            self.line = self.line.saturating_add(1);
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SandboxError {
        SandboxError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SandboxError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_second()) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => return Err(self.error("Unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn number(&mut self) -> Result<TokenKind, SandboxError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let after = self.rest().get(1..).unwrap_or_default();
            let signed = after.starts_with(['+', '-']);
            let digits = if signed { after.get(1..).unwrap_or_default() } else { after };
            if digits.starts_with(|c: char| c.is_ascii_digit()) {
                self.bump();
                if signed {
                    self.bump();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let text = self.src.get(start..self.pos).unwrap_or_default();
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|e| self.error(format!("Invalid number '{text}': {e}")))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, SandboxError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("Invalid or unexpected token")),
                Some(c) if c == quote => return Ok(TokenKind::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('0') => out.push('\0'),
                    Some(other) => out.push(other),
                    None => return Err(self.error("Invalid or unexpected token")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.bump();
        }
        TokenKind::Ident(self.src.get(start..self.pos).unwrap_or_default().to_owned())
    }

    fn punct(&mut self) -> Result<TokenKind, SandboxError> {
        let rest = self.rest();
        let Some(&op) = PUNCTUATION.iter().find(|op| rest.starts_with(**op)) else {
            let c = self.peek().unwrap_or(' ');
            return Err(self.error(format!("Invalid or unexpected token '{c}'")));
        };
        self.pos = self.pos.saturating_add(op.len());
        Ok(TokenKind::Punct(op))
    }

    fn next_token(&mut self) -> Result<Token, SandboxError> {
        self.skip_trivia()?;
        let line = self.line;
        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(c) if c.is_ascii_digit() => self.number()?,
            Some('.') if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => self.number()?,
            Some(q @ ('"' | '\'')) => self.string(q)?,
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => self.ident(),
            Some(_) => self.punct()?,
        };
        Ok(Token { kind, line })
    }
}

/// Split `src` into tokens. The last token is always [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Token>, SandboxError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn greedy_operators() {
        assert_eq!(
            kinds("a === b => c++"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("==="),
                TokenKind::Ident("b".into()),
                TokenKind::Punct("=>"),
                TokenKind::Ident("c".into()),
                TokenKind::Punct("++"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_counted() {
        let tokens = tokenize("// one\n/* two\n */ x").unwrap();
        assert_eq!(tokens.first().map(|t| t.line), Some(3));
        assert!(tokens.first().is_some_and(|t| t.is_word("x")));
    }

    #[test]
    fn numbers_and_strings() {
        assert_eq!(
            kinds("1.5e2 'it\\'s' \"a\\nb\""),
            vec![
                TokenKind::Number(150.0),
                TokenKind::Str("it's".into()),
                TokenKind::Str("a\nb".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn member_access_after_number_is_not_a_fraction() {
        assert_eq!(
            kinds("(2).x"),
            vec![
                TokenKind::Punct("("),
                TokenKind::Number(2.0),
                TokenKind::Punct(")"),
                TokenKind::Punct("."),
                TokenKind::Ident("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        assert!(matches!(tokenize("'abc"), Err(SandboxError::Syntax { line: 1, .. })));
        assert!(matches!(tokenize("#"), Err(SandboxError::Syntax { .. })));
    }
}
