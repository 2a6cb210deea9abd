use mathex_lexer::{tokenize, Token};
use serde::{Deserialize, Serialize};

pub mod display;
pub mod latex;
pub mod precedence;
pub mod transform;

pub use precedence::{Assoc, Prec};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // Element-wise operations
    ElemMul, // .*
    ElemDiv, // ./
    ElemPow, // .^
    // Logical operations
    AndAnd, // && (short-circuit)
    OrOr,   // || (short-circuit)
    BitAnd, // &
    BitOr,  // |
    // Comparison operations
    Equal,        // ==
    NotEqual,     // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum UnOp {
    Plus,
    Minus,
    Not,    // !
    BitNot, // ~
}

/// One entry of a Block: the expression plus whether its result is part of
/// the visible output (`;`-terminated entries are suppressed).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BlockEntry {
    pub node: Node,
    pub visible: bool,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Node {
    Constant(Literal),
    Symbol(String),
    Unary(UnOp, Box<Node>),
    Binary(Box<Node>, BinOp, Box<Node>),
    FunctionCall {
        name: String,
        args: Vec<Node>,
    },
    /// `f(x, y) = body`
    FunctionAssign {
        name: String,
        params: Vec<String>,
        body: Box<Node>,
    },
    /// Target is a Symbol or an Index expression.
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    Conditional {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    /// `start:end` or `start:step:end`
    Range {
        start: Box<Node>,
        step: Option<Box<Node>>,
        end: Box<Node>,
    },
    /// `[1, 2; 3, 4]`, row-major
    Matrix(Vec<Vec<Node>>),
    /// One selector per dimension; `a.b` is Index with a string selector.
    Index {
        target: Box<Node>,
        dims: Vec<Node>,
    },
    /// `{key: value, ...}`, insertion order preserved
    Object(Vec<(String, Node)>),
    Block(Vec<BlockEntry>),
}

impl Node {
    pub fn number(n: f64) -> Node {
        Node::Constant(Literal::Number(n))
    }

    pub fn symbol(name: impl Into<String>) -> Node {
        Node::Symbol(name.into())
    }

    pub fn binary(lhs: Node, op: BinOp, rhs: Node) -> Node {
        Node::Binary(Box::new(lhs), op, Box::new(rhs))
    }

    pub fn unary(op: UnOp, operand: Node) -> Node {
        Node::Unary(op, Box::new(operand))
    }

    pub fn to_tex(&self) -> String {
        latex::to_tex(self)
    }
}

#[derive(Clone)]
struct TokenInfo {
    token: Token,
    lexeme: String,
    position: usize,
}

#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub found_token: Option<String>,
    pub expected: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at position {}: {}",
            self.position, self.message
        )?;
        if let Some(found) = &self.found_token {
            write!(f, " (found: '{found}')")?;
        }
        if let Some(expected) = &self.expected {
            write!(f, " (expected: {expected})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<mathex_lexer::LexError> for ParseError {
    fn from(e: mathex_lexer::LexError) -> Self {
        ParseError {
            message: format!("invalid character '{}'", e.character),
            position: e.offset,
            found_token: Some(e.character.to_string()),
            expected: None,
        }
    }
}

/// Parse one source string into a single tree: a lone expression as-is, or a
/// Block when the input has several statements or any `;` separator.
pub fn parse(input: &str) -> Result<Node, ParseError> {
    let toks = tokenize(input)?;
    let tokens = toks
        .into_iter()
        .map(|t| TokenInfo {
            token: t.token,
            lexeme: t.lexeme,
            position: t.start,
        })
        .collect();

    let mut parser = Parser {
        tokens,
        pos: 0,
        input: input.to_string(),
        nesting_level: 0,
        conditional_level: None,
    };
    parser.parse_program()
}

/// Parse several independent sources; the first failure aborts.
pub fn parse_many(inputs: &[&str]) -> Result<Vec<Node>, ParseError> {
    inputs.iter().map(|s| parse(s)).collect()
}

struct Parser {
    tokens: Vec<TokenInfo>,
    pos: usize,
    input: String,
    /// Bracket depth; newlines are separators only at depth 0.
    nesting_level: usize,
    /// Bracket depth of the innermost pending `? :`, so the range production
    /// leaves that `:` alone.
    conditional_level: Option<usize>,
}

impl Parser {
    fn parse_program(&mut self) -> Result<Node, ParseError> {
        let mut entries: Vec<BlockEntry> = Vec::new();
        let mut saw_semicolon = false;

        loop {
            while self.consume(&Token::Semicolon) || self.consume(&Token::Newline) {}
            if self.pos >= self.tokens.len() {
                break;
            }
            let node = self.parse_expr()?;
            let visible = if self.consume(&Token::Semicolon) {
                saw_semicolon = true;
                false
            } else if self.consume(&Token::Newline) || self.pos >= self.tokens.len() {
                true
            } else {
                return Err(self.error_with_expected(
                    "expected end of expression",
                    "';', newline or end of input",
                ));
            };
            entries.push(BlockEntry { node, visible });
        }

        if entries.is_empty() {
            return Err(self.error("unexpected end of input, expected expression"));
        }
        if entries.len() == 1 && !saw_semicolon {
            return Ok(entries.remove(0).node);
        }
        Ok(Node::Block(entries))
    }

    fn error(&self, message: &str) -> ParseError {
        let (position, found_token) = if let Some(token_info) = self.tokens.get(self.pos) {
            (token_info.position, Some(token_info.lexeme.clone()))
        } else {
            (self.input.len(), None)
        };

        ParseError {
            message: message.to_string(),
            position,
            found_token,
            expected: None,
        }
    }

    fn error_with_expected(&self, message: &str, expected: &str) -> ParseError {
        let (position, found_token) = if let Some(token_info) = self.tokens.get(self.pos) {
            (token_info.position, Some(token_info.lexeme.clone()))
        } else {
            (self.input.len(), None)
        };

        ParseError {
            message: message.to_string(),
            position,
            found_token,
            expected: Some(expected.to_string()),
        }
    }

    fn parse_expr(&mut self) -> Result<Node, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Node, ParseError> {
        let target = self.parse_conditional()?;
        if !self.consume(&Token::Assign) {
            return Ok(target);
        }
        self.skip_nested_newlines();
        match target {
            Node::Symbol(_) | Node::Index { .. } => {
                let value = self.parse_assignment()?;
                Ok(Node::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                })
            }
            Node::FunctionCall { name, args } => {
                let mut params = Vec::with_capacity(args.len());
                for arg in args {
                    match arg {
                        Node::Symbol(p) => params.push(p),
                        _ => {
                            return Err(self.error(
                                "function parameters must be plain identifiers",
                            ))
                        }
                    }
                }
                let body = self.parse_assignment()?;
                Ok(Node::FunctionAssign {
                    name,
                    params,
                    body: Box::new(body),
                })
            }
            _ => Err(self.error("invalid assignment target")),
        }
    }

    fn parse_conditional(&mut self) -> Result<Node, ParseError> {
        let cond = self.parse_logical_or()?;
        if !self.consume(&Token::Question) {
            return Ok(cond);
        }
        self.skip_nested_newlines();

        // While the branches parse, a bare ':' at this bracket depth closes
        // the conditional instead of forming a range.
        let outer = self.conditional_level.replace(self.nesting_level);
        let then = self.parse_assignment()?;
        if !self.consume(&Token::Colon) {
            return Err(self.error_with_expected(
                "expected ':' for the false branch of the conditional",
                "':'",
            ));
        }
        self.skip_nested_newlines();
        self.conditional_level = outer;
        let otherwise = self.parse_assignment()?;

        Ok(Node::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_logical_or(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_logical_and()?;
        while self.consume(&Token::OrOr) {
            self.skip_nested_newlines();
            let rhs = self.parse_logical_and()?;
            lhs = Node::binary(lhs, BinOp::OrOr, rhs);
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_bitwise_or()?;
        while self.consume(&Token::AndAnd) {
            self.skip_nested_newlines();
            let rhs = self.parse_bitwise_or()?;
            lhs = Node::binary(lhs, BinOp::AndAnd, rhs);
        }
        Ok(lhs)
    }

    fn parse_bitwise_or(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_bitwise_and()?;
        while self.consume(&Token::Or) {
            self.skip_nested_newlines();
            let rhs = self.parse_bitwise_and()?;
            lhs = Node::binary(lhs, BinOp::BitOr, rhs);
        }
        Ok(lhs)
    }

    fn parse_bitwise_and(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_relational()?;
        while self.consume(&Token::And) {
            self.skip_nested_newlines();
            let rhs = self.parse_relational()?;
            lhs = Node::binary(lhs, BinOp::BitAnd, rhs);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_range()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::EqualEqual) => BinOp::Equal,
                Some(Token::NotEqual) => BinOp::NotEqual,
                Some(Token::Less) => BinOp::Less,
                Some(Token::LessEqual) => BinOp::LessEqual,
                Some(Token::Greater) => BinOp::Greater,
                Some(Token::GreaterEqual) => BinOp::GreaterEqual,
                _ => break,
            };
            self.pos += 1;
            self.skip_nested_newlines();
            let rhs = self.parse_range()?;
            lhs = Node::binary(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn range_colon_ahead(&self) -> bool {
        self.peek_token() == Some(&Token::Colon)
            && self.conditional_level != Some(self.nesting_level)
    }

    fn parse_range(&mut self) -> Result<Node, ParseError> {
        let start = self.parse_additive()?;
        if !self.range_colon_ahead() {
            return Ok(start);
        }
        self.pos += 1;
        self.skip_nested_newlines();
        let second = self.parse_additive()?;
        if self.range_colon_ahead() {
            self.pos += 1;
            self.skip_nested_newlines();
            let end = self.parse_additive()?;
            Ok(Node::Range {
                start: Box::new(start),
                step: Some(Box::new(second)),
                end: Box::new(end),
            })
        } else {
            Ok(Node::Range {
                start: Box::new(start),
                step: None,
                end: Box::new(second),
            })
        }
    }

    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.skip_nested_newlines();
            let rhs = self.parse_multiplicative()?;
            lhs = Node::binary(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                Some(Token::DotStar) => BinOp::ElemMul,
                Some(Token::DotSlash) => BinOp::ElemDiv,
                _ => break,
            };
            self.pos += 1;
            self.skip_nested_newlines();
            let rhs = self.parse_unary()?;
            lhs = Node::binary(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        let op = match self.peek_token() {
            Some(Token::Plus) => Some(UnOp::Plus),
            Some(Token::Minus) => Some(UnOp::Minus),
            Some(Token::Bang) => Some(UnOp::Not),
            Some(Token::Tilde) => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            self.skip_nested_newlines();
            let operand = self.parse_unary()?;
            Ok(Node::unary(op, operand))
        } else {
            self.parse_pow()
        }
    }

    fn parse_pow(&mut self) -> Result<Node, ParseError> {
        let base = self.parse_postfix()?;
        let op = match self.peek_token() {
            Some(Token::Caret) => BinOp::Pow,
            Some(Token::DotCaret) => BinOp::ElemPow,
            _ => return Ok(base),
        };
        self.pos += 1;
        self.skip_nested_newlines();
        // The exponent re-enters at unary so `2^-3` works; unary falls back
        // into pow, which makes `^` right-associative.
        let exponent = self.parse_unary()?;
        Ok(Node::binary(base, op, exponent))
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut base = self.parse_primary()?;
        loop {
            match self.peek_token() {
                Some(Token::LParen) => {
                    let name = match base {
                        Node::Symbol(name) => name,
                        _ => {
                            return Err(self.error(
                                "only a named function can be called",
                            ))
                        }
                    };
                    self.open(Token::LParen);
                    let args = self.parse_call_args()?;
                    base = Node::FunctionCall { name, args };
                }
                Some(Token::LBracket) => {
                    self.open(Token::LBracket);
                    let dims = self.parse_index_dims()?;
                    base = Node::Index {
                        target: Box::new(base),
                        dims,
                    };
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    let field = self.expect_ident()?;
                    base = Node::Index {
                        target: Box::new(base),
                        dims: vec![Node::Constant(Literal::Str(field))],
                    };
                }
                _ => break,
            }
        }
        Ok(base)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();
        self.skip_nested_newlines();
        if self.close(Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            self.skip_nested_newlines();
            if self.consume(&Token::Comma) {
                self.skip_nested_newlines();
                continue;
            }
            if self.close(Token::RParen) {
                return Ok(args);
            }
            return Err(self.error_with_expected(
                "expected ',' or ')' in argument list",
                "',' or ')'",
            ));
        }
    }

    fn parse_index_dims(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut dims = Vec::new();
        self.skip_nested_newlines();
        if self.close(Token::RBracket) {
            return Err(self.error("expected at least one index expression"));
        }
        loop {
            dims.push(self.parse_expr()?);
            self.skip_nested_newlines();
            if self.consume(&Token::Comma) {
                self.skip_nested_newlines();
                continue;
            }
            if self.close(Token::RBracket) {
                return Ok(dims);
            }
            return Err(self.error_with_expected(
                "expected ',' or ']' in index",
                "',' or ']'",
            ));
        }
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        match self.next() {
            Some(info) => match info.token {
                Token::Number => {
                    let n: f64 = info.lexeme.parse().map_err(|_| ParseError {
                        message: format!("invalid number literal '{}'", info.lexeme),
                        position: info.position,
                        found_token: Some(info.lexeme.clone()),
                        expected: None,
                    })?;
                    Ok(Node::Constant(Literal::Number(n)))
                }
                Token::Str => {
                    let text = unescape(&info.lexeme).map_err(|message| ParseError {
                        message,
                        position: info.position,
                        found_token: Some(info.lexeme.clone()),
                        expected: None,
                    })?;
                    Ok(Node::Constant(Literal::Str(text)))
                }
                Token::True => Ok(Node::Constant(Literal::Bool(true))),
                Token::False => Ok(Node::Constant(Literal::Bool(false))),
                Token::Ident => Ok(Node::Symbol(info.lexeme)),
                Token::LParen => {
                    self.nesting_level += 1;
                    self.skip_nested_newlines();
                    let expr = self.parse_expr()?;
                    self.skip_nested_newlines();
                    if !self.close(Token::RParen) {
                        return Err(self.error_with_expected(
                            "expected ')' to close parentheses",
                            "')'",
                        ));
                    }
                    Ok(expr)
                }
                Token::LBracket => {
                    self.nesting_level += 1;
                    let matrix = self.parse_matrix()?;
                    if !self.close(Token::RBracket) {
                        return Err(self.error_with_expected(
                            "expected ']' to close matrix literal",
                            "']'",
                        ));
                    }
                    Ok(matrix)
                }
                Token::LBrace => {
                    self.nesting_level += 1;
                    let object = self.parse_object()?;
                    if !self.close(Token::RBrace) {
                        return Err(self.error_with_expected(
                            "expected '}' to close object literal",
                            "'}'",
                        ));
                    }
                    Ok(object)
                }
                _ => {
                    self.pos -= 1;
                    Err(self.error("unexpected token in expression context"))
                }
            },
            None => Err(self.error("unexpected end of input, expected expression")),
        }
    }

    fn parse_matrix(&mut self) -> Result<Node, ParseError> {
        self.skip_nested_newlines();
        let mut rows = Vec::new();
        if self.peek_token() == Some(&Token::RBracket) {
            return Ok(Node::Matrix(rows));
        }
        loop {
            let mut row = Vec::new();
            row.push(self.parse_expr()?);
            self.skip_nested_newlines();
            while self.consume(&Token::Comma) {
                self.skip_nested_newlines();
                row.push(self.parse_expr()?);
                self.skip_nested_newlines();
            }
            rows.push(row);
            if self.consume(&Token::Semicolon) {
                self.skip_nested_newlines();
                continue;
            }
            break;
        }
        Ok(Node::Matrix(rows))
    }

    fn parse_object(&mut self) -> Result<Node, ParseError> {
        self.skip_nested_newlines();
        let mut pairs = Vec::new();
        if self.peek_token() == Some(&Token::RBrace) {
            return Ok(Node::Object(pairs));
        }
        loop {
            let key = match self.next() {
                Some(TokenInfo {
                    token: Token::Ident,
                    lexeme,
                    ..
                }) => lexeme,
                Some(TokenInfo {
                    token: Token::Str,
                    lexeme,
                    position,
                }) => unescape(&lexeme).map_err(|message| ParseError {
                    message,
                    position,
                    found_token: Some(lexeme.clone()),
                    expected: None,
                })?,
                _ => {
                    self.pos = self.pos.saturating_sub(1);
                    return Err(self.error_with_expected(
                        "expected object key",
                        "identifier or string",
                    ));
                }
            };
            if !self.consume(&Token::Colon) {
                return Err(self.error_with_expected("expected ':' after object key", "':'"));
            }
            self.skip_nested_newlines();
            let value = self.parse_expr()?;
            pairs.push((key, value));
            self.skip_nested_newlines();
            if self.consume(&Token::Comma) {
                self.skip_nested_newlines();
                continue;
            }
            break;
        }
        Ok(Node::Object(pairs))
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.next() {
            Some(TokenInfo {
                token: Token::Ident,
                lexeme,
                ..
            }) => Ok(lexeme),
            Some(_) => {
                self.pos -= 1;
                Err(self.error_with_expected("expected identifier", "identifier"))
            }
            None => Err(self.error_with_expected("expected identifier", "identifier")),
        }
    }

    /// Consume an opening bracket that the caller already peeked.
    fn open(&mut self, t: Token) {
        debug_assert_eq!(self.peek_token(), Some(&t));
        self.pos += 1;
        self.nesting_level += 1;
    }

    /// Consume a closing bracket and drop one nesting level.
    fn close(&mut self, t: Token) -> bool {
        if self.consume(&t) {
            self.nesting_level = self.nesting_level.saturating_sub(1);
            true
        } else {
            false
        }
    }

    /// Newlines are layout inside brackets and separators outside them.
    fn skip_nested_newlines(&mut self) {
        if self.nesting_level > 0 {
            while self.consume(&Token::Newline) {}
        }
    }

    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn next(&mut self) -> Option<TokenInfo> {
        if self.pos < self.tokens.len() {
            let info = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(info)
        } else {
            None
        }
    }

    fn consume(&mut self, t: &Token) -> bool {
        if self.peek_token() == Some(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

fn unescape(lexeme: &str) -> Result<String, String> {
    // The lexer guarantees surrounding double quotes.
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(format!("invalid escape sequence '\\{other}'")),
            None => return Err("dangling escape at end of string".to_string()),
        }
    }
    Ok(out)
}
