use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Keywords
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Identifiers and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
    // No trailing-dot form: "2.*3" must lex as 2 .* 3, not (2.) * 3
    #[regex(r"\d+(\.\d+)?([eE][+-]?\d+)?")]
    #[regex(r"\.\d+([eE][+-]?\d+)?")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // Multi-character operators before their single-character prefixes
    #[token(".*")]
    DotStar,
    #[token("./")]
    DotSlash,
    #[token(".^")]
    DotCaret,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("&")]
    And,
    #[token("|")]
    Or,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("=")]
    Assign,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Statement separator; not layout, so it is a token rather than skipped
    #[token("\n")]
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub lexeme: String,
    pub start: usize,
    pub end: usize,
}

/// Tokenization stops at the first character no rule accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub character: char,
    pub offset: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected character '{}' at offset {}",
            self.character, self.offset
        )
    }
}

impl std::error::Error for LexError {}

/// Lazy spanned token stream over an input string.
pub struct SpannedLexer<'a> {
    inner: logos::Lexer<'a, Token>,
    input: &'a str,
}

impl<'a> SpannedLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        SpannedLexer {
            inner: Token::lexer(input),
            input,
        }
    }
}

impl<'a> Iterator for SpannedLexer<'a> {
    type Item = Result<SpannedToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let res = self.inner.next()?;
        let span = self.inner.span();
        Some(match res {
            Ok(token) => Ok(SpannedToken {
                token,
                lexeme: self.inner.slice().to_string(),
                start: span.start,
                end: span.end,
            }),
            Err(()) => {
                let character = self.input[span.start..]
                    .chars()
                    .next()
                    .unwrap_or('\u{fffd}');
                Err(LexError {
                    character,
                    offset: span.start,
                })
            }
        })
    }
}

/// Tokenize the whole input eagerly. The first unrecognized character aborts
/// the scan; callers never see a partial stream on error.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexError> {
    SpannedLexer::new(input).collect()
}

/// Token kinds only, for compact assertions.
pub fn token_kinds(input: &str) -> Result<Vec<Token>, LexError> {
    Ok(tokenize(input)?.into_iter().map(|t| t.token).collect())
}
