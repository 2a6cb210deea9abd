use mathex_lexer::{token_kinds, Token};

#[test]
fn arithmetic_operators() {
    let src = "+ - * / % ^";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![
            Token::Plus,
            Token::Minus,
            Token::Star,
            Token::Slash,
            Token::Percent,
            Token::Caret,
        ]
    );
}

#[test]
fn elementwise_operators() {
    let src = ".* ./ .^";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![Token::DotStar, Token::DotSlash, Token::DotCaret]
    );
}

#[test]
fn comparison_operators() {
    let src = "== != < <= > >=";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![
            Token::EqualEqual,
            Token::NotEqual,
            Token::Less,
            Token::LessEqual,
            Token::Greater,
            Token::GreaterEqual,
        ]
    );
}

#[test]
fn logical_and_bitwise_operators() {
    let src = "&& || & | ! ~";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![
            Token::AndAnd,
            Token::OrOr,
            Token::And,
            Token::Or,
            Token::Bang,
            Token::Tilde,
        ]
    );
}

#[test]
fn longest_match_wins() {
    // "<=" must not split into "<" "="
    assert_eq!(
        token_kinds("a<=b").unwrap(),
        vec![Token::Ident, Token::LessEqual, Token::Ident]
    );
    // a number followed by ".*" keeps the dot with the operator
    assert_eq!(
        token_kinds("2.*3").unwrap(),
        vec![Token::Number, Token::DotStar, Token::Number]
    );
}

#[test]
fn ternary_range_and_punctuation() {
    let src = "? : ; , ( ) [ ] { } . =";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![
            Token::Question,
            Token::Colon,
            Token::Semicolon,
            Token::Comma,
            Token::LParen,
            Token::RParen,
            Token::LBracket,
            Token::RBracket,
            Token::LBrace,
            Token::RBrace,
            Token::Dot,
            Token::Assign,
        ]
    );
}
