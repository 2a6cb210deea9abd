use mathex_lexer::{token_kinds, tokenize, Token};

#[test]
fn identifiers_and_numbers() {
    let src = "x 123 4.56";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![Token::Ident, Token::Number, Token::Number]
    );
}

#[test]
fn true_false_keywords() {
    let src = "true false";
    assert_eq!(token_kinds(src).unwrap(), vec![Token::True, Token::False]);
}

#[test]
fn scientific_and_leading_dot_numbers() {
    let src = "1e3 2.5E-2 .5 .5e2";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![Token::Number, Token::Number, Token::Number, Token::Number]
    );
}

#[test]
fn spans_cover_lexemes() {
    let toks = tokenize("ab + 12").unwrap();
    assert_eq!(toks.len(), 3);
    assert_eq!((toks[0].start, toks[0].end, toks[0].lexeme.as_str()), (0, 2, "ab"));
    assert_eq!((toks[1].start, toks[1].end, toks[1].lexeme.as_str()), (3, 4, "+"));
    assert_eq!((toks[2].start, toks[2].end, toks[2].lexeme.as_str()), (5, 7, "12"));
}

#[test]
fn newlines_are_tokens_semicolons_too() {
    let src = "a\nb; c";
    assert_eq!(
        token_kinds(src).unwrap(),
        vec![
            Token::Ident,
            Token::Newline,
            Token::Ident,
            Token::Semicolon,
            Token::Ident,
        ]
    );
}

#[test]
fn unknown_character_aborts_with_offset() {
    let err = tokenize("1 + @").unwrap_err();
    assert_eq!(err.character, '@');
    assert_eq!(err.offset, 4);
    assert!(err.to_string().contains("'@'"));
}

#[test]
fn error_reports_first_bad_character_only() {
    let err = tokenize("x $ @").unwrap_err();
    assert_eq!(err.character, '$');
    assert_eq!(err.offset, 2);
}
