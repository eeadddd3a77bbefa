use indoc::indoc;
use spython::lexer::token::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    spython::lex(source)
        .expect("lex should succeed")
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn lexes_assignment_with_newline() {
    let tokens = kinds("x = 42\n");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier("x".to_string()),
            TokenKind::Equal,
            TokenKind::Int(42),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexes_two_character_operators_greedily() {
    let tokens = kinds("a -> b == c != d <= e >= f");
    assert!(tokens.contains(&TokenKind::Arrow));
    assert!(tokens.contains(&TokenKind::EqualEqual));
    assert!(tokens.contains(&TokenKind::BangEqual));
    assert!(tokens.contains(&TokenKind::LessEqual));
    assert!(tokens.contains(&TokenKind::GreaterEqual));
    assert!(!tokens.contains(&TokenKind::Minus));
    assert!(!tokens.contains(&TokenKind::Equal));
}

#[test]
fn lexes_float_and_int_literals() {
    let tokens = kinds("pi = 3.14 + 3");
    assert_eq!(tokens[2], TokenKind::Float(3.14));
    assert_eq!(tokens[4], TokenKind::Int(3));
}

#[test]
fn distinguishes_keywords_from_identifiers() {
    let tokens = kinds("def define if iffy and true");
    assert_eq!(tokens[0], TokenKind::Def);
    assert_eq!(tokens[1], TokenKind::Identifier("define".to_string()));
    assert_eq!(tokens[2], TokenKind::If);
    assert_eq!(tokens[3], TokenKind::Identifier("iffy".to_string()));
    assert_eq!(tokens[4], TokenKind::And);
    assert_eq!(tokens[5], TokenKind::True);
}

#[test]
fn decodes_string_escapes() {
    let tokens = kinds(r#"s = "a\"b\\c\n""#);
    match &tokens[2] {
        TokenKind::String(value) => assert_eq!(value, "a\"b\\c\n"),
        other => panic!("expected string token, got {:?}", other),
    }
}

#[test]
fn records_indentation_depth_per_line() {
    let source = indoc! {"
        while i:
        \tif j:
        \t\tk
    "};
    let tokens = spython::lex(source).expect("lex should succeed");
    let depth_of = |name: &str| {
        tokens
            .iter()
            .find(|token| token.kind == TokenKind::Identifier(name.to_string()))
            .map(|token| token.depth)
            .expect("identifier should be present")
    };
    assert_eq!(depth_of("i"), 0);
    assert_eq!(depth_of("j"), 1);
    assert_eq!(depth_of("k"), 2);
}

#[test]
fn spaces_and_tabs_both_count_toward_depth() {
    let tokens = spython::lex("  \tx").expect("lex should succeed");
    assert_eq!(tokens[0].depth, 3);
}

#[test]
fn comments_and_blank_lines_emit_no_tokens() {
    let source = indoc! {"
        a = 1 # set a

        # only a comment
        b = 2
    "};
    let newlines = kinds(source)
        .into_iter()
        .filter(|kind| *kind == TokenKind::Newline)
        .count();
    assert_eq!(newlines, 2);
}

#[test]
fn tracks_line_and_column() {
    let tokens = spython::lex("a\n  bc = 1").expect("lex should succeed");
    let bc = &tokens[2];
    assert_eq!(bc.lexeme, "bc");
    assert_eq!(bc.line, 2);
    assert_eq!(bc.column, 3);
}

#[test]
fn rejects_unterminated_string() {
    let err = spython::lex("s = \"open\nx").expect_err("lex should fail");
    assert_eq!(err.message, "unterminated string literal");
    assert_eq!((err.line, err.column), (1, 5));
}

#[test]
fn rejects_out_of_range_int() {
    let err = spython::lex("n = 99999999999999999999").expect_err("lex should fail");
    assert!(err.message.contains("out of range"));
}

#[test]
fn rejects_unknown_character() {
    let err = spython::lex("a = $").expect_err("lex should fail");
    assert_eq!(err.message, "unexpected character '$'");
    assert_eq!(err.column, 5);
}
