use super::*;

fn lex(source: &str) -> Vec<Lexeme> {
    let (tokens, diags) = Lexer::new(source).tokenize();
    assert!(diags.is_empty(), "unexpected lex errors: {:?}", diags);
    tokens.into_iter().map(|t| t.node).collect()
}

fn lex_errors(source: &str) -> Vec<Diagnostic> {
    Lexer::new(source).tokenize().1
}

fn ident(s: &str) -> Lexeme {
    Lexeme::Ident(s.to_string())
}

fn int(value: u64) -> Lexeme {
    Lexeme::Integer {
        value,
        suffix: String::new(),
    }
}

#[test]
fn test_keywords_and_identifiers() {
    let tokens = lex("struct Kernel { static constexpr bool on = true; };");
    assert_eq!(
        tokens,
        vec![
            Lexeme::Struct,
            ident("Kernel"),
            Lexeme::LBrace,
            Lexeme::Static,
            Lexeme::Constexpr,
            Lexeme::Bool,
            ident("on"),
            Lexeme::Eq,
            Lexeme::True,
            Lexeme::Semicolon,
            Lexeme::RBrace,
            Lexeme::Semicolon,
            Lexeme::Eof,
        ]
    );
}

#[test]
fn test_scope_and_template_brackets() {
    let tokens = lex("tc::BufferBinding<tc::uint, 0, 1>");
    assert_eq!(
        tokens,
        vec![
            ident("tc"),
            Lexeme::ColonColon,
            ident("BufferBinding"),
            Lexeme::Lt,
            ident("tc"),
            Lexeme::ColonColon,
            ident("uint"),
            Lexeme::Comma,
            int(0),
            Lexeme::Comma,
            int(1),
            Lexeme::Gt,
            Lexeme::Eof,
        ]
    );
}

#[test]
fn test_shift_right_is_two_gt() {
    let (tokens, _) = Lexer::new("a >> b").tokenize();
    assert_eq!(tokens[1].node, Lexeme::Gt);
    assert_eq!(tokens[2].node, Lexeme::Gt);
    assert_eq!(tokens[1].span.end, tokens[2].span.start);
}

#[test]
fn test_compound_operators() {
    let tokens = lex("a += b <<= c && d -> e ... ++f");
    assert!(tokens.contains(&Lexeme::PlusEq));
    assert!(tokens.contains(&Lexeme::ShlEq));
    assert!(tokens.contains(&Lexeme::AmpAmp));
    assert!(tokens.contains(&Lexeme::Arrow));
    assert!(tokens.contains(&Lexeme::Ellipsis));
    assert!(tokens.contains(&Lexeme::PlusPlus));
}

#[test]
fn test_swizzle_literal_suffix() {
    let tokens = lex(r#"v["wzyx"_sw]"#);
    assert_eq!(
        tokens[2],
        Lexeme::Str {
            value: "wzyx".to_string(),
            suffix: "_sw".to_string(),
        }
    );
}

#[test]
fn test_number_forms() {
    let tokens = lex("42 0x1F 0b101 017 1'000 7u 3.5f 1e3 .5 2.");
    assert_eq!(tokens[0], int(42));
    assert_eq!(tokens[1], int(31));
    assert_eq!(tokens[2], int(5));
    assert_eq!(tokens[3], int(15));
    assert_eq!(tokens[4], int(1000));
    assert_eq!(
        tokens[5],
        Lexeme::Integer {
            value: 7,
            suffix: "u".to_string()
        }
    );
    assert_eq!(
        tokens[6],
        Lexeme::FloatLit {
            value: 3.5,
            suffix: "f".to_string()
        }
    );
    assert!(matches!(tokens[7], Lexeme::FloatLit { value, .. } if value == 1000.0));
    assert!(matches!(tokens[8], Lexeme::FloatLit { value, .. } if value == 0.5));
    assert!(matches!(tokens[9], Lexeme::FloatLit { value, .. } if value == 2.0));
}

#[test]
fn test_type_keywords_distinct_from_literals() {
    let tokens = lex("float f = 1.5f; char c = 'c';");
    assert_eq!(tokens[0], Lexeme::Float);
    assert_eq!(
        tokens[3],
        Lexeme::FloatLit {
            value: 1.5,
            suffix: "f".to_string()
        }
    );
    assert_eq!(tokens[5], Lexeme::Char);
    assert_eq!(tokens[8], Lexeme::CharLit('c'));
    assert_eq!(Lexeme::Float.description(), "'float'");
    assert_eq!(Lexeme::CharLit('c').description(), "character 'c'");
}

#[test]
fn test_comments_and_preprocessor_skipped() {
    let tokens = lex("#pragma once\n#define X \\\n  1\n// line\nint /* block\n */ x;");
    assert_eq!(
        tokens,
        vec![Lexeme::Int, ident("x"), Lexeme::Semicolon, Lexeme::Eof]
    );
}

#[test]
fn test_hash_mid_line_is_error() {
    let errors = lex_errors("int x # y;");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("unexpected character"));
}

#[test]
fn test_string_escapes_and_prefixes() {
    let tokens = lex(r#""a\n\"b" u8"x" L'c' '\t' R"d(raw "text")d""#);
    assert_eq!(
        tokens[0],
        Lexeme::Str {
            value: "a\n\"b".to_string(),
            suffix: String::new()
        }
    );
    assert_eq!(
        tokens[1],
        Lexeme::Str {
            value: "x".to_string(),
            suffix: String::new()
        }
    );
    assert_eq!(tokens[2], Lexeme::CharLit('c'));
    assert_eq!(tokens[3], Lexeme::CharLit('\t'));
    assert_eq!(
        tokens[4],
        Lexeme::Str {
            value: "raw \"text\"".to_string(),
            suffix: String::new()
        }
    );
}

#[test]
fn test_spans_cover_token_text() {
    let source = "  uvec2 gId";
    let (tokens, _) = Lexer::new(source).tokenize();
    assert_eq!(&source[tokens[0].span.range()], "uvec2");
    assert_eq!(&source[tokens[1].span.range()], "gId");
    assert_eq!(tokens[2].span, Span::point(source.len() as u32));
}

#[test]
fn test_unterminated_literals_report() {
    assert!(lex_errors("\"abc").iter().any(|d| d.message.contains("unterminated")));
    assert!(lex_errors("/* never closed").iter().any(|d| d.message.contains("block comment")));
}

#[test]
fn test_integer_overflow() {
    let errors = lex_errors("99999999999999999999999");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("too large"));
}

#[test]
fn test_non_ascii_in_string_and_stray() {
    let tokens = lex("\"héllo\"");
    assert_eq!(
        tokens[0],
        Lexeme::Str {
            value: "héllo".to_string(),
            suffix: String::new()
        }
    );
    let errors = lex_errors("int é;");
    assert_eq!(errors.len(), 1);
}
