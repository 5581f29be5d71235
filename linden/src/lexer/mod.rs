//! Lexer implementation using logos
//!
//! Whitespace and `//` comments are skipped here, so the parser only ever
//! sees meaningful tokens.

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => return Err(CompileError::lexer(describe_error(lexer.slice()), span)),
        }
    }

    Ok(tokens)
}

fn describe_error(slice: &str) -> String {
    if slice.starts_with('"') {
        format!("invalid escape sequence in string literal {slice}")
    } else if slice.starts_with(|c: char| c.is_ascii_digit()) {
        format!("integer literal out of range: {slice}")
    } else {
        format!("unexpected character: {slice:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("if else while return new true false void"),
            vec![
                Token::If,
                Token::Else,
                Token::While,
                Token::Return,
                Token::New,
                Token::True,
                Token::False,
                Token::Void,
            ]
        );
    }

    #[test]
    fn test_tokenize_type_keywords() {
        assert_eq!(
            kinds("int float string bool List Dict Pair"),
            vec![
                Token::TyInt,
                Token::TyFloat,
                Token::TyString,
                Token::TyBool,
                Token::TyList,
                Token::TyDict,
                Token::TyPair,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            kinds("integer iffy Lists"),
            vec![
                Token::Ident("integer".to_string()),
                Token::Ident("iffy".to_string()),
                Token::Ident("Lists".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_names_are_identifiers() {
        assert_eq!(
            kinds("where select orderBy forEach"),
            vec![
                Token::Ident("where".to_string()),
                Token::Ident("select".to_string()),
                Token::Ident("orderBy".to_string()),
                Token::Ident("forEach".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(kinds("42"), vec![Token::IntLit(42)]);
        assert_eq!(kinds("2.5"), vec![Token::FloatLit(2.5)]);
        assert_eq!(
            kinds("1."),
            vec![Token::IntLit(1), Token::Dot],
            "a bare trailing dot is not part of the number"
        );
    }

    #[test]
    fn test_integer_overflow_is_error() {
        let err = tokenize("99999999999999999999").unwrap_err();
        assert!(err.message().contains("out of range"));
    }

    #[test]
    fn test_tokenize_string_with_escapes() {
        assert_eq!(
            kinds(r#""line\nnext""#),
            vec![Token::StringLit("line\nnext".to_string())]
        );
    }

    #[test]
    fn test_bad_escape_is_error() {
        let err = tokenize(r#"string s = "\z";"#).unwrap_err();
        assert!(err.message().contains("escape"));
        assert_eq!(err.span(), Some(Span::new(11, 15)));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("int x; // trailing words\n// whole line\nx"),
            vec![
                Token::TyInt,
                Token::Ident("x".to_string()),
                Token::Semi,
                Token::Ident("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= < > && || ! = + - * /"),
            vec![
                Token::EqEq,
                Token::NotEq,
                Token::LtEq,
                Token::GtEq,
                Token::Lt,
                Token::Gt,
                Token::AmpAmp,
                Token::PipePipe,
                Token::Bang,
                Token::Eq,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
            ]
        );
    }

    #[test]
    fn test_generic_type_tokens() {
        assert_eq!(
            kinds("Dict<string,int>"),
            vec![
                Token::TyDict,
                Token::Lt,
                Token::TyString,
                Token::Comma,
                Token::TyInt,
                Token::Gt,
            ]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = tokenize("int  abc").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 3));
        assert_eq!(tokens[1].1, Span::new(5, 8));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("int x = 1 % 2;").unwrap_err();
        assert!(err.message().contains("unexpected character"));
    }
}
