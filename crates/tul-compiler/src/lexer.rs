//! Lexical analysis for TUL source.
//!
//! Tokenization uses logos. Whitespace and `//` comments are stripped
//! during lexing and never appear as tokens. The `~` character is
//! deliberately not lexable inside identifiers; the collapse pass relies
//! on it to synthesize names no source program can collide with.

use logos::Logos;

/// TUL token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // === Keywords ===
    #[token("trait")]
    Trait,
    #[token("properties")]
    Properties,
    #[token("always")]
    Always,
    #[token("unit")]
    Unit,
    #[token("if")]
    If,
    #[token("becomes")]
    Becomes,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("range")]
    Range,
    #[token("of")]
    Of,
    #[token("with")]
    With,
    #[token("this")]
    This,
    #[token("type")]
    Type,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("bool")]
    TyBool,
    #[token("float")]
    TyFloat,
    #[token("int")]
    TyInt,

    // === Operators & delimiters ===
    #[token(":=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("::")]
    ColonColon,
    #[token("->")]
    Arrow,
    #[token(".")]
    Dot,
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
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token(">=")]
    Gte,
    #[token("<=")]
    Lte,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("=")]
    Eq,

    // === Literals & identifiers ===
    /// Float literal such as `2.5`. Must carry a decimal point; plain
    /// digit runs lex as [`Token::Int`].
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).map(|t| t.expect("lex error")).collect()
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        assert_eq!(
            lex("trait always becomes"),
            vec![Token::Trait, Token::Always, Token::Becomes]
        );
        assert_eq!(lex("traits"), vec![Token::Ident("traits".into())]);
    }

    #[test]
    fn test_member_operators() {
        assert_eq!(
            lex("this::hp x.prop y->rate"),
            vec![
                Token::This,
                Token::ColonColon,
                Token::Ident("hp".into()),
                Token::Ident("x".into()),
                Token::Dot,
                Token::Ident("prop".into()),
                Token::Ident("y".into()),
                Token::Arrow,
                Token::Ident("rate".into()),
            ]
        );
    }

    #[test]
    fn test_compound_assignment_operators() {
        assert_eq!(
            lex(":= += == != >= <= > < ="),
            vec![
                Token::Assign,
                Token::PlusAssign,
                Token::EqEq,
                Token::NotEq,
                Token::Gte,
                Token::Lte,
                Token::Gt,
                Token::Lt,
                Token::Eq,
            ]
        );
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(lex("42"), vec![Token::Int(42)]);
        assert_eq!(lex("2.5"), vec![Token::Float(2.5)]);
        // A minus sign is always its own token; the parser folds it into
        // the literal where a signed value is expected.
        assert_eq!(lex("-7"), vec![Token::Minus, Token::Int(7)]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            lex("trait // a comment\nunit"),
            vec![Token::Trait, Token::Unit]
        );
    }

    #[test]
    fn test_tilde_is_not_lexable() {
        let mut lexer = Token::lexer("a~b");
        assert_eq!(lexer.next(), Some(Ok(Token::Ident("a".into()))));
        assert_eq!(lexer.next(), Some(Err(())));
    }

    #[test]
    fn test_int_type_syntax() {
        assert_eq!(
            lex("int<0, 15>"),
            vec![
                Token::TyInt,
                Token::Lt,
                Token::Int(0),
                Token::Comma,
                Token::Int(15),
                Token::Gt,
            ]
        );
    }
}
