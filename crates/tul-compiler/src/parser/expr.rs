//! Expression parsers: arithmetic, logical, and field references.
//!
//! Precedence is encoded in the descent structure, all binary operators
//! associating left:
//!
//! - arithmetic: `^` over `* / %` over `+ -`
//! - logical: comparisons over `not` over `and` over `or`
//!
//! Logical primaries are ambiguous on their first token (a field reference
//! can be a boolean leaf or the start of a comparison; `(` can open either
//! grammar), so the primary parser tries alternatives with save/restore
//! backtracking, in the order: boolean literal, comparison, bare field,
//! parenthesized logical.

use crate::ast::{ArithKind, Arithmetic, CompareOp, Field, LogicKind, Logical, MemberOp, UnitObject};
use crate::foundation::NodeArena;
use crate::lexer::Token;

use super::error::ParseError;
use super::stream::TokenStream;

/// Parse a logical expression (`or` level).
pub fn parse_logical(
    stream: &mut TokenStream,
    arena: &mut NodeArena,
) -> Result<Logical, ParseError> {
    let start = stream.save();
    let mut lhs = parse_and(stream, arena)?;

    while stream.check(&Token::Or) {
        stream.advance();
        let rhs = parse_and(stream, arena)?;
        let span = stream.span_from(start);
        lhs = Logical::new(arena, span, LogicKind::Or(Box::new(lhs), Box::new(rhs)));
    }

    Ok(lhs)
}

fn parse_and(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Logical, ParseError> {
    let start = stream.save();
    let mut lhs = parse_not(stream, arena)?;

    while stream.check(&Token::And) {
        stream.advance();
        let rhs = parse_not(stream, arena)?;
        let span = stream.span_from(start);
        lhs = Logical::new(arena, span, LogicKind::And(Box::new(lhs), Box::new(rhs)));
    }

    Ok(lhs)
}

fn parse_not(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Logical, ParseError> {
    if stream.check(&Token::Not) {
        let start = stream.save();
        stream.advance();
        let inner = parse_not(stream, arena)?;
        let span = stream.span_from(start);
        return Ok(Logical::new(arena, span, LogicKind::Not(Box::new(inner))));
    }
    parse_logical_primary(stream, arena)
}

fn parse_logical_primary(
    stream: &mut TokenStream,
    arena: &mut NodeArena,
) -> Result<Logical, ParseError> {
    let start = stream.save();

    // Boolean literals are unambiguous.
    if stream.check(&Token::True) {
        stream.advance();
        return Ok(Logical::bool(arena, stream.span_from(start), true));
    }
    if stream.check(&Token::False) {
        stream.advance();
        return Ok(Logical::bool(arena, stream.span_from(start), false));
    }

    // Comparison: <arithmetic> <op> <arithmetic>.
    if let Ok(lhs) = parse_arithmetic(stream, arena) {
        if let Some(op) = peek_compare_op(stream) {
            stream.advance();
            let rhs = parse_arithmetic(stream, arena)?;
            let span = stream.span_from(start);
            return Ok(Logical::comparison(arena, span, lhs, op, rhs));
        }
    }
    stream.restore(start);

    // Bare boolean field.
    if let Ok(field) = parse_field(stream, arena) {
        let span = stream.span_from(start);
        return Ok(Logical::field(arena, span, field));
    }
    stream.restore(start);

    // Parenthesized logical expression.
    if stream.check(&Token::LParen) {
        stream.advance();
        let inner = parse_logical(stream, arena)?;
        stream.expect(Token::RParen)?;
        return Ok(inner);
    }

    Err(stream.note_error(ParseError::unexpected_token(
        stream.peek(),
        "in logical expression",
        stream.current_span(),
    )))
}

fn peek_compare_op(stream: &TokenStream) -> Option<CompareOp> {
    match stream.peek() {
        Some(Token::EqEq) => Some(CompareOp::Eq),
        Some(Token::NotEq) => Some(CompareOp::Neq),
        Some(Token::Gt) => Some(CompareOp::Gt),
        Some(Token::Lt) => Some(CompareOp::Lt),
        Some(Token::Gte) => Some(CompareOp::Gte),
        Some(Token::Lte) => Some(CompareOp::Lte),
        _ => None,
    }
}

/// Parse an arithmetic expression (`+ -` level).
pub fn parse_arithmetic(
    stream: &mut TokenStream,
    arena: &mut NodeArena,
) -> Result<Arithmetic, ParseError> {
    let start = stream.save();
    let mut lhs = parse_mul(stream, arena)?;

    loop {
        let make: fn(Box<Arithmetic>, Box<Arithmetic>) -> ArithKind = match stream.peek() {
            Some(Token::Plus) => ArithKind::Add,
            Some(Token::Minus) => ArithKind::Sub,
            _ => break,
        };
        stream.advance();
        let rhs = parse_mul(stream, arena)?;
        let span = stream.span_from(start);
        lhs = Arithmetic::new(arena, span, make(Box::new(lhs), Box::new(rhs)));
    }

    Ok(lhs)
}

fn parse_mul(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Arithmetic, ParseError> {
    let start = stream.save();
    let mut lhs = parse_exp(stream, arena)?;

    loop {
        let make: fn(Box<Arithmetic>, Box<Arithmetic>) -> ArithKind = match stream.peek() {
            Some(Token::Star) => ArithKind::Mul,
            Some(Token::Slash) => ArithKind::Div,
            Some(Token::Percent) => ArithKind::Mod,
            _ => break,
        };
        stream.advance();
        let rhs = parse_exp(stream, arena)?;
        let span = stream.span_from(start);
        lhs = Arithmetic::new(arena, span, make(Box::new(lhs), Box::new(rhs)));
    }

    Ok(lhs)
}

fn parse_exp(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Arithmetic, ParseError> {
    let start = stream.save();
    let mut lhs = parse_arith_value(stream, arena)?;

    while stream.check(&Token::Caret) {
        stream.advance();
        let rhs = parse_arith_value(stream, arena)?;
        let span = stream.span_from(start);
        lhs = Arithmetic::new(arena, span, ArithKind::Exp(Box::new(lhs), Box::new(rhs)));
    }

    Ok(lhs)
}

fn parse_arith_value(
    stream: &mut TokenStream,
    arena: &mut NodeArena,
) -> Result<Arithmetic, ParseError> {
    let start = stream.save();

    match stream.peek() {
        Some(Token::Int(value)) => {
            let value = *value;
            stream.advance();
            Ok(Arithmetic::int(arena, stream.span_from(start), value))
        }
        Some(Token::Float(value)) => {
            let value = *value;
            stream.advance();
            Ok(Arithmetic::float(arena, stream.span_from(start), value))
        }
        Some(Token::Minus) => {
            stream.advance();
            match stream.peek() {
                Some(Token::Int(value)) => {
                    let value = *value;
                    stream.advance();
                    Ok(Arithmetic::int(arena, stream.span_from(start), -value))
                }
                Some(Token::Float(value)) => {
                    let value = *value;
                    stream.advance();
                    Ok(Arithmetic::float(arena, stream.span_from(start), -value))
                }
                other => Err(stream.note_error(ParseError::unexpected_token(
                    other,
                    "after unary minus",
                    stream.current_span(),
                ))),
            }
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_arithmetic(stream, arena)?;
            stream.expect(Token::RParen)?;
            Ok(inner)
        }
        Some(Token::This) | Some(Token::Type) | Some(Token::Ident(_)) => {
            let field = parse_field(stream, arena)?;
            Ok(Arithmetic::field(arena, stream.span_from(start), field))
        }
        other => Err(stream.note_error(ParseError::unexpected_token(
            other,
            "in arithmetic expression",
            stream.current_span(),
        ))),
    }
}

/// Parse a field reference: unit object, member operator, field name.
pub fn parse_field(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Field, ParseError> {
    let start = stream.save();
    let unit = parse_unit_object(stream)?;

    let member_op = match stream.peek() {
        Some(Token::ColonColon) => MemberOp::Builtin,
        Some(Token::Dot) => MemberOp::Custom,
        Some(Token::Arrow) => MemberOp::Language,
        other => {
            return Err(stream.note_error(ParseError::unexpected_token(
                other,
                "in field reference (expected '::', '.', or '->')",
                stream.current_span(),
            )));
        }
    };
    stream.advance();

    let name = parse_ident(stream)?;
    let span = stream.span_from(start);
    Ok(Field::new(arena, span, unit, member_op, name))
}

/// Parse a unit object: `this`, `type`, or an identifier.
pub fn parse_unit_object(stream: &mut TokenStream) -> Result<UnitObject, ParseError> {
    match stream.peek() {
        Some(Token::This) => {
            stream.advance();
            Ok(UnitObject::This)
        }
        Some(Token::Type) => {
            stream.advance();
            Ok(UnitObject::Type)
        }
        Some(Token::Ident(name)) => {
            let name = name.clone();
            stream.advance();
            Ok(UnitObject::Identifier(name))
        }
        other => Err(stream.note_error(ParseError::unexpected_token(
            other,
            "as unit object",
            stream.current_span(),
        ))),
    }
}

/// Parse a bare identifier.
pub fn parse_ident(stream: &mut TokenStream) -> Result<String, ParseError> {
    match stream.peek() {
        Some(Token::Ident(name)) => {
            let name = name.clone();
            stream.advance();
            Ok(name)
        }
        other => Err(stream.note_error(ParseError::unexpected_token(
            other,
            "as identifier",
            stream.current_span(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn with_stream<T>(
        source: &str,
        f: impl FnOnce(&mut TokenStream, &mut NodeArena) -> T,
    ) -> T {
        let mut lexer = Token::lexer(source);
        let mut tokens = Vec::new();
        let mut spans = Vec::new();
        while let Some(result) = lexer.next() {
            tokens.push(result.expect("lex error"));
            spans.push(lexer.span());
        }
        let mut stream = TokenStream::new(&tokens, &spans, 0, source.len() as u32);
        let mut arena = NodeArena::new();
        f(&mut stream, &mut arena)
    }

    #[test]
    fn test_arithmetic_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        with_stream("1 + 2 * 3", |stream, arena| {
            let expr = parse_arithmetic(stream, arena).unwrap();
            match expr.kind {
                ArithKind::Add(_, rhs) => {
                    assert!(matches!(rhs.kind, ArithKind::Mul(_, _)));
                }
                other => panic!("expected Add, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_arithmetic_left_associativity() {
        // 1 - 2 - 3 parses as (1 - 2) - 3
        with_stream("1 - 2 - 3", |stream, arena| {
            let expr = parse_arithmetic(stream, arena).unwrap();
            match expr.kind {
                ArithKind::Sub(lhs, rhs) => {
                    assert!(matches!(lhs.kind, ArithKind::Sub(_, _)));
                    assert!(matches!(rhs.kind, ArithKind::Int(3)));
                }
                other => panic!("expected Sub, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_exp_binds_tightest() {
        // 2 * 3 ^ 4 parses as 2 * (3 ^ 4)
        with_stream("2 * 3 ^ 4", |stream, arena| {
            let expr = parse_arithmetic(stream, arena).unwrap();
            match expr.kind {
                ArithKind::Mul(_, rhs) => {
                    assert!(matches!(rhs.kind, ArithKind::Exp(_, _)));
                }
                other => panic!("expected Mul, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_negative_literal() {
        with_stream("0 - -5", |stream, arena| {
            let expr = parse_arithmetic(stream, arena).unwrap();
            match expr.kind {
                ArithKind::Sub(_, rhs) => assert!(matches!(rhs.kind, ArithKind::Int(-5))),
                other => panic!("expected Sub, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_field_member_ops() {
        with_stream("this::hp", |stream, arena| {
            let field = parse_field(stream, arena).unwrap();
            assert_eq!(field.member_op, MemberOp::Builtin);
            assert_eq!(field.unit, UnitObject::This);
            assert_eq!(field.name, "hp");
        });

        with_stream("u->rate", |stream, arena| {
            let field = parse_field(stream, arena).unwrap();
            assert_eq!(field.member_op, MemberOp::Language);
            assert!(field.is_rate);
        });
    }

    #[test]
    fn test_logical_precedence() {
        // a.p or b.q and not c.r: and binds tighter than or, not tightest
        with_stream("a.p or b.q and not c.r", |stream, arena| {
            let expr = parse_logical(stream, arena).unwrap();
            match expr.kind {
                LogicKind::Or(lhs, rhs) => {
                    assert!(matches!(lhs.kind, LogicKind::Field(_)));
                    match rhs.kind {
                        LogicKind::And(_, and_rhs) => {
                            assert!(matches!(and_rhs.kind, LogicKind::Not(_)));
                        }
                        other => panic!("expected And, got {:?}", other),
                    }
                }
                other => panic!("expected Or, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_comparison() {
        with_stream("this.x + 1 >= 2", |stream, arena| {
            let expr = parse_logical(stream, arena).unwrap();
            match expr.kind {
                LogicKind::Comparison { lhs, op, rhs } => {
                    assert!(matches!(lhs.kind, ArithKind::Add(_, _)));
                    assert_eq!(op, CompareOp::Gte);
                    assert!(matches!(rhs.kind, ArithKind::Int(2)));
                }
                other => panic!("expected Comparison, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_parenthesized_comparison() {
        with_stream("(this.x > 0)", |stream, arena| {
            let expr = parse_logical(stream, arena).unwrap();
            assert!(matches!(expr.kind, LogicKind::Comparison { .. }));
        });
    }

    #[test]
    fn test_bare_field_guard() {
        with_stream("this.alive", |stream, arena| {
            let expr = parse_logical(stream, arena).unwrap();
            assert!(matches!(expr.kind, LogicKind::Field(_)));
        });
    }
}
