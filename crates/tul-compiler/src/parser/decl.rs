//! Declaration and statement parsers.
//!
//! Top level is keyword-dispatched: `trait` and `unit` declarations. On a
//! declaration-level error the parser records the farthest-position error
//! and synchronizes to the next declaration keyword, so one malformed
//! trait does not hide diagnostics for the rest of the file.

use indexmap::IndexMap;

use crate::ast::{
    AlwaysBody, AssignKind, AssignRhs, Literal, LogicKind, Program, Stmt, StmtKind, Trait,
    TraitInitializer, UnitDecl, VarDecl, VarType,
};
use crate::foundation::NodeArena;
use crate::lexer::Token;

use super::error::ParseError;
use super::expr::{parse_arithmetic, parse_field, parse_ident, parse_logical, parse_unit_object};
use super::stream::TokenStream;

/// Parse a whole program from a token stream.
pub fn parse_program(
    stream: &mut TokenStream,
    arena: &mut NodeArena,
) -> Result<Program, Vec<ParseError>> {
    let start = stream.save();
    let mut program = Program::new(arena, stream.span_from(start));
    let mut errors = Vec::new();

    while !stream.at_end() {
        stream.reset_error_watermark();
        let result = match stream.peek() {
            Some(Token::Trait) => parse_trait(stream, arena).map(|t| program.traits.push(t)),
            Some(Token::Unit) => parse_unit(stream, arena).map(|u| program.units.push(u)),
            other => Err(ParseError::unexpected_token(
                other,
                "at top level (expected 'trait' or 'unit')",
                stream.current_span(),
            )),
        };

        if let Err(err) = result {
            errors.push(stream.farthest_error(err));
            stream.synchronize();
        }
    }

    program.span = stream.span_from(start);

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

fn parse_trait(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Trait, ParseError> {
    let start = stream.save();
    stream.expect(Token::Trait)?;
    let name = parse_ident(stream)?;
    stream.expect(Token::LBrace)?;

    stream.expect(Token::Properties)?;
    stream.expect(Token::LBrace)?;
    let mut properties = Vec::new();
    while !stream.check(&Token::RBrace) {
        properties.push(parse_var_decl(stream, arena)?);
        if !stream.check(&Token::Comma) {
            break;
        }
        stream.advance();
    }
    stream.expect(Token::RBrace)?;

    stream.expect(Token::Always)?;
    stream.expect(Token::LBrace)?;
    let body = parse_always_body(stream, arena)?;
    stream.expect(Token::RBrace)?;

    stream.expect(Token::RBrace)?;

    let span = stream.span_from(start);
    Ok(Trait::new(arena, span, name, properties, body))
}

fn parse_var_decl(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<VarDecl, ParseError> {
    let start = stream.save();
    let name = parse_ident(stream)?;
    stream.expect(Token::Colon)?;
    let ty = parse_var_type(stream)?;
    let span = stream.span_from(start);
    Ok(VarDecl::new(arena, span, name, ty))
}

fn parse_var_type(stream: &mut TokenStream) -> Result<VarType, ParseError> {
    match stream.peek() {
        Some(Token::TyBool) => {
            stream.advance();
            Ok(VarType::bool())
        }
        Some(Token::TyFloat) => {
            stream.advance();
            Ok(VarType::float())
        }
        Some(Token::TyInt) => {
            stream.advance();
            stream.expect(Token::Lt)?;
            let min = parse_signed_int(stream)?;
            stream.expect(Token::Comma)?;
            let max = parse_signed_int(stream)?;
            stream.expect(Token::Gt)?;
            Ok(VarType::int(min, max))
        }
        other => Err(stream.note_error(ParseError::unexpected_token(
            other,
            "as property type (expected 'bool', 'float', or 'int<min, max>')",
            stream.current_span(),
        ))),
    }
}

fn parse_always_body(
    stream: &mut TokenStream,
    arena: &mut NodeArena,
) -> Result<AlwaysBody, ParseError> {
    let start = stream.save();
    let mut exprs = Vec::new();
    while !stream.check(&Token::RBrace) && !stream.at_end() {
        exprs.push(parse_stmt(stream, arena)?);
    }
    Ok(AlwaysBody::new(arena, stream.span_from(start), exprs))
}

fn parse_stmt(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Stmt, ParseError> {
    match stream.peek() {
        Some(Token::If) => parse_if(stream, arena),
        Some(Token::For) => parse_for(stream, arena),
        _ => parse_assignment(stream, arena),
    }
}

fn parse_if(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Stmt, ParseError> {
    let start = stream.save();
    stream.expect(Token::If)?;

    let transition = stream.check(&Token::Becomes);
    if transition {
        stream.advance();
    }

    let condition = parse_logical(stream, arena)?;
    stream.expect(Token::LBrace)?;
    let body = parse_always_body(stream, arena)?;
    stream.expect(Token::RBrace)?;

    let span = stream.span_from(start);
    let kind = if transition {
        StmtKind::TransitionIf { condition, body }
    } else {
        StmtKind::ContinuousIf { condition, body }
    };
    Ok(Stmt::new(arena, span, kind))
}

fn parse_for(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Stmt, ParseError> {
    let start = stream.save();
    stream.expect(Token::For)?;
    let variable = parse_ident(stream)?;
    stream.expect(Token::In)?;
    stream.expect(Token::Range)?;
    let range = parse_number(stream)?;
    stream.expect(Token::Of)?;
    let range_unit = parse_unit_object(stream)?;

    let mut traits = Vec::new();
    if stream.check(&Token::With) {
        stream.advance();
        stream.expect(Token::Trait)?;
        loop {
            traits.push(parse_ident(stream)?);
            if !stream.check(&Token::Comma) {
                break;
            }
            stream.advance();
        }
    }

    stream.expect(Token::LBrace)?;
    let body = parse_always_body(stream, arena)?;
    stream.expect(Token::RBrace)?;

    let span = stream.span_from(start);
    Ok(Stmt::new(
        arena,
        span,
        StmtKind::ForIn {
            variable,
            range,
            range_unit,
            traits,
            body,
        },
    ))
}

fn parse_assignment(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<Stmt, ParseError> {
    let start = stream.save();
    let lhs = parse_field(stream, arena)?;

    let kind = match stream.peek() {
        Some(Token::Assign) => AssignKind::Absolute,
        Some(Token::PlusAssign) => AssignKind::Relative,
        other => {
            return Err(stream.note_error(ParseError::unexpected_token(
                other,
                "in assignment (expected ':=' or '+=')",
                stream.current_span(),
            )));
        }
    };
    stream.advance();

    // The right-hand side is arithmetic or logical; a bare field reference
    // is syntactically both, and is parsed as arithmetic so that the
    // checker can judge it against the left-hand side's kind.
    let rhs_start = stream.save();
    let logical = match parse_logical(stream, arena) {
        Ok(l) if !matches!(l.kind, LogicKind::Field(_)) && stream.check(&Token::Semicolon) => {
            Some(l)
        }
        _ => None,
    };
    let rhs = match logical {
        Some(l) => AssignRhs::Logical(l),
        None => {
            stream.restore(rhs_start);
            AssignRhs::Arithmetic(parse_arithmetic(stream, arena)?)
        }
    };

    stream.expect(Token::Semicolon)?;

    let span = stream.span_from(start);
    Ok(Stmt::new(arena, span, StmtKind::Assignment { lhs, kind, rhs }))
}

fn parse_unit(stream: &mut TokenStream, arena: &mut NodeArena) -> Result<UnitDecl, ParseError> {
    let start = stream.save();
    stream.expect(Token::Unit)?;
    let name = parse_ident(stream)?;
    stream.expect(Token::Colon)?;

    let mut initializers = Vec::new();
    loop {
        initializers.push(parse_trait_initializer(stream, arena)?);
        if !stream.check(&Token::Comma) {
            break;
        }
        stream.advance();
    }

    stream.expect(Token::Semicolon)?;

    let span = stream.span_from(start);
    Ok(UnitDecl::new(arena, span, name, initializers))
}

fn parse_trait_initializer(
    stream: &mut TokenStream,
    arena: &mut NodeArena,
) -> Result<TraitInitializer, ParseError> {
    let start = stream.save();
    let name = parse_ident(stream)?;

    let mut values = IndexMap::new();
    if stream.check(&Token::LParen) {
        stream.advance();
        while !stream.check(&Token::RParen) {
            let property = parse_ident(stream)?;
            stream.expect(Token::Eq)?;
            let value = parse_literal(stream)?;
            values.insert(property, value);
            if !stream.check(&Token::Comma) {
                break;
            }
            stream.advance();
        }
        stream.expect(Token::RParen)?;
    }

    let span = stream.span_from(start);
    Ok(TraitInitializer::new(arena, span, name, values))
}

fn parse_literal(stream: &mut TokenStream) -> Result<Literal, ParseError> {
    match stream.peek() {
        Some(Token::True) => {
            stream.advance();
            Ok(Literal::Bool(true))
        }
        Some(Token::False) => {
            stream.advance();
            Ok(Literal::Bool(false))
        }
        Some(Token::Int(value)) => {
            let value = *value;
            stream.advance();
            Ok(Literal::Int(value))
        }
        Some(Token::Float(value)) => {
            let value = *value;
            stream.advance();
            Ok(Literal::Float(value))
        }
        Some(Token::Minus) => {
            stream.advance();
            match stream.peek() {
                Some(Token::Int(value)) => {
                    let value = *value;
                    stream.advance();
                    Ok(Literal::Int(-value))
                }
                Some(Token::Float(value)) => {
                    let value = *value;
                    stream.advance();
                    Ok(Literal::Float(-value))
                }
                other => Err(stream.note_error(ParseError::unexpected_token(
                    other,
                    "after unary minus",
                    stream.current_span(),
                ))),
            }
        }
        other => Err(stream.note_error(ParseError::unexpected_token(
            other,
            "as literal value",
            stream.current_span(),
        ))),
    }
}

fn parse_signed_int(stream: &mut TokenStream) -> Result<i64, ParseError> {
    match parse_literal(stream)? {
        Literal::Int(value) => Ok(value),
        _ => Err(stream.note_error(ParseError::unexpected_token(
            stream.peek(),
            "as integer bound",
            stream.current_span(),
        ))),
    }
}

fn parse_number(stream: &mut TokenStream) -> Result<f64, ParseError> {
    match parse_literal(stream)? {
        Literal::Int(value) => Ok(value as f64),
        Literal::Float(value) => Ok(value),
        Literal::Bool(_) => Err(stream.note_error(ParseError::unexpected_token(
            stream.peek(),
            "as numeric range",
            stream.current_span(),
        ))),
    }
}
