//! Lexing and parsing of TUL source into the AST.
//!
//! The entry point is [`parse`], which lexes with logos and runs the
//! hand-written recursive descent parser. The returned tree has spans on
//! every node and fresh arena ids; parent links are established by the
//! caller's first `relink`.

pub mod decl;
pub mod error;
pub mod expr;
pub mod stream;

pub use error::{ParseError, ParseErrorKind};
pub use stream::TokenStream;

use logos::Logos;

use crate::ast::Program;
use crate::foundation::{NodeArena, Span};
use crate::lexer::Token;

/// Lex and parse one source file into a [`Program`].
pub fn parse(
    source: &str,
    file_id: u16,
    arena: &mut NodeArena,
) -> Result<Program, Vec<ParseError>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut spans = Vec::new();
    let mut lex_errors = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => {
                tokens.push(token);
                spans.push(span);
            }
            Err(()) => {
                lex_errors.push(ParseError::invalid_token(Span::new(
                    file_id,
                    span.start as u32,
                    span.end as u32,
                )));
            }
        }
    }

    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }

    let mut stream = TokenStream::new(&tokens, &spans, file_id, source.len() as u32);
    decl::parse_program(&mut stream, arena)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignKind, AssignRhs, Literal, StmtKind, TypeKind, UnitObject};

    fn parse_ok(source: &str) -> Program {
        let mut arena = NodeArena::new();
        parse(source, 0, &mut arena).expect("parse failed")
    }

    #[test]
    fn test_parse_trait_with_properties() {
        let program = parse_ok(
            "trait Soldier {
                properties { hp_bonus: int<0, 100>, fast: bool, speed: float }
                always { }
            }",
        );

        assert_eq!(program.traits.len(), 1);
        let tr = &program.traits[0];
        assert_eq!(tr.name, "Soldier");
        assert_eq!(tr.properties.len(), 3);
        assert_eq!(tr.properties[0].ty.kind, TypeKind::Int);
        assert_eq!(tr.properties[0].ty.min, 0);
        assert_eq!(tr.properties[0].ty.max, 100);
        assert_eq!(tr.properties[1].ty.kind, TypeKind::Bool);
        assert_eq!(tr.properties[2].ty.kind, TypeKind::Float);
    }

    #[test]
    fn test_parse_statements() {
        let program = parse_ok(
            "trait A {
                properties { x: int<0, 15>, armed: bool }
                always {
                    this.x := 3;
                    this.x += 1;
                    if this.armed { this.x := 0; }
                    if becomes this.armed { this.x := 1; }
                    for u in range 5.0 of this with trait A { u.x := 2; }
                }
            }",
        );

        let body = &program.traits[0].body;
        assert_eq!(body.exprs.len(), 5);

        match &body.exprs[0].kind {
            StmtKind::Assignment { kind, rhs, .. } => {
                assert_eq!(*kind, AssignKind::Absolute);
                assert!(matches!(rhs, AssignRhs::Arithmetic(_)));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
        assert!(matches!(
            body.exprs[1].kind,
            StmtKind::Assignment {
                kind: AssignKind::Relative,
                ..
            }
        ));
        assert!(matches!(body.exprs[2].kind, StmtKind::ContinuousIf { .. }));
        assert!(matches!(body.exprs[3].kind, StmtKind::TransitionIf { .. }));

        match &body.exprs[4].kind {
            StmtKind::ForIn {
                variable,
                range,
                range_unit,
                traits,
                ..
            } => {
                assert_eq!(variable, "u");
                assert_eq!(*range, 5.0);
                assert_eq!(*range_unit, UnitObject::This);
                assert_eq!(traits, &vec!["A".to_string()]);
            }
            other => panic!("expected for-in, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_boolean_rhs() {
        let program = parse_ok(
            "trait A {
                properties { armed: bool }
                always { this.armed := true; }
            }",
        );

        match &program.traits[0].body.exprs[0].kind {
            StmtKind::Assignment { rhs, .. } => assert!(matches!(rhs, AssignRhs::Logical(_))),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unit_declaration() {
        let program = parse_ok(
            "trait A { properties { x: int<0, 15> } always { } }
             trait B { properties { y: bool } always { } }
             unit U : A(x = 3), B(y = false);
             unit V : B;",
        );

        assert_eq!(program.units.len(), 2);
        let u = &program.units[0];
        assert_eq!(u.name, "U");
        assert_eq!(u.initializers.len(), 2);
        assert_eq!(u.initializers[0].name, "A");
        assert_eq!(u.initializers[0].values.get("x"), Some(&Literal::Int(3)));
        assert_eq!(
            u.initializers[1].values.get("y"),
            Some(&Literal::Bool(false))
        );
        assert!(program.units[1].initializers[0].values.is_empty());
    }

    #[test]
    fn test_parse_negative_bounds() {
        let program = parse_ok(
            "trait A { properties { dx: int<-8, 7> } always { } }",
        );
        let ty = program.traits[0].properties[0].ty;
        assert_eq!(ty.min, -8);
        assert_eq!(ty.max, 7);
    }

    #[test]
    fn test_parse_error_recovery() {
        let mut arena = NodeArena::new();
        let result = parse(
            "trait A { properties { x: } always { } }
             unit U : A;",
            0,
            &mut arena,
        );

        // The malformed trait reports an error; parsing resumes at the
        // next declaration, so only one error comes back.
        let errors = result.expect_err("expected parse errors");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_syntax_error_reports_farthest_position() {
        let mut arena = NodeArena::new();
        let source = "trait A { properties { } always { this.x := ; } }";
        let errors = parse(source, 0, &mut arena).expect_err("expected parse errors");

        // The error points at the offending `;`, not at the statement
        // start that the backtracking rhs parse rewound to.
        let semi = source.rfind(';').unwrap() as u32 - 2;
        assert!(errors[0].span.start >= semi);
    }
}
