//! Pretty-printing of programs.
//!
//! One structural walk, two renderings selected by [`Syntax`]:
//!
//! - [`Syntax::Surface`] — canonical source syntax; output parses back.
//! - [`Syntax::Oracle`] — the syntax the external rewriting oracle
//!   expects. Differs only in comparison operator spellings (`eqs`,
//!   `neq`, `gt`, `lt`, `gte`, `lte`) and in explicit sort annotations on
//!   leaf terms (`(x):Arithmetic`, `(x):Logical`).
//!
//! Printing is pure: no configuration beyond the syntax choice, no state.
//!
//! Numeric ranges in `for` loops always render as float literals, even
//! when the source wrote an integer; the runtime treats ranges as
//! distances, and the canonical form reflects that.

use crate::ast::{
    AlwaysBody, ArithKind, Arithmetic, AssignKind, AssignRhs, CompareOp, Field, Literal, LogicKind,
    Logical, MemberOp, Program, Stmt, StmtKind, Trait, TraitInitializer, TypeKind, UnitDecl,
    UnitObject, VarDecl, VarType,
};

/// Rendering selection for the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Canonical source syntax
    Surface,
    /// Syntax expected by the external rewriting oracle
    Oracle,
}

/// Program printer.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    syntax: Syntax,
}

impl Printer {
    pub fn new(syntax: Syntax) -> Self {
        Self { syntax }
    }

    /// Printer for the canonical surface syntax.
    pub fn surface() -> Self {
        Self::new(Syntax::Surface)
    }

    /// Printer for the oracle's syntax.
    pub fn oracle() -> Self {
        Self::new(Syntax::Oracle)
    }

    /// Print a whole program.
    pub fn print_program(&self, program: &Program) -> String {
        let mut output = String::new();
        for tr in &program.traits {
            output += &self.print_trait(tr);
        }
        for unit in &program.units {
            output += &self.print_unit(unit);
        }
        output
    }

    /// Print one trait declaration.
    pub fn print_trait(&self, tr: &Trait) -> String {
        let mut output = format!("trait {} {{\n", tr.name);
        output += "\tproperties {\n";
        for (i, decl) in tr.properties.iter().enumerate() {
            output += &format!("\t\t{}", self.print_var_decl(decl));
            if i < tr.properties.len() - 1 {
                output += ",";
            }
            output += "\n";
        }
        output += "\t}\n";
        output += "\n\talways {\n";
        output += &self.print_body(&tr.body, 2);
        output += "\t}\n";
        output += "}\n\n";
        output
    }

    pub fn print_var_decl(&self, decl: &VarDecl) -> String {
        format!("{} : {}", decl.name, self.print_var_type(&decl.ty))
    }

    pub fn print_var_type(&self, ty: &VarType) -> String {
        match ty.kind {
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Float => "float".to_string(),
            TypeKind::Int => format!("int<{}, {}>", ty.min, ty.max),
        }
    }

    /// Print an always-body at the given indent depth.
    pub fn print_body(&self, body: &AlwaysBody, indent: usize) -> String {
        let mut output = String::new();
        for stmt in &body.exprs {
            output += &self.print_stmt(stmt, indent);
        }
        output
    }

    /// Print one statement at the given indent depth.
    pub fn print_stmt(&self, stmt: &Stmt, indent: usize) -> String {
        let pad = "\t".repeat(indent);
        match &stmt.kind {
            StmtKind::Assignment { lhs, kind, rhs } => {
                let op = match kind {
                    AssignKind::Absolute => ":=",
                    AssignKind::Relative => "+=",
                };
                let rhs = match rhs {
                    AssignRhs::Arithmetic(a) => self.print_arithmetic(a),
                    AssignRhs::Logical(l) => self.print_logical(l),
                };
                format!("{}{} {} {};\n", pad, self.print_field(lhs), op, rhs)
            }
            StmtKind::ContinuousIf { condition, body } => {
                format!(
                    "{}if {} {{\n{}{}}}\n",
                    pad,
                    self.print_logical(condition),
                    self.print_body(body, indent + 1),
                    pad
                )
            }
            StmtKind::TransitionIf { condition, body } => {
                format!(
                    "{}if becomes {} {{\n{}{}}}\n",
                    pad,
                    self.print_logical(condition),
                    self.print_body(body, indent + 1),
                    pad
                )
            }
            StmtKind::ForIn {
                variable,
                range,
                range_unit,
                traits,
                body,
            } => {
                let mut head = format!(
                    "{}for {} in range {} of {}",
                    pad,
                    variable,
                    format_float(*range),
                    self.print_unit_object(range_unit)
                );
                if !traits.is_empty() {
                    head += &format!(" with trait {}", traits.join(", "));
                }
                format!(
                    "{} {{\n{}{}}}\n",
                    head,
                    self.print_body(body, indent + 1),
                    pad
                )
            }
        }
    }

    /// Print an arithmetic expression.
    pub fn print_arithmetic(&self, expr: &Arithmetic) -> String {
        match &expr.kind {
            ArithKind::Add(a, b) => self.binary(a, "+", b),
            ArithKind::Sub(a, b) => self.binary(a, "-", b),
            ArithKind::Mul(a, b) => self.binary(a, "*", b),
            ArithKind::Div(a, b) => self.binary(a, "/", b),
            ArithKind::Mod(a, b) => self.binary(a, "%", b),
            ArithKind::Exp(a, b) => self.binary(a, "^", b),
            ArithKind::Int(value) => self.arith_leaf(value.to_string()),
            ArithKind::Float(value) => self.arith_leaf(format_float(*value)),
            ArithKind::Field(field) => self.arith_leaf(self.print_field(field)),
        }
    }

    fn binary(&self, a: &Arithmetic, op: &str, b: &Arithmetic) -> String {
        format!(
            "({} {} {})",
            self.print_arithmetic(a),
            op,
            self.print_arithmetic(b)
        )
    }

    fn arith_leaf(&self, text: String) -> String {
        match self.syntax {
            Syntax::Surface => text,
            Syntax::Oracle => format!("({}):Arithmetic", text),
        }
    }

    fn logic_leaf(&self, text: String) -> String {
        match self.syntax {
            Syntax::Surface => text,
            Syntax::Oracle => format!("({}):Logical", text),
        }
    }

    /// Print a logical expression.
    pub fn print_logical(&self, expr: &Logical) -> String {
        match &expr.kind {
            LogicKind::And(a, b) => {
                format!("({} and {})", self.print_logical(a), self.print_logical(b))
            }
            LogicKind::Or(a, b) => {
                format!("({} or {})", self.print_logical(a), self.print_logical(b))
            }
            LogicKind::Not(inner) => format!("not {}", self.print_logical(inner)),
            LogicKind::Comparison { lhs, op, rhs } => {
                format!(
                    "({} {} {})",
                    self.print_arithmetic(lhs),
                    self.compare_op(*op),
                    self.print_arithmetic(rhs)
                )
            }
            LogicKind::Bool(value) => self.logic_leaf(value.to_string()),
            LogicKind::Field(field) => self.logic_leaf(self.print_field(field)),
        }
    }

    fn compare_op(&self, op: CompareOp) -> &'static str {
        match self.syntax {
            Syntax::Surface => match op {
                CompareOp::Eq => "==",
                CompareOp::Neq => "!=",
                CompareOp::Gt => ">",
                CompareOp::Lt => "<",
                CompareOp::Gte => ">=",
                CompareOp::Lte => "<=",
            },
            Syntax::Oracle => match op {
                CompareOp::Eq => "eqs",
                CompareOp::Neq => "neq",
                CompareOp::Gt => "gt",
                CompareOp::Lt => "lt",
                CompareOp::Gte => "gte",
                CompareOp::Lte => "lte",
            },
        }
    }

    /// Print a field reference.
    pub fn print_field(&self, field: &Field) -> String {
        let op = match field.member_op {
            MemberOp::Builtin => "::",
            MemberOp::Custom => ".",
            MemberOp::Language => "->",
        };
        format!(
            "{}{}{}",
            self.print_unit_object(&field.unit),
            op,
            field.name
        )
    }

    pub fn print_unit_object(&self, unit: &UnitObject) -> String {
        match unit {
            UnitObject::This => "this".to_string(),
            UnitObject::Type => "type".to_string(),
            UnitObject::Identifier(name) => name.clone(),
        }
    }

    /// Print one unit declaration.
    pub fn print_unit(&self, unit: &UnitDecl) -> String {
        let inits: Vec<String> = unit
            .initializers
            .iter()
            .map(|init| self.print_initializer(init))
            .collect();
        format!("unit {} : {};\n", unit.name, inits.join(", "))
    }

    pub fn print_initializer(&self, init: &TraitInitializer) -> String {
        if init.values.is_empty() {
            return init.name.clone();
        }
        let values: Vec<String> = init
            .values
            .iter()
            .map(|(name, value)| format!("{} = {}", name, self.print_literal(value)))
            .collect();
        format!("{}({})", init.name, values.join(", "))
    }

    pub fn print_literal(&self, literal: &Literal) -> String {
        match literal {
            Literal::Bool(value) => value.to_string(),
            Literal::Int(value) => value.to_string(),
            Literal::Float(value) => format_float(*value),
        }
    }
}

/// Render a float so that it always lexes back as a float literal.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOp, Field, MemberOp, UnitObject};
    use crate::foundation::{NodeArena, Span};
    use crate::parser;

    fn span() -> Span {
        Span::zero(0)
    }

    #[test]
    fn test_format_float_always_has_decimal() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-3.0), "-3.0");
    }

    #[test]
    fn test_comparison_spellings() {
        let mut arena = NodeArena::new();
        let field = Field::new(&mut arena, span(), UnitObject::This, MemberOp::Custom, "x");
        let lhs = Arithmetic::field(&mut arena, span(), field);
        let rhs = Arithmetic::int(&mut arena, span(), 0);
        let cmp = Logical::comparison(&mut arena, span(), lhs, CompareOp::Gte, rhs);

        assert_eq!(Printer::surface().print_logical(&cmp), "(this.x >= 0)");
        assert_eq!(
            Printer::oracle().print_logical(&cmp),
            "((this.x):Arithmetic gte (0):Arithmetic)"
        );
    }

    #[test]
    fn test_oracle_annotates_logical_leaves() {
        let mut arena = NodeArena::new();
        let field = Field::new(&mut arena, span(), UnitObject::This, MemberOp::Custom, "armed");
        let leaf = Logical::field(&mut arena, span(), field);
        let not = Logical::not(&mut arena, span(), leaf);

        assert_eq!(Printer::surface().print_logical(&not), "not this.armed");
        assert_eq!(
            Printer::oracle().print_logical(&not),
            "not (this.armed):Logical"
        );
    }

    #[test]
    fn test_print_round_trips_through_parser() {
        let source = "trait A {
            properties { x: int<0, 15>, armed: bool }
            always {
                this.x := (this.x + 1);
                if (this.armed and (this.x > 3)) { this.x := 0; }
                if becomes this.armed { this.x += 1; }
                for u in range 5 of this with trait A { u.x := 2; }
            }
        }
        unit U : A(x = 3);";

        let mut arena = NodeArena::new();
        let program = parser::parse(source, 0, &mut arena).expect("parse failed");
        let printed = Printer::surface().print_program(&program);

        // The canonical form must itself parse, and printing it again
        // must be a fixed point.
        let mut arena2 = NodeArena::new();
        let reparsed = parser::parse(&printed, 0, &mut arena2).expect("reparse failed");
        let reprinted = Printer::surface().print_program(&reparsed);
        assert_eq!(printed, reprinted);

        // The for range renders as a float even though the source wrote
        // an integer.
        assert!(printed.contains("in range 5.0 of"));
    }

    #[test]
    fn test_print_unit_initializers() {
        let source = "trait A { properties { x: int<0, 15> } always { } }
            unit U : A(x = 3);
            unit V : A;";

        let mut arena = NodeArena::new();
        let program = parser::parse(source, 0, &mut arena).expect("parse failed");
        let printed = Printer::surface().print_program(&program);

        assert!(printed.contains("unit U : A(x = 3);"));
        assert!(printed.contains("unit V : A;"));
    }
}
