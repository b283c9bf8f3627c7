//! Arithmetic formulas over cell references.
//!
//! A formula is parsed once into a small expression tree and can then be
//! evaluated any number of times against a resolver that supplies the
//! numeric value of each referenced cell.
//!
//! Supported syntax: numbers (`3`, `2.5`, `1e-3`), cell references (`A1`),
//! `+ - * /`, unary `+`/`-` and parentheses.

use thiserror::Error;

use super::lexer::{Token, TokenKind, tokenize};
use super::{FormulaError, FormulaErrorKind, Position, format_number};

/// Formula text that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at offset {offset}: {message}")]
pub struct FormulaSyntaxError {
    /// Byte offset into the formula text (without the leading `=`).
    pub offset: usize,
    pub message: String,
}

impl FormulaSyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        FormulaSyntaxError {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Plus,
    Minus,
}

const UNARY_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Ref(Position),
    /// Well-formed reference outside the grid, kept by name. Evaluates to `#REF!`.
    InvalidRef(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Ref(_) | Expr::InvalidRef(_) => ATOM_PRECEDENCE,
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            Expr::Binary { op, .. } => op.precedence(),
        }
    }

    fn eval<F>(&self, resolve: &F) -> Result<f64, FormulaError>
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Ref(pos) => resolve(*pos),
            Expr::InvalidRef(_) => Err(FormulaError::new(FormulaErrorKind::Ref)),
            Expr::Unary { op, operand } => {
                let v = operand.eval(resolve)?;
                Ok(match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => -v,
                })
            }
            Expr::Binary { op, left, right } => {
                let l = left.eval(resolve)?;
                let r = right.eval(resolve)?;
                let result = match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            return Err(FormulaError::new(FormulaErrorKind::Div0));
                        }
                        l / r
                    }
                };
                if result.is_finite() {
                    Ok(result)
                } else {
                    Err(FormulaError::new(FormulaErrorKind::Div0))
                }
            }
        }
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            Expr::Number(n) => out.push_str(&format_number(*n)),
            Expr::Ref(pos) => out.push_str(&pos.to_string()),
            Expr::InvalidRef(name) => out.push_str(name),
            Expr::Unary { op, operand } => {
                out.push(match op {
                    UnaryOp::Plus => '+',
                    UnaryOp::Minus => '-',
                });
                write_operand(operand, operand.precedence() < UNARY_PRECEDENCE, out);
            }
            Expr::Binary { op, left, right } => {
                write_operand(left, left.precedence() < op.precedence(), out);
                out.push(op.symbol());
                // Binary operators group to the left, so an equal-precedence
                // right operand only comes from explicit parentheses.
                write_operand(right, right.precedence() <= op.precedence(), out);
            }
        }
    }

    fn collect_refs(&self, refs: &mut Vec<Position>) {
        match self {
            Expr::Ref(pos) => refs.push(*pos),
            Expr::Number(_) | Expr::InvalidRef(_) => {}
            Expr::Unary { operand, .. } => operand.collect_refs(refs),
            Expr::Binary { left, right, .. } => {
                left.collect_refs(refs);
                right.collect_refs(refs);
            }
        }
    }
}

fn write_operand(expr: &Expr, parenthesize: bool, out: &mut String) {
    if parenthesize {
        out.push('(');
        expr.write_canonical(out);
        out.push(')');
    } else {
        expr.write_canonical(out);
    }
}

/// A parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    /// Evaluate the formula, asking `resolve` for the value of each referenced cell.
    ///
    /// The first error produced (by the resolver or by arithmetic) is returned.
    pub fn evaluate<F>(&self, resolve: F) -> Result<f64, FormulaError>
    where
        F: Fn(Position) -> Result<f64, FormulaError>,
    {
        self.expr.eval(&resolve)
    }

    /// The formula re-serialized without whitespace and with only the
    /// parentheses needed to reproduce the same expression tree.
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        self.expr.write_canonical(&mut out);
        out
    }

    /// Valid positions the formula reads, sorted and without duplicates.
    pub fn referenced_positions(&self) -> Vec<Position> {
        let mut refs = Vec::new();
        self.expr.collect_refs(&mut refs);
        refs.sort();
        refs.dedup();
        refs
    }
}

/// Parse formula text (without the leading `=`).
pub fn parse_formula(text: &str) -> Result<Formula, FormulaSyntaxError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(FormulaSyntaxError::new(0, "empty formula"));
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: text.len(),
    };
    let expr = parser.parse_expr()?;
    if let Some(token) = parser.peek() {
        return Err(FormulaSyntaxError::new(
            token.offset,
            format!("unexpected {}", describe(&token.kind)),
        ));
    }
    Ok(Formula { expr })
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Offset reported for errors at end of input.
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expr(&mut self) -> Result<Expr, FormulaSyntaxError> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek().and_then(|t| match t.kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        }) {
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaSyntaxError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek().and_then(|t| match t.kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            _ => None,
        }) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaSyntaxError> {
        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Minus,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaSyntaxError> {
        let Some(token) = self.next() else {
            return Err(FormulaSyntaxError::new(self.end, "unexpected end of formula"));
        };
        match &token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(*n)),
            TokenKind::CellRef(name) => match Position::from_a1(name) {
                Some(pos) if pos.is_valid() => Ok(Expr::Ref(pos)),
                Some(_) => Ok(Expr::InvalidRef(name.to_ascii_uppercase())),
                None => Err(FormulaSyntaxError::new(
                    token.offset,
                    format!("unknown name '{}'", name),
                )),
            },
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(FormulaSyntaxError::new(
                        other.offset,
                        format!("expected ')', found {}", describe(&other.kind)),
                    )),
                    None => Err(FormulaSyntaxError::new(self.end, "missing ')'")),
                }
            }
            other => Err(FormulaSyntaxError::new(
                token.offset,
                format!("unexpected {}", describe(other)),
            )),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {}", format_number(*n)),
        TokenKind::CellRef(name) => format!("'{}'", name),
        TokenKind::Plus => "'+'".to_string(),
        TokenKind::Minus => "'-'".to_string(),
        TokenKind::Star => "'*'".to_string(),
        TokenKind::Slash => "'/'".to_string(),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn eval_with(text: &str, cells: &[(&str, f64)]) -> Result<f64, FormulaError> {
        let values: HashMap<Position, f64> = cells
            .iter()
            .map(|(name, v)| (Position::from_a1(name).unwrap(), *v))
            .collect();
        parse_formula(text)
            .unwrap()
            .evaluate(|pos| Ok(values.get(&pos).copied().unwrap_or(0.0)))
    }

    fn canonical(text: &str) -> String {
        parse_formula(text).unwrap().canonical_text()
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval_with("1+2*3", &[]), Ok(7.0));
        assert_eq!(eval_with("(1+2)*3", &[]), Ok(9.0));
        assert_eq!(eval_with("10-4-3", &[]), Ok(3.0));
        assert_eq!(eval_with("8/4/2", &[]), Ok(1.0));
        assert_eq!(eval_with("-2*-3", &[]), Ok(6.0));
    }

    #[test]
    fn test_evaluate_references() {
        assert_eq!(eval_with("A1+3", &[("A1", 5.0)]), Ok(8.0));
        assert_eq!(eval_with("A1*B2", &[("A1", 2.0), ("B2", 4.5)]), Ok(9.0));
    }

    #[test]
    fn test_division_by_zero() {
        let div0 = Err(FormulaError::new(FormulaErrorKind::Div0));
        assert_eq!(eval_with("1/0", &[]), div0);
        assert_eq!(eval_with("A1/B1", &[("A1", 1.0)]), div0);
        assert_eq!(eval_with("1e308*10", &[]), div0);
    }

    #[test]
    fn test_resolver_error_propagates() {
        let formula = parse_formula("1+A1").unwrap();
        let err = FormulaError::new(FormulaErrorKind::Value);
        assert_eq!(formula.evaluate(|_| Err(err)), Err(err));
    }

    #[test]
    fn test_out_of_range_reference_is_ref_error() {
        let formula = parse_formula("A1+ZZZ1").unwrap();
        assert_eq!(
            formula.evaluate(|_| Ok(1.0)),
            Err(FormulaError::new(FormulaErrorKind::Ref))
        );
        assert_eq!(formula.referenced_positions(), vec![Position::new(0, 0)]);
        assert_eq!(formula.canonical_text(), "A1+ZZZ1");
    }

    #[test]
    fn test_canonical_text_strips_whitespace_and_redundant_parens() {
        assert_eq!(canonical(" a1 +  3 "), "A1+3");
        assert_eq!(canonical("((A1))*(2)"), "A1*2");
        assert_eq!(canonical("(1+2)+3"), "1+2+3");
        assert_eq!(canonical("(1*2)+3"), "1*2+3");
        assert_eq!(canonical("1.50*2"), "1.5*2");
    }

    #[test]
    fn test_canonical_text_keeps_required_parens() {
        assert_eq!(canonical("(1+2)*3"), "(1+2)*3");
        assert_eq!(canonical("1-(2-3)"), "1-(2-3)");
        assert_eq!(canonical("1/(2*3)"), "1/(2*3)");
        assert_eq!(canonical("-(A1+B1)"), "-(A1+B1)");
        assert_eq!(canonical("2*-A1"), "2*-A1");
    }

    #[test]
    fn test_canonical_text_reparses_to_same_tree() {
        for text in ["1-(2-3)*4", "-(1/(2/3))", "A1/(B1*C1)-+2", "(A1+B1)/(C1-D1)"] {
            let first = parse_formula(text).unwrap();
            let second = parse_formula(&first.canonical_text()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_referenced_positions_sorted_and_deduplicated() {
        let formula = parse_formula("B2+A1+B2+A3+A1").unwrap();
        assert_eq!(
            formula.referenced_positions(),
            vec![Position::new(0, 0), Position::new(1, 1), Position::new(2, 0)]
        );
        assert!(parse_formula("1+2").unwrap().referenced_positions().is_empty());
    }

    #[test]
    fn test_syntax_errors() {
        for text in ["", "   ", "1+", "*2", "(1+2", "1+2)", "A1 B1", "SUM", "1 & 2", "()"] {
            assert!(parse_formula(text).is_err(), "expected error for {:?}", text);
        }
    }

    #[test]
    fn test_syntax_error_offsets() {
        assert_eq!(parse_formula("1+").unwrap_err().offset, 2);
        assert_eq!(parse_formula("1+2)").unwrap_err().offset, 3);
        assert_eq!(parse_formula("A1+FOO").unwrap_err().offset, 3);
    }
}
