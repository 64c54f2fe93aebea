//! Operator rebalancing.
//!
//! `#lh-expr-lhs * #stm-rhs` parses its right-hand side greedily, so
//! `a * b + c` first comes out as `a * (b + c)`. When the freshly parsed
//! right-hand side is an operator of lower or equal precedence, `lhs` is
//! pushed down to its leftmost operand instead. Groups are opaque.

use crate::parser::ast::{BinaryOp, CompareOp, Stmt, StmtKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Binary(BinaryOp),
    Compare(CompareOp),
}

impl Operator {
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Compare(_) => 1,
            Operator::Binary(BinaryOp::Add | BinaryOp::Sub) => 2,
            Operator::Binary(BinaryOp::Mul | BinaryOp::Div) => 3,
        }
    }

    fn build(self, lhs: Stmt, rhs: Stmt) -> StmtKind {
        let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
        match self {
            Operator::Binary(op) => StmtKind::Binary { op, lhs, rhs },
            Operator::Compare(op) => StmtKind::Compare { op, lhs, rhs },
        }
    }
}

fn split(stmt: Stmt) -> Result<(Operator, Stmt, Stmt), Stmt> {
    match stmt.node {
        StmtKind::Binary { op, lhs, rhs } => Ok((Operator::Binary(op), *lhs, *rhs)),
        StmtKind::Compare { op, lhs, rhs } => Ok((Operator::Compare(op), *lhs, *rhs)),
        node => Err(Stmt { node, span: stmt.span }),
    }
}

/// Build `lhs op rhs`, rotating `rhs` when it binds looser than (or as loose as) `op`.
pub fn attach(op: Operator, lhs: Stmt, rhs: Stmt) -> StmtKind {
    let rhs = match split(rhs) {
        Ok((inner, inner_lhs, inner_rhs)) if inner.precedence() <= op.precedence() => {
            let left = attach(op, lhs, inner_lhs);
            let span = operand_span(&left, &inner_rhs);
            let left = Stmt { node: left, span };
            return inner.build(left, inner_rhs);
        }
        Ok((inner, inner_lhs, inner_rhs)) => {
            let span = inner_lhs.span.join(&inner_rhs.span);
            Stmt { node: inner.build(inner_lhs, inner_rhs), span }
        }
        Err(rhs) => rhs,
    };
    op.build(lhs, rhs)
}

fn operand_span(node: &StmtKind, next: &Stmt) -> crate::span::Span {
    let (lhs, rhs) = match node {
        StmtKind::Binary { lhs, rhs, .. } | StmtKind::Compare { lhs, rhs, .. } => (lhs, rhs),
        _ => return next.span.clone(),
    };
    lhs.span.join(&rhs.span)
}
