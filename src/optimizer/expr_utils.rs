// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use crate::binder::BoundExpr;
use crate::parser::BinaryOperator;
use crate::parser::BinaryOperator::And;

/// Split a predicate on `AND` into its conjuncts.
pub fn conjunctions_inner(expr: BoundExpr, rets: &mut Vec<BoundExpr>) {
    match expr {
        BoundExpr::BinaryOp(bin_expr) if bin_expr.op == And => {
            conjunctions_inner(*bin_expr.left_expr, rets);
            conjunctions_inner(*bin_expr.right_expr, rets);
        }
        _ => rets.push(expr),
    }
}

pub fn conjunctions(expr: BoundExpr) -> Vec<BoundExpr> {
    let mut rets = vec![];
    conjunctions_inner(expr, &mut rets);
    rets
}

/// Whether the operator is one of `=`, `<>`, `<`, `<=`, `>`, `>=`.
pub fn is_comparison(op: &BinaryOperator) -> bool {
    use BinaryOperator::*;
    matches!(op, Eq | NotEq | Lt | LtEq | Gt | GtEq)
}

/// The comparison that holds when the operands are swapped:
/// `a < b` iff `b > a`.
pub fn flip_comparison(op: BinaryOperator) -> BinaryOperator {
    use BinaryOperator::*;
    match op {
        Eq => Eq,
        NotEq => NotEq,
        Lt => Gt,
        Gt => Lt,
        LtEq => GtEq,
        GtEq => LtEq,
        other => panic!("flip of non-comparison operator {}", other),
    }
}

/// The comparison equivalent to `NOT (a op b)`, or `None` if `op` is not
/// a comparison: `NOT (a = b)` is `a <> b`, `NOT (a > b)` is `a <= b`.
pub fn negate_comparison(op: &BinaryOperator) -> Option<BinaryOperator> {
    use BinaryOperator::*;
    match op {
        Eq => Some(NotEq),
        NotEq => Some(Eq),
        Lt => Some(GtEq),
        Gt => Some(LtEq),
        LtEq => Some(Gt),
        GtEq => Some(Lt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BinaryOperator::*;

    #[test]
    fn test_flip_comparison() {
        assert_eq!(flip_comparison(Eq), Eq);
        assert_eq!(flip_comparison(NotEq), NotEq);
        assert_eq!(flip_comparison(Lt), Gt);
        assert_eq!(flip_comparison(GtEq), LtEq);
    }

    #[test]
    fn test_negate_comparison() {
        assert_eq!(negate_comparison(&Eq), Some(NotEq));
        assert_eq!(negate_comparison(&Gt), Some(LtEq));
        assert_eq!(negate_comparison(&LtEq), Some(Gt));
        assert_eq!(negate_comparison(&And), None);
    }

    #[test]
    fn test_conjunctions() {
        let a = BoundExpr::column_ref(0, 0);
        let b = BoundExpr::column_ref(1, 0);
        let eq = BoundExpr::comparison(Eq, a.clone(), b.clone());
        let gt = BoundExpr::comparison(Gt, a, b);
        let conj = BoundExpr::comparison(And, eq.clone(), gt.clone());
        assert_eq!(conjunctions(conj), vec![eq.clone(), gt]);
        assert_eq!(conjunctions(eq.clone()), vec![eq]);
    }
}
