// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use serde::Serialize;

use super::BoundExpr;
use crate::parser::BinaryOperator;
use crate::types::DataType;

/// A bound binary operation expression.
#[derive(PartialEq, Clone, Serialize)]
pub struct BoundBinaryOp {
    pub op: BinaryOperator,
    pub left_expr: Box<BoundExpr>,
    pub right_expr: Box<BoundExpr>,
    pub return_type: DataType,
}

impl BoundBinaryOp {
    pub fn is_comparison(&self) -> bool {
        use BinaryOperator::*;
        matches!(self.op, Eq | NotEq | Lt | LtEq | Gt | GtEq)
    }
}

impl std::fmt::Debug for BoundBinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:?} {} {:?})",
            self.left_expr, self.op, self.right_expr
        )
    }
}
