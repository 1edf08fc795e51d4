// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use serde::Serialize;

use super::BoundExpr;
use crate::parser::UnaryOperator;
use crate::types::DataType;

/// A bound unary operation expression.
#[derive(PartialEq, Clone, Serialize)]
pub struct BoundUnaryOp {
    pub op: UnaryOperator,
    pub expr: Box<BoundExpr>,
    pub return_type: DataType,
}

impl std::fmt::Debug for BoundUnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:?}", self.op, self.expr)
    }
}
