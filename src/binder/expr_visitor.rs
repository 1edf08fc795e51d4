// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use super::expression::*;
use crate::types::DataValue;

/// Traverse a bound expression tree. Each `visit_*` method defaults to
/// recursing into children; override the ones you care about.
pub trait ExprVisitor {
    fn visit_expr(&mut self, expr: &BoundExpr) {
        match expr {
            BoundExpr::Constant(v) => self.visit_constant(v),
            BoundExpr::ColumnRef(expr) => self.visit_column_ref(expr),
            BoundExpr::InputRef(expr) => self.visit_input_ref(expr),
            BoundExpr::BinaryOp(expr) => self.visit_binary_op(expr),
            BoundExpr::UnaryOp(expr) => self.visit_unary_op(expr),
            BoundExpr::Subquery(expr) => self.visit_subquery(expr),
        }
    }

    fn visit_constant(&mut self, _: &DataValue) {}

    fn visit_column_ref(&mut self, _: &BoundColumnRef) {}

    fn visit_input_ref(&mut self, _: &BoundInputRef) {}

    fn visit_binary_op(&mut self, expr: &BoundBinaryOp) {
        self.visit_expr(expr.left_expr.as_ref());
        self.visit_expr(expr.right_expr.as_ref());
    }

    fn visit_unary_op(&mut self, expr: &BoundUnaryOp) {
        self.visit_expr(expr.expr.as_ref());
    }

    fn visit_subquery(&mut self, _: &BoundSubquery) {}
}
