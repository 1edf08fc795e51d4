// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use serde::Serialize;

use crate::parser::{BinaryOperator, UnaryOperator};
use crate::types::{DataType, DataTypeExt, DataTypeKind, DataValue};

mod binary_op;
mod column_ref;
mod input_ref;
mod subquery;
mod unary_op;

pub use self::binary_op::*;
pub use self::column_ref::*;
pub use self::input_ref::*;
pub use self::subquery::*;
pub use self::unary_op::*;

/// A bound expression.
#[derive(PartialEq, Clone, Serialize)]
pub enum BoundExpr {
    Constant(DataValue),
    ColumnRef(BoundColumnRef),
    /// Only used after column ref is resolved into input ref
    InputRef(BoundInputRef),
    BinaryOp(BoundBinaryOp),
    UnaryOp(BoundUnaryOp),
    Subquery(BoundSubquery),
}

impl BoundExpr {
    pub fn return_type(&self) -> Option<DataType> {
        match self {
            Self::Constant(v) => v.data_type(),
            Self::ColumnRef(expr) => Some(expr.return_type),
            Self::InputRef(expr) => Some(expr.return_type),
            Self::BinaryOp(expr) => Some(expr.return_type),
            Self::UnaryOp(expr) => Some(expr.return_type),
            Self::Subquery(expr) => Some(expr.return_type),
        }
    }

    /// Whether the expression belongs to the comparison class, i.e. it is
    /// a binary operation over `=`, `<>`, `<`, `<=`, `>` or `>=`.
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::BinaryOp(op) if op.is_comparison())
    }

    /// Build a column reference with depth 0.
    pub fn column_ref(table_index: u32, column_index: u32) -> Self {
        Self::ColumnRef(BoundColumnRef {
            table_index,
            column_index,
            depth: 0,
            return_type: DataTypeKind::Int32.nullable(),
        })
    }

    /// Build a comparison between two expressions.
    pub fn comparison(op: BinaryOperator, left: BoundExpr, right: BoundExpr) -> Self {
        Self::BinaryOp(BoundBinaryOp {
            op,
            left_expr: Box::new(left),
            right_expr: Box::new(right),
            return_type: DataTypeKind::Bool.nullable(),
        })
    }

    /// Build a `NOT` over an expression.
    pub fn not(expr: BoundExpr) -> Self {
        Self::UnaryOp(BoundUnaryOp {
            op: UnaryOperator::Not,
            expr: Box::new(expr),
            return_type: DataTypeKind::Bool.nullable(),
        })
    }

    /// Collect the table index of every depth-0 column reference.
    pub fn referenced_tables(&self, tables: &mut Vec<u32>) {
        use crate::binder::ExprVisitor;
        struct Visitor<'a>(&'a mut Vec<u32>);
        impl ExprVisitor for Visitor<'_> {
            fn visit_column_ref(&mut self, expr: &BoundColumnRef) {
                if expr.depth == 0 {
                    self.0.push(expr.table_index);
                }
            }
        }
        Visitor(tables).visit_expr(self);
    }
}

impl std::fmt::Debug for BoundExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "{:?} (const)", v),
            Self::ColumnRef(expr) => write!(f, "{:?}", expr),
            Self::InputRef(expr) => write!(f, "{:?}", expr),
            Self::BinaryOp(expr) => write!(f, "{:?}", expr),
            Self::UnaryOp(expr) => write!(f, "{:?}", expr),
            Self::Subquery(expr) => write!(f, "{:?}", expr),
        }
    }
}

impl std::fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
