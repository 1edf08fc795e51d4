// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

//! Bound expressions.
//!
//! Binding itself happens in the SQL frontend; the optimizer only ever
//! sees expressions in this already-bound form. Column references carry a
//! `(table_index, column_index, depth)` binding, where a nonzero depth
//! marks a correlated reference into an enclosing query.

mod expr_visitor;
mod expression;

pub use self::expr_visitor::*;
pub use self::expression::*;
