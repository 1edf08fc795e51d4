// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

//! The operator vocabulary shared with the SQL frontend.
//!
//! Binding happens outside this crate; bound expressions still carry the
//! parser's operator enums, so they are re-exported here.

pub use sqlparser::ast::{BinaryOperator, UnaryOperator};
