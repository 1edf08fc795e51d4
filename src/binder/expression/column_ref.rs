// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use serde::Serialize;

use crate::types::DataType;

/// A bound column reference expression.
///
/// `table_index` is the binder-assigned index of the producing table,
/// `depth` counts how many subquery levels the reference reaches out of;
/// depth 0 is a reference into the current query.
#[derive(PartialEq, Eq, Clone, Serialize)]
pub struct BoundColumnRef {
    pub table_index: u32,
    pub column_index: u32,
    pub depth: u32,
    pub return_type: DataType,
}

impl std::fmt::Debug for BoundColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.table_index, self.column_index)?;
        if self.depth > 0 {
            write!(f, " (depth {})", self.depth)?;
        }
        Ok(())
    }
}
