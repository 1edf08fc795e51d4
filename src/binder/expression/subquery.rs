// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use serde::Serialize;

use crate::types::DataType;

/// A bound scalar subquery expression.
///
/// The subquery's own plan is kept on the frontend side; the optimizer
/// only needs to know whether it is correlated with the enclosing query.
#[derive(PartialEq, Eq, Clone, Serialize)]
pub struct BoundSubquery {
    pub is_correlated: bool,
    pub return_type: DataType,
}

impl std::fmt::Debug for BoundSubquery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_correlated {
            write!(f, "Subquery (correlated)")
        } else {
            write!(f, "Subquery")
        }
    }
}
