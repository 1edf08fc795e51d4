// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

use serde::Serialize;

use super::PlanNodeId;
use crate::binder::BoundExpr;
use crate::parser::BinaryOperator;

/// A node of the logical plan.
///
/// Every operator carries its children and a list of predicate
/// expressions; per-kind payloads live in [`LogicalOperatorKind`]. Filter
/// and inner-join expressions are implicitly conjoined.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct LogicalOperator {
    pub kind: LogicalOperatorKind,
    pub children: Vec<PlanNodeId>,
    pub expressions: Vec<BoundExpr>,
}

impl LogicalOperator {
    pub fn new(kind: LogicalOperatorKind) -> Self {
        LogicalOperator {
            kind,
            children: vec![],
            expressions: vec![],
        }
    }

    pub fn with_children(kind: LogicalOperatorKind, children: Vec<PlanNodeId>) -> Self {
        LogicalOperator {
            kind,
            children,
            expressions: vec![],
        }
    }

    /// The binder-assigned table index, for operators that produce a
    /// table binding.
    pub fn table_index(&self) -> Option<u32> {
        match &self.kind {
            LogicalOperatorKind::Get(get) => Some(get.table_index),
            LogicalOperatorKind::TableFunction(func) => Some(func.table_index),
            LogicalOperatorKind::Subquery(subquery) => Some(subquery.table_index),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            LogicalOperatorKind::Get(get) => {
                write!(f, "LogicalGet: table #{}", get.table_index)
            }
            LogicalOperatorKind::TableFunction(func) => {
                write!(f, "LogicalTableFunction: table #{}", func.table_index)
            }
            LogicalOperatorKind::Subquery(subquery) => {
                write!(f, "LogicalSubquery: table #{}", subquery.table_index)
            }
            LogicalOperatorKind::Filter => {
                write!(f, "LogicalFilter: {:?}", self.expressions)
            }
            LogicalOperatorKind::Projection => write!(f, "LogicalProjection"),
            LogicalOperatorKind::Aggregate => write!(f, "LogicalAggregate"),
            LogicalOperatorKind::Limit(limit) => {
                write!(f, "LogicalLimit: {} offset {}", limit.limit, limit.offset)
            }
            LogicalOperatorKind::Join(join) => {
                write!(f, "LogicalJoin: {} {:?}", join.join_type, join.conditions)?;
                if !self.expressions.is_empty() {
                    write!(f, " on {:?}", self.expressions)?;
                }
                Ok(())
            }
            LogicalOperatorKind::CrossProduct => write!(f, "LogicalCrossProduct"),
            LogicalOperatorKind::Union => write!(f, "LogicalUnion"),
            LogicalOperatorKind::Except => write!(f, "LogicalExcept"),
            LogicalOperatorKind::Intersect => write!(f, "LogicalIntersect"),
        }
    }
}

/// The kind tag of a [`LogicalOperator`], with per-kind payload.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum LogicalOperatorKind {
    Get(LogicalGet),
    TableFunction(LogicalTableFunction),
    Subquery(LogicalSubquery),
    Filter,
    Projection,
    Aggregate,
    Limit(LogicalLimit),
    Join(LogicalJoin),
    CrossProduct,
    Union,
    Except,
    Intersect,
}

/// A base table scan.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct LogicalGet {
    pub table_index: u32,
    pub estimated_cardinality: u64,
}

/// A table-producing function call.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct LogicalTableFunction {
    pub table_index: u32,
    pub estimated_cardinality: u64,
}

/// The root of a decorrelated subquery in the FROM clause.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct LogicalSubquery {
    pub table_index: u32,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct LogicalLimit {
    pub limit: usize,
    pub offset: usize,
}

/// The join payload: its type and the structured conditions. Predicates
/// that have not been normalized yet sit in the operator's `expressions`.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct LogicalJoin {
    pub join_type: JoinType,
    pub conditions: Vec<JoinCondition>,
}

impl LogicalJoin {
    pub fn inner() -> LogicalOperatorKind {
        LogicalOperatorKind::Join(LogicalJoin {
            join_type: JoinType::Inner,
            conditions: vec![],
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Outer,
    Semi,
    Anti,
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Right => "right",
            Self::Outer => "outer",
            Self::Semi => "semi",
            Self::Anti => "anti",
        };
        write!(f, "{}", name)
    }
}

/// A normalized join condition. The left expression references only the
/// join's left input, the right expression only its right input.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct JoinCondition {
    pub left: BoundExpr,
    pub right: BoundExpr,
    pub comparison: BinaryOperator,
}
