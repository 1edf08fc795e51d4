// Copyright 2026 Glowlight Project Authors. Licensed under Apache-2.0.

//! Query optimization.
//!
//! The only cost-based rule this crate ships is join-order selection; it
//! is invoked once per logical subplan and rewrites the plan in place.

pub mod expr_utils;
pub mod join_order;

pub use self::join_order::{JoinOrderConfig, JoinOrderOptimizer, OptimizeError};
