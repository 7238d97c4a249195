//! Argument validation engine.
//!
//! Provides rule specifications and their parsed form, plus the pure-logic
//! evaluator that checks one parameter value against an expected type set
//! and an ordered rule list.

pub mod evaluator;
pub mod rules;
