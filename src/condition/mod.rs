//! The closed-grammar routing conditions used by `logic` rules.
//!
//! Conditions are parsed once, when a flow is loaded, into the [`Condition`]
//! enum. Adding a new shape means adding a variant.

pub mod evaluator;
pub mod expression;

pub use evaluator::*;
pub use expression::*;
