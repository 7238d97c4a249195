//! Runtime argument validation.
//!
//! Checks one parameter value at a time: its runtime type against an
//! expected set, then an ordered list of named rules (`ALPHA`, `IN-LIST`,
//! `GREATER-THAN`, ...). The first failure becomes a [`DuctTapeError`] whose
//! message points at the parameter in an annotated call signature:
//!
//! ```text
//! Incorrect second parameter type (string)! in
//! create_user( name, age: <number> )
//! ```

pub mod contract;
pub mod error;
pub mod ordinal;
pub mod signature;
pub mod types;
pub mod validation;

pub use contract::{CallContract, ParamCheck};
pub use error::{DuctTapeError, ErrorKind, ParamContext};
pub use signature::{describe_call, Signature};
pub use types::{type_of, Callable, ExpectedTypes, Inspect, TypeTag};
pub use validation::evaluator::{validate, validate_rules, validate_type};
pub use validation::rules::{Rule, RuleName, RuleSpec};
