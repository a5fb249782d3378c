//! Runtime object model shared by the evaluator: values, classes, holders,
//! comparisons, and the context threaded through execution.

pub mod compare;
pub mod context;
pub mod error;
pub mod object;
pub mod value;

pub use context::Context;
pub use error::{ExecResult, Interrupt, RuntimeError};
pub use object::{Closure, ObjectHolder, is_true};
pub use value::{Class, ClassInstance, Method, Value};
