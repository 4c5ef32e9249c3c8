//! rlox tree-walking interpreter.
//!
//! Executes a resolved program directly from the AST. Variable reads and
//! writes use the resolver's hop counts to find the right environment;
//! unresolved names go straight to the globals.

mod control_flow;
mod environment;
mod error;
mod interpreter;
mod natives;
mod value;

pub use control_flow::ControlFlow;
pub use environment::{EnvRef, Environment};
pub use error::{EvalResult, RuntimeError};
pub use interpreter::{EvalConfig, Interpreter, Output, DEFAULT_MAX_CALL_DEPTH};
pub use value::{LoxClass, LoxFunction, NativeFn, NativeFunction, Value};
