use crate::value::Value;

/// How a statement finished.
///
/// `return` travels up through blocks and loops as a value of this type,
/// never as a [`RuntimeError`](crate::RuntimeError).
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    Return(Value),
}
