//! Runtime fault types.

use rlox_types::Span;
use thiserror::Error;

/// A fault raised while executing a program. The first fault aborts the
/// run; there is no recovery inside the interpreter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// An operator was applied to operands of the wrong type.
    #[error("{message}")]
    TypeMismatch { message: String, span: Span },

    /// The callee of a call expression is not a function.
    #[error("Can only call functions.")]
    NotCallable { span: Span },

    /// Argument count differs from the callee's parameter count.
    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch {
        expected: usize,
        got: usize,
        span: Span,
    },

    /// Read or assignment of a name with no binding.
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, span: Span },

    /// Nested calls went deeper than `EvalConfig::max_call_depth`.
    #[error("Stack overflow.")]
    StackOverflow { span: Span },

    /// `print` could not write to stdout, e.g. a closed pipe.
    #[error("Could not write output: {message}")]
    Output { message: String, span: Span },
}

impl RuntimeError {
    pub(crate) fn type_mismatch(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    /// Span of the token that faulted.
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::NotCallable { span }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::StackOverflow { span }
            | RuntimeError::Output { span, .. } => *span,
        }
    }

    pub fn line(&self) -> u32 {
        self.span().line
    }
}

/// Evaluator result type alias.
pub type EvalResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let span = Span::at(3, 7);
        assert_eq!(
            RuntimeError::type_mismatch("Operand must be a number.", span).to_string(),
            "Operand must be a number."
        );
        assert_eq!(
            RuntimeError::ArityMismatch {
                expected: 2,
                got: 1,
                span
            }
            .to_string(),
            "Expected 2 arguments but got 1."
        );
        assert_eq!(
            RuntimeError::UndefinedVariable {
                name: "x".into(),
                span
            }
            .to_string(),
            "Undefined variable 'x'."
        );
    }

    #[test]
    fn line_comes_from_span() {
        let err = RuntimeError::NotCallable {
            span: Span::new(4, 1, 4, 2),
        };
        assert_eq!(err.line(), 4);
        assert_eq!(err.span(), Span::new(4, 1, 4, 2));
    }
}
