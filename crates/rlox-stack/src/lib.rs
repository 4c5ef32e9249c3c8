//! Stack safety for deep recursion.
//!
//! The parser, resolver and interpreter all recurse over the tree, so
//! deeply nested source or deep Lox recursion would otherwise run out of
//! host stack. Wrapping the recursive entry points in
//! [`ensure_sufficient_stack`] grows the stack on demand instead.
//!
//! - **Red zone**: 128KB. Below this much remaining stack, we grow.
//! - **Growth size**: 1MB per new segment.

const RED_ZONE: usize = 128 * 1024;

const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_closure_result() {
        assert_eq!(ensure_sufficient_stack(|| 42), 42);
        let result: Result<i32, &str> = ensure_sufficient_stack(|| Err("no"));
        assert_eq!(result, Err("no"));
    }

    #[test]
    fn test_deep_recursion() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }

        // Far deeper than a 2MB test thread allows without growth.
        assert_eq!(depth(100_000), 100_000);
    }
}
