//! Host stack growth for the recursive passes.
//!
//! Parsing, static checks, printing, evaluation and value rendering all
//! recurse over user-controlled nesting, so each recursive step goes through
//! [`ensure_sufficient_stack`].

/// Minimum stack to keep free before recursing further.
const RED_ZONE: usize = 100 * 1024;

/// Stack allocated each time the red zone is hit.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Grows the host stack when deep recursion gets close to exhausting it.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
