//! Debug assertion macros for the invariants documented on [`crate::Brb`].
//!
//! Active only in debug builds (`#[cfg(debug_assertions)]`); zero overhead
//! in release builds.

// =============================================================================
// INV-BRB-01: Bounded fill
// =============================================================================

/// Assert `0 <= filled <= capacity`.
macro_rules! debug_assert_bounded_fill {
    ($filled:expr, $capacity:expr) => {
        debug_assert!(
            $filled <= $capacity,
            "INV-BRB-01 violated: filled {} exceeds capacity {}",
            $filled,
            $capacity
        )
    };
}

// =============================================================================
// INV-BRB-02: Pointer/fill consistency
// =============================================================================

/// Assert `read_ptr == (write_ptr - filled) mod capacity` (or `read_ptr ==
/// write_ptr` when `filled == 0`).
macro_rules! debug_assert_ptr_consistency {
    ($read_ptr:expr, $write_ptr:expr, $filled:expr, $capacity:expr) => {
        debug_assert!(
            if $filled == 0 {
                $read_ptr == $write_ptr
            } else {
                $read_ptr == ($write_ptr + $capacity - $filled) % $capacity
            },
            "INV-BRB-02 violated: read_ptr {} write_ptr {} filled {} capacity {}",
            $read_ptr,
            $write_ptr,
            $filled,
            $capacity
        )
    };
}

// =============================================================================
// INV-BRB-04: Writer-finished is one-shot
// =============================================================================

/// Assert that a write is not accepted once `writer_finished` was set.
macro_rules! debug_assert_no_write_after_finished {
    ($writer_finished:expr, $accepted:expr) => {
        debug_assert!(
            !($writer_finished && $accepted),
            "INV-BRB-04 violated: write accepted after writer_finished"
        )
    };
}

pub(crate) use debug_assert_bounded_fill;
pub(crate) use debug_assert_no_write_after_finished;
pub(crate) use debug_assert_ptr_consistency;
