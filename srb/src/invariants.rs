//! Debug assertion macros for the invariants documented on [`crate::Srb`].
//!
//! Active only in debug builds; zero overhead in release builds.

// =============================================================================
// INV-SRB-01: Anchor list stays sorted
// =============================================================================

/// Assert the anchor list remains sorted by `offset` ascending after an
/// insertion.
///
/// Walks the deque via `iter()`, which yields logical order regardless of
/// where the backing ring has wrapped; checking `as_slices().0`/`.1`
/// separately would miss a violation straddling that wrap point.
macro_rules! debug_assert_anchors_sorted {
    ($anchors:expr) => {
        debug_assert!(
            $anchors
                .iter()
                .zip($anchors.iter().skip(1))
                .all(|(a, b)| a.offset <= b.offset),
            "INV-SRB-01 violated: anchor list is not sorted by offset"
        )
    };
}

// =============================================================================
// INV-SRB-02: Offset consistency
// =============================================================================

/// Assert `write_offset == read_offset + filled` at a quiescent point.
macro_rules! debug_assert_offset_consistency {
    ($read_offset:expr, $filled:expr, $write_offset:expr) => {
        debug_assert!(
            $read_offset + ($filled as u64) == $write_offset,
            "INV-SRB-02 violated: read_offset {} + filled {} != write_offset {}",
            $read_offset,
            $filled,
            $write_offset
        )
    };
}

pub(crate) use debug_assert_anchors_sorted;
pub(crate) use debug_assert_offset_consistency;
