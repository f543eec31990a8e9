use brb::BrbError;
use thiserror::Error;

/// Sentinel outcomes for [`Srb::read`](crate::Srb::read) and the other
/// fallible `Srb` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SrbError {
    /// Invalid construction argument.
    #[error("invalid argument: {0}")]
    Fail(&'static str),

    /// The next byte due to the reader is an anchor: pop it with
    /// [`Srb::get_anchor`](crate::Srb::get_anchor) before reading further.
    #[error("an anchor is due before the next byte")]
    FetchAnchor,

    /// [`Srb::get_anchor`](crate::Srb::get_anchor) was called but the head
    /// anchor (if any) has not been reached yet.
    #[error("no anchor is due yet")]
    NoAnchors,

    /// Passed through from the underlying [`Brb`](brb::Brb).
    #[error(transparent)]
    Brb(#[from] BrbError),
}
