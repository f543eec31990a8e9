use thiserror::Error;

/// Sentinel outcomes for [`Brb::read`](crate::Brb::read) and
/// [`Brb::write`](crate::Brb::write).
///
/// Distinct variants rather than magic negative integers, so a valid byte
/// count (including zero) is never confusable with a terminal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BrbError {
    /// Invalid construction argument (e.g. capacity < 2).
    #[error("invalid argument: {0}")]
    Fail(&'static str),

    /// The read or write side was aborted; no further progress is possible
    /// on that side until [`Brb::reset`](crate::Brb::reset).
    #[error("operation aborted")]
    Abort,

    /// The writer signalled end-of-stream and no unread bytes remain.
    #[error("writer finished, no more data")]
    WriterFinished,

    /// [`Brb::wakeup_reader`](crate::Brb::wakeup_reader) forced an early,
    /// zero-byte return.
    #[error("reader was woken up externally")]
    ReaderUnblock,

    /// The timeout elapsed with zero bytes transferred and no other
    /// terminal condition observed.
    #[error("operation timed out")]
    Timeout,
}
