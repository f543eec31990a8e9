/// An out-of-band marker placed at a logical byte offset in an [`Srb`](crate::Srb)'s
/// stream.
///
/// `Srb` never interprets `payload`; it only orders anchors by `offset` and
/// hands them back to the reader at the exact offset they were placed, so
/// `P` can be anything the caller wants to carry alongside the byte stream
/// (a frame boundary marker, a format-change descriptor, a timestamp, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor<P> {
    /// Logical byte offset (since the `Srb`'s creation, or last
    /// [`reset_read_offset`](crate::Srb::reset_read_offset)) this anchor is
    /// anchored to.
    pub offset: u64,
    /// Caller-owned payload, opaque to `Srb`.
    pub payload: P,
}

impl<P> Anchor<P> {
    /// Creates an anchor at an explicit offset.
    #[must_use]
    pub fn new(offset: u64, payload: P) -> Self {
        Self { offset, payload }
    }
}
