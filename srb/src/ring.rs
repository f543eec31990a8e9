use crate::anchor::Anchor;
use crate::error::SrbError;
use crate::invariants::{debug_assert_anchors_sorted, debug_assert_offset_consistency};
use brb::{Brb, BrbError};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// State guarded by `Srb`'s anchor-list mutex (`lock` in the design).
struct State<P> {
    read_offset: u64,
    anchors: VecDeque<Anchor<P>>,
}

/// An anchored ring buffer: wraps a [`Brb`] and interleaves out-of-band
/// **anchors** into the byte stream, returned to the reader in order, at
/// the exact logical offset they were placed at.
///
/// `Srb` has no notion of what an anchor payload `P` means; it only orders
/// anchors by offset and hands them back via [`get_anchor`](Self::get_anchor)
/// at the right point in the stream.
pub struct Srb<P> {
    brb: Brb,
    /// Guards `read_offset` and the anchor list.
    lock: Mutex<State<P>>,
    /// Serializes reader-side operations (`read`, `drain`, `reset`) against
    /// each other, so the window between releasing `lock` and re-acquiring
    /// it mid-`read` can never interleave with another reader-side op.
    read_lock: Mutex<()>,
}

impl<P> Srb<P> {
    /// A small poll interval for [`drain`](Self::drain)'s internal
    /// null-destination reads, so draining past the end of a still-open
    /// stream doesn't busy-loop.
    pub const DEFAULT_DRAIN_TICK: Duration = Duration::from_millis(20);

    /// Creates a new anchored ring buffer with the given name and
    /// byte capacity.
    pub fn new(name: impl Into<String>, size: usize) -> Result<Self, SrbError> {
        let brb = Brb::new(name, size)?;
        Ok(Self {
            brb,
            lock: Mutex::new(State {
                read_offset: 0,
                anchors: VecDeque::new(),
            }),
            read_lock: Mutex::new(()),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<P>> {
        self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read_lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.read_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // -----------------------------------------------------------------
    // Write passthrough
    // -----------------------------------------------------------------

    /// Passes through to the underlying [`Brb::write`].
    pub fn write(&self, src: &[u8], timeout: Option<Duration>) -> Result<usize, SrbError> {
        Ok(self.brb.write(src, timeout)?)
    }

    // -----------------------------------------------------------------
    // Anchors
    // -----------------------------------------------------------------

    /// Inserts an anchor at its explicit `offset`.
    ///
    /// If `offset` is at or behind the current read offset, a reader
    /// blocked in [`read`](Self::read) is woken immediately so it can
    /// observe [`SrbError::FetchAnchor`].
    pub fn put_anchor(&self, anchor: Anchor<P>) -> Result<(), SrbError> {
        let wake = {
            let mut state = self.lock();
            let wake = anchor.offset <= state.read_offset;
            Self::insert(&mut state.anchors, anchor);
            debug_assert_anchors_sorted!(state.anchors);
            wake
        };
        if wake {
            log::debug!("srb '{}': late anchor, waking reader", self.brb.name());
            self.brb.wakeup_reader();
        }
        Ok(())
    }

    /// Inserts an anchor at the buffer's current write offset
    /// (`read_offset + filled`), computed under the lock.
    ///
    /// Returns the offset the anchor was actually placed at.
    pub fn put_anchor_at_current(&self, payload: P) -> Result<u64, SrbError> {
        let (offset, wake) = {
            let mut state = self.lock();
            let offset = state.read_offset + self.brb.filled() as u64;
            let wake = offset <= state.read_offset;
            Self::insert(&mut state.anchors, Anchor::new(offset, payload));
            debug_assert_anchors_sorted!(state.anchors);
            (offset, wake)
        };
        if wake {
            self.brb.wakeup_reader();
        }
        Ok(offset)
    }

    /// Inserts `anchor` into `anchors`, preserving sort-by-offset with
    /// FIFO order among equal offsets: it is inserted immediately after
    /// the last existing entry with `offset <= anchor.offset`.
    fn insert(anchors: &mut VecDeque<Anchor<P>>, anchor: Anchor<P>) {
        let pos = anchors
            .iter()
            .rposition(|a| a.offset <= anchor.offset)
            .map_or(0, |i| i + 1);
        anchors.insert(pos, anchor);
    }

    /// Pops the head anchor if and only if it is due (`offset <=
    /// read_offset`); otherwise returns [`SrbError::NoAnchors`].
    pub fn get_anchor(&self) -> Result<Anchor<P>, SrbError> {
        let mut state = self.lock();
        match state.anchors.front() {
            Some(a) if a.offset <= state.read_offset => Ok(state.anchors.pop_front().unwrap()),
            _ => Err(SrbError::NoAnchors),
        }
    }

    // -----------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------

    /// Reads up to `dst.len()` bytes, clamped so the read never crosses an
    /// anchor's offset.
    ///
    /// Returns [`SrbError::FetchAnchor`] without touching the underlying
    /// buffer if the next due byte is an anchor.
    pub fn read(&self, dst: &mut [u8], timeout: Option<Duration>) -> Result<usize, SrbError> {
        let _rl = self.read_lock();

        let clamp = {
            let state = self.lock();
            match state.anchors.front() {
                Some(a) if a.offset <= state.read_offset => return Err(SrbError::FetchAnchor),
                Some(a) => {
                    let distance = a.offset - state.read_offset;
                    (dst.len() as u64).min(distance) as usize
                }
                None => dst.len(),
            }
        };

        // NOTE: `lock` is released here. A `put_anchor` landing strictly
        // inside [read_offset, read_offset + clamp) while `Brb::read` is
        // in flight is the accepted race documented on `Srb::read`: those
        // bytes are delivered first, and the *next* `read` call returns
        // `FetchAnchor` because its distance becomes <= 0. Callers that
        // need stricter ordering must call `put_anchor_at_current` before
        // writing the bytes meant to follow it.
        let transferred = self.brb.read(&mut dst[..clamp], timeout)?;

        let mut state = self.lock();
        state.read_offset += transferred as u64;
        Ok(transferred)
    }

    // -----------------------------------------------------------------
    // Drain
    // -----------------------------------------------------------------

    /// Discards bytes (ignoring anchor boundaries) until `read_offset >=
    /// drain_upto` or the writer signals it is finished. Anchors are not
    /// removed; the next [`read`](Self::read) will return
    /// [`SrbError::FetchAnchor`] for each offset the drain passed over, in
    /// offset order.
    pub fn drain(&self, drain_upto: u64) -> Result<u64, SrbError> {
        self.drain_with_tick(drain_upto, Self::DEFAULT_DRAIN_TICK)
    }

    /// Like [`drain`](Self::drain), with an explicit poll interval.
    pub fn drain_with_tick(&self, drain_upto: u64, tick: Duration) -> Result<u64, SrbError> {
        let _rl = self.read_lock();
        loop {
            let read_offset = self.lock().read_offset;
            if read_offset >= drain_upto {
                return Ok(read_offset);
            }
            let remaining = drain_upto - read_offset;
            let want = usize::try_from(remaining).unwrap_or(usize::MAX);

            match self.brb.discard(want, Some(tick)) {
                Ok(n) => {
                    let mut state = self.lock();
                    state.read_offset += n as u64;
                }
                Err(BrbError::Timeout) => {
                    // Nothing arrived this tick; loop and re-check drain_upto.
                }
                Err(BrbError::ReaderUnblock) => {
                    // A concurrent put_anchor (or an external wakeup) fired
                    // while draining; absorb it and keep going rather than
                    // failing the drain.
                }
                Err(BrbError::WriterFinished) => {
                    return Ok(self.lock().read_offset);
                }
                Err(e) => return Err(SrbError::Brb(e)),
            }
        }
    }

    // -----------------------------------------------------------------
    // Offsets & reset
    // -----------------------------------------------------------------

    /// Cumulative bytes delivered to the reader since creation (or the
    /// last [`reset_read_offset`](Self::reset_read_offset)).
    #[must_use]
    pub fn read_offset(&self) -> u64 {
        self.lock().read_offset
    }

    /// `read_offset + filled`.
    #[must_use]
    pub fn write_offset(&self) -> u64 {
        let state = self.lock();
        let write_offset = state.read_offset + self.brb.filled() as u64;
        debug_assert_offset_consistency!(state.read_offset, self.brb.filled(), write_offset);
        write_offset
    }

    /// Bytes currently buffered and unread.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.brb.filled()
    }

    /// Advances `read_offset` by the currently unread byte count, then
    /// empties the underlying `Brb`. Non-blocking; drops unread bytes.
    /// Anchors are preserved.
    ///
    /// Takes `read_lock`, so this cannot interleave with an in-flight
    /// [`read`](Self::read)'s release-lock/re-acquire-lock window. A reader
    /// idle-blocked in `read(dst, None)` would otherwise make this call
    /// wait for however long that read takes to return, so an unblock
    /// signal goes out first to force it to return immediately, keeping
    /// `reset` itself non-blocking.
    pub fn reset(&self) {
        self.brb.wakeup_reader();
        let _rl = self.read_lock();
        let filled = self.brb.filled();
        {
            let mut state = self.lock();
            state.read_offset += filled as u64;
        }
        self.brb.reset();
    }

    /// Sets `read_offset` back to zero. Only safe to call when the caller
    /// knows no anchors are outstanding (an outstanding anchor's offset
    /// would no longer make sense relative to the new `read_offset`).
    pub fn reset_read_offset(&self) {
        self.lock().read_offset = 0;
    }

    // -----------------------------------------------------------------
    // Control delegation
    // -----------------------------------------------------------------

    /// Aborts both sides of the underlying `Brb`.
    pub fn abort(&self) {
        self.brb.abort();
    }

    /// Marks the underlying stream as finished.
    pub fn signal_writer_finished(&self) {
        self.brb.signal_writer_finished();
    }

    /// Forces a blocked reader to return early.
    pub fn wakeup_reader(&self) {
        self.brb.wakeup_reader();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_between_bytes() {
        let srb: Srb<&'static str> = Srb::new("anchor-test", 32).unwrap();
        srb.write(&[0u8; 10], None).unwrap();
        srb.put_anchor(Anchor::new(10, "X")).unwrap();
        srb.write(&[1u8; 5], None).unwrap();

        let mut buf = [0u8; 20];
        let n = srb.read(&mut buf, None).unwrap();
        assert_eq!(n, 10);

        assert_eq!(srb.read(&mut buf, None), Err(SrbError::FetchAnchor));
        let anchor = srb.get_anchor().unwrap();
        assert_eq!(anchor, Anchor::new(10, "X"));

        let n2 = srb.read(&mut buf, None).unwrap();
        assert_eq!(n2, 5);
    }

    #[test]
    fn drain_past_anchors_preserves_them() {
        let srb: Srb<u32> = Srb::new("drain-test", 64).unwrap();
        srb.write(&[7u8; 30], None).unwrap();
        srb.put_anchor(Anchor::new(10, 1)).unwrap();
        srb.put_anchor(Anchor::new(20, 2)).unwrap();

        let reached = srb.drain(25).unwrap();
        assert_eq!(reached, 25);

        assert_eq!(srb.read(&mut [0u8; 5], None), Err(SrbError::FetchAnchor));
        assert_eq!(srb.get_anchor().unwrap().payload, 1);

        assert_eq!(srb.read(&mut [0u8; 5], None), Err(SrbError::FetchAnchor));
        assert_eq!(srb.get_anchor().unwrap().payload, 2);

        let mut buf = [0u8; 5];
        assert_eq!(srb.read(&mut buf, None).unwrap(), 5);
    }

    #[test]
    fn late_anchor_wakes_sleeping_reader() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        // No bytes buffered yet: a reader calling `read` blocks inside the
        // underlying `Brb`. Inserting an anchor at or behind the current
        // read_offset must wake it rather than leave it blocked forever.
        let srb: Arc<Srb<&'static str>> = Arc::new(Srb::new("wake-test", 32).unwrap());

        let reader = {
            let srb = Arc::clone(&srb);
            thread::spawn(move || {
                let mut buf = [0u8; 5];
                srb.read(&mut buf, None)
            })
        };
        thread::sleep(Duration::from_millis(30));
        srb.put_anchor(Anchor::new(0, "late")).unwrap();

        // The wakeup unblocks the in-flight `Brb::read` with `ReaderUnblock`;
        // the caller is expected to retry, at which point the now-visible
        // anchor is reported before any more bytes are consulted.
        assert_eq!(
            reader.join().unwrap(),
            Err(SrbError::Brb(brb::BrbError::ReaderUnblock))
        );
        assert_eq!(srb.read(&mut [0u8; 1], None), Err(SrbError::FetchAnchor));
        assert_eq!(srb.get_anchor().unwrap().payload, "late");
    }

    #[test]
    fn no_anchors_is_no_anchors() {
        let srb: Srb<()> = Srb::new("empty", 16).unwrap();
        assert_eq!(srb.get_anchor(), Err(SrbError::NoAnchors));
    }

    #[test]
    fn reset_advances_offset_and_keeps_anchors() {
        let srb: Srb<u8> = Srb::new("reset-test", 16).unwrap();
        srb.write(&[1, 2, 3], None).unwrap();
        srb.put_anchor(Anchor::new(100, 7)).unwrap();
        srb.reset();
        assert_eq!(srb.read_offset(), 3);
        assert_eq!(srb.filled(), 0);
    }
}
