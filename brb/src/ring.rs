use crate::error::BrbError;
use crate::invariants::{
    debug_assert_bounded_fill, debug_assert_no_write_after_finished, debug_assert_ptr_consistency,
};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// State guarded by [`Brb`]'s single mutex.
///
/// Kept separate from `Brb` itself so the mutex guard borrows exactly this
/// and nothing else (the name/capacity fields on `Brb` are immutable after
/// construction and need no locking).
struct Shared {
    buf: Box<[u8]>,
    read_ptr: usize,
    write_ptr: usize,
    filled: usize,
    abort_read: bool,
    abort_write: bool,
    writer_finished: bool,
    reader_unblock: bool,
}

/// A bounded byte ring buffer with blocking read/write, one writer and one
/// reader.
///
/// `Brb` owns its backing array outright; there is no `cleanup`/`destroy`
/// call the way C APIs with an explicit `rb_cleanup` need one. Dropping the
/// value releases everything, and the borrow checker prevents a `read`/
/// `write` call from outliving the buffer.
///
/// `Brb` is `Send + Sync` whenever it's behind a shared reference (e.g.
/// `Arc<Brb>`), so the producer and consumer can each hold a clone of that
/// `Arc` on their own thread.
pub struct Brb {
    name: String,
    capacity: usize,
    state: Mutex<Shared>,
    can_read: Condvar,
    can_write: Condvar,
}

impl Brb {
    /// Creates a new ring buffer with the given name and capacity.
    ///
    /// Fails if `capacity < 2`.
    pub fn new(name: impl Into<String>, capacity: usize) -> Result<Self, BrbError> {
        if capacity < 2 {
            return Err(BrbError::Fail("capacity must be >= 2"));
        }

        Ok(Self {
            name: name.into(),
            capacity,
            state: Mutex::new(Shared {
                buf: vec![0u8; capacity].into_boxed_slice(),
                read_ptr: 0,
                write_ptr: 0,
                filled: 0,
                abort_read: false,
                abort_write: false,
                writer_finished: false,
                reader_unblock: false,
            }),
            can_read: Condvar::new(),
            can_write: Condvar::new(),
        })
    }

    /// The name this buffer was created with (diagnostic only).
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total buffer capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of unread bytes currently buffered.
    #[must_use]
    pub fn filled(&self) -> usize {
        self.lock().filled
    }

    /// Free space currently available to the writer.
    #[must_use]
    pub fn available(&self) -> usize {
        let g = self.lock();
        g.buf.len() - g.filled
    }

    /// Returns `true` once [`signal_writer_finished`](Self::signal_writer_finished)
    /// has been called.
    #[must_use]
    pub fn is_writer_finished(&self) -> bool {
        self.lock().writer_finished
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // -----------------------------------------------------------------
    // Read / write
    // -----------------------------------------------------------------

    /// Copies up to `dst.len()` bytes into `dst`, blocking as described on
    /// the type: returns once `dst` is full, the writer has finished, an
    /// abort/wakeup occurs, or `timeout` elapses.
    ///
    /// A partial transfer is a valid non-error return; the *next* call is
    /// what reports the terminal sentinel once no further bytes remain.
    pub fn read(&self, dst: &mut [u8], timeout: Option<Duration>) -> Result<usize, BrbError> {
        let len = dst.len();
        self.read_impl(Some(dst), len, timeout)
    }

    /// Like [`read`](Self::read), but discards the bytes instead of copying
    /// them anywhere (the "null destination" mode used by draining).
    pub fn discard(&self, len: usize, timeout: Option<Duration>) -> Result<usize, BrbError> {
        self.read_impl(None, len, timeout)
    }

    fn read_impl(
        &self,
        mut dst: Option<&mut [u8]>,
        requested: usize,
        timeout: Option<Duration>,
    ) -> Result<usize, BrbError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut copied = 0usize;
        let mut guard = self.lock();

        loop {
            // Checked unconditionally, even when the request is already
            // satisfiable in one pass: an abort must never be starved by a
            // lucky fast path.
            if guard.abort_read {
                return if copied > 0 {
                    Ok(copied)
                } else {
                    Err(BrbError::Abort)
                };
            }

            if copied >= requested {
                return Ok(copied);
            }

            if guard.filled > 0 {
                let want = (requested - copied).min(guard.filled);
                let n = match dst.as_deref_mut() {
                    Some(d) => Self::copy_out(&mut guard, &mut d[copied..copied + want]),
                    None => Self::discard_locked(&mut guard, want),
                };
                debug_assert_bounded_fill!(guard.filled, guard.buf.len());
                debug_assert_ptr_consistency!(
                    guard.read_ptr,
                    guard.write_ptr,
                    guard.filled,
                    guard.buf.len()
                );
                copied += n;
                self.can_write.notify_one();
                continue;
            }

            if guard.writer_finished {
                return if copied > 0 {
                    Ok(copied)
                } else {
                    Err(BrbError::WriterFinished)
                };
            }

            if guard.reader_unblock {
                guard.reader_unblock = false;
                return if copied > 0 {
                    Ok(copied)
                } else {
                    Err(BrbError::ReaderUnblock)
                };
            }

            match deadline {
                None => {
                    guard = self
                        .can_read
                        .wait(guard)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                }
                Some(dl) => {
                    let now = Instant::now();
                    if now >= dl {
                        if copied > 0 {
                            return Ok(copied);
                        }
                        drop(guard);
                        // Avoid a watchdog-busy-loop on a zero-timeout miss.
                        thread::yield_now();
                        return Err(BrbError::Timeout);
                    }
                    let (g, _timeout_result) = self
                        .can_read
                        .wait_timeout(guard, dl - now)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    guard = g;
                }
            }
        }
    }

    /// Copies `src` into the buffer, blocking as described on the type.
    pub fn write(&self, src: &[u8], timeout: Option<Duration>) -> Result<usize, BrbError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut copied = 0usize;
        let mut guard = self.lock();

        loop {
            if guard.abort_write {
                return if copied > 0 {
                    Ok(copied)
                } else {
                    Err(BrbError::Abort)
                };
            }

            if guard.writer_finished {
                debug_assert_no_write_after_finished!(guard.writer_finished, false);
                return if copied > 0 {
                    Ok(copied)
                } else {
                    Err(BrbError::WriterFinished)
                };
            }

            if copied >= src.len() {
                return Ok(copied);
            }

            let capacity = guard.buf.len();
            if guard.filled < capacity {
                let want = (src.len() - copied).min(capacity - guard.filled);
                let n = Self::copy_in(&mut guard, &src[copied..copied + want]);
                debug_assert_bounded_fill!(guard.filled, guard.buf.len());
                debug_assert_ptr_consistency!(
                    guard.read_ptr,
                    guard.write_ptr,
                    guard.filled,
                    guard.buf.len()
                );
                copied += n;
                self.can_read.notify_one();
                continue;
            }

            match deadline {
                None => {
                    guard = self
                        .can_write
                        .wait(guard)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                }
                Some(dl) => {
                    let now = Instant::now();
                    if now >= dl {
                        if copied > 0 {
                            return Ok(copied);
                        }
                        drop(guard);
                        thread::yield_now();
                        return Err(BrbError::Timeout);
                    }
                    let (g, _timeout_result) = self
                        .can_write
                        .wait_timeout(guard, dl - now)
                        .unwrap_or_else(std::sync::PoisonError::into_inner);
                    guard = g;
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Wrap-around copy helpers (at most two slices each, per the design)
    // -----------------------------------------------------------------

    fn copy_out(state: &mut Shared, dst: &mut [u8]) -> usize {
        let n = dst.len().min(state.filled);
        if n == 0 {
            return 0;
        }
        let cap = state.buf.len();
        let first = n.min(cap - state.read_ptr);
        dst[..first].copy_from_slice(&state.buf[state.read_ptr..state.read_ptr + first]);
        if first < n {
            let second = n - first;
            dst[first..n].copy_from_slice(&state.buf[..second]);
        }
        state.read_ptr = (state.read_ptr + n) % cap;
        state.filled -= n;
        n
    }

    fn discard_locked(state: &mut Shared, want: usize) -> usize {
        let n = want.min(state.filled);
        if n == 0 {
            return 0;
        }
        let cap = state.buf.len();
        state.read_ptr = (state.read_ptr + n) % cap;
        state.filled -= n;
        n
    }

    fn copy_in(state: &mut Shared, src: &[u8]) -> usize {
        let n = src.len();
        if n == 0 {
            return 0;
        }
        let cap = state.buf.len();
        let first = n.min(cap - state.write_ptr);
        state.buf[state.write_ptr..state.write_ptr + first].copy_from_slice(&src[..first]);
        if first < n {
            let second = n - first;
            state.buf[..second].copy_from_slice(&src[first..n]);
        }
        state.write_ptr = (state.write_ptr + n) % cap;
        state.filled += n;
        n
    }

    // -----------------------------------------------------------------
    // Lifecycle / control operations
    // -----------------------------------------------------------------

    /// Clears pointers and one-shot flags; capacity is preserved. Does not
    /// block and does not wake waiters (there is nothing to read or write
    /// after a reset).
    pub fn reset(&self) {
        let mut g = self.lock();
        Self::reset_locked(&mut g, false, false);
    }

    fn reset_locked(g: &mut Shared, abort_read: bool, abort_write: bool) {
        g.read_ptr = 0;
        g.write_ptr = 0;
        g.filled = 0;
        g.writer_finished = false;
        g.reader_unblock = false;
        g.abort_read = abort_read;
        g.abort_write = abort_write;
    }

    /// Atomically clears state and sets `abort_write`, so no write can ever
    /// interleave with the reset.
    pub fn reset_and_abort_write(&self) {
        {
            let mut g = self.lock();
            Self::reset_locked(&mut g, false, true);
        }
        self.can_write.notify_all();
    }

    /// Aborts the reader side. Subsequent reads fail fast with
    /// [`BrbError::Abort`] until [`reset`](Self::reset).
    pub fn abort_read(&self) {
        {
            let mut g = self.lock();
            g.abort_read = true;
        }
        log::debug!("brb '{}': abort_read", self.name);
        self.can_read.notify_all();
    }

    /// Aborts the writer side. Subsequent writes fail fast with
    /// [`BrbError::Abort`] until [`reset`](Self::reset).
    pub fn abort_write(&self) {
        {
            let mut g = self.lock();
            g.abort_write = true;
        }
        log::debug!("brb '{}': abort_write", self.name);
        self.can_write.notify_all();
    }

    /// Aborts both sides.
    pub fn abort(&self) {
        {
            let mut g = self.lock();
            g.abort_read = true;
            g.abort_write = true;
        }
        log::debug!("brb '{}': abort", self.name);
        self.can_read.notify_all();
        self.can_write.notify_all();
    }

    /// Marks the stream as finished: the reader will drain whatever is
    /// buffered and then observe [`BrbError::WriterFinished`].
    pub fn signal_writer_finished(&self) {
        {
            let mut g = self.lock();
            g.writer_finished = true;
        }
        self.can_read.notify_all();
    }

    /// Forces the next blocked (or about-to-block) read to return
    /// immediately with [`BrbError::ReaderUnblock`] if it has no other
    /// bytes to deliver.
    pub fn wakeup_reader(&self) {
        {
            let mut g = self.lock();
            g.reader_unblock = true;
        }
        self.can_read.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_round_trip() {
        let rb = Brb::new("t", 16).unwrap();
        assert_eq!(rb.write(b"HELLO", None).unwrap(), 5);
        let mut buf = [0u8; 5];
        assert_eq!(rb.read(&mut buf, None).unwrap(), 5);
        assert_eq!(&buf, b"HELLO");
        assert_eq!(rb.filled(), 0);
    }

    #[test]
    fn wrap_around() {
        let rb = Brb::new("t", 8).unwrap();
        assert_eq!(rb.write(b"ABCDEF", None).unwrap(), 6);
        let mut buf = [0u8; 4];
        assert_eq!(rb.read(&mut buf, None).unwrap(), 4);
        assert_eq!(&buf, b"ABCD");
        assert_eq!(rb.write(b"12345", None).unwrap(), 5);
        let mut buf2 = [0u8; 7];
        assert_eq!(rb.read(&mut buf2, None).unwrap(), 7);
        assert_eq!(&buf2, b"EF12345");
    }

    #[test]
    fn writer_finished_partial_then_sentinel() {
        let rb = Brb::new("t", 16).unwrap();
        rb.write(b"ABC", None).unwrap();
        rb.signal_writer_finished();
        let mut buf = [0u8; 10];
        assert_eq!(
            rb.read(&mut buf, Some(Duration::from_millis(20))).unwrap(),
            3
        );
        let mut buf2 = [0u8; 10];
        assert_eq!(
            rb.read(&mut buf2, Some(Duration::from_millis(20))),
            Err(BrbError::WriterFinished)
        );
    }

    #[test]
    fn abort_unblocks_waiting_reader() {
        let rb = std::sync::Arc::new(Brb::new("t", 16).unwrap());
        let rb2 = rb.clone();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 10];
            rb2.read(&mut buf, None)
        });
        thread::sleep(Duration::from_millis(20));
        rb.abort_read();
        assert_eq!(handle.join().unwrap(), Err(BrbError::Abort));
    }

    #[test]
    fn zero_length_read_is_a_noop() {
        let rb = Brb::new("t", 16).unwrap();
        assert_eq!(rb.read(&mut [], None).unwrap(), 0);
    }

    #[test]
    fn zero_timeout_yields_instead_of_spinning() {
        let rb = Brb::new("t", 16).unwrap();
        let mut buf = [0u8; 4];
        let start = Instant::now();
        assert_eq!(
            rb.read(&mut buf, Some(Duration::ZERO)),
            Err(BrbError::Timeout)
        );
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn wakeup_reader_returns_zero_bytes() {
        let rb = std::sync::Arc::new(Brb::new("t", 16).unwrap());
        let rb2 = rb.clone();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 10];
            rb2.read(&mut buf, None)
        });
        thread::sleep(Duration::from_millis(20));
        rb.wakeup_reader();
        assert_eq!(handle.join().unwrap(), Err(BrbError::ReaderUnblock));
    }

    #[test]
    fn capacity_below_two_fails() {
        assert!(matches!(Brb::new("t", 1), Err(BrbError::Fail(_))));
    }
}
