//! A bounded, single-producer/single-consumer byte ring buffer with
//! blocking read/write, writer-finished signalling, reader wake-up, and
//! bilateral abort.
//!
//! This is the leaf layer underneath `srb`, which interleaves anchors into
//! the byte stream this crate moves. `Brb` itself has no notion of anchors,
//! frames, or any other structure above a byte: it exists purely to move
//! bytes from one thread to another with backpressure.
//!
//! # Example
//!
//! ```
//! use brb::Brb;
//! use std::time::Duration;
//!
//! let rb = Brb::new("demo", 16).unwrap();
//! rb.write(b"hello", None).unwrap();
//! rb.signal_writer_finished();
//!
//! let mut buf = [0u8; 16];
//! let n = rb.read(&mut buf, Some(Duration::from_millis(100))).unwrap();
//! assert_eq!(&buf[..n], b"hello");
//! assert_eq!(rb.read(&mut buf, None), Err(brb::BrbError::WriterFinished));
//! ```

mod error;
mod invariants;
mod ring;

pub use error::BrbError;
pub use ring::Brb;
