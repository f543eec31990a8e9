//! Anchored byte ring buffer: wraps a [`brb::Brb`] and interleaves
//! out-of-band **anchors** (caller-defined markers placed at a logical byte
//! offset) into the stream it moves.
//!
//! A reader pulling bytes out of an `Srb` is stopped the instant it reaches
//! an offset an anchor was placed at; it must retrieve the anchor with
//! [`Srb::get_anchor`] before the byte stream resumes. This is how a single
//! byte-oriented channel can also carry structural events (a frame boundary,
//! a format change, a timestamp) without the reader and writer needing a
//! second, separately-synchronized channel for them.
//!
//! # Example
//!
//! ```
//! use srb::{Anchor, Srb};
//!
//! let s: Srb<&str> = Srb::new("demo", 32).unwrap();
//! s.write(b"abcdefghij", None).unwrap();
//! s.put_anchor(Anchor::new(10, "format-change")).unwrap();
//! s.write(b"klmno", None).unwrap();
//!
//! let mut buf = [0u8; 32];
//! assert_eq!(s.read(&mut buf, None).unwrap(), 10);
//! assert_eq!(s.read(&mut buf, None), Err(srb::SrbError::FetchAnchor));
//! assert_eq!(s.get_anchor().unwrap().payload, "format-change");
//! assert_eq!(s.read(&mut buf, None).unwrap(), 5);
//! ```

mod anchor;
mod error;
mod invariants;
mod ring;

pub use anchor::Anchor;
pub use error::SrbError;
pub use ring::Srb;
