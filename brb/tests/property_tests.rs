use brb::Brb;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    /// INV: `filled` is always in `[0, capacity]`, for any sequence of
    /// write/read sizes on a single-threaded, non-blocking schedule.
    #[test]
    fn filled_stays_within_capacity(
        capacity in 2usize..64,
        ops in prop::collection::vec((any::<bool>(), 0usize..32), 1..64),
    ) {
        let rb = Brb::new("prop-capacity", capacity).unwrap();
        for (is_write, size) in ops {
            if is_write {
                let data = vec![0u8; size];
                let _ = rb.write(&data, Some(Duration::ZERO));
            } else {
                let mut buf = vec![0u8; size];
                let _ = rb.read(&mut buf, Some(Duration::ZERO));
            }
            prop_assert!(rb.filled() <= rb.capacity());
            prop_assert_eq!(rb.filled() + rb.available(), rb.capacity());
        }
    }

    /// Round-trip law: whatever is written (within capacity, single burst,
    /// no wraparound contention) comes back out byte-for-byte in order.
    #[test]
    fn round_trip_preserves_byte_order(
        capacity in 8usize..128,
        bytes in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        prop_assume!(bytes.len() <= capacity);
        let rb = Brb::new("prop-roundtrip", capacity).unwrap();
        let written = rb.write(&bytes, Some(Duration::from_millis(10))).unwrap();
        prop_assert_eq!(written, bytes.len());

        let mut out = vec![0u8; bytes.len()];
        let mut total = 0;
        while total < out.len() {
            let n = rb
                .read(&mut out[total..], Some(Duration::from_millis(10)))
                .unwrap();
            prop_assert!(n > 0 || total == out.len());
            total += n;
        }
        prop_assert_eq!(out, bytes);
    }
}
