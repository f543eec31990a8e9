//! Demonstration of a producer thread and a consumer thread sharing one
//! `Srb`, with anchors marking frame boundaries in the byte stream.
//!
//! Run with: `cargo run -p srb --example roundtrip`

use srb::{Anchor, Srb};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();
    println!("=== srb roundtrip demo ===\n");

    let rb: Arc<Srb<&'static str>> = Arc::new(Srb::new("roundtrip-demo", 256).unwrap());

    let producer = {
        let rb = Arc::clone(&rb);
        thread::spawn(move || {
            for frame in 0..5 {
                let payload = format!("frame-{frame}");
                let offset = rb.put_anchor_at_current("frame-start").unwrap();
                println!("  producer: anchor @ {offset} before {payload:?}");
                rb.write(payload.as_bytes(), None).unwrap();
            }
            rb.signal_writer_finished();
            println!("  producer: done\n");
        })
    };

    let mut buf = [0u8; 64];
    let mut frames_seen = 0;
    loop {
        match rb.read(&mut buf, Some(Duration::from_millis(200))) {
            Ok(n) => {
                println!(
                    "  consumer: {} bytes: {:?}",
                    n,
                    std::str::from_utf8(&buf[..n]).unwrap()
                );
            }
            Err(srb::SrbError::FetchAnchor) => {
                let anchor = rb.get_anchor().unwrap();
                frames_seen += 1;
                println!("  consumer: anchor @ {} ({})", anchor.offset, anchor.payload);
            }
            Err(srb::SrbError::Brb(brb::BrbError::WriterFinished)) => {
                println!("  consumer: writer finished");
                break;
            }
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    producer.join().unwrap();
    println!("\n=== saw {frames_seen} frame anchors ===");
}
