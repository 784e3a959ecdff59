//! Simple usage example
//!
//! Run with `--features tracing` and `RUST_LOG=casring=trace` to see the
//! ring's internal retry events.

use casring::{PushError, RingBuffer};
use std::sync::Arc;
use std::thread;

fn main() {
    casring::trace::init_tracing();

    println!("casring - Simple Example\n");

    // 16 slots, 15 usable
    let ring = Arc::new(RingBuffer::<String>::new(16).expect("16 is a power of two"));

    let producer_ring = ring.clone();
    let consumer_ring = ring.clone();

    let producer = thread::spawn(move || {
        for i in 0..10 {
            let mut message = format!("Message {}", i);
            println!("Sending: {}", message);

            loop {
                match producer_ring.push(message) {
                    Ok(slot) => {
                        println!("  -> slot {}", slot);
                        break;
                    }
                    Err(PushError::Full(back)) => {
                        // Ring is full, spin and retry
                        message = back;
                        std::hint::spin_loop();
                    }
                    Err(PushError::Rejected) => unreachable!(),
                }
            }

            // Small delay to make output readable
            thread::sleep(std::time::Duration::from_millis(100));
        }
        println!("Producer finished!");
    });

    let consumer = thread::spawn(move || {
        for _ in 0..10 {
            loop {
                match consumer_ring.pop() {
                    Ok(message) => {
                        println!("Received: {}", message);
                        break;
                    }
                    Err(_) => {
                        // Ring is empty, spin and retry
                        std::hint::spin_loop();
                    }
                }
            }
        }
        println!("Consumer finished!");
    });

    producer.join().unwrap();
    consumer.join().unwrap();

    // An absent value is turned away without touching the cursors.
    assert_eq!(ring.push_opt(None), Err(PushError::Rejected));

    println!("\n{:?}", ring);
    println!("Example completed successfully!");
}
