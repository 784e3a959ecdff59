use casring::{PushError, RingBuffer};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const MESSAGES: usize = 1_000_000;
const BUFFER_SIZE: usize = 1024;

fn main() {
    casring::trace::init_tracing();

    println!("casring Performance Test");
    println!("========================\n");

    for (producers, consumers) in [(1, 1), (4, 1), (1, 4), (4, 4)] {
        println!(
            "{} Producer(s), {} Consumer(s) ({} messages):",
            producers, consumers, MESSAGES
        );
        let start = Instant::now();
        let ring = run(producers, consumers);
        let elapsed = start.elapsed();
        let throughput = MESSAGES as f64 / elapsed.as_secs_f64();
        println!("  Time: {:?}", elapsed);
        println!("  Throughput: {:.2} msgs/sec", throughput);
        println!(
            "  Latency: {:.0} ns/op",
            elapsed.as_nanos() as f64 / MESSAGES as f64
        );
        println!("  Final state: {:?}\n", ring);
    }
}

fn push_spin(ring: &RingBuffer<usize>, mut value: usize) {
    loop {
        match ring.push(value) {
            Ok(_) => return,
            Err(PushError::Full(v)) => {
                value = v;
                std::hint::spin_loop();
            }
            Err(PushError::Rejected) => unreachable!(),
        }
    }
}

fn run(producers: usize, consumers: usize) -> Arc<RingBuffer<usize>> {
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;

    let ring = Arc::new(RingBuffer::<usize>::new(BUFFER_SIZE).expect("power of two"));
    let mut handles = vec![];

    for p in 0..producers {
        let r = ring.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                push_spin(&r, p * per_producer + i);
            }
        }));
    }

    for _ in 0..consumers {
        let r = ring.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                while r.pop().is_err() {
                    std::hint::spin_loop();
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    ring
}
