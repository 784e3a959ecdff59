use casring::{PushError, RingBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn push_spin<T>(ring: &RingBuffer<T>, mut value: T) {
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

fn main() {
    casring::trace::init_tracing();

    println!("Work Queue Example\n");

    const NUM_WORKERS: usize = 4;
    const NUM_JOBS: usize = 20;

    let jobs = Arc::new(RingBuffer::<String>::new(128).expect("power of two"));
    let results = Arc::new(RingBuffer::<String>::new(128).expect("power of two"));
    let producing = Arc::new(AtomicBool::new(true));

    let jobs_tx = jobs.clone();
    let producing_flag = producing.clone();
    let producer = thread::spawn(move || {
        for i in 0..NUM_JOBS {
            let job = format!("Job-{:02}", i);
            println!("Enqueued: {}", job);
            push_spin(&jobs_tx, job);
            thread::sleep(Duration::from_millis(50));
        }
        producing_flag.store(false, Ordering::Release);
        println!("All jobs enqueued!");
    });

    let mut workers = vec![];
    for worker_id in 0..NUM_WORKERS {
        let jobs_rx = jobs.clone();
        let results_tx = results.clone();
        let producing = producing.clone();

        workers.push(thread::spawn(move || {
            let mut processed = 0;
            loop {
                match jobs_rx.pop() {
                    Ok(job) => {
                        println!("Worker {} processing: {}", worker_id, job);
                        thread::sleep(Duration::from_millis(200));
                        push_spin(
                            &results_tx,
                            format!("{} -> completed by worker {}", job, worker_id),
                        );
                        processed += 1;
                    }
                    Err(_) => {
                        if !producing.load(Ordering::Acquire) && jobs_rx.is_empty() {
                            break;
                        }
                        thread::sleep(Duration::from_millis(10));
                    }
                }
            }
            println!("Worker {} finished ({} jobs)", worker_id, processed);
        }));
    }

    let results_rx = results.clone();
    let collector = thread::spawn(move || {
        let mut collected = 0;
        while collected < NUM_JOBS {
            let batch = results_rx.pop_batch(NUM_JOBS - collected);
            if batch.is_empty() {
                std::hint::spin_loop();
                continue;
            }
            for result in batch {
                println!("Result: {}", result);
                collected += 1;
            }
        }
        println!("All results collected!");
    });

    producer.join().unwrap();
    for worker in workers {
        worker.join().unwrap();
    }
    collector.join().unwrap();

    println!("\njobs: {:?}", jobs);
    println!("results: {:?}", results);
}
