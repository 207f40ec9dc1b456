use super::*;
use std::collections::HashSet;

#[test]
fn test_every_job_completes() {
    let pool = WorkerPool::new(4);
    let jobs: Vec<u64> = (0..32).collect();

    let results = pool.run(jobs, |x| x * x).unwrap();
    assert_eq!(results.len(), 32);

    let indices: HashSet<usize> = results.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices.len(), 32);
    for (index, square) in results {
        assert_eq!(square, (index as u64) * (index as u64));
    }
}

#[test]
fn test_no_jobs() {
    let pool = WorkerPool::new(2);
    let results = pool.run(Vec::<u8>::new(), |x| x).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_zero_size_clamped() {
    assert_eq!(WorkerPool::new(0).size(), 1);
}

#[test]
fn test_runs_on_named_workers() {
    let pool = WorkerPool::new(2);
    let results = pool
        .run(vec![(), ()], |_| {
            std::thread::current()
                .name()
                .map(str::to_owned)
                .unwrap_or_default()
        })
        .unwrap();
    for (_, name) in results {
        assert!(name.starts_with("lazyflow-worker-"), "got {name}");
    }
}

#[test]
fn test_panic_becomes_worker_fault() {
    let pool = WorkerPool::new(2);
    let result = pool.run(vec![1, 2, 3, 4], |x: i32| {
        if x == 3 {
            panic!("bad element {x}");
        }
        x
    });

    match result {
        Err(StreamError::WorkerFault { partition, message }) => {
            assert_eq!(partition, 2);
            assert_eq!(message, "bad element 3");
        }
        other => panic!("expected worker fault, got {other:?}"),
    }
}

#[test]
fn test_spawn_failure_stops_started_workers() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    let mut pool = WorkerPool::new(3);
    pool.fail_spawn_at = Some(2);

    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    let result = pool.run((0..200).collect::<Vec<u32>>(), move |x| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(1));
        x
    });

    assert!(matches!(result, Err(StreamError::Spawn(_))));
    let at_return = ran.load(Ordering::SeqCst);
    assert!(at_return < 200, "started workers drained the queue");

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(ran.load(Ordering::SeqCst), at_return);
}
