use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lazyflow_api::environment::StreamEnvironment;
use lazyflow_api::{ExecutionConfig, StreamError, collectors};

fn small_partitions() -> StreamEnvironment {
    StreamEnvironment::with_config(
        ExecutionConfig::default()
            .with_parallelism(4)
            .with_min_partition_len(3),
    )
}

#[test]
fn test_last_mode_call_wins() {
    let env = small_partitions();

    let seq = env.of(vec![1, 2, 3]).parallel().unwrap().sequential().unwrap();
    assert!(!seq.is_parallel());

    let par = env.of(vec![1, 2, 3]).sequential().unwrap().parallel().unwrap();
    assert!(par.is_parallel());

    let mapped = env.par_of(vec![1, 2, 3]).map(|x| x + 1).unwrap();
    assert!(mapped.is_parallel());
}

#[test]
fn test_range_parallel_flag() {
    let stream = StreamEnvironment::new().range(1, 150).parallel().unwrap();
    assert!(stream.is_parallel());
    assert_eq!(stream.count().unwrap(), 149);
}

#[test]
fn test_stateful_ops_match_sequential() {
    let env = small_partitions();
    let input: Vec<i32> = (0..60).map(|x| (x * 37) % 23).collect();

    let sorted_seq = env.of(input.clone()).sorted().unwrap().limit(3).unwrap().to_vec().unwrap();
    let sorted_par = env
        .par_of(input.clone())
        .sorted()
        .unwrap()
        .limit(3)
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(sorted_par, sorted_seq);
    assert_eq!(sorted_seq, vec![0, 0, 0]);

    let skip_seq = env.of(input.clone()).skip(17).unwrap().to_vec().unwrap();
    let skip_par = env.par_of(input.clone()).skip(17).unwrap().to_vec().unwrap();
    assert_eq!(skip_par, skip_seq);
    assert_eq!(skip_seq.len(), 43);

    let distinct_seq = env.of(input.clone()).distinct().unwrap().to_vec().unwrap();
    let distinct_par = env.par_of(input).distinct().unwrap().to_vec().unwrap();
    assert_eq!(distinct_par, distinct_seq);
    assert_eq!(distinct_seq.len(), 23);
}

#[test]
fn test_sorted_limit_small_case_in_parallel() {
    let smallest = small_partitions()
        .par_of(vec![5, 3, 1, 4, 2])
        .sorted()
        .unwrap()
        .limit(3)
        .unwrap()
        .collect(collectors::to_list())
        .unwrap();
    assert_eq!(smallest, vec![1, 2, 3]);
}

#[test]
fn test_find_first_is_leftmost() {
    let first = small_partitions()
        .range(0, 1_000)
        .parallel()
        .unwrap()
        .filter(|x| x % 97 == 5)
        .unwrap()
        .find_first()
        .unwrap();
    assert_eq!(first, Some(5));
}

#[test]
fn test_find_any_returns_a_match() {
    let any = small_partitions()
        .range(0, 1_000)
        .parallel()
        .unwrap()
        .filter(|x| x % 97 == 5)
        .unwrap()
        .find_any()
        .unwrap();
    let found = any.expect("some element matches");
    assert_eq!(found % 97, 5);
}

#[test]
fn test_unordered_sum_is_exact() {
    let sum = small_partitions()
        .range_closed(1i64, 1_000)
        .parallel()
        .unwrap()
        .unordered()
        .unwrap()
        .fold(0, |a, b| a + b)
        .unwrap();
    assert_eq!(sum, 500_500);
}

#[test]
fn test_flat_map_in_parallel() {
    let out = small_partitions()
        .par_of(vec![1usize, 2, 3, 4])
        .flat_map(|n| vec![n; n])
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(out, vec![1, 2, 2, 3, 3, 3, 4, 4, 4, 4]);
}

#[test]
fn test_for_each_visits_every_element() {
    let seen = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&seen);
    small_partitions()
        .par_of((1..=100).collect::<Vec<usize>>())
        .for_each(move |x| {
            s.fetch_add(x, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 5050);
}

#[test]
fn test_panicking_accumulator_is_a_worker_fault() {
    let result = small_partitions()
        .par_of((0..40).collect::<Vec<i32>>())
        .reduce_with(
            0,
            |acc, x| {
                if x == 25 {
                    panic!("refusing {x}");
                }
                acc + x
            },
            |a, b| a + b,
        );

    match result {
        Err(StreamError::WorkerFault { message, .. }) => assert_eq!(message, "refusing 25"),
        other => panic!("expected worker fault, got {other:?}"),
    }
}

#[test]
fn test_generate_falls_back_to_sequential() {
    let elements = small_partitions()
        .generate(|| "element")
        .parallel()
        .unwrap()
        .limit(10)
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(elements, 10);
}

#[test]
fn test_parallel_limit_visits_a_bounded_prefix() {
    let env = StreamEnvironment::with_config(ExecutionConfig::default().with_parallelism(4));
    let peeked = |parallel: bool| {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let stream = env.range(0i64, 2_000_000);
        let stream = if parallel { stream.parallel().unwrap() } else { stream };
        let out = stream
            .peek(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
            .limit(3)
            .unwrap()
            .to_vec()
            .unwrap();
        (out, calls.load(Ordering::SeqCst))
    };

    let (sequential, sequential_calls) = peeked(false);
    let (parallel, parallel_calls) = peeked(true);
    assert_eq!(sequential, vec![0, 1, 2]);
    assert_eq!(parallel, sequential);
    assert_eq!(sequential_calls, 3);
    assert!(parallel_calls <= 3 * 4, "visited {parallel_calls} elements");
}

#[test]
fn test_parallel_skip_limit_on_huge_range() {
    let window = small_partitions()
        .range(0i64, i64::MAX)
        .parallel()
        .unwrap()
        .skip(10)
        .unwrap()
        .limit(4)
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(window, vec![10, 11, 12, 13]);
}
