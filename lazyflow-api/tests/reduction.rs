use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lazyflow_api::environment::StreamEnvironment;
use lazyflow_api::{ExecutionConfig, stream};
use proptest::prelude::*;

fn single_element_partitions() -> StreamEnvironment {
    StreamEnvironment::with_config(
        ExecutionConfig::default()
            .with_parallelism(3)
            .with_min_partition_len(1),
    )
}

#[test]
fn test_range_reduce() {
    let closed = stream::range_closed(1, 4).reduce(|a, b| a + b).unwrap();
    let open = stream::range(1, 4).reduce(|a, b| a + b).unwrap();
    assert_eq!(closed, Some(10));
    assert_eq!(open, Some(6));
}

#[test]
fn test_reduce_empty_is_none() {
    assert_eq!(stream::range(4, 4).reduce(|a, b| a + b).unwrap(), None);
    assert_eq!(stream::empty::<i64>().reduce(|a, b| a + b).unwrap(), None);
}

#[test]
fn test_fold_with_identity() {
    let sum = stream::of(vec![1, 2, 3]).fold(10, |a, b| a + b).unwrap();
    assert_eq!(sum, 16);
}

#[test]
fn test_identity_per_partition() -> anyhow::Result<()> {
    let env = single_element_partitions();

    let sequential_combines = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&sequential_combines);
    let sequential = env.of(vec![1, 2, 3]).reduce_with(
        10,
        |acc, x| acc + x,
        move |a, b| {
            c.fetch_add(1, Ordering::SeqCst);
            a + b
        },
    )?;
    assert_eq!(sequential, 16);
    assert_eq!(sequential_combines.load(Ordering::SeqCst), 0);

    let parallel_combines = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&parallel_combines);
    let parallel = env.par_of(vec![1, 2, 3]).reduce_with(
        10,
        |acc, x| acc + x,
        move |a, b| {
            c.fetch_add(1, Ordering::SeqCst);
            a + b
        },
    )?;
    assert_eq!(parallel, 36);
    assert_eq!(parallel_combines.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_reduce_with_changes_type() {
    let total_len = stream::of(vec!["abc", "de", "f"])
        .parallel()
        .unwrap()
        .reduce_with(0usize, |acc, s| acc + s.len(), |a, b| a + b)
        .unwrap();
    assert_eq!(total_len, 6);
}

#[test]
fn test_min_max() {
    let env = StreamEnvironment::new();
    assert_eq!(env.of(vec![4, 9, 1, 7]).min().unwrap(), Some(1));
    assert_eq!(env.of(vec![4, 9, 1, 7]).max().unwrap(), Some(9));
    assert_eq!(env.empty::<i32>().max().unwrap(), None);
}

#[test]
fn test_min_by_max_by_ties() {
    let env = single_element_partitions();
    let words = vec!["bb", "aa", "c", "dd"];
    for parallel in [false, true] {
        let stream = if parallel {
            env.par_of(words.clone())
        } else {
            env.of(words.clone())
        };
        let shortest = stream.min_by(|a, b| a.len().cmp(&b.len())).unwrap();
        assert_eq!(shortest, Some("c"));

        let stream = if parallel {
            env.par_of(words.clone())
        } else {
            env.of(words.clone())
        };
        let longest = stream.max_by(|a, b| a.len().cmp(&b.len())).unwrap();
        assert_eq!(longest, Some("dd"));
    }
}

#[test]
fn test_match_on_empty() {
    let env = StreamEnvironment::new();
    assert!(!env.empty::<u8>().any_match(|_| true).unwrap());
    assert!(env.empty::<u8>().all_match(|_| false).unwrap());
    assert!(env.empty::<u8>().none_match(|_| true).unwrap());
}

proptest! {
    #[test]
    fn prop_parallel_sum_matches_sequential(
        items in prop::collection::vec(-1_000i64..1_000, 0..200),
        parallelism in 1usize..6,
        min_partition_len in 1usize..20,
    ) {
        let env = StreamEnvironment::with_config(
            ExecutionConfig::default()
                .with_parallelism(parallelism)
                .with_min_partition_len(min_partition_len),
        );

        let sequential = env
            .of(items.clone())
            .reduce_with(0, |acc, x| acc + x, |a, b| a + b)
            .unwrap();
        let parallel = env
            .par_of(items.clone())
            .reduce_with(0, |acc, x| acc + x, |a, b| a + b)
            .unwrap();

        prop_assert_eq!(sequential, parallel);
        prop_assert_eq!(sequential, items.iter().sum::<i64>());
    }

    #[test]
    fn prop_parallel_collect_keeps_order(
        items in prop::collection::vec(any::<u16>(), 0..300),
        min_partition_len in 1usize..16,
    ) {
        let env = StreamEnvironment::with_config(
            ExecutionConfig::default()
                .with_parallelism(4)
                .with_min_partition_len(min_partition_len),
        );
        let collected = env.par_of(items.clone()).map(|x| u32::from(x) + 1).unwrap().to_vec().unwrap();
        let expected: Vec<u32> = items.iter().map(|x| u32::from(*x) + 1).collect();
        prop_assert_eq!(collected, expected);
    }
}
