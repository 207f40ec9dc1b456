use super::*;
use crate::config::ExecutionConfig;
use crate::pipeline::operator::{FilterOp, LimitOp, MapOp, SortedOp};
use crate::source::{IterSource, RangeSource};

fn range_plan(end: i64) -> Arc<dyn Plan<i64>> {
    Arc::new(SourcePlan::new(RangeSource::exclusive(0i64, end)))
}

#[test]
fn test_op_kinds_source_side_first() {
    let root = range_plan(10);
    let filtered: Arc<dyn Plan<i64>> =
        Arc::new(OpPlan::new(root, FilterOp::new(|x: &i64| x % 2 == 0)));
    let mapped: Arc<dyn Plan<String>> =
        Arc::new(OpPlan::new(filtered, MapOp::new(|x: i64| x.to_string())));
    let limited: Arc<dyn Plan<String>> = Arc::new(OpPlan::new(mapped, LimitOp::new(2)));

    assert_eq!(
        op_kinds(limited.as_ref()),
        vec![OpKind::Filter, OpKind::Map, OpKind::Limit]
    );
}

#[test]
fn test_prefix_is_shared_not_mutated() {
    let root = range_plan(5);
    let _extended: Arc<dyn Plan<i64>> = Arc::new(OpPlan::new(
        Arc::clone(&root),
        MapOp::new(|x: i64| x + 1),
    ));
    assert!(op_kinds(root.as_ref()).is_empty());
}

#[test]
fn test_open_sequential_composes_nodes() {
    let root = range_plan(10);
    let plan = OpPlan::new(root, FilterOp::new(|x: &i64| x % 3 == 0));
    let output: Vec<i64> = plan.open_sequential().unwrap().collect();
    assert_eq!(output, vec![0, 3, 6, 9]);
}

#[test]
fn test_source_is_taken_once() {
    let plan = SourcePlan::new(RangeSource::exclusive(0u32, 3));
    assert!(plan.open_sequential().is_ok());
    assert!(matches!(plan.open_sequential(), Err(StreamError::Reused)));
}

#[test]
fn test_characteristics_come_from_root() {
    let plan = SourcePlan::new(IterSource::new(vec![1, 2, 3].into_iter()));
    assert!(!plan.characteristics().splittable);
    assert!(plan.characteristics().ordered);
}

#[test]
fn test_fused_split_preserves_order() {
    let evaluator = ParallelEvaluator::new(ExecutionConfig::default().with_parallelism(2));
    let root = range_plan(8);
    let plan = OpPlan::new(root, MapOp::new(|x: i64| x * 10));

    let mut right = plan.open_parallel(&evaluator, true).unwrap();
    let left = right.try_split().expect("range of 8 splits");

    let mut output: Vec<i64> = left.open().collect();
    output.extend(right.open());
    assert_eq!(output, vec![0, 10, 20, 30, 40, 50, 60, 70]);
}

#[test]
fn test_filter_clears_size_known() {
    let evaluator = ParallelEvaluator::new(ExecutionConfig::default());
    let plan = OpPlan::new(range_plan(4), FilterOp::new(|x: &i64| *x > 1));
    let source = plan.open_parallel(&evaluator, true).unwrap();
    assert!(!source.characteristics().size_known);
    assert_eq!(source.estimate_size(), Some(4));
}

#[test]
fn test_stateful_node_is_a_barrier() {
    let evaluator = ParallelEvaluator::new(
        ExecutionConfig::default()
            .with_parallelism(4)
            .with_min_partition_len(2),
    );
    let plan = OpPlan::new(
        range_plan(6),
        SortedOp::new(|a: &i64, b: &i64| b.cmp(a)),
    );
    let source = plan.open_parallel(&evaluator, true).unwrap();
    assert!(source.characteristics().size_known);
    assert_eq!(source.estimate_size(), Some(6));
    assert_eq!(source.open().collect::<Vec<_>>(), vec![5, 4, 3, 2, 1, 0]);
}
