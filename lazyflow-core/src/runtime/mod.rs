//! Runtime-domain modules: evaluators, the terminal contract and the worker pool.
//!
//! Every terminal operation is expressed as a [`Terminal`]: a per-partition fold
//! (supplier plus accumulator, free to short-circuit) and a combiner for partials.
//! The sequential evaluator runs the fold once over the whole pipeline and never
//! calls the combiner. The parallel evaluator runs it once per partition and merges
//! the partials with the combiner.

pub mod parallel;
pub mod pool;
pub mod sequential;

pub use parallel::*;
pub use pool::*;
pub use sequential::*;

use std::sync::Arc;

use tracing::debug;

use crate::config::ExecutionConfig;
use crate::error::Result;
use crate::pipeline::{Plan, op_kinds};
use crate::types::{BoxIter, StreamData};

/// Evaluator selection for one terminal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

type FoldFn<T, A> = dyn Fn(BoxIter<T>) -> A + Send + Sync;
type CombineFn<A> = dyn Fn(A, A) -> A + Send + Sync;

/// The reduction a terminal operation performs.
pub struct Terminal<T, A> {
    fold: Arc<FoldFn<T, A>>,
    combine: Arc<CombineFn<A>>,
}

impl<T, A> Clone for Terminal<T, A> {
    fn clone(&self) -> Self {
        Self {
            fold: Arc::clone(&self.fold),
            combine: Arc::clone(&self.combine),
        }
    }
}

impl<T, A> Terminal<T, A> {
    pub fn new<F, C>(fold: F, combine: C) -> Self
    where
        F: Fn(BoxIter<T>) -> A + Send + Sync + 'static,
        C: Fn(A, A) -> A + Send + Sync + 'static,
    {
        Self {
            fold: Arc::new(fold),
            combine: Arc::new(combine),
        }
    }

    /// Reduce one partition (or the whole stream, sequentially).
    pub fn fold(&self, items: BoxIter<T>) -> A {
        (self.fold)(items)
    }

    /// Merge two partials; `left` precedes `right` in encounter order.
    pub fn combine(&self, left: A, right: A) -> A {
        (self.combine)(left, right)
    }
}

/// Run `terminal` over `plan` on the evaluator selected by `mode`.
pub fn execute<T, A>(
    plan: &dyn Plan<T>,
    terminal: &Terminal<T, A>,
    mode: ExecutionMode,
    ordered: bool,
    config: &ExecutionConfig,
) -> Result<A>
where
    T: StreamData,
    A: Send + 'static,
{
    let kinds = op_kinds(plan)
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(" -> ");
    debug!("evaluating {:?} pipeline: source -> [{}]", mode, kinds);
    match mode {
        ExecutionMode::Sequential => SequentialEvaluator.evaluate(plan, terminal),
        ExecutionMode::Parallel => {
            ParallelEvaluator::new(config.clone()).evaluate(plan, terminal, ordered)
        }
    }
}
