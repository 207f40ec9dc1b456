//! Split / fold / merge evaluation.
//!
//! ```text
//!            [1 2 3 4 5 6]                 split while size > threshold
//!           /             \
//!       [1 2 3]         [4 5 6]
//!       /     \         /     \
//!     [1]   [2 3]     [4]   [5 6]          leaves → worker pool (fold each)
//!       \     /         \     /
//!     combine(a,b)    combine(c,d)         siblings merged after both finish
//!             \         /
//!            combine(ab,cd)                root partial → caller
//! ```
//!
//! Every leaf starts from a fresh supplier (or `identity`), so a non-neutral
//! identity is counted once per leaf, not once per stream.

use tracing::debug;

use super::{SequentialEvaluator, Terminal, WorkerPool};
use crate::config::ExecutionConfig;
use crate::error::{Result, StreamError};
use crate::pipeline::Plan;
use crate::source::Source;
use crate::types::{BoxIter, StreamData};

/// Evaluator that partitions a splittable source across a [`WorkerPool`].
pub struct ParallelEvaluator {
    config: ExecutionConfig,
    pool: WorkerPool,
}

impl ParallelEvaluator {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            pool: WorkerPool::new(config.parallelism),
            config,
        }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Evaluate `plan`, falling back to sequential evaluation when its source
    /// cannot be split.
    pub fn evaluate<T, A>(
        &self,
        plan: &dyn Plan<T>,
        terminal: &Terminal<T, A>,
        ordered: bool,
    ) -> Result<A>
    where
        T: StreamData,
        A: Send + 'static,
    {
        if !plan.characteristics().splittable {
            debug!("source is not splittable, evaluating sequentially");
            return SequentialEvaluator.evaluate(plan, terminal);
        }
        let source = plan.open_parallel(self, ordered)?;
        self.run(source, terminal, ordered)
    }

    /// Split `source`, fold each leaf on the pool and merge the partials.
    ///
    /// With `ordered`, partials are merged pairwise along the split tree, left
    /// before right. Otherwise they are folded in completion order.
    pub fn run<T, A>(
        &self,
        source: Box<dyn Source<T>>,
        terminal: &Terminal<T, A>,
        ordered: bool,
    ) -> Result<A>
    where
        T: StreamData,
        A: Send + 'static,
    {
        let len = source.estimate_size().unwrap_or(0);
        let threshold = self.config.split_threshold(len);
        let (tree, leaves) = SplitTree::build(source, threshold, self.config.max_split_depth);
        let leaf_count = leaves.len();
        debug!(
            "split {} element(s) into {} partition(s), threshold {}",
            len, leaf_count, threshold
        );

        let task = terminal.clone();
        let mut partials = self
            .pool
            .run(leaves, move |leaf: Box<dyn Source<T>>| task.fold(leaf.open()))?;

        let merged = if ordered {
            partials.sort_unstable_by_key(|(index, _)| *index);
            let mut values = partials.into_iter().map(|(_, partial)| partial);
            tree.merge(&mut values, &|left, right| terminal.combine(left, right))
        } else {
            partials
                .into_iter()
                .map(|(_, partial)| partial)
                .reduce(|left, right| terminal.combine(left, right))
        };
        merged.ok_or(StreamError::Disconnected {
            missing: leaf_count,
        })
    }

    /// Evaluate `source` in parallel into a buffer.
    pub fn materialize<T: StreamData>(
        &self,
        source: Box<dyn Source<T>>,
        ordered: bool,
    ) -> Result<Vec<T>> {
        let concat = Terminal::new(
            |items: BoxIter<T>| items.collect::<Vec<T>>(),
            |mut left: Vec<T>, right: Vec<T>| {
                left.extend(right);
                left
            },
        );
        self.run(source, &concat, ordered)
    }

    /// The first `n` elements of `source`, in encounter order.
    ///
    /// Partitions are dispatched in waves of `parallelism`, left to right, and
    /// each stops pulling after `n` elements. No further wave starts once `n`
    /// elements are buffered, so an oversized source is never fully visited.
    pub fn materialize_prefix<T: StreamData>(
        &self,
        source: Box<dyn Source<T>>,
        n: usize,
    ) -> Result<Vec<T>> {
        let mut prefix = Vec::new();
        if n == 0 {
            return Ok(prefix);
        }
        let len = source.estimate_size().unwrap_or(0);
        let threshold = self.config.split_threshold(len);
        let (_, leaves) = SplitTree::build(source, threshold, self.config.max_split_depth);
        let leaf_count = leaves.len();

        let mut leaves = leaves.into_iter();
        let mut waves = 0;
        while prefix.len() < n {
            let wave: Vec<Box<dyn Source<T>>> = leaves.by_ref().take(self.pool.size()).collect();
            if wave.is_empty() {
                break;
            }
            waves += 1;
            let wanted = n - prefix.len();
            let mut partials = self.pool.run(wave, move |leaf: Box<dyn Source<T>>| {
                leaf.open().take(wanted).collect::<Vec<T>>()
            })?;
            partials.sort_unstable_by_key(|(index, _)| *index);
            for (_, partial) in partials {
                let room = n - prefix.len();
                prefix.extend(partial.into_iter().take(room));
            }
        }
        debug!(
            "prefix of {} filled {} element(s) in {} wave(s) over {} partition(s)",
            n,
            prefix.len(),
            waves,
            leaf_count
        );
        Ok(prefix)
    }
}

/// Shape of the recursive split. Leaves are numbered left to right, matching the
/// order of the partition list returned by [`SplitTree::build`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SplitTree {
    Leaf,
    Node(Box<SplitTree>, Box<SplitTree>),
}

impl SplitTree {
    pub(crate) fn build<T>(
        source: Box<dyn Source<T>>,
        threshold: usize,
        max_depth: usize,
    ) -> (Self, Vec<Box<dyn Source<T>>>) {
        let mut leaves = Vec::new();
        let tree = Self::split(source, threshold, max_depth, &mut leaves);
        (tree, leaves)
    }

    fn split<T>(
        mut source: Box<dyn Source<T>>,
        threshold: usize,
        depth: usize,
        leaves: &mut Vec<Box<dyn Source<T>>>,
    ) -> Self {
        let oversized = source.estimate_size().is_some_and(|n| n > threshold);
        if oversized
            && depth > 0
            && let Some(left) = source.try_split()
        {
            let left = Self::split(left, threshold, depth - 1, leaves);
            let right = Self::split(source, threshold, depth - 1, leaves);
            return SplitTree::Node(Box::new(left), Box::new(right));
        }
        leaves.push(source);
        SplitTree::Leaf
    }

    /// Combine partials (given in leaf order) bottom-up along the tree.
    pub(crate) fn merge<A>(
        &self,
        partials: &mut impl Iterator<Item = A>,
        combine: &dyn Fn(A, A) -> A,
    ) -> Option<A> {
        match self {
            SplitTree::Leaf => partials.next(),
            SplitTree::Node(left, right) => {
                let left = left.merge(partials, combine)?;
                let right = right.merge(partials, combine)?;
                Some(combine(left, right))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn leaf_count(&self) -> usize {
        match self {
            SplitTree::Leaf => 1,
            SplitTree::Node(left, right) => left.leaf_count() + right.leaf_count(),
        }
    }
}

#[cfg(test)]
#[path = "tests/parallel_tests.rs"]
mod tests;
