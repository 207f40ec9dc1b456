//! Operation nodes.
//!
//! Each node wraps its upstream pull iterator into a new one. Nothing runs until
//! the terminal operation pulls the first element, and each pull asks upstream for
//! exactly as many elements as the node needs:
//!
//! ```text
//! terminal.next()
//!   → limit: stop after n, never pull again
//!   → map:   f(upstream.next())
//!   → filter: upstream.next() until p(x)
//!   → source
//! ```
//!
//! Nodes are shared (`Arc`) between every partition of a parallel evaluation, so
//! their functions are `Fn + Send + Sync`. Per-evaluation state (the `distinct`
//! seen-set, the `sorted` buffer) lives in the iterator, never in the node.

use std::cmp::Ordering;
use std::hash::Hash;
use std::sync::Arc;

use ahash::AHashSet;
use tracing::debug;

use crate::error::Result;
use crate::runtime::ParallelEvaluator;
use crate::source::{Source, VecSource, skip_prefix};
use crate::types::{BoxIter, OpKind, StreamData};

/// A lazy transformation step.
///
/// `OUT` is an associated type so that a plan node's output type is uniquely
/// determined by its operator and input type.
pub trait Operator<IN>: Send + Sync + 'static {
    /// Output element type of this node.
    type OUT: StreamData;

    fn kind(&self) -> OpKind;

    /// Compose this node on top of `upstream`.
    fn pull(self: Arc<Self>, upstream: BoxIter<IN>) -> BoxIter<Self::OUT>;

    /// Run a stateful node between two parallel segments.
    ///
    /// By default the upstream segment is evaluated into a buffer and the node
    /// runs over it. Positional nodes override this to avoid visiting elements
    /// they would discard.
    fn barrier(
        self: Arc<Self>,
        upstream: Box<dyn Source<IN>>,
        evaluator: &ParallelEvaluator,
        ordered: bool,
    ) -> Result<Box<dyn Source<Self::OUT>>>
    where
        IN: StreamData,
    {
        let buffer = evaluator.materialize(upstream, ordered)?;
        debug!("barrier {} over {} buffered element(s)", self.kind(), buffer.len());
        let output: Vec<Self::OUT> = self.pull(Box::new(buffer.into_iter())).collect();
        Ok(Box::new(VecSource::new(output)))
    }
}

// ============================================================================
// Stateless nodes: Map, FlatMap, Filter, Peek
// ============================================================================

/// Map operator: transforms each input to one output.
pub struct MapOp<F> {
    f: F,
}

impl<F> MapOp<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, IN, OUT> Operator<IN> for MapOp<F>
where
    F: Fn(IN) -> OUT + Send + Sync + 'static,
    IN: StreamData,
    OUT: StreamData,
{
    type OUT = OUT;

    fn kind(&self) -> OpKind {
        OpKind::Map
    }

    #[inline]
    fn pull(self: Arc<Self>, upstream: BoxIter<IN>) -> BoxIter<OUT> {
        Box::new(upstream.map(move |item| (self.f)(item)))
    }
}

/// FlatMap operator: transforms each input to zero or more outputs.
pub struct FlatMapOp<F> {
    f: F,
}

impl<F> FlatMapOp<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, IN, I> Operator<IN> for FlatMapOp<F>
where
    F: Fn(IN) -> I + Send + Sync + 'static,
    IN: StreamData,
    I: IntoIterator + 'static,
    I::IntoIter: Send + 'static,
    I::Item: StreamData,
{
    type OUT = I::Item;

    fn kind(&self) -> OpKind {
        OpKind::FlatMap
    }

    #[inline]
    fn pull(self: Arc<Self>, upstream: BoxIter<IN>) -> BoxIter<I::Item> {
        Box::new(upstream.flat_map(move |item| (self.f)(item)))
    }
}

/// Filter operator: only elements that satisfy the predicate pass through.
pub struct FilterOp<F> {
    f: F,
}

impl<F> FilterOp<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, T> Operator<T> for FilterOp<F>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
    T: StreamData,
{
    type OUT = T;

    fn kind(&self) -> OpKind {
        OpKind::Filter
    }

    #[inline]
    fn pull(self: Arc<Self>, upstream: BoxIter<T>) -> BoxIter<T> {
        Box::new(upstream.filter(move |item| (self.f)(item)))
    }
}

/// Peek operator: observes each element on its way downstream.
pub struct PeekOp<F> {
    f: F,
}

impl<F> PeekOp<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, T> Operator<T> for PeekOp<F>
where
    F: Fn(&T) + Send + Sync + 'static,
    T: StreamData,
{
    type OUT = T;

    fn kind(&self) -> OpKind {
        OpKind::Peek
    }

    fn pull(self: Arc<Self>, upstream: BoxIter<T>) -> BoxIter<T> {
        Box::new(upstream.inspect(move |item| (self.f)(item)))
    }
}

// ============================================================================
// Stateful nodes: Skip, Limit, Distinct, Sorted
// ============================================================================

/// Drops the first `n` elements that reach this node.
pub struct SkipOp {
    n: usize,
}

impl SkipOp {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<T: StreamData> Operator<T> for SkipOp {
    type OUT = T;

    fn kind(&self) -> OpKind {
        OpKind::Skip
    }

    fn pull(self: Arc<Self>, upstream: BoxIter<T>) -> BoxIter<T> {
        Box::new(upstream.skip(self.n))
    }

    /// A sized upstream drops its prefix by splitting, without opening it.
    fn barrier(
        self: Arc<Self>,
        upstream: Box<dyn Source<T>>,
        evaluator: &ParallelEvaluator,
        ordered: bool,
    ) -> Result<Box<dyn Source<T>>> {
        if upstream.characteristics().size_known {
            debug!("skip {} over a sized segment", self.n);
            return Ok(skip_prefix(upstream, self.n));
        }
        let buffer = evaluator.materialize(upstream, ordered)?;
        debug!("skip {} over {} buffered element(s)", self.n, buffer.len());
        Ok(Box::new(buffer.into_iter().skip(self.n).collect::<VecSource<T>>()))
    }
}

/// Passes at most `n` elements, then stops pulling from upstream.
pub struct LimitOp {
    n: usize,
}

impl LimitOp {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<T: StreamData> Operator<T> for LimitOp {
    type OUT = T;

    fn kind(&self) -> OpKind {
        OpKind::Limit
    }

    fn pull(self: Arc<Self>, upstream: BoxIter<T>) -> BoxIter<T> {
        Box::new(upstream.take(self.n))
    }

    fn barrier(
        self: Arc<Self>,
        upstream: Box<dyn Source<T>>,
        evaluator: &ParallelEvaluator,
        _ordered: bool,
    ) -> Result<Box<dyn Source<T>>> {
        let prefix = evaluator.materialize_prefix(upstream, self.n)?;
        Ok(Box::new(VecSource::new(prefix)))
    }
}

/// Emits the first occurrence of each element, in encounter order.
pub struct DistinctOp;

impl<T> Operator<T> for DistinctOp
where
    T: StreamData + Eq + Hash + Clone,
{
    type OUT = T;

    fn kind(&self) -> OpKind {
        OpKind::Distinct
    }

    fn pull(self: Arc<Self>, upstream: BoxIter<T>) -> BoxIter<T> {
        let mut seen = AHashSet::new();
        Box::new(upstream.filter(move |item| seen.insert(item.clone())))
    }
}

/// Buffers the whole upstream on the first pull, then emits it sorted.
///
/// The sort is stable: equal elements keep their encounter order.
pub struct SortedOp<C> {
    cmp: C,
}

impl<C> SortedOp<C> {
    pub fn new(cmp: C) -> Self {
        Self { cmp }
    }
}

impl<T, C> Operator<T> for SortedOp<C>
where
    T: StreamData,
    C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    type OUT = T;

    fn kind(&self) -> OpKind {
        OpKind::Sorted
    }

    fn pull(self: Arc<Self>, upstream: BoxIter<T>) -> BoxIter<T> {
        Box::new(Sorted {
            op: self,
            state: SortState::Pending(upstream),
        })
    }
}

enum SortState<T> {
    Pending(BoxIter<T>),
    Draining(std::vec::IntoIter<T>),
}

struct Sorted<T, C> {
    op: Arc<SortedOp<C>>,
    state: SortState<T>,
}

impl<T, C> Iterator for Sorted<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let SortState::Pending(upstream) = &mut self.state {
            let mut buffer: Vec<T> = upstream.collect();
            buffer.sort_by(|a, b| (self.op.cmp)(a, b));
            self.state = SortState::Draining(buffer.into_iter());
        }
        match &mut self.state {
            SortState::Draining(items) => items.next(),
            SortState::Pending(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/operator_tests.rs"]
mod tests;
