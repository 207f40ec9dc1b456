//! Immutable pipeline descriptions.
//!
//! A plan is a chain of nodes linked by `Arc`, rooted at a source:
//!
//! ```text
//! SourcePlan<S> ← OpPlan<S, Filter> ← OpPlan<_, Map> ← ...
//! ```
//!
//! Appending a node creates a new `OpPlan` that points at the existing one. The
//! prefix is shared and never mutated. The source is taken out of its plan
//! exactly once, when a terminal operation opens the pipeline.

use std::sync::{Arc, Mutex, PoisonError};

use super::operator::Operator;
use crate::error::{Result, StreamError};
use crate::runtime::ParallelEvaluator;
use crate::source::Source;
use crate::types::{BoxIter, Characteristics, OpKind, StreamData};

/// A pipeline that yields elements of type `T`.
pub trait Plan<T>: Send + Sync {
    /// Characteristics of the root source.
    fn characteristics(&self) -> Characteristics;

    /// Append the kinds of every node, source side first.
    fn collect_kinds(&self, out: &mut Vec<OpKind>);

    /// Take the source and compose every node into one lazy pull iterator.
    fn open_sequential(&self) -> Result<BoxIter<T>>;

    /// Take the source and build a splittable source for the trailing run of
    /// stateless nodes.
    ///
    /// Stateful nodes are barriers: the segment above one is evaluated in parallel
    /// into a buffer (in source order when `ordered`), the node runs over that
    /// buffer, and the result seeds the next segment.
    fn open_parallel(
        &self,
        evaluator: &ParallelEvaluator,
        ordered: bool,
    ) -> Result<Box<dyn Source<T>>>;
}

/// Node kinds of `plan`, source side first.
pub fn op_kinds<T>(plan: &dyn Plan<T>) -> Vec<OpKind> {
    let mut kinds = Vec::new();
    plan.collect_kinds(&mut kinds);
    kinds
}

/// Root of every plan: holds the source until it is opened.
pub struct SourcePlan<T> {
    source: Mutex<Option<Box<dyn Source<T>>>>,
    characteristics: Characteristics,
}

impl<T: StreamData> SourcePlan<T> {
    pub fn new(source: impl Source<T> + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn Source<T>>) -> Self {
        let characteristics = source.characteristics();
        Self {
            source: Mutex::new(Some(source)),
            characteristics,
        }
    }

    fn take(&self) -> Result<Box<dyn Source<T>>> {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(StreamError::Reused)
    }
}

impl<T: StreamData> Plan<T> for SourcePlan<T> {
    fn characteristics(&self) -> Characteristics {
        self.characteristics
    }

    fn collect_kinds(&self, _out: &mut Vec<OpKind>) {}

    fn open_sequential(&self) -> Result<BoxIter<T>> {
        Ok(self.take()?.open())
    }

    fn open_parallel(
        &self,
        _evaluator: &ParallelEvaluator,
        _ordered: bool,
    ) -> Result<Box<dyn Source<T>>> {
        self.take()
    }
}

/// One operation node appended to an upstream plan.
pub struct OpPlan<IN, O> {
    upstream: Arc<dyn Plan<IN>>,
    op: Arc<O>,
}

impl<IN, O> OpPlan<IN, O>
where
    IN: StreamData,
    O: Operator<IN>,
{
    pub fn new(upstream: Arc<dyn Plan<IN>>, op: O) -> Self {
        Self {
            upstream,
            op: Arc::new(op),
        }
    }
}

impl<IN, O> Plan<O::OUT> for OpPlan<IN, O>
where
    IN: StreamData,
    O: Operator<IN>,
{
    fn characteristics(&self) -> Characteristics {
        self.upstream.characteristics()
    }

    fn collect_kinds(&self, out: &mut Vec<OpKind>) {
        self.upstream.collect_kinds(out);
        out.push(self.op.kind());
    }

    fn open_sequential(&self) -> Result<BoxIter<O::OUT>> {
        let upstream = self.upstream.open_sequential()?;
        Ok(Arc::clone(&self.op).pull(upstream))
    }

    fn open_parallel(
        &self,
        evaluator: &ParallelEvaluator,
        ordered: bool,
    ) -> Result<Box<dyn Source<O::OUT>>> {
        let upstream = self.upstream.open_parallel(evaluator, ordered)?;
        let kind = self.op.kind();
        if !kind.is_stateful() {
            return Ok(Box::new(FusedSource {
                inner: upstream,
                op: Arc::clone(&self.op),
            }));
        }

        Arc::clone(&self.op).barrier(upstream, evaluator, ordered)
    }
}

/// A stateless node fused onto a splittable source.
///
/// Splitting splits the inner source and fuses the same node onto both halves,
/// so each partition runs its own copy of the segment.
struct FusedSource<IN, O> {
    inner: Box<dyn Source<IN>>,
    op: Arc<O>,
}

impl<IN, O> Source<O::OUT> for FusedSource<IN, O>
where
    IN: StreamData,
    O: Operator<IN>,
{
    fn characteristics(&self) -> Characteristics {
        let mut c = self.inner.characteristics();
        if self.op.kind().changes_size() {
            c.size_known = false;
        }
        c
    }

    fn estimate_size(&self) -> Option<usize> {
        self.inner.estimate_size()
    }

    fn try_split(&mut self) -> Option<Box<dyn Source<O::OUT>>> {
        let left = self.inner.try_split()?;
        Some(Box::new(FusedSource {
            inner: left,
            op: Arc::clone(&self.op),
        }))
    }

    fn open(self: Box<Self>) -> BoxIter<O::OUT> {
        let FusedSource { inner, op } = *self;
        op.pull(inner.open())
    }
}

#[cfg(test)]
#[path = "tests/plan_tests.rs"]
mod tests;
