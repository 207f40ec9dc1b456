use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use lazyflow_core::collector::{Collector, to_list};
use lazyflow_core::pipeline::{
    DistinctOp, FilterOp, FlatMapOp, LimitOp, MapOp, OpPlan, Operator, PeekOp, Plan, SkipOp,
    SortedOp, op_kinds,
};
use lazyflow_core::runtime::{self, ExecutionMode, Terminal};
use lazyflow_core::source::RangeElement;
use lazyflow_core::{BoxIter, ExecutionConfig, OpKind, Result, StreamData, StreamError};
use tracing::debug;

use crate::environment::{StreamBuilder, StreamEnvironment};

/// A single-use handle over a lazy pipeline.
///
/// Intermediate operations ([`map`](Self::map), [`filter`](Self::filter), ...)
/// append a node and return a new handle. Terminal operations
/// ([`count`](Self::count), [`collect`](Self::collect), ...) run the pipeline.
/// Either kind consumes this handle: every later call on it returns
/// [`StreamError::Reused`].
///
/// # Hazards
///
/// - [`generate`](StreamEnvironment::generate) and
///   [`iterate`](StreamEnvironment::iterate) are unbounded. Without a
///   [`limit`](Self::limit) upstream, a terminal that is not short-circuiting
///   never returns.
/// - In parallel mode, combiners passed to [`reduce_with`](Self::reduce_with) and
///   custom collectors must be associative and agree with their accumulator, or
///   parallel results differ from sequential ones.
pub struct Stream<T> {
    plan: Arc<dyn Plan<T>>,
    consumed: AtomicBool,
    mode: ExecutionMode,
    ordered: bool,
    config: Arc<ExecutionConfig>,
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("ops", &op_kinds(self.plan.as_ref()))
            .field("mode", &self.mode)
            .field("ordered", &self.ordered)
            .field("consumed", &self.consumed.load(AtomicOrdering::Acquire))
            .finish()
    }
}

impl<T: StreamData> Stream<T> {
    pub(crate) fn new(plan: Arc<dyn Plan<T>>, config: Arc<ExecutionConfig>) -> Self {
        let ordered = plan.characteristics().ordered;
        Self {
            plan,
            consumed: AtomicBool::new(false),
            mode: ExecutionMode::Sequential,
            ordered,
            config,
        }
    }

    pub(crate) fn into_parallel(mut self) -> Self {
        self.mode = ExecutionMode::Parallel;
        self
    }

    fn successor<U>(&self, plan: Arc<dyn Plan<U>>, mode: ExecutionMode, ordered: bool) -> Stream<U> {
        Stream {
            plan,
            consumed: AtomicBool::new(false),
            mode,
            ordered,
            config: Arc::clone(&self.config),
        }
    }

    /// Mark this handle consumed and hand out its plan.
    fn take(&self) -> Result<Arc<dyn Plan<T>>> {
        if self.consumed.swap(true, AtomicOrdering::AcqRel) {
            debug!("rejecting operation on a consumed stream");
            return Err(StreamError::Reused);
        }
        Ok(Arc::clone(&self.plan))
    }

    fn link<O: Operator<T>>(&self, op: O) -> Result<Stream<O::OUT>> {
        let upstream = self.take()?;
        let plan: Arc<dyn Plan<O::OUT>> = Arc::new(OpPlan::new(upstream, op));
        Ok(self.successor(plan, self.mode, self.ordered))
    }

    fn relabel(&self, mode: ExecutionMode, ordered: bool) -> Result<Stream<T>> {
        let plan = self.take()?;
        Ok(self.successor(plan, mode, ordered))
    }

    fn run<A: Send + 'static>(&self, terminal: Terminal<T, A>, ordered: bool) -> Result<A> {
        let plan = self.take()?;
        runtime::execute(plan.as_ref(), &terminal, self.mode, ordered, &self.config)
    }

    fn evaluate<A: Send + 'static>(&self, terminal: Terminal<T, A>) -> Result<A> {
        self.run(terminal, self.ordered)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether a terminal operation on this handle would run in parallel.
    pub fn is_parallel(&self) -> bool {
        self.mode == ExecutionMode::Parallel
    }

    /// Kinds of the nodes appended so far, source side first.
    pub fn op_kinds(&self) -> Vec<OpKind> {
        op_kinds(self.plan.as_ref())
    }

    // ------------------------------------------------------------------
    // Intermediate operations
    // ------------------------------------------------------------------

    pub fn map<U, F>(&self, f: F) -> Result<Stream<U>>
    where
        U: StreamData,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.link(MapOp::new(f))
    }

    pub fn flat_map<I, F>(&self, f: F) -> Result<Stream<I::Item>>
    where
        I: IntoIterator + 'static,
        I::IntoIter: Send + 'static,
        I::Item: StreamData,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        self.link(FlatMapOp::new(f))
    }

    pub fn filter<P>(&self, predicate: P) -> Result<Stream<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.link(FilterOp::new(predicate))
    }

    /// Observe each element as it is pulled. Nothing is observed until a terminal
    /// operation runs.
    pub fn peek<F>(&self, f: F) -> Result<Stream<T>>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.link(PeekOp::new(f))
    }

    pub fn skip(&self, n: usize) -> Result<Stream<T>> {
        self.link(SkipOp::new(n))
    }

    pub fn limit(&self, n: usize) -> Result<Stream<T>> {
        self.link(LimitOp::new(n))
    }

    pub fn distinct(&self) -> Result<Stream<T>>
    where
        T: Eq + Hash + Clone,
    {
        self.link(DistinctOp)
    }

    pub fn sorted(&self) -> Result<Stream<T>>
    where
        T: Ord,
    {
        self.link(SortedOp::new(|a: &T, b: &T| a.cmp(b)))
    }

    /// Stable sort by `cmp`.
    pub fn sorted_by<C>(&self, cmp: C) -> Result<Stream<T>>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.link(SortedOp::new(cmp))
    }

    pub fn parallel(&self) -> Result<Stream<T>> {
        self.relabel(ExecutionMode::Parallel, self.ordered)
    }

    pub fn sequential(&self) -> Result<Stream<T>> {
        self.relabel(ExecutionMode::Sequential, self.ordered)
    }

    /// Drop the encounter-order guarantee. Parallel partials are then merged in
    /// completion order.
    pub fn unordered(&self) -> Result<Stream<T>> {
        self.relabel(self.mode, false)
    }

    // ------------------------------------------------------------------
    // Terminal operations
    // ------------------------------------------------------------------

    pub fn count(&self) -> Result<usize> {
        self.evaluate(Terminal::new(|items: BoxIter<T>| items.count(), |a: usize, b: usize| a + b))
    }

    /// Reduce without identity; `None` for an empty stream.
    pub fn reduce<F>(&self, f: F) -> Result<Option<T>>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let fold_f = Arc::clone(&f);
        self.evaluate(Terminal::new(
            move |items: BoxIter<T>| items.reduce(|a, b| fold_f(a, b)),
            move |left: Option<T>, right: Option<T>| match (left, right) {
                (Some(left), Some(right)) => Some(f(left, right)),
                (left, None) => left,
                (None, right) => right,
            },
        ))
    }

    /// Reduce from `identity` with `f`, which also merges partials.
    ///
    /// Each parallel partition starts from its own copy of `identity`.
    pub fn fold<F>(&self, identity: T, f: F) -> Result<T>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let fold_f = Arc::clone(&f);
        self.evaluate(Terminal::new(
            move |items: BoxIter<T>| items.fold(identity.clone(), |acc, x| fold_f(acc, x)),
            move |left: T, right: T| f(left, right),
        ))
    }

    /// Reduce into `U` with a separate `combiner` for partials.
    ///
    /// Each parallel partition starts from its own copy of `identity`, so a
    /// non-neutral identity is counted once per partition. Sequential evaluation
    /// never calls `combiner`.
    pub fn reduce_with<U, F, C>(&self, identity: U, accumulator: F, combiner: C) -> Result<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(U, T) -> U + Send + Sync + 'static,
        C: Fn(U, U) -> U + Send + Sync + 'static,
    {
        self.evaluate(Terminal::new(
            move |items: BoxIter<T>| items.fold(identity.clone(), |acc, x| accumulator(acc, x)),
            combiner,
        ))
    }

    pub fn collect<A, R>(&self, collector: Collector<T, A, R>) -> Result<R>
    where
        A: Send + 'static,
        R: 'static,
    {
        let partial = self.evaluate(collector.into_terminal())?;
        Ok(collector.finish(partial))
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.collect(to_list())
    }

    /// The first element in encounter order.
    pub fn find_first(&self) -> Result<Option<T>> {
        self.evaluate(Terminal::new(
            |mut items: BoxIter<T>| items.next(),
            |left: Option<T>, right: Option<T>| left.or(right),
        ))
    }

    /// Any element. In parallel mode, the first partition to finish wins.
    pub fn find_any(&self) -> Result<Option<T>> {
        self.run(
            Terminal::new(
                |mut items: BoxIter<T>| items.next(),
                |left: Option<T>, right: Option<T>| left.or(right),
            ),
            false,
        )
    }

    pub fn any_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.evaluate(Terminal::new(
            move |mut items: BoxIter<T>| items.any(|x| predicate(&x)),
            |a: bool, b: bool| a || b,
        ))
    }

    /// `true` for an empty stream.
    pub fn all_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.evaluate(Terminal::new(
            move |mut items: BoxIter<T>| items.all(|x| predicate(&x)),
            |a: bool, b: bool| a && b,
        ))
    }

    /// `true` for an empty stream.
    pub fn none_match<P>(&self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.evaluate(Terminal::new(
            move |mut items: BoxIter<T>| !items.any(|x| predicate(&x)),
            |a: bool, b: bool| a && b,
        ))
    }

    /// Run `f` on every element. In parallel mode, calls happen on worker threads
    /// in no particular order.
    pub fn for_each<F>(&self, f: F) -> Result<()>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.evaluate(Terminal::new(
            move |items: BoxIter<T>| items.for_each(|x| f(x)),
            |_: (), _: ()| (),
        ))
    }

    /// The least element by `cmp`; the first of equal minima.
    pub fn min_by<C>(&self, cmp: C) -> Result<Option<T>>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let cmp = Arc::new(cmp);
        let fold_cmp = Arc::clone(&cmp);
        self.evaluate(Terminal::new(
            move |items: BoxIter<T>| items.min_by(|a, b| fold_cmp(a, b)),
            move |left: Option<T>, right: Option<T>| match (left, right) {
                (Some(left), Some(right)) => match cmp(&right, &left) {
                    Ordering::Less => Some(right),
                    _ => Some(left),
                },
                (left, None) => left,
                (None, right) => right,
            },
        ))
    }

    /// The greatest element by `cmp`; the last of equal maxima.
    pub fn max_by<C>(&self, cmp: C) -> Result<Option<T>>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let cmp = Arc::new(cmp);
        let fold_cmp = Arc::clone(&cmp);
        self.evaluate(Terminal::new(
            move |items: BoxIter<T>| items.max_by(|a, b| fold_cmp(a, b)),
            move |left: Option<T>, right: Option<T>| match (left, right) {
                (Some(left), Some(right)) => match cmp(&right, &left) {
                    Ordering::Less => Some(left),
                    _ => Some(right),
                },
                (left, None) => left,
                (None, right) => right,
            },
        ))
    }

    pub fn min(&self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.min_by(|a: &T, b: &T| a.cmp(b))
    }

    pub fn max(&self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.max_by(|a: &T, b: &T| a.cmp(b))
    }
}

// ----------------------------------------------------------------------
// Construction through a default environment
// ----------------------------------------------------------------------

pub fn of<T: StreamData>(items: Vec<T>) -> Stream<T> {
    StreamEnvironment::new().of(items)
}

pub fn of_collection<T, I>(items: I) -> Stream<T>
where
    T: StreamData,
    I: IntoIterator<Item = T>,
{
    StreamEnvironment::new().of_collection(items)
}

pub fn par_of<T: StreamData>(items: Vec<T>) -> Stream<T> {
    StreamEnvironment::new().par_of(items)
}

pub fn of_array<T: StreamData + Clone>(items: &[T]) -> Stream<T> {
    StreamEnvironment::new().of_array(items)
}

pub fn of_array_range<T: StreamData + Clone>(items: &[T], start: usize, end: usize) -> Stream<T> {
    StreamEnvironment::new().of_array_range(items, start, end)
}

pub fn empty<T: StreamData>() -> Stream<T> {
    StreamEnvironment::new().empty()
}

pub fn generate<T, F>(supplier: F) -> Stream<T>
where
    T: StreamData,
    F: FnMut() -> T + Send + 'static,
{
    StreamEnvironment::new().generate(supplier)
}

pub fn iterate<T, F>(seed: T, successor: F) -> Stream<T>
where
    T: StreamData + Clone,
    F: FnMut(&T) -> T + Send + 'static,
{
    StreamEnvironment::new().iterate(seed, successor)
}

pub fn range<N: RangeElement>(start: N, end: N) -> Stream<N> {
    StreamEnvironment::new().range(start, end)
}

pub fn range_closed<N: RangeElement>(start: N, end: N) -> Stream<N> {
    StreamEnvironment::new().range_closed(start, end)
}

pub fn from_iter<I>(iter: I) -> Stream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: StreamData,
{
    StreamEnvironment::new().from_iter(iter)
}

pub fn chars(text: &str) -> Stream<char> {
    StreamEnvironment::new().chars(text)
}

pub fn split(text: &str, delimiter: &str) -> Stream<String> {
    StreamEnvironment::new().split(text, delimiter)
}

pub fn lines<R>(reader: R) -> Stream<std::io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    StreamEnvironment::new().lines(reader)
}

pub fn builder<T: StreamData>() -> StreamBuilder<T> {
    StreamEnvironment::new().builder()
}
