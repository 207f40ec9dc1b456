use std::io::BufRead;
use std::sync::Arc;

use lazyflow_core::pipeline::{Plan, SourcePlan};
use lazyflow_core::source::{
    GenerateSource, IterSource, IterateSource, RangeElement, RangeSource, Source, VecSource,
};
use lazyflow_core::{ExecutionConfig, StreamData};

use crate::stream::Stream;

/// The entry point for building streams.
///
/// Every stream created from an environment carries its [`ExecutionConfig`],
/// which parallel evaluation reads when the terminal operation runs.
#[derive(Debug, Clone, Default)]
pub struct StreamEnvironment {
    config: Arc<ExecutionConfig>,
}

impl StreamEnvironment {
    /// Create an environment with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ExecutionConfig::default())
    }

    pub fn with_config(config: ExecutionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Wrap any [`Source`] in a fresh sequential handle.
    pub fn from_source<T, S>(&self, source: S) -> Stream<T>
    where
        T: StreamData,
        S: Source<T> + 'static,
    {
        let plan: Arc<dyn Plan<T>> = Arc::new(SourcePlan::new(source));
        Stream::new(plan, Arc::clone(&self.config))
    }

    pub fn of<T: StreamData>(&self, items: Vec<T>) -> Stream<T> {
        self.from_source(VecSource::new(items))
    }

    pub fn of_collection<T, I>(&self, items: I) -> Stream<T>
    where
        T: StreamData,
        I: IntoIterator<Item = T>,
    {
        self.from_source(items.into_iter().collect::<VecSource<T>>())
    }

    /// Like [`of`](Self::of), but the handle starts in parallel mode.
    pub fn par_of<T: StreamData>(&self, items: Vec<T>) -> Stream<T> {
        self.of(items).into_parallel()
    }

    pub fn of_array<T: StreamData + Clone>(&self, items: &[T]) -> Stream<T> {
        self.of(items.to_vec())
    }

    /// Elements `items[start..end]`. Out-of-range bounds are clamped to the slice,
    /// and `start > end` gives an empty stream.
    pub fn of_array_range<T: StreamData + Clone>(
        &self,
        items: &[T],
        start: usize,
        end: usize,
    ) -> Stream<T> {
        self.from_source(VecSource::from_slice_range(items, start, end))
    }

    pub fn empty<T: StreamData>(&self) -> Stream<T> {
        self.from_source(VecSource::empty())
    }

    /// Infinite, unordered stream of `supplier()` results. Bound it with `limit`.
    pub fn generate<T, F>(&self, supplier: F) -> Stream<T>
    where
        T: StreamData,
        F: FnMut() -> T + Send + 'static,
    {
        self.from_source(GenerateSource::new(supplier))
    }

    /// Infinite, ordered stream `seed, f(seed), f(f(seed)), ...`. Bound it with `limit`.
    pub fn iterate<T, F>(&self, seed: T, successor: F) -> Stream<T>
    where
        T: StreamData + Clone,
        F: FnMut(&T) -> T + Send + 'static,
    {
        self.from_source(IterateSource::new(seed, successor))
    }

    /// `start, start + 1, ..., end - 1`.
    pub fn range<N: RangeElement>(&self, start: N, end: N) -> Stream<N> {
        self.from_source(RangeSource::exclusive(start, end))
    }

    /// `start, start + 1, ..., end`.
    pub fn range_closed<N: RangeElement>(&self, start: N, end: N) -> Stream<N> {
        self.from_source(RangeSource::inclusive(start, end))
    }

    /// Ordered stream over a lazy iterator. It is never split, so parallel mode
    /// evaluates it sequentially.
    pub fn from_iter<I>(&self, iter: I) -> Stream<I::Item>
    where
        I: IntoIterator,
        I::IntoIter: Send + 'static,
        I::Item: StreamData,
    {
        self.from_source(IterSource::new(iter.into_iter()))
    }

    pub fn chars(&self, text: &str) -> Stream<char> {
        self.from_iter(text.chars().collect::<Vec<_>>())
    }

    /// Pieces of `text` between occurrences of `delimiter`. Trailing empty
    /// pieces are dropped.
    pub fn split(&self, text: &str, delimiter: &str) -> Stream<String> {
        let mut pieces: Vec<String> = text.split(delimiter).map(str::to_owned).collect();
        while pieces.last().is_some_and(|piece| piece.is_empty()) {
            pieces.pop();
        }
        self.from_iter(pieces)
    }

    /// One element per line of `reader`, read on demand.
    pub fn lines<R>(&self, reader: R) -> Stream<std::io::Result<String>>
    where
        R: BufRead + Send + 'static,
    {
        self.from_iter(reader.lines())
    }

    pub fn builder<T: StreamData>(&self) -> StreamBuilder<T> {
        StreamBuilder {
            items: Vec::new(),
            env: self.clone(),
        }
    }
}

/// Accumulates elements one by one, then becomes a stream.
///
/// [`build`](Self::build) takes the builder by value, so nothing can be added
/// once the stream exists.
#[derive(Debug)]
pub struct StreamBuilder<T> {
    items: Vec<T>,
    env: StreamEnvironment,
}

impl<T: StreamData> StreamBuilder<T> {
    pub fn add(mut self, item: T) -> Self {
        self.items.push(item);
        self
    }

    pub fn build(self) -> Stream<T> {
        self.env.of(self.items)
    }
}
