use super::Source;
use crate::types::{BoxIter, Characteristics, StreamData};

/// Infinite, unordered source calling a supplier for every element.
pub struct GenerateSource<F> {
    supplier: F,
}

impl<F> GenerateSource<F> {
    pub fn new(supplier: F) -> Self {
        Self { supplier }
    }
}

impl<T, F> Source<T> for GenerateSource<F>
where
    T: StreamData,
    F: FnMut() -> T + Send + 'static,
{
    fn characteristics(&self) -> Characteristics {
        Characteristics::unsplittable(false)
    }

    fn estimate_size(&self) -> Option<usize> {
        None
    }

    fn open(self: Box<Self>) -> BoxIter<T> {
        Box::new(std::iter::repeat_with(self.supplier))
    }
}

/// Infinite, ordered source: `seed, f(seed), f(f(seed)), ...`.
pub struct IterateSource<T, F> {
    seed: T,
    successor: F,
}

impl<T, F> IterateSource<T, F> {
    pub fn new(seed: T, successor: F) -> Self {
        Self { seed, successor }
    }
}

impl<T, F> Source<T> for IterateSource<T, F>
where
    T: StreamData + Clone,
    F: FnMut(&T) -> T + Send + 'static,
{
    fn characteristics(&self) -> Characteristics {
        Characteristics::unsplittable(true)
    }

    fn estimate_size(&self) -> Option<usize> {
        None
    }

    fn open(self: Box<Self>) -> BoxIter<T> {
        let IterateSource { seed, successor } = *self;
        Box::new(Iterate {
            seed: Some(seed),
            prev: None,
            successor,
        })
    }
}

/// Applies the successor only when the next element is pulled, so a downstream
/// `limit(n)` calls it exactly `n - 1` times.
struct Iterate<T, F> {
    seed: Option<T>,
    prev: Option<T>,
    successor: F,
}

impl<T, F> Iterator for Iterate<T, F>
where
    T: Clone,
    F: FnMut(&T) -> T,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let value = match &self.prev {
            Some(prev) => (self.successor)(prev),
            None => self.seed.take()?,
        };
        self.prev = Some(value.clone());
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Ordered, non-splittable source over an arbitrary lazy iterator.
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> Source<I::Item> for IterSource<I>
where
    I: Iterator + Send + 'static,
    I::Item: StreamData,
{
    fn characteristics(&self) -> Characteristics {
        Characteristics::unsplittable(true)
    }

    fn estimate_size(&self) -> Option<usize> {
        self.iter.size_hint().1
    }

    fn open(self: Box<Self>) -> BoxIter<I::Item> {
        Box::new(self.iter)
    }
}
