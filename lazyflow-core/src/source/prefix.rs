use super::{Source, VecSource};
use crate::types::{BoxIter, Characteristics, StreamData};

/// Drop the first `n` elements of a sized source without opening it.
///
/// Whole prefixes are split off and discarded; only the partition holding the
/// boundary is skipped element by element, when it is finally opened. The
/// source must report an exact `estimate_size`.
pub(crate) fn skip_prefix<T: StreamData>(
    mut source: Box<dyn Source<T>>,
    mut n: usize,
) -> Box<dyn Source<T>> {
    loop {
        if n == 0 {
            return source;
        }
        if n >= source.estimate_size().unwrap_or(0) {
            return Box::new(VecSource::empty());
        }
        let Some(left) = source.try_split() else {
            return Box::new(SkipSource { inner: source, n });
        };
        let left_len = left.estimate_size().unwrap_or(0);
        if n < left_len {
            return Box::new(ConcatSource {
                left: Some(skip_prefix(left, n)),
                right: source,
            });
        }
        n -= left_len;
    }
}

/// `left` followed by `right`. Splits at the seam first.
struct ConcatSource<T> {
    left: Option<Box<dyn Source<T>>>,
    right: Box<dyn Source<T>>,
}

impl<T: StreamData> Source<T> for ConcatSource<T> {
    fn characteristics(&self) -> Characteristics {
        self.right.characteristics()
    }

    fn estimate_size(&self) -> Option<usize> {
        let right = self.right.estimate_size()?;
        match &self.left {
            Some(left) => left.estimate_size().map(|l| l.saturating_add(right)),
            None => Some(right),
        }
    }

    fn try_split(&mut self) -> Option<Box<dyn Source<T>>> {
        match self.left.take() {
            Some(left) => Some(left),
            None => self.right.try_split(),
        }
    }

    fn open(self: Box<Self>) -> BoxIter<T> {
        let ConcatSource { left, right } = *self;
        match left {
            Some(left) => Box::new(left.open().chain(right.open())),
            None => right.open(),
        }
    }
}

/// An unsplittable partition whose first `n` elements are dropped on open.
struct SkipSource<T> {
    inner: Box<dyn Source<T>>,
    n: usize,
}

impl<T: StreamData> Source<T> for SkipSource<T> {
    fn characteristics(&self) -> Characteristics {
        Characteristics {
            splittable: false,
            ..self.inner.characteristics()
        }
    }

    fn estimate_size(&self) -> Option<usize> {
        self.inner.estimate_size().map(|len| len.saturating_sub(self.n))
    }

    fn open(self: Box<Self>) -> BoxIter<T> {
        Box::new(self.inner.open().skip(self.n))
    }
}
