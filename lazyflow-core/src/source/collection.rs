use super::Source;
use crate::types::{BoxIter, Characteristics, StreamData};

/// Source over an owned, in-memory sequence.
///
/// Backs collections, arrays, builders and the buffers materialized at stateful
/// barriers during parallel evaluation.
#[derive(Debug, Clone)]
pub struct VecSource<T> {
    items: Vec<T>,
}

impl<T> VecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Copy `items[start..end]`, clamping both bounds to the slice.
    pub fn from_slice_range(items: &[T], start: usize, end: usize) -> Self
    where
        T: Clone,
    {
        let end = end.min(items.len());
        let start = start.min(end);
        Self::new(items[start..end].to_vec())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: StreamData> Source<T> for VecSource<T> {
    fn characteristics(&self) -> Characteristics {
        Characteristics::sized()
    }

    fn estimate_size(&self) -> Option<usize> {
        Some(self.items.len())
    }

    fn try_split(&mut self) -> Option<Box<dyn Source<T>>> {
        if self.items.len() < 2 {
            return None;
        }
        let mid = self.items.len() / 2;
        let right = self.items.split_off(mid);
        let left = std::mem::replace(&mut self.items, right);
        Some(Box::new(VecSource::new(left)))
    }

    fn open(self: Box<Self>) -> BoxIter<T> {
        Box::new(self.items.into_iter())
    }
}

impl<T> FromIterator<T> for VecSource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
