//! Element sources.
//!
//! A [`Source`] is consumed exactly once: either opened whole as a pull iterator, or
//! first split into independent partitions that are each opened on a worker.
//!
//! | Backing                | Ordered | Sized | Splittable |
//! |------------------------|---------|-------|------------|
//! | [`VecSource`]          | yes     | yes   | yes        |
//! | [`RangeSource`]        | yes     | yes   | yes        |
//! | [`IterateSource`]      | yes     | no    | no         |
//! | [`GenerateSource`]     | no      | no    | no         |
//! | [`IterSource`]         | yes     | no    | no         |
//!
//! `generate` and `iterate` sources are infinite. A terminal operation that has to see
//! every element never returns on them unless a `limit` sits somewhere upstream.

mod collection;
mod generator;
mod prefix;
mod range;

pub use collection::VecSource;
pub use generator::{GenerateSource, IterSource, IterateSource};
pub use range::{RangeElement, RangeSource};

pub(crate) use prefix::skip_prefix;

use crate::types::{BoxIter, Characteristics};

/// Produces the elements of a stream, on demand.
pub trait Source<T>: Send {
    fn characteristics(&self) -> Characteristics;

    /// Remaining element count: exact for sized sources, an upper bound once a
    /// size-changing node is fused on top, `None` when unbounded or unknown.
    fn estimate_size(&self) -> Option<usize>;

    /// Split off the leading half of the remaining elements.
    ///
    /// The returned source covers a prefix of `self`, so that concatenating
    /// `left` then `self` reproduces the original encounter order. Returns `None`
    /// when the source is not splittable or too small to split.
    fn try_split(&mut self) -> Option<Box<dyn Source<T>>> {
        None
    }

    /// Consume the source into a lazy pull iterator.
    fn open(self: Box<Self>) -> BoxIter<T>;
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
