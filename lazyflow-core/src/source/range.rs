use std::marker::PhantomData;

use super::Source;
use crate::types::{BoxIter, Characteristics};

/// Primitive integers usable as range bounds.
///
/// Bounds are widened to `i128` internally so that `range_closed` up to the
/// type's maximum value neither overflows nor wraps.
pub trait RangeElement: Copy + Send + 'static {
    fn to_i128(self) -> i128;

    /// Narrow a value known to lie between two valid bounds.
    fn from_i128(value: i128) -> Self;
}

macro_rules! impl_range_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl RangeElement for $t {
                #[inline]
                fn to_i128(self) -> i128 {
                    self as i128
                }

                #[inline]
                fn from_i128(value: i128) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_range_element!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Half-open integer range `[next, end)` with step 1.
pub struct RangeSource<N> {
    next: i128,
    end: i128,
    _phantom: PhantomData<fn() -> N>,
}

impl<N: RangeElement> RangeSource<N> {
    /// `start..end`. Empty when `start >= end`.
    pub fn exclusive(start: N, end: N) -> Self {
        let start = start.to_i128();
        Self::bounded(start, end.to_i128().max(start))
    }

    /// `start..=end`. Empty when `start > end`.
    pub fn inclusive(start: N, end: N) -> Self {
        let start = start.to_i128();
        Self::bounded(start, (end.to_i128() + 1).max(start))
    }

    fn bounded(next: i128, end: i128) -> Self {
        Self {
            next,
            end,
            _phantom: PhantomData,
        }
    }

    fn remaining(&self) -> i128 {
        self.end - self.next
    }
}

impl<N: RangeElement> Source<N> for RangeSource<N> {
    fn characteristics(&self) -> Characteristics {
        Characteristics::sized()
    }

    fn estimate_size(&self) -> Option<usize> {
        Some(usize::try_from(self.remaining()).unwrap_or(usize::MAX))
    }

    fn try_split(&mut self) -> Option<Box<dyn Source<N>>> {
        let remaining = self.remaining();
        if remaining < 2 {
            return None;
        }
        let mid = self.next + remaining / 2;
        let left = RangeSource::bounded(self.next, mid);
        self.next = mid;
        Some(Box::new(left))
    }

    fn open(self: Box<Self>) -> BoxIter<N> {
        Box::new((self.next..self.end).map(N::from_i128))
    }
}
