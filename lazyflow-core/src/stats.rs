//! Count/sum/min/max summaries produced by the `summarizing_*` collectors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric types that [`SummaryStatistics`] can track.
pub trait StatNumber: Copy + PartialOrd + Default + Send + 'static {
    /// Sum of two values. Integers wrap on overflow instead of panicking.
    fn accumulate(self, other: Self) -> Self;

    fn to_f64(self) -> f64;
}

impl StatNumber for i64 {
    fn accumulate(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl StatNumber for f64 {
    fn accumulate(self, other: Self) -> Self {
        self + other
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// Running count, sum, min and max of a numeric sequence.
///
/// `min`, `max` and `average` are `None` until the first value is accepted.
/// An `i64` sum wraps on overflow, like a Java `long`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics<N> {
    count: u64,
    sum: N,
    min: Option<N>,
    max: Option<N>,
}

impl<N: StatNumber> Default for SummaryStatistics<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: StatNumber> SummaryStatistics<N> {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: N::default(),
            min: None,
            max: None,
        }
    }

    /// Record one value.
    pub fn accept(&mut self, value: N) {
        self.count += 1;
        self.sum = self.sum.accumulate(value);
        self.min = Some(match self.min {
            Some(m) if m <= value => m,
            _ => value,
        });
        self.max = Some(match self.max {
            Some(m) if m >= value => m,
            _ => value,
        });
    }

    /// Fold another partial summary into this one.
    pub fn combine(&mut self, other: &Self) {
        self.count += other.count;
        self.sum = self.sum.accumulate(other.sum);
        self.min = pick(self.min, other.min, |a, b| a <= b);
        self.max = pick(self.max, other.max, |a, b| a >= b);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> N {
        self.sum
    }

    pub fn min(&self) -> Option<N> {
        self.min
    }

    pub fn max(&self) -> Option<N> {
        self.max
    }

    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum.to_f64() / self.count as f64)
    }
}

fn pick<N: Copy>(a: Option<N>, b: Option<N>, keep_a: impl Fn(N, N) -> bool) -> Option<N> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if keep_a(x, y) { x } else { y }),
        (x, None) => x,
        (None, y) => y,
    }
}

impl<N: StatNumber + fmt::Display> fmt::Display for SummaryStatistics<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SummaryStatistics{{count={}, sum={}", self.count, self.sum)?;
        match (self.min, self.average(), self.max) {
            (Some(min), Some(avg), Some(max)) => {
                write!(f, ", min={min}, average={avg:.6}, max={max}}}")
            }
            _ => write!(f, ", min=none, average=none, max=none}}"),
        }
    }
}
