//! Mutable reductions.
//!
//! A [`Collector`] is four shared functions:
//!
//! ```text
//! supplier()            → A          fresh container, once per partition
//! accumulator(&mut A, T)             fold one element in
//! combiner(A, A)        → A          merge two partials, left before right
//! finisher(A)           → R          final conversion, once per evaluation
//! ```
//!
//! Sequential evaluation never calls the combiner. Parallel evaluation calls it
//! once per merge in the split tree, so a combiner that is not associative, or
//! that disagrees with the accumulator, makes parallel results differ from
//! sequential ones. That is a caller obligation; nothing detects it.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use crate::runtime::Terminal;
use crate::stats::SummaryStatistics;
use crate::types::{BoxIter, StreamData};

type SupplierFn<A> = dyn Fn() -> A + Send + Sync;
type AccumulatorFn<A, T> = dyn Fn(&mut A, T) + Send + Sync;
type CombinerFn<A> = dyn Fn(A, A) -> A + Send + Sync;
type FinisherFn<A, R> = dyn Fn(A) -> R + Send + Sync;

/// Supplier / accumulator / combiner / finisher.
pub struct Collector<T, A, R> {
    supplier: Arc<SupplierFn<A>>,
    accumulator: Arc<AccumulatorFn<A, T>>,
    combiner: Arc<CombinerFn<A>>,
    finisher: Arc<FinisherFn<A, R>>,
}

impl<T, A, R> Clone for Collector<T, A, R> {
    fn clone(&self) -> Self {
        Self {
            supplier: Arc::clone(&self.supplier),
            accumulator: Arc::clone(&self.accumulator),
            combiner: Arc::clone(&self.combiner),
            finisher: Arc::clone(&self.finisher),
        }
    }
}

impl<T, A> Collector<T, A, A> {
    /// A collector whose container is its result.
    pub fn of<S, Acc, C>(supplier: S, accumulator: Acc, combiner: C) -> Self
    where
        S: Fn() -> A + Send + Sync + 'static,
        Acc: Fn(&mut A, T) + Send + Sync + 'static,
        C: Fn(A, A) -> A + Send + Sync + 'static,
    {
        Self::new(supplier, accumulator, combiner, |acc| acc)
    }
}

impl<T, A, R> Collector<T, A, R> {
    pub fn new<S, Acc, C, F>(supplier: S, accumulator: Acc, combiner: C, finisher: F) -> Self
    where
        S: Fn() -> A + Send + Sync + 'static,
        Acc: Fn(&mut A, T) + Send + Sync + 'static,
        C: Fn(A, A) -> A + Send + Sync + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            supplier: Arc::new(supplier),
            accumulator: Arc::new(accumulator),
            combiner: Arc::new(combiner),
            finisher: Arc::new(finisher),
        }
    }

    pub fn supply(&self) -> A {
        (self.supplier)()
    }

    pub fn accumulate(&self, acc: &mut A, item: T) {
        (self.accumulator)(acc, item)
    }

    pub fn combine(&self, left: A, right: A) -> A {
        (self.combiner)(left, right)
    }

    pub fn finish(&self, acc: A) -> R {
        (self.finisher)(acc)
    }

    /// Fold a whole partition into a fresh container.
    pub fn fold(&self, items: impl Iterator<Item = T>) -> A {
        let mut acc = self.supply();
        for item in items {
            self.accumulate(&mut acc, item);
        }
        acc
    }
}

impl<T, A, R> Collector<T, A, R>
where
    T: StreamData,
    A: 'static,
    R: 'static,
{
    /// The evaluator-facing form of this collector. The finisher is not part of
    /// it; apply [`finish`](Self::finish) to the returned partial.
    pub fn into_terminal(&self) -> Terminal<T, A> {
        let folder = self.clone();
        let combiner = Arc::clone(&self.combiner);
        Terminal::new(
            move |items: BoxIter<T>| folder.fold(items),
            move |left: A, right: A| combiner(left, right),
        )
    }
}

/// Every element, in encounter order.
pub fn to_list<T: StreamData>() -> Collector<T, Vec<T>, Vec<T>> {
    Collector::of(
        Vec::new,
        |acc: &mut Vec<T>, item| acc.push(item),
        |mut left: Vec<T>, right: Vec<T>| {
            left.extend(right);
            left
        },
    )
}

pub fn to_set<T>() -> Collector<T, HashSet<T>, HashSet<T>>
where
    T: StreamData + Eq + Hash,
{
    Collector::of(
        HashSet::new,
        |acc: &mut HashSet<T>, item| {
            acc.insert(item);
        },
        |mut left: HashSet<T>, right: HashSet<T>| {
            left.extend(right);
            left
        },
    )
}

/// Concatenate string elements with `delimiter`, wrapped in `prefix` and `suffix`.
///
/// The partial is `None` until the first element arrives, so empty-string
/// elements still receive their delimiters and an empty input yields exactly
/// `prefix + suffix`.
pub fn joining<T>(
    delimiter: &str,
    prefix: &str,
    suffix: &str,
) -> Collector<T, Option<String>, String>
where
    T: StreamData + AsRef<str>,
{
    let accumulate_delim = delimiter.to_owned();
    let combine_delim = delimiter.to_owned();
    let prefix = prefix.to_owned();
    let suffix = suffix.to_owned();

    Collector::new(
        || None,
        move |acc: &mut Option<String>, item: T| match acc {
            Some(joined) => {
                joined.push_str(&accumulate_delim);
                joined.push_str(item.as_ref());
            }
            None => *acc = Some(item.as_ref().to_owned()),
        },
        move |left: Option<String>, right: Option<String>| match (left, right) {
            (Some(mut left), Some(right)) => {
                left.push_str(&combine_delim);
                left.push_str(&right);
                Some(left)
            }
            (left, None) => left,
            (None, right) => right,
        },
        move |acc: Option<String>| {
            let body = acc.unwrap_or_default();
            let mut out = String::with_capacity(prefix.len() + body.len() + suffix.len());
            out.push_str(&prefix);
            out.push_str(&body);
            out.push_str(&suffix);
            out
        },
    )
}

pub fn joining_with<T>(delimiter: &str) -> Collector<T, Option<String>, String>
where
    T: StreamData + AsRef<str>,
{
    joining(delimiter, "", "")
}

/// Plain concatenation.
pub fn joining_str<T>() -> Collector<T, Option<String>, String>
where
    T: StreamData + AsRef<str>,
{
    joining("", "", "")
}

/// Sum of `f` over the elements. Wraps on overflow, like a Java `long`.
pub fn summing_i64<T, F>(f: F) -> Collector<T, i64, i64>
where
    T: StreamData,
    F: Fn(&T) -> i64 + Send + Sync + 'static,
{
    Collector::of(
        || 0,
        move |acc: &mut i64, item: T| *acc = acc.wrapping_add(f(&item)),
        |a: i64, b: i64| a.wrapping_add(b),
    )
}

pub fn summing_f64<T, F>(f: F) -> Collector<T, f64, f64>
where
    T: StreamData,
    F: Fn(&T) -> f64 + Send + Sync + 'static,
{
    Collector::of(|| 0.0, move |acc: &mut f64, item: T| *acc += f(&item), |a: f64, b: f64| a + b)
}

/// Arithmetic mean; `0.0` for an empty input.
///
/// The running sum is kept as `i128`, so the mean of values near `i64::MAX`
/// is exact up to the final division.
pub fn averaging_i64<T, F>(f: F) -> Collector<T, (i128, u64), f64>
where
    T: StreamData,
    F: Fn(&T) -> i64 + Send + Sync + 'static,
{
    Collector::new(
        || (0, 0),
        move |acc: &mut (i128, u64), item: T| {
            acc.0 += i128::from(f(&item));
            acc.1 += 1;
        },
        |a: (i128, u64), b: (i128, u64)| (a.0 + b.0, a.1 + b.1),
        |(sum, count): (i128, u64)| mean(sum as f64, count),
    )
}

/// Arithmetic mean; `0.0` for an empty input.
pub fn averaging_f64<T, F>(f: F) -> Collector<T, (f64, u64), f64>
where
    T: StreamData,
    F: Fn(&T) -> f64 + Send + Sync + 'static,
{
    Collector::new(
        || (0.0, 0),
        move |acc: &mut (f64, u64), item: T| {
            acc.0 += f(&item);
            acc.1 += 1;
        },
        |a: (f64, u64), b: (f64, u64)| (a.0 + b.0, a.1 + b.1),
        |(sum, count): (f64, u64)| mean(sum, count),
    )
}

fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

pub fn summarizing_i64<T, F>(
    f: F,
) -> Collector<T, SummaryStatistics<i64>, SummaryStatistics<i64>>
where
    T: StreamData,
    F: Fn(&T) -> i64 + Send + Sync + 'static,
{
    Collector::of(
        SummaryStatistics::new,
        move |acc: &mut SummaryStatistics<i64>, item: T| acc.accept(f(&item)),
        |mut left: SummaryStatistics<i64>, right: SummaryStatistics<i64>| {
            left.combine(&right);
            left
        },
    )
}

pub fn summarizing_f64<T, F>(
    f: F,
) -> Collector<T, SummaryStatistics<f64>, SummaryStatistics<f64>>
where
    T: StreamData,
    F: Fn(&T) -> f64 + Send + Sync + 'static,
{
    Collector::of(
        SummaryStatistics::new,
        move |acc: &mut SummaryStatistics<f64>, item: T| acc.accept(f(&item)),
        |mut left: SummaryStatistics<f64>, right: SummaryStatistics<f64>| {
            left.combine(&right);
            left
        },
    )
}

pub fn counting<T: StreamData>() -> Collector<T, usize, usize> {
    Collector::of(|| 0, |acc: &mut usize, _item: T| *acc += 1, |a: usize, b: usize| a + b)
}

/// Group elements into lists by `classifier`, keeping encounter order per key.
pub fn grouping_by<T, K, F>(classifier: F) -> Collector<T, HashMap<K, Vec<T>>, HashMap<K, Vec<T>>>
where
    T: StreamData,
    K: StreamData + Eq + Hash,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    grouping_by_with(classifier, to_list())
}

/// Group elements by `classifier` and reduce each group with `downstream`.
pub fn grouping_by_with<T, K, A, R, F>(
    classifier: F,
    downstream: Collector<T, A, R>,
) -> Collector<T, HashMap<K, A>, HashMap<K, R>>
where
    T: StreamData,
    K: StreamData + Eq + Hash,
    A: 'static,
    R: 'static,
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    let accumulate = downstream.clone();
    let merge = downstream.clone();
    let finish = downstream;

    Collector::new(
        HashMap::new,
        move |groups: &mut HashMap<K, A>, item: T| {
            let group = groups
                .entry(classifier(&item))
                .or_insert_with(|| accumulate.supply());
            accumulate.accumulate(group, item);
        },
        move |mut left: HashMap<K, A>, right: HashMap<K, A>| {
            for (key, partial) in right {
                let merged = match left.remove(&key) {
                    Some(existing) => merge.combine(existing, partial),
                    None => partial,
                };
                left.insert(key, merged);
            }
            left
        },
        move |groups: HashMap<K, A>| {
            groups
                .into_iter()
                .map(|(key, acc)| (key, finish.finish(acc)))
                .collect()
        },
    )
}

/// Split elements by `predicate`. Both `false` and `true` are always present.
pub fn partitioning_by<T, P>(
    predicate: P,
) -> Collector<T, (Vec<T>, Vec<T>), HashMap<bool, Vec<T>>>
where
    T: StreamData,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    Collector::new(
        || (Vec::new(), Vec::new()),
        move |acc: &mut (Vec<T>, Vec<T>), item: T| {
            if predicate(&item) {
                acc.1.push(item);
            } else {
                acc.0.push(item);
            }
        },
        |mut left: (Vec<T>, Vec<T>), right: (Vec<T>, Vec<T>)| {
            left.0.extend(right.0);
            left.1.extend(right.1);
            left
        },
        |(rejected, accepted): (Vec<T>, Vec<T>)| HashMap::from([(false, rejected), (true, accepted)]),
    )
}

/// Apply `wrapper` to the result of `collector`.
pub fn collecting_and_then<T, A, R, RR, W>(
    collector: Collector<T, A, R>,
    wrapper: W,
) -> Collector<T, A, RR>
where
    A: 'static,
    R: 'static,
    W: Fn(R) -> RR + Send + Sync + 'static,
{
    let finisher = Arc::clone(&collector.finisher);
    Collector {
        supplier: collector.supplier,
        accumulator: collector.accumulator,
        combiner: collector.combiner,
        finisher: Arc::new(move |acc: A| wrapper(finisher(acc))),
    }
}
