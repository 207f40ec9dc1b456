//! # LazyFlow Core
//!
//! Runtime components for the LazyFlow lazy stream engine.
//!
//! - [`types`]: shared element bounds, [`OpKind`](types::OpKind) tags and source
//!   [`Characteristics`](types::Characteristics).
//! - [`source`]: the [`Source`](source::Source) contract and its collection, range,
//!   generator and iterator backings.
//! - [`pipeline`]: operation nodes ([`Operator`](pipeline::Operator)) and the immutable
//!   [`Plan`](pipeline::Plan) that chains them onto a source.
//! - [`collector`]: the supplier/accumulator/combiner/finisher reduction contract and
//!   the standard collectors.
//! - [`runtime`]: the sequential and parallel evaluators and the worker pool.
//! - [`config`], [`error`], [`stats`]: execution settings, error taxonomy and
//!   summary statistics.

pub mod collector;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod runtime;
pub mod source;
pub mod stats;
pub mod types;

pub use config::ExecutionConfig;
pub use error::{Result, StreamError};
pub use stats::SummaryStatistics;
pub use types::{BoxIter, Characteristics, OpKind, StreamData};
