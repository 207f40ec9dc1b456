//! # LazyFlow API
//!
//! User-facing stream API: build a pipeline from a source, chain lazy
//! intermediate operations, and run it with one terminal operation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lazyflow_api::collectors;
//! use lazyflow_api::environment::StreamEnvironment;
//!
//! let env = StreamEnvironment::new();
//! let names = env
//!     .of(vec!["potatoes", "orange", "lemon", "bread", "sugar"])
//!     .filter(|name| name.len() > 5)?
//!     .map(|name| name.to_uppercase())?
//!     .collect(collectors::joining(", ", "[", "]"))?;
//! assert_eq!(names, "[POTATOES, ORANGE]");
//! # Ok::<(), lazyflow_api::StreamError>(())
//! ```
//!
//! - [`environment`]: [`StreamEnvironment`](environment::StreamEnvironment), the entry
//!   point for creating sources, and [`StreamBuilder`](environment::StreamBuilder).
//! - [`stream`]: the single-use [`Stream`](stream::Stream) handle with every intermediate
//!   and terminal operation, plus free constructors on a default environment.
//! - [`collectors`]: the standard [`Collector`](collectors::Collector)s.

pub mod environment;
pub mod stream;

pub use lazyflow_core;
pub use lazyflow_core::collector as collectors;
pub use lazyflow_core::{ExecutionConfig, OpKind, Result, StreamError, SummaryStatistics};

pub use environment::{StreamBuilder, StreamEnvironment};
pub use stream::Stream;
