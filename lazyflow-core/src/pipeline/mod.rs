//! Pipeline-domain modules: operation nodes and the plans that chain them.

pub mod operator;
pub mod plan;

pub use operator::*;
pub use plan::*;
