use super::Terminal;
use crate::error::Result;
use crate::pipeline::Plan;
use crate::types::StreamData;

/// Single-threaded, demand-driven evaluator.
///
/// The terminal's fold pulls from the composed iterator one element at a time;
/// each pull travels up through the nodes to the source. A fold that stops early
/// (`find_first`, `any_match`, ...) leaves the rest of the source untouched, and
/// no node function runs for the elements it never asked for.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialEvaluator;

impl SequentialEvaluator {
    pub fn evaluate<T, A>(&self, plan: &dyn Plan<T>, terminal: &Terminal<T, A>) -> Result<A>
    where
        T: StreamData,
    {
        let items = plan.open_sequential()?;
        Ok(terminal.fold(items))
    }
}
