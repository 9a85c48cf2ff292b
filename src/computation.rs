use crate::aggregate::Aggregator;
use crate::context::{ComputeContext, InitContext, MasterContext};
use crate::messenger::Messages;
use crate::schema::NodeSchema;

/// Per-node algorithm logic plugged into the superstep engine.
///
/// `compute` runs once per active node per superstep: every node in superstep 0, afterwards
/// every node that did not vote to halt in its last invocation or received messages.
pub trait Computation<M>: Send + Sync {
    fn schema(&self) -> NodeSchema;

    /// Called for every node in superstep 0, right before its first `compute`.
    fn init(&self, _context: &mut InitContext<'_>) {}

    fn compute(&self, context: &mut ComputeContext<'_, M>, messages: Messages<M>);

    /// Runs on the scheduler thread after each superstep. Returning `true` ends the run as
    /// converged.
    fn master_compute(&self, _context: &MasterContext<'_>) -> bool {
        false
    }

    fn aggregators(&self) -> Vec<Aggregator> {
        Vec::new()
    }

    /// Called once when the run terminates, whatever the reason, including a panic in `compute`.
    /// Not called when the engine is released without running.
    fn close(&self) {}
}
