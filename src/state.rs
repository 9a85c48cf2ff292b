use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    /// No messages in flight and every node halted, or the master computation stopped the run.
    Converged,
    /// The superstep cap was hit first.
    MaxSuperstepsReached,
    /// Stopped through a [`TerminationFlag`] between supersteps.
    Cancelled,
}

/// The counters the scheduler keeps for the superstep in progress.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunState {
    pub(crate) superstep: usize,
    pub(crate) has_sent_message: bool,
    pub(crate) has_active_node: bool,
}

impl RunState {
    pub(crate) fn start(superstep: usize) -> Self {
        RunState {
            superstep,
            has_sent_message: false,
            has_active_node: true,
        }
    }

    /// A vertex may halt while its messages wake others, so both silence and a fully halted
    /// graph are needed.
    pub(crate) fn converged(&self) -> bool {
        !self.has_sent_message && !self.has_active_node
    }
}

/// Shared handle to request cancellation of a running computation.
///
/// The request is honoured at the next superstep boundary; the superstep in flight completes.
#[derive(Debug, Clone, Default)]
pub struct TerminationFlag {
    terminated: Arc<AtomicBool>,
}

impl TerminationFlag {
    pub fn new() -> Self {
        TerminationFlag::default()
    }

    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperstepStats {
    pub superstep: usize,
    pub computed_nodes: usize,
    pub messages_sent: usize,
    pub elapsed: Duration,
}
