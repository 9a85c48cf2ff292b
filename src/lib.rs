//! A bulk-synchronous, vertex-centric graph computation engine.
//!
//! Algorithms implement [`Computation`]; the [`Pregel`] scheduler runs them superstep by
//! superstep over a [`Graph`], delivering messages sent in one superstep at the start of the
//! next and stopping once every node voted to halt and no message is in flight.

mod error;
pub use error::PregelError;

mod aggregate;
pub use aggregate::Aggregator;

mod combine;
pub use combine::*;

mod computation;
pub use computation::*;

mod config;
pub use config::*;

mod context;
pub use context::*;

mod executor;
pub use executor::*;

mod graph;
pub use graph::*;

mod halt;
pub use halt::*;

mod master;
pub use master::*;

mod messenger;
pub use messenger::*;

mod node_value;
pub use node_value::*;

mod partition;
pub use partition::*;

mod schema;
pub use schema::*;

mod state;
pub use state::{SuperstepStats, TerminationFlag, TerminationStatus};

mod worker;
