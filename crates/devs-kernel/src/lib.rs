//! Discrete-event scheduling kernel for timed, port-coupled component models.
//!
//! Components implement [`Atomic`], are registered and wired with a
//! [`TopologyBuilder`], and are driven by a flat [`Simulation`] coordinator.
//! Zero-length delays ([`Sigma::NOW`]) fire on the next step at the same
//! simulated instant, which lets chains of components react within one cycle.

/// Simulated time and per-component time advance.
pub mod time;
pub use time::{Sigma, Time};

/// Ports and per-step input/output views.
pub mod port;
pub use port::{Direction, Inputs, Outputs, PortRef};

/// Atomic model contract.
pub mod model;
pub use model::{AsAny, Atomic};

/// Build and run failures.
pub mod error;
pub use error::{SimulationError, TopologyError};

/// Component registration, couplings, and validation.
pub mod topology;
pub use topology::{ComponentId, Selector, TopologyBuilder};

/// Flat coordinator and run bookkeeping.
pub mod coordinator;
pub use coordinator::{
    RunSummary, Simulation, StepReport, TransitionEvent, TransitionKind, TransitionObserver,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
