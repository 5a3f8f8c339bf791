use thiserror::Error;

use crate::port::Direction;
use crate::time::Time;

/// Structural defects rejected while building a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// No component was registered.
    #[error("topology has no components")]
    Empty,
    /// Two components share one instance name.
    #[error("duplicate component name `{0}`")]
    DuplicateComponent(String),
    /// A component declares the same port name twice.
    #[error("component `{component}` declares port `{port}` more than once")]
    DuplicatePort {
        /// Offending component.
        component: String,
        /// Repeated port name.
        port: &'static str,
    },
    /// A component id does not belong to this builder.
    #[error("component id {0} is not registered")]
    UnknownComponent(usize),
    /// A coupling names a port the component never declared.
    #[error("component `{component}` has no port named `{port}`")]
    UnknownPort {
        /// Component addressed by the coupling.
        component: String,
        /// Undeclared port name.
        port: &'static str,
    },
    /// A coupling uses a port against its declared direction.
    #[error("port `{component}.{port}` is not an {expected} port")]
    WrongDirection {
        /// Component addressed by the coupling.
        component: String,
        /// Misused port name.
        port: &'static str,
        /// Direction the coupling needed.
        expected: Direction,
    },
    /// The same producer/consumer pair was coupled more than once.
    #[error("coupling `{from}` -> `{to}` is registered twice")]
    DuplicateCoupling {
        /// Producer port, as `component.port`.
        from: String,
        /// Consumer port, as `component.port`.
        to: String,
    },
    /// A non-mesh input port has more than one upstream producer.
    #[error("input `{component}.{port}` has {feeders} feeders but is not a mesh member")]
    MultipleFeeders {
        /// Consumer component.
        component: String,
        /// Consumer port.
        port: &'static str,
        /// Number of distinct producers.
        feeders: usize,
    },
    /// A mesh needs at least two members to carry anything.
    #[error("mesh has {0} member(s), at least two are required")]
    DegenerateMesh(usize),
    /// A component declares inputs but none of them is ever fed.
    #[error("component `{0}` declares inputs but none is connected")]
    IsolatedComponent(String),
}

/// Failures raised while the coordinator advances a built topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// Two producers wrote the same single-slot input in one step.
    #[error("input `{component}.{port}` received more than one value at t={time}")]
    PortCollision {
        /// Consumer component.
        component: String,
        /// Consumer port.
        port: &'static str,
        /// Simulated time of the collision.
        time: Time,
    },
    /// A bounded run did not reach quiescence.
    #[error("step budget of {0} exhausted before the model went quiescent")]
    StepBudgetExhausted(u64),
}
