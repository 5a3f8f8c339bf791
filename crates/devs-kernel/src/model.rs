//! Atomic model contract consumed by the coordinator.

use std::any::Any;

use crate::port::{Inputs, Outputs};
use crate::time::{Sigma, Time};

/// Upcast helper so registered models can be recovered by concrete type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A timed finite-state component driven by the coordinator.
///
/// The coordinator calls [`Atomic::output`] immediately before
/// [`Atomic::internal`] whenever the scheduled delay expires, and
/// [`Atomic::external`] whenever values arrive on input ports. After every
/// transition it reads [`Atomic::time_advance`] to reschedule the component.
pub trait Atomic<M>: AsAny {
    /// Unique instance name within a topology.
    fn name(&self) -> &str;

    /// Declared input port names.
    fn input_ports(&self) -> &'static [&'static str];

    /// Declared output port names.
    fn output_ports(&self) -> &'static [&'static str];

    /// Sets the initial state and initial delay.
    fn initialize(&mut self);

    /// Current delay until the next internal transition.
    fn time_advance(&self) -> Sigma;

    /// Autonomous transition fired when the delay reaches zero.
    fn internal(&mut self);

    /// Reaction to inputs arriving `elapsed` cycles after the last transition.
    fn external(&mut self, elapsed: Time, inputs: &Inputs<'_, M>);

    /// Inputs arriving at the same instant the delay expires.
    ///
    /// Defaults to the internal transition followed by a zero-elapsed external one.
    fn confluent(&mut self, inputs: &Inputs<'_, M>) {
        self.internal();
        self.external(0, inputs);
    }

    /// Values to emit at this instant, computed just before [`Atomic::internal`].
    fn output(&self, outputs: &mut Outputs<M>);
}
