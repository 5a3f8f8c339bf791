//! Flat coordinator: advances simulated time and drives every registered model.

use std::fmt::Debug;

use crate::error::SimulationError;
use crate::model::{AsAny, Atomic};
use crate::port::{Inputs, Outputs};
use crate::time::Time;
use crate::topology::{Route, Target};

/// Which transition function a component ran in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TransitionKind {
    /// Delay expired with no input.
    Internal,
    /// Input arrived before the delay expired.
    External,
    /// Delay expired and input arrived at the same instant.
    Confluent,
}

/// One component transition, reported to an installed observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent<'a> {
    /// Simulated time of the transition.
    pub time: Time,
    /// Instance name of the component.
    pub component: &'a str,
    /// Transition that ran.
    pub kind: TransitionKind,
}

/// Receives every transition the coordinator performs.
pub trait TransitionObserver {
    /// Called once per transitioning component, in registration order.
    fn on_transition(&mut self, event: &TransitionEvent<'_>);
}

impl<F: FnMut(&TransitionEvent<'_>)> TransitionObserver for F {
    fn on_transition(&mut self, event: &TransitionEvent<'_>) {
        self(event);
    }
}

/// Transition counts for a single coordinator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    /// Simulated time the step ran at.
    pub time: Time,
    /// Internal transitions.
    pub internal: u64,
    /// External transitions.
    pub external: u64,
    /// Confluent transitions.
    pub confluent: u64,
}

/// Totals accumulated over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunSummary {
    /// Coordinator steps taken.
    pub steps: u64,
    /// Internal transitions.
    pub internal: u64,
    /// External transitions.
    pub external: u64,
    /// Confluent transitions.
    pub confluent: u64,
    /// Simulated time at the end of the run.
    pub clock: Time,
}

impl RunSummary {
    const fn absorb(&mut self, report: StepReport) {
        self.steps += 1;
        self.internal += report.internal;
        self.external += report.external;
        self.confluent += report.confluent;
        self.clock = report.time;
    }
}

struct Slot<M> {
    model: Box<dyn Atomic<M>>,
    inputs: Vec<Option<M>>,
    routes: Vec<Vec<Route<M>>>,
    time_last: Time,
    time_next: Option<Time>,
}

/// A built, initialized topology ready to be stepped.
pub struct Simulation<M> {
    slots: Vec<Slot<M>>,
    clock: Time,
    observer: Option<Box<dyn TransitionObserver>>,
}

impl<M: 'static> Debug for Simulation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("clock", &self.clock)
            .field(
                "components",
                &self.slots.iter().map(|s| s.model.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<M: Clone + Debug + 'static> Simulation<M> {
    pub(crate) fn new(models: Vec<Box<dyn Atomic<M>>>, routes: Vec<Vec<Vec<Route<M>>>>) -> Self {
        let slots = models
            .into_iter()
            .zip(routes)
            .map(|(model, routes)| Slot {
                inputs: model.input_ports().iter().map(|_| None).collect(),
                model,
                routes,
                time_last: 0,
                time_next: None,
            })
            .collect();

        let mut simulation = Self {
            slots,
            clock: 0,
            observer: None,
        };
        simulation.initialize();
        simulation
    }

    /// Rewinds the clock to zero and re-runs every model's initialization.
    ///
    /// Pending inputs are discarded. The observer stays installed.
    pub fn initialize(&mut self) {
        self.clock = 0;
        for slot in &mut self.slots {
            slot.inputs.iter_mut().for_each(|cell| *cell = None);
            slot.model.initialize();
            slot.time_last = 0;
            slot.time_next = slot.model.time_advance().deadline(0);
            log::trace!(
                "{}: initialized, next at {:?}",
                slot.model.name(),
                slot.time_next
            );
        }
    }

    /// Current simulated time.
    #[must_use]
    pub const fn clock(&self) -> Time {
        self.clock
    }

    /// Earliest scheduled internal transition, or `None` when every model is passive.
    #[must_use]
    pub fn time_next(&self) -> Option<Time> {
        self.slots.iter().filter_map(|slot| slot.time_next).min()
    }

    /// Returns `true` when no further event is scheduled.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.time_next().is_none()
    }

    /// Instance names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.model.name())
    }

    /// Installs an observer that sees every transition from now on.
    pub fn set_observer(&mut self, observer: impl TransitionObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Removes the installed observer, if any.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Borrows a registered component by name and concrete type.
    #[must_use]
    pub fn component<T: Atomic<M>>(&self, name: &str) -> Option<&T> {
        self.slots
            .iter()
            .find(|slot| slot.model.name() == name)
            .and_then(|slot| AsAny::as_any(&*slot.model).downcast_ref())
    }

    /// Mutably borrows a registered component by name and concrete type.
    ///
    /// Mutating a model does not reschedule it.
    #[must_use]
    pub fn component_mut<T: Atomic<M>>(&mut self, name: &str) -> Option<&mut T> {
        self.slots
            .iter_mut()
            .find(|slot| slot.model.name() == name)
            .and_then(|slot| AsAny::as_any_mut(&mut *slot.model).downcast_mut())
    }

    /// Runs one coordinator step at the earliest scheduled time.
    ///
    /// Returns `Ok(None)` when nothing is scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::PortCollision`] when two values land on the
    /// same input port in one step. The simulation should not be stepped again.
    pub fn step(&mut self) -> Result<Option<StepReport>, SimulationError> {
        let Some(now) = self.time_next() else {
            return Ok(None);
        };
        self.clock = now;

        let imminent: Vec<bool> = self
            .slots
            .iter()
            .map(|slot| slot.time_next == Some(now))
            .collect();

        let mut deliveries: Vec<(Target, M)> = Vec::new();
        for (slot, _) in self.slots.iter().zip(&imminent).filter(|(_, hot)| **hot) {
            let mut outputs = Outputs::new(slot.model.output_ports());
            slot.model.output(&mut outputs);
            for (port, value) in outputs.into_emitted() {
                for route in &slot.routes[port] {
                    match route {
                        Route::Direct(target) => deliveries.push((*target, value.clone())),
                        Route::Routed { selector, targets } => {
                            match selector(&value).and_then(|index| targets.get(index)) {
                                Some(target) => deliveries.push((*target, value.clone())),
                                None => log::warn!(
                                    "{}.{}: no route for {value:?}, dropped",
                                    slot.model.name(),
                                    slot.model.output_ports()[port]
                                ),
                            }
                        }
                    }
                }
            }
        }

        for (target, value) in deliveries {
            let slot = &mut self.slots[target.component];
            if slot.inputs[target.slot].is_some() {
                let error = SimulationError::PortCollision {
                    component: slot.model.name().to_string(),
                    port: slot.model.input_ports()[target.slot],
                    time: now,
                };
                for slot in &mut self.slots {
                    slot.inputs.iter_mut().for_each(|cell| *cell = None);
                }
                return Err(error);
            }
            slot.inputs[target.slot] = Some(value);
        }

        let mut report = StepReport {
            time: now,
            ..StepReport::default()
        };
        for (slot, hot) in self.slots.iter_mut().zip(imminent) {
            let has_input = slot.inputs.iter().any(Option::is_some);
            let inputs = Inputs::new(slot.model.input_ports(), &slot.inputs);
            let kind = match (hot, has_input) {
                (true, false) => {
                    slot.model.internal();
                    report.internal += 1;
                    TransitionKind::Internal
                }
                (true, true) => {
                    slot.model.confluent(&inputs);
                    report.confluent += 1;
                    TransitionKind::Confluent
                }
                (false, true) => {
                    slot.model.external(now - slot.time_last, &inputs);
                    report.external += 1;
                    TransitionKind::External
                }
                (false, false) => continue,
            };

            slot.inputs.iter_mut().for_each(|cell| *cell = None);
            slot.time_last = now;
            slot.time_next = slot.model.time_advance().deadline(now);
            log::trace!(
                "t={now} {}: {kind:?}, next at {:?}",
                slot.model.name(),
                slot.time_next
            );

            if let Some(observer) = self.observer.as_mut() {
                observer.on_transition(&TransitionEvent {
                    time: now,
                    component: slot.model.name(),
                    kind,
                });
            }
        }

        Ok(Some(report))
    }

    /// Steps until no event is scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::StepBudgetExhausted`] when `max_steps` steps
    /// run without reaching quiescence, or any error raised by [`Self::step`].
    pub fn run(&mut self, max_steps: u64) -> Result<RunSummary, SimulationError> {
        let mut summary = RunSummary {
            clock: self.clock,
            ..RunSummary::default()
        };
        while !self.is_quiescent() {
            if summary.steps == max_steps {
                return Err(SimulationError::StepBudgetExhausted(max_steps));
            }
            if let Some(report) = self.step()? {
                summary.absorb(report);
            }
        }
        log::debug!(
            "quiescent at t={} after {} steps",
            summary.clock,
            summary.steps
        );
        Ok(summary)
    }

    /// Steps every event scheduled at or before `limit`.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by [`Self::step`].
    pub fn run_until(&mut self, limit: Time) -> Result<RunSummary, SimulationError> {
        let mut summary = RunSummary {
            clock: self.clock,
            ..RunSummary::default()
        };
        while self.time_next().is_some_and(|next| next <= limit) {
            if let Some(report) = self.step()? {
                summary.absorb(report);
            }
        }
        Ok(summary)
    }
}
