//! Static coupling registration and build-time validation.

use std::collections::{HashMap, HashSet};

use crate::coordinator::Simulation;
use crate::error::TopologyError;
use crate::model::Atomic;
use crate::port::{Direction, PortRef};

/// Handle to a component registered with a [`TopologyBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

impl ComponentId {
    /// Registration index of the component.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Reference to one of this component's ports.
    #[must_use]
    pub const fn port(self, name: &'static str) -> PortRef {
        PortRef::new(self, name)
    }
}

/// Picks the target index for an addressed message, or `None` to drop it.
pub type Selector<M> = fn(&M) -> Option<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Target {
    pub(crate) component: usize,
    pub(crate) slot: usize,
}

pub(crate) enum Route<M> {
    Direct(Target),
    Routed {
        selector: Selector<M>,
        targets: Vec<Target>,
    },
}

enum Wire<M> {
    Direct {
        from: PortRef,
        to: PortRef,
    },
    Routed {
        from: PortRef,
        selector: Selector<M>,
        targets: Vec<PortRef>,
    },
}

/// Collects components and couplings, then validates them into a [`Simulation`].
///
/// Couplings are only checked in [`TopologyBuilder::build`]; the resulting
/// wiring is immutable for the lifetime of the simulation.
pub struct TopologyBuilder<M> {
    models: Vec<Box<dyn Atomic<M>>>,
    wires: Vec<Wire<M>>,
    meshes: Vec<Vec<(PortRef, PortRef)>>,
}

impl<M> Default for TopologyBuilder<M> {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            wires: Vec::new(),
            meshes: Vec::new(),
        }
    }
}

impl<M: 'static> std::fmt::Debug for TopologyBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyBuilder")
            .field(
                "models",
                &self.models.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("wires", &self.wires.len())
            .field("meshes", &self.meshes.len())
            .finish()
    }
}

impl<M: Clone + std::fmt::Debug + 'static> TopologyBuilder<M> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DuplicateComponent`] when the name is taken and
    /// [`TopologyError::DuplicatePort`] when the component repeats a port name.
    pub fn add<A: Atomic<M>>(&mut self, model: A) -> Result<ComponentId, TopologyError> {
        if self.models.iter().any(|m| m.name() == model.name()) {
            return Err(TopologyError::DuplicateComponent(model.name().to_string()));
        }

        let mut seen = HashSet::new();
        for &port in model.input_ports().iter().chain(model.output_ports()) {
            if !seen.insert(port) {
                return Err(TopologyError::DuplicatePort {
                    component: model.name().to_string(),
                    port,
                });
            }
        }

        let id = ComponentId(self.models.len());
        self.models.push(Box::new(model));
        Ok(id)
    }

    /// Looks up a registered component by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<ComponentId> {
        self.models
            .iter()
            .position(|m| m.name() == name)
            .map(ComponentId)
    }

    /// Couples an output port to an input port.
    pub fn connect(&mut self, from: PortRef, to: PortRef) -> &mut Self {
        self.wires.push(Wire::Direct { from, to });
        self
    }

    /// Couples an output port to one of several inputs chosen per message.
    ///
    /// `selector` maps each emitted value to an index into `targets`; values
    /// it maps to `None` (or past the end) are dropped.
    pub fn route(
        &mut self,
        from: PortRef,
        selector: Selector<M>,
        targets: impl IntoIterator<Item = PortRef>,
    ) -> &mut Self {
        self.wires.push(Wire::Routed {
            from,
            selector,
            targets: targets.into_iter().collect(),
        });
        self
    }

    /// Declares an all-to-all mesh between `(output, input)` member pairs.
    ///
    /// Every member's output feeds every other member's input. Mesh inputs
    /// are the only ports allowed more than one feeder.
    pub fn mesh(&mut self, members: &[(PortRef, PortRef)]) -> &mut Self {
        self.meshes.push(members.to_vec());
        self
    }

    /// Validates all couplings and hands the models to a coordinator.
    ///
    /// The returned simulation is already initialized.
    ///
    /// # Errors
    ///
    /// Returns the first [`TopologyError`] found.
    pub fn build(mut self) -> Result<Simulation<M>, TopologyError> {
        if self.models.is_empty() {
            return Err(TopologyError::Empty);
        }

        let mut mesh_inputs = HashSet::new();
        for members in std::mem::take(&mut self.meshes) {
            if members.len() < 2 {
                return Err(TopologyError::DegenerateMesh(members.len()));
            }
            for (i, (from, _)) in members.iter().enumerate() {
                for (j, (_, to)) in members.iter().enumerate() {
                    if i != j {
                        self.wires.push(Wire::Direct {
                            from: *from,
                            to: *to,
                        });
                        let _ = mesh_inputs.insert(*to);
                    }
                }
            }
        }

        let mut routes: Vec<Vec<Vec<Route<M>>>> = self
            .models
            .iter()
            .map(|m| m.output_ports().iter().map(|_| Vec::new()).collect())
            .collect();
        let mut couplings = HashSet::new();
        let mut feeders: HashMap<PortRef, HashSet<PortRef>> = HashMap::new();

        for wire in &self.wires {
            let (from, targets) = match wire {
                Wire::Direct { from, to } => (*from, std::slice::from_ref(to)),
                Wire::Routed { from, targets, .. } => (*from, targets.as_slice()),
            };
            let from_slot = self.resolve(from, Direction::Output)?;

            let mut resolved = Vec::with_capacity(targets.len());
            for to in targets {
                let slot = self.resolve(*to, Direction::Input)?;
                if !couplings.insert((from, *to)) {
                    return Err(TopologyError::DuplicateCoupling {
                        from: self.describe(from),
                        to: self.describe(*to),
                    });
                }
                let _ = feeders.entry(*to).or_default().insert(from);
                resolved.push(Target {
                    component: to.component.index(),
                    slot,
                });
            }

            let route = match wire {
                Wire::Direct { .. } => Route::Direct(resolved[0]),
                Wire::Routed { selector, .. } => Route::Routed {
                    selector: *selector,
                    targets: resolved,
                },
            };
            routes[from.component.index()][from_slot].push(route);
        }

        let mut fed: Vec<_> = feeders.iter().collect();
        fed.sort_by_key(|(port, _)| (port.component, port.port));
        for (port, sources) in fed {
            if sources.len() > 1 && !mesh_inputs.contains(port) {
                return Err(TopologyError::MultipleFeeders {
                    component: self.models[port.component.index()].name().to_string(),
                    port: port.port,
                    feeders: sources.len(),
                });
            }
        }

        for (index, model) in self.models.iter().enumerate() {
            let has_inputs = !model.input_ports().is_empty();
            let connected = feeders
                .keys()
                .any(|port| port.component.index() == index);
            if has_inputs && !connected {
                return Err(TopologyError::IsolatedComponent(model.name().to_string()));
            }
        }

        log::debug!(
            "built topology: {} components, {} couplings",
            self.models.len(),
            couplings.len()
        );
        Ok(Simulation::new(self.models, routes))
    }

    fn resolve(&self, port: PortRef, expected: Direction) -> Result<usize, TopologyError> {
        let model = self
            .models
            .get(port.component.index())
            .ok_or(TopologyError::UnknownComponent(port.component.index()))?;
        let (own, other) = match expected {
            Direction::Input => (model.input_ports(), model.output_ports()),
            Direction::Output => (model.output_ports(), model.input_ports()),
        };

        if let Some(slot) = own.iter().position(|name| *name == port.port) {
            return Ok(slot);
        }
        if other.contains(&port.port) {
            return Err(TopologyError::WrongDirection {
                component: model.name().to_string(),
                port: port.port,
                expected,
            });
        }
        Err(TopologyError::UnknownPort {
            component: model.name().to_string(),
            port: port.port,
        })
    }

    fn describe(&self, port: PortRef) -> String {
        let name = self
            .models
            .get(port.component.index())
            .map_or("?", |m| m.name());
        format!("{name}.{}", port.port)
    }
}
