//! Single-slot message ports and the per-step input/output views handed to models.

use crate::topology::ComponentId;

/// Reference to a named port on a registered component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    /// Owning component.
    pub component: ComponentId,
    /// Port name as declared by the component.
    pub port: &'static str,
}

impl PortRef {
    /// Creates a port reference.
    #[must_use]
    pub const fn new(component: ComponentId, port: &'static str) -> Self {
        Self { component, port }
    }
}

/// Direction of a declared port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Consumer side of a coupling.
    Input,
    /// Producer side of a coupling.
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Read-only view of the values delivered to a component in one step.
///
/// Each declared input port holds at most one value.
#[derive(Debug)]
pub struct Inputs<'a, M> {
    names: &'static [&'static str],
    slots: &'a [Option<M>],
}

impl<'a, M> Inputs<'a, M> {
    /// Wraps one slot per declared port name, in declaration order.
    ///
    /// The coordinator builds these; it is public so models can be driven
    /// directly in unit tests.
    #[must_use]
    pub const fn new(names: &'static [&'static str], slots: &'a [Option<M>]) -> Self {
        Self { names, slots }
    }

    /// Returns the value delivered on `port`, if any.
    #[must_use]
    pub fn get(&self, port: &str) -> Option<&'a M> {
        let index = self.names.iter().position(|name| *name == port)?;
        let slots: &'a [Option<M>] = self.slots;
        slots.get(index)?.as_ref()
    }

    /// Returns `true` when a value was delivered on `port`.
    #[must_use]
    pub fn contains(&self, port: &str) -> bool {
        self.get(port).is_some()
    }

    /// Returns `true` when no port received a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Iterates over `(port, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'a M)> + 'a {
        let slots: &'a [Option<M>] = self.slots;
        self.names
            .iter()
            .zip(slots.iter())
            .filter_map(|(name, slot)| slot.as_ref().map(|value| (*name, value)))
    }
}

/// Collector for the values a component emits from its output function.
#[derive(Debug)]
pub struct Outputs<M> {
    names: &'static [&'static str],
    slots: Vec<Option<M>>,
}

impl<M> Outputs<M> {
    /// Creates an empty collector for the declared output ports.
    #[must_use]
    pub fn new(names: &'static [&'static str]) -> Self {
        Self {
            names,
            slots: names.iter().map(|_| None).collect(),
        }
    }

    /// Places `value` on `port`. A second emit on the same port replaces the first.
    ///
    /// Emitting on an undeclared port drops the value.
    pub fn emit(&mut self, port: &str, value: M) {
        match self.names.iter().position(|name| *name == port) {
            Some(index) => self.slots[index] = Some(value),
            None => log::warn!("dropping value emitted on undeclared output port `{port}`"),
        }
    }

    /// Returns `true` when nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Returns the value currently placed on `port`.
    #[must_use]
    pub fn get(&self, port: &str) -> Option<&M> {
        let index = self.names.iter().position(|name| *name == port)?;
        self.slots.get(index)?.as_ref()
    }

    pub(crate) fn into_emitted(self) -> impl Iterator<Item = (usize, M)> {
        self.slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|value| (index, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::{Inputs, Outputs};

    const PORTS: &[&str] = &["a", "b", "c"];

    #[test]
    fn inputs_resolve_by_name() {
        let slots = [Some(1_u8), None, Some(3)];
        let inputs = Inputs::new(PORTS, &slots);

        assert_eq!(inputs.get("a"), Some(&1));
        assert_eq!(inputs.get("b"), None);
        assert!(inputs.contains("c"));
        assert!(!inputs.contains("missing"));
        assert!(!inputs.is_empty());
        assert_eq!(inputs.iter().collect::<Vec<_>>(), vec![("a", &1), ("c", &3)]);
    }

    #[test]
    fn empty_inputs_report_empty() {
        let slots: [Option<u8>; 3] = [None, None, None];
        assert!(Inputs::new(PORTS, &slots).is_empty());
    }

    #[test]
    fn outputs_hold_one_value_per_port() {
        let mut outputs = Outputs::new(PORTS);
        assert!(outputs.is_empty());

        outputs.emit("b", 7_u8);
        outputs.emit("b", 9);
        outputs.emit("nope", 1);

        assert_eq!(outputs.get("b"), Some(&9));
        assert_eq!(outputs.into_emitted().collect::<Vec<_>>(), vec![(1, 9)]);
    }
}
