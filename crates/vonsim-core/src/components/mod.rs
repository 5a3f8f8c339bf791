//! Leaf state machines wired together by [`crate::system::VonSim8`].

/// Shared-bus arbiter (catalog only).
pub mod arbiter;
pub use arbiter::BusArbiter;

/// Memory address register.
pub mod mar;
pub use mar::MemoryAddressRegister;

/// Main memory.
pub mod memory;
pub use memory::{new_address_space, Memory, ADDRESS_SPACE_BYTES};

/// Instruction pointer.
pub mod pointer;
pub use pointer::InstructionPointer;

/// Named and simple byte registers.
pub mod register;
pub use register::{NamedRegister, SimpleRegister, WriteGate};

#[cfg(test)]
pub(crate) mod testing {
    use devs_kernel::{Atomic, Inputs, Time};

    use crate::signal::Signal;

    fn slots_for(names: &[&str], values: &[(&str, Signal)]) -> Vec<Option<Signal>> {
        for (port, _) in values {
            assert!(
                names.iter().any(|name| name == port),
                "undeclared input port `{port}`"
            );
        }
        names
            .iter()
            .map(|name| {
                values
                    .iter()
                    .find(|(port, _)| port == name)
                    .map(|(_, value)| *value)
            })
            .collect()
    }

    /// Runs an external transition with `values` placed on the named input ports.
    pub(crate) fn deliver_after(
        model: &mut impl Atomic<Signal>,
        elapsed: Time,
        values: &[(&str, Signal)],
    ) {
        let names = model.input_ports();
        let slots = slots_for(names, values);
        model.external(elapsed, &Inputs::new(names, &slots));
    }

    /// [`deliver_after`] with no elapsed time.
    pub(crate) fn deliver(model: &mut impl Atomic<Signal>, values: &[(&str, Signal)]) {
        deliver_after(model, 0, values);
    }

    /// Runs a confluent transition, as when `values` land on a model whose
    /// delay expires in the same step.
    pub(crate) fn deliver_confluent(model: &mut impl Atomic<Signal>, values: &[(&str, Signal)]) {
        let names = model.input_ports();
        let slots = slots_for(names, values);
        model.confluent(&Inputs::new(names, &slots));
    }
}
