//! Instruction pointer.

use devs_kernel::{Atomic, Inputs, Outputs, Sigma, Time};

use crate::signal::Signal;

/// Read request: emit the current address.
pub const READ: &str = "read";
/// Increment request.
pub const INC: &str = "inc";
/// Next-fetch address.
pub const ADDR_OUT: &str = "addr_out";

/// Holds the address of the next instruction byte.
///
/// A read and an increment armed together emit the pre-increment address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPointer {
    initial: u8,
    value: u8,
    read_armed: bool,
    inc_armed: bool,
}

impl InstructionPointer {
    /// Instance name in the system topology.
    pub const NAME: &'static str = "IP";

    /// Creates a pointer starting at `initial`.
    #[must_use]
    pub const fn new(initial: u8) -> Self {
        Self {
            initial,
            value: initial,
            read_armed: false,
            inc_armed: false,
        }
    }

    /// Current address.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.value
    }
}

impl Atomic<Signal> for InstructionPointer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &[READ, INC]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &[ADDR_OUT]
    }

    fn initialize(&mut self) {
        *self = Self::new(self.initial);
    }

    fn time_advance(&self) -> Sigma {
        if self.read_armed || self.inc_armed {
            Sigma::NOW
        } else {
            Sigma::Passive
        }
    }

    fn internal(&mut self) {
        if self.inc_armed {
            let old = self.value;
            self.value = self.value.wrapping_add(1);
            log::debug!("IP: {old:02X} -> {:02X}", self.value);
        }
        self.read_armed = false;
        self.inc_armed = false;
    }

    fn external(&mut self, _elapsed: Time, inputs: &Inputs<'_, Signal>) {
        if inputs.get(READ).is_some_and(Signal::is_asserted) {
            self.read_armed = true;
        }
        if inputs.get(INC).is_some_and(Signal::is_asserted) {
            self.inc_armed = true;
        }
    }

    fn output(&self, outputs: &mut Outputs<Signal>) {
        if self.read_armed {
            outputs.emit(ADDR_OUT, Signal::Byte(self.value));
        }
    }
}
