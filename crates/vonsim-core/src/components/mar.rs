//! Memory address register.

use devs_kernel::{Atomic, Inputs, Outputs, Sigma, Time};

use crate::signal::Signal;

/// Address from the instruction pointer.
pub const ADDR_IN: &str = "addr_in";
/// Address toward memory.
pub const ADDR_OUT: &str = "addr_out";

/// Latches every incoming address and forwards it to memory one step later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAddressRegister {
    address: u8,
    pending: Option<u8>,
}

impl MemoryAddressRegister {
    /// Instance name in the system topology.
    pub const NAME: &'static str = "MAR";

    /// Creates an empty register.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            address: 0,
            pending: None,
        }
    }

    /// Last latched address.
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }
}

impl Atomic<Signal> for MemoryAddressRegister {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &[ADDR_IN]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &[ADDR_OUT]
    }

    fn initialize(&mut self) {
        *self = Self::new();
    }

    fn time_advance(&self) -> Sigma {
        self.pending.map_or(Sigma::Passive, |_| Sigma::NOW)
    }

    fn internal(&mut self) {
        if let Some(address) = self.pending.take() {
            self.address = address;
        }
    }

    fn external(&mut self, _elapsed: Time, inputs: &Inputs<'_, Signal>) {
        if let Some(address) = inputs.get(ADDR_IN).and_then(Signal::byte) {
            self.pending = Some(address);
        }
    }

    fn output(&self, outputs: &mut Outputs<Signal>) {
        if let Some(address) = self.pending {
            outputs.emit(ADDR_OUT, Signal::Byte(address));
        }
    }
}
