//! Byte-wide storage cells: the four named bank registers and the MBR/IR latches.

use devs_kernel::{Atomic, Inputs, Outputs, Sigma, Time};

use crate::signal::{RegisterId, Signal};

/// Staged data input.
pub const DATA_IN: &str = "data_in";
/// Write enable.
pub const WRITE: &str = "write";
/// Read enable.
pub const READ: &str = "read";
/// Current value, emitted on a read.
pub const DATA_OUT: &str = "data_out";

const GATED_INPUTS: &[&str] = &[DATA_IN, WRITE, READ];
const TRANSPARENT_INPUTS: &[&str] = &[DATA_IN, READ];
const OUTPUTS: &[&str] = &[DATA_OUT];

/// One delivery decoded into latch terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Delivery {
    data: Option<u8>,
    write: bool,
    read: bool,
}

/// Result of resolving the pending enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Idle,
    Committed { old: u8, new: u8 },
    Dropped,
}

impl Settled {
    fn log(self, name: &str) {
        match self {
            Self::Idle => {}
            Self::Committed { old, new } => log::debug!("{name}: {old:02X} -> {new:02X}"),
            Self::Dropped => log::debug!("{name}: write enable with no data, dropped"),
        }
    }
}

/// Shared write/read arming logic.
///
/// Any armed enable schedules the next transition in the same instant. That
/// transition commits the staged value, including data delivered alongside
/// it, or drops the write if nothing is staged; an enable never outlives its
/// instant. A read emits the value held before the write commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Latch {
    value: u8,
    staged: Option<u8>,
    write_armed: bool,
    read_armed: bool,
}

impl Latch {
    const fn new(value: u8) -> Self {
        Self {
            value,
            staged: None,
            write_armed: false,
            read_armed: false,
        }
    }

    const fn time_advance(&self) -> Sigma {
        if self.read_armed || self.write_armed {
            Sigma::NOW
        } else {
            Sigma::Passive
        }
    }

    fn emit(&self, outputs: &mut Outputs<Signal>) {
        if self.read_armed {
            outputs.emit(DATA_OUT, Signal::Byte(self.value));
        }
    }

    fn accept(&mut self, delivery: Delivery) {
        if let Some(byte) = delivery.data {
            self.staged = Some(byte);
        }
        self.write_armed |= delivery.write;
        self.read_armed |= delivery.read;
    }

    /// Resolves the enables armed before this transition, folding in what
    /// arrived with it. Enables in `delivery` stay armed for the next step.
    fn settle(&mut self, delivery: Delivery) -> Settled {
        if let Some(byte) = delivery.data {
            self.staged = Some(byte);
        }
        let settled = match (self.write_armed, self.staged.take()) {
            (false, staged) => {
                self.staged = staged;
                Settled::Idle
            }
            (true, Some(new)) => {
                let old = self.value;
                self.value = new;
                Settled::Committed { old, new }
            }
            (true, None) => Settled::Dropped,
        };
        self.write_armed = delivery.write;
        self.read_armed = delivery.read;
        settled
    }
}

/// One of the four general-purpose registers, enabled by [`Signal::Select`].
///
/// The bank delivers a select only to the register it names; a select naming
/// another register is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRegister {
    id: RegisterId,
    initial: u8,
    latch: Latch,
}

impl NamedRegister {
    /// Creates a register holding `initial`.
    #[must_use]
    pub const fn new(id: RegisterId, initial: u8) -> Self {
        Self {
            id,
            initial,
            latch: Latch::new(initial),
        }
    }

    /// Which register this is.
    #[must_use]
    pub const fn id(&self) -> RegisterId {
        self.id
    }

    /// Committed value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.latch.value
    }

    /// Data waiting for a write enable.
    #[must_use]
    pub const fn staged(&self) -> Option<u8> {
        self.latch.staged
    }

    /// Whether a write enable is waiting to be resolved.
    #[must_use]
    pub const fn write_pending(&self) -> bool {
        self.latch.write_armed
    }

    fn addressed(&self, signal: Option<&Signal>, port: &str) -> bool {
        match signal.map(Signal::selected) {
            Some(Some(id)) if id == self.id => true,
            Some(other) => {
                log::warn!("{}: ignoring {port} enable {other:?}", self.id);
                false
            }
            None => false,
        }
    }

    fn delivery(&self, inputs: &Inputs<'_, Signal>) -> Delivery {
        Delivery {
            data: inputs.get(DATA_IN).and_then(Signal::byte),
            write: self.addressed(inputs.get(WRITE), WRITE),
            read: self.addressed(inputs.get(READ), READ),
        }
    }
}

impl Atomic<Signal> for NamedRegister {
    fn name(&self) -> &str {
        self.id.name()
    }

    fn input_ports(&self) -> &'static [&'static str] {
        GATED_INPUTS
    }

    fn output_ports(&self) -> &'static [&'static str] {
        OUTPUTS
    }

    fn initialize(&mut self) {
        self.latch = Latch::new(self.initial);
    }

    fn time_advance(&self) -> Sigma {
        self.latch.time_advance()
    }

    fn internal(&mut self) {
        self.latch.settle(Delivery::default()).log(self.id.name());
    }

    fn external(&mut self, _elapsed: Time, inputs: &Inputs<'_, Signal>) {
        let delivery = self.delivery(inputs);
        self.latch.accept(delivery);
    }

    fn confluent(&mut self, inputs: &Inputs<'_, Signal>) {
        let delivery = self.delivery(inputs);
        self.latch.settle(delivery).log(self.id.name());
    }

    fn output(&self, outputs: &mut Outputs<Signal>) {
        self.latch.emit(outputs);
    }
}

/// How a [`SimpleRegister`] decides to commit incoming data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteGate {
    /// Data commits only after an asserted `write` line.
    Enabled,
    /// No `write` port; arriving data arms its own commit.
    Transparent,
}

/// Anonymous byte latch enabled by boolean control lines (MBR, IR).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRegister {
    name: &'static str,
    gate: WriteGate,
    initial: u8,
    latch: Latch,
}

impl SimpleRegister {
    /// Creates a latch that waits for an asserted `write` line.
    #[must_use]
    pub const fn gated(name: &'static str, initial: u8) -> Self {
        Self::new(name, WriteGate::Enabled, initial)
    }

    /// Creates a latch that commits whatever arrives on `data_in`.
    #[must_use]
    pub const fn transparent(name: &'static str, initial: u8) -> Self {
        Self::new(name, WriteGate::Transparent, initial)
    }

    const fn new(name: &'static str, gate: WriteGate, initial: u8) -> Self {
        Self {
            name,
            gate,
            initial,
            latch: Latch::new(initial),
        }
    }

    /// Write gating mode.
    #[must_use]
    pub const fn gate(&self) -> WriteGate {
        self.gate
    }

    /// Committed value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.latch.value
    }

    /// Data waiting for a write enable.
    #[must_use]
    pub const fn staged(&self) -> Option<u8> {
        self.latch.staged
    }

    /// Whether a write enable is waiting to be resolved.
    #[must_use]
    pub const fn write_pending(&self) -> bool {
        self.latch.write_armed
    }

    fn delivery(&self, inputs: &Inputs<'_, Signal>) -> Delivery {
        let data = inputs.get(DATA_IN).and_then(Signal::byte);
        let write = match self.gate {
            WriteGate::Enabled => inputs.get(WRITE).is_some_and(Signal::is_asserted),
            WriteGate::Transparent => data.is_some(),
        };
        Delivery {
            data,
            write,
            read: inputs.get(READ).is_some_and(Signal::is_asserted),
        }
    }
}

impl Atomic<Signal> for SimpleRegister {
    fn name(&self) -> &str {
        self.name
    }

    fn input_ports(&self) -> &'static [&'static str] {
        match self.gate {
            WriteGate::Enabled => GATED_INPUTS,
            WriteGate::Transparent => TRANSPARENT_INPUTS,
        }
    }

    fn output_ports(&self) -> &'static [&'static str] {
        OUTPUTS
    }

    fn initialize(&mut self) {
        self.latch = Latch::new(self.initial);
    }

    fn time_advance(&self) -> Sigma {
        self.latch.time_advance()
    }

    fn internal(&mut self) {
        self.latch.settle(Delivery::default()).log(self.name);
    }

    fn external(&mut self, _elapsed: Time, inputs: &Inputs<'_, Signal>) {
        let delivery = self.delivery(inputs);
        self.latch.accept(delivery);
    }

    fn confluent(&mut self, inputs: &Inputs<'_, Signal>) {
        let delivery = self.delivery(inputs);
        self.latch.settle(delivery).log(self.name);
    }

    fn output(&self, outputs: &mut Outputs<Signal>) {
        self.latch.emit(outputs);
    }
}

#[cfg(test)]
mod tests {
    use devs_kernel::{Atomic, Outputs, Sigma};

    use super::{NamedRegister, SimpleRegister, WriteGate, DATA_OUT};
    use crate::components::testing::{deliver, deliver_after, deliver_confluent};
    use crate::signal::{RegisterId, Signal};

    fn read_out(model: &impl Atomic<Signal>) -> Option<Signal> {
        let mut outputs = Outputs::new(model.output_ports());
        model.output(&mut outputs);
        outputs.get(DATA_OUT).copied()
    }

    #[test]
    fn named_register_commits_when_data_then_enable_arrive() {
        let mut al = NamedRegister::new(RegisterId::AL, 0x01);
        al.initialize();
        assert_eq!(al.time_advance(), Sigma::Passive);

        deliver(&mut al, &[("data_in", Signal::Byte(0x0A))]);
        assert_eq!(al.staged(), Some(0x0A));
        assert_eq!(al.time_advance(), Sigma::Passive);

        deliver(&mut al, &[("write", Signal::Select(RegisterId::AL))]);
        assert_eq!(al.time_advance(), Sigma::NOW);
        al.internal();

        assert_eq!(al.value(), 0x0A);
        assert_eq!(al.staged(), None);
        assert_eq!(al.time_advance(), Sigma::Passive);
    }

    #[test]
    fn enable_then_data_in_the_same_instant_commits() {
        let mut ir = SimpleRegister::gated("IR", 0);
        ir.initialize();

        deliver(&mut ir, &[("write", Signal::Control(true))]);
        assert!(ir.write_pending());
        assert_eq!(ir.time_advance(), Sigma::NOW);

        // Data lands on the very step the armed write resolves.
        deliver_confluent(&mut ir, &[("data_in", Signal::Byte(0x33))]);
        assert_eq!(ir.value(), 0x33);
        assert!(!ir.write_pending());
        assert_eq!(ir.time_advance(), Sigma::Passive);
    }

    #[test]
    fn bare_write_enable_is_dropped_at_the_end_of_its_instant() {
        let mut al = NamedRegister::new(RegisterId::AL, 0x01);
        al.initialize();

        deliver(&mut al, &[("write", Signal::Select(RegisterId::AL))]);
        assert_eq!(al.time_advance(), Sigma::NOW);
        al.internal();
        assert!(!al.write_pending());
        assert_eq!(al.time_advance(), Sigma::Passive);

        deliver_after(&mut al, 3, &[("data_in", Signal::Byte(0x77))]);
        assert_eq!(al.time_advance(), Sigma::Passive);
        assert_eq!(al.value(), 0x01);
        assert_eq!(al.staged(), Some(0x77));
    }

    #[test]
    fn late_enable_commits_data_staged_earlier() {
        let mut al = NamedRegister::new(RegisterId::AL, 0x01);
        al.initialize();

        deliver(&mut al, &[("data_in", Signal::Byte(0x0A))]);
        deliver_after(&mut al, 3, &[("write", Signal::Select(RegisterId::AL))]);
        al.internal();
        assert_eq!(al.value(), 0x0A);
    }

    #[test]
    fn read_and_write_together_emit_the_old_value() {
        let mut bl = NamedRegister::new(RegisterId::BL, 0x0A);
        bl.initialize();

        deliver(
            &mut bl,
            &[
                ("data_in", Signal::Byte(0x55)),
                ("write", Signal::Select(RegisterId::BL)),
                ("read", Signal::Select(RegisterId::BL)),
            ],
        );
        assert_eq!(read_out(&bl), Some(Signal::Byte(0x0A)));
        bl.internal();
        assert_eq!(bl.value(), 0x55);
        assert_eq!(read_out(&bl), None);
    }

    #[test]
    fn select_for_another_register_is_ignored() {
        let mut cl = NamedRegister::new(RegisterId::CL, 0x00);
        cl.initialize();

        deliver(
            &mut cl,
            &[
                ("data_in", Signal::Byte(0x99)),
                ("write", Signal::Select(RegisterId::DL)),
            ],
        );
        assert_eq!(cl.time_advance(), Sigma::Passive);
        assert_eq!(cl.value(), 0x00);
    }

    #[test]
    fn deasserted_control_does_nothing() {
        let mut ir = SimpleRegister::gated("IR", 0);
        ir.initialize();

        deliver(
            &mut ir,
            &[
                ("data_in", Signal::Byte(0x01)),
                ("write", Signal::Control(false)),
                ("read", Signal::Control(false)),
            ],
        );
        assert_eq!(ir.time_advance(), Sigma::Passive);
    }

    #[test]
    fn transparent_latch_commits_data_alone() {
        let mut latch = SimpleRegister::transparent("T", 0);
        latch.initialize();
        assert_eq!(latch.gate(), WriteGate::Transparent);
        assert_eq!(latch.input_ports(), &["data_in", "read"]);

        deliver(&mut latch, &[("data_in", Signal::Byte(0x7F))]);
        assert_eq!(latch.time_advance(), Sigma::NOW);
        latch.internal();
        assert_eq!(latch.value(), 0x7F);
    }

    #[test]
    fn initialize_restores_the_initial_value() {
        let mut dl = NamedRegister::new(RegisterId::DL, 0x42);
        deliver(
            &mut dl,
            &[
                ("data_in", Signal::Byte(0x01)),
                ("write", Signal::Select(RegisterId::DL)),
            ],
        );
        dl.internal();
        assert_eq!(dl.value(), 0x01);

        dl.initialize();
        assert_eq!(dl.value(), 0x42);
        assert_eq!(dl.staged(), None);
    }
}
