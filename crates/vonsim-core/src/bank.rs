//! Register bank: the four named registers and the wiring between them.

use devs_kernel::{ComponentId, PortRef, TopologyBuilder, TopologyError};

use crate::components::register::{self, NamedRegister};
use crate::signal::{select_route, RegisterId, Signal, REGISTER_COUNT};

/// Handles to the bank's registers once installed in a topology.
///
/// Addressed enables reach a register through a lookup indexed by
/// [`RegisterId`]; data moves over an all-to-all mesh. The bank does not
/// arbitrate: two simultaneous reads surface as a kernel port collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBank {
    ids: [ComponentId; REGISTER_COUNT],
}

impl RegisterBank {
    /// Adds `AL`..`DL` holding `initial` and declares their data mesh.
    ///
    /// # Errors
    ///
    /// Propagates registration failures such as a name already in use.
    pub fn install(
        builder: &mut TopologyBuilder<Signal>,
        initial: [u8; REGISTER_COUNT],
    ) -> Result<Self, TopologyError> {
        let [first, rest @ ..] = RegisterId::ALL;
        let seed = builder.add(NamedRegister::new(first, initial[first.index()]))?;
        let mut ids = [seed; REGISTER_COUNT];
        for id in rest {
            ids[id.index()] = builder.add(NamedRegister::new(id, initial[id.index()]))?;
        }

        let members: Vec<(PortRef, PortRef)> = ids
            .iter()
            .map(|id| (id.port(register::DATA_OUT), id.port(register::DATA_IN)))
            .collect();
        builder.mesh(&members);

        Ok(Self { ids })
    }

    /// Routes addressed read and write enables to the selected register.
    pub fn connect_enables(
        &self,
        builder: &mut TopologyBuilder<Signal>,
        read: PortRef,
        write: PortRef,
    ) {
        builder.route(read, select_route, self.ports(register::READ));
        builder.route(write, select_route, self.ports(register::WRITE));
    }

    /// Component handle for one register.
    #[must_use]
    pub const fn component(&self, id: RegisterId) -> ComponentId {
        self.ids[id.index()]
    }

    fn ports(&self, port: &'static str) -> Vec<PortRef> {
        self.ids.iter().map(|id| id.port(port)).collect()
    }
}

#[cfg(test)]
mod tests {
    use devs_kernel::{Atomic, Inputs, Outputs, Sigma, Time, TopologyBuilder};

    use super::RegisterBank;
    use crate::components::NamedRegister;
    use crate::signal::{RegisterId, Signal};

    type Burst = (Time, Vec<(&'static str, Signal)>);

    /// Fires scripted bursts of enables at their listed times.
    struct Script {
        bursts: Vec<Burst>,
        cursor: usize,
        now: Time,
    }

    impl Atomic<Signal> for Script {
        fn name(&self) -> &str {
            "script"
        }

        fn input_ports(&self) -> &'static [&'static str] {
            &[]
        }

        fn output_ports(&self) -> &'static [&'static str] {
            &["read", "write"]
        }

        fn initialize(&mut self) {
            self.cursor = 0;
            self.now = 0;
        }

        fn time_advance(&self) -> Sigma {
            self.bursts
                .get(self.cursor)
                .map_or(Sigma::Passive, |(at, _)| Sigma::After(at - self.now))
        }

        fn internal(&mut self) {
            if let Some((at, _)) = self.bursts.get(self.cursor) {
                self.now = *at;
            }
            self.cursor += 1;
        }

        fn external(&mut self, _elapsed: Time, _inputs: &Inputs<'_, Signal>) {}

        fn output(&self, outputs: &mut Outputs<Signal>) {
            if let Some((_, signals)) = self.bursts.get(self.cursor) {
                for (port, signal) in signals {
                    outputs.emit(port, *signal);
                }
            }
        }
    }

    fn bank_with(bursts: Vec<Burst>) -> devs_kernel::Simulation<Signal> {
        let mut builder = TopologyBuilder::new();
        let driver = builder
            .add(Script {
                bursts,
                cursor: 0,
                now: 0,
            })
            .expect("fresh name");
        let bank =
            RegisterBank::install(&mut builder, [0x11, 0x22, 0x33, 0x44]).expect("fresh names");
        bank.connect_enables(&mut builder, driver.port("read"), driver.port("write"));
        assert_eq!(bank.component(RegisterId::AL).index(), 1);
        builder.build().expect("valid bank")
    }

    fn value(sim: &devs_kernel::Simulation<Signal>, id: RegisterId) -> u8 {
        sim.component::<NamedRegister>(id.name())
            .expect("bank register")
            .value()
    }

    #[test]
    fn read_of_one_register_lands_in_another_on_write() {
        let mut sim = bank_with(vec![(
            1,
            vec![
                ("read", Signal::Select(RegisterId::DL)),
                ("write", Signal::Select(RegisterId::BL)),
            ],
        )]);
        sim.run(50).expect("quiescent");

        assert_eq!(value(&sim, RegisterId::BL), 0x44);
        assert_eq!(value(&sim, RegisterId::DL), 0x44);
        assert_eq!(value(&sim, RegisterId::AL), 0x11);
        assert_eq!(value(&sim, RegisterId::CL), 0x33);
    }

    #[test]
    fn read_enable_alone_leaves_every_register_unchanged() {
        let mut sim = bank_with(vec![(1, vec![("read", Signal::Select(RegisterId::CL))])]);
        sim.run(50).expect("quiescent");

        for (id, expected) in RegisterId::ALL.into_iter().zip([0x11, 0x22, 0x33, 0x44]) {
            assert_eq!(value(&sim, id), expected);
        }
        let al = sim
            .component::<NamedRegister>("AL")
            .expect("bank register");
        assert_eq!(al.staged(), Some(0x33));
    }

    #[test]
    fn non_select_enables_are_dropped_by_the_route() {
        let mut sim = bank_with(vec![(1, vec![("read", Signal::Control(true))])]);
        let summary = sim.run(50).expect("quiescent");
        assert_eq!(summary.external, 0);
    }

    #[test]
    fn self_move_leaves_no_write_armed_for_a_later_read() {
        let mut sim = bank_with(vec![
            (
                1,
                vec![
                    ("read", Signal::Select(RegisterId::AL)),
                    ("write", Signal::Select(RegisterId::AL)),
                ],
            ),
            (3, vec![("read", Signal::Select(RegisterId::BL))]),
        ]);
        sim.run(50).expect("quiescent");

        let al = sim
            .component::<NamedRegister>("AL")
            .expect("bank register");
        assert_eq!(al.value(), 0x11);
        assert_eq!(al.staged(), Some(0x22));
        assert!(!al.write_pending());
        assert_eq!(value(&sim, RegisterId::CL), 0x33);
    }
}
