//! Control unit driving the fetch/decode/execute cycle.
//!
//! Each phase holds for its table delay. When the delay expires the output
//! function asserts that phase's control lines, then the internal transition
//! moves to the next phase. The fetched opcode arrives on [`OPCODE_IN`] while
//! the sequencer waits in `EXEC1` and is decoded on leaving it.

use devs_kernel::{Atomic, Inputs, Outputs, Sigma, Time};

use crate::decode::{DecodeTable, DecodedInstruction};
use crate::signal::{MemoryAccess, Signal};

/// Phase enumeration and per-phase delay table.
pub mod phase;
pub use phase::{phase_delay, Phase, PHASE_DELAY_TABLE};

/// Entered-phase ledger and cycle fold.
pub mod ledger;
pub use ledger::{CycleBreakdown, CycleLedger};

/// Opcode from the instruction register.
pub const OPCODE_IN: &str = "opcode_in";
/// IP read request.
pub const IP_READ: &str = "ip_read";
/// IP increment request.
pub const IP_INC: &str = "ip_inc";
/// Memory access request.
pub const MEM_READ: &str = "mem_read";
/// MBR write enable.
pub const MBR_WRITE: &str = "mbr_write";
/// MBR read enable and IR write enable, asserted together.
pub const IR_LOAD: &str = "ir_load";
/// IR read enable.
pub const IR_READ: &str = "ir_read";
/// Addressed read enable for the register bank.
pub const REG_READ: &str = "reg_read";
/// Addressed write enable for the register bank.
pub const REG_WRITE: &str = "reg_write";

const ASSERT: Signal = Signal::Control(true);

/// The sequencer state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequencer {
    table: DecodeTable,
    phase: Phase,
    sigma: Sigma,
    instruction_code: u8,
    decoded: Option<DecodedInstruction>,
    ledger: CycleLedger,
}

impl Sequencer {
    /// Instance name in the system topology.
    pub const NAME: &'static str = "CU";

    /// Creates an idle sequencer decoding with `table`.
    #[must_use]
    pub const fn new(table: DecodeTable) -> Self {
        Self {
            table,
            phase: Phase::Idle,
            sigma: Sigma::Passive,
            instruction_code: 0,
            decoded: None,
            ledger: CycleLedger::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Last opcode received from the IR.
    #[must_use]
    pub const fn instruction_code(&self) -> u8 {
        self.instruction_code
    }

    /// Decode result, available once `EXEC1` has been left.
    #[must_use]
    pub const fn decoded(&self) -> Option<DecodedInstruction> {
        self.decoded
    }

    /// Phases entered so far.
    #[must_use]
    pub const fn ledger(&self) -> &CycleLedger {
        &self.ledger
    }

    /// Cycle totals for the phases entered so far.
    #[must_use]
    pub fn cycles(&self) -> CycleBreakdown {
        self.ledger.breakdown()
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("CU: {} -> {phase}", self.phase);
        self.phase = phase;
        self.sigma = phase_delay(phase).map_or(Sigma::Passive, Sigma::After);
        self.ledger.record(phase);
    }
}

impl Atomic<Signal> for Sequencer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &[OPCODE_IN]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &[
            IP_READ, IP_INC, MEM_READ, MBR_WRITE, IR_LOAD, IR_READ, REG_READ, REG_WRITE,
        ]
    }

    fn initialize(&mut self) {
        self.phase = Phase::Idle;
        self.instruction_code = 0;
        self.decoded = None;
        self.ledger.clear();
        self.enter(Phase::Fetch1);
    }

    fn time_advance(&self) -> Sigma {
        self.sigma
    }

    fn internal(&mut self) {
        if self.phase == Phase::Exec1 {
            let decoded = self.table.decode(self.instruction_code);
            if decoded.is_nop() {
                log::warn!(
                    "CU: opcode {:#04X} has no decode entry, executing as NOP",
                    self.instruction_code
                );
            } else {
                log::debug!("CU: decoded {decoded}");
            }
            self.decoded = Some(decoded);
        }
        self.enter(self.phase.next());
    }

    fn external(&mut self, elapsed: Time, inputs: &Inputs<'_, Signal>) {
        self.sigma = self.sigma.elapse(elapsed);
        if let Some(opcode) = inputs.get(OPCODE_IN).and_then(Signal::byte) {
            log::debug!("CU: opcode {opcode:#04X} received in {}", self.phase);
            self.instruction_code = opcode;
        }
    }

    fn output(&self, outputs: &mut Outputs<Signal>) {
        let operands = self.decoded.and_then(|decoded| decoded.operands);
        match self.phase {
            Phase::Fetch1 => outputs.emit(IP_READ, ASSERT),
            Phase::Fetch3 => {
                outputs.emit(MEM_READ, Signal::Access(MemoryAccess::Read));
                outputs.emit(IP_INC, ASSERT);
            }
            Phase::Fetch4 => outputs.emit(MBR_WRITE, ASSERT),
            Phase::Fetch5 => outputs.emit(IR_LOAD, ASSERT),
            Phase::Fetch6 => outputs.emit(IR_READ, ASSERT),
            Phase::Exec2 => {
                if let Some(operands) = operands {
                    outputs.emit(REG_READ, Signal::Select(operands.src));
                }
            }
            Phase::Exec4 => {
                if let Some(operands) = operands {
                    outputs.emit(REG_WRITE, Signal::Select(operands.dest));
                }
            }
            Phase::Idle
            | Phase::Fetch2
            | Phase::Exec1
            | Phase::Exec3
            | Phase::Exec5
            | Phase::Done => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use devs_kernel::{Atomic, Outputs, Sigma};
    use rstest::rstest;

    use super::{Phase, Sequencer, IP_INC, IP_READ, MEM_READ, REG_READ, REG_WRITE};
    use crate::components::testing::{deliver, deliver_after};
    use crate::decode::{DecodeTable, MOV_AL_BL};
    use crate::signal::{MemoryAccess, RegisterId, Signal};

    fn advance_to(sequencer: &mut Sequencer, phase: Phase) {
        while sequencer.phase() != phase {
            sequencer.internal();
        }
    }

    fn emitted(sequencer: &Sequencer) -> Vec<(&'static str, Signal)> {
        let mut outputs = Outputs::new(sequencer.output_ports());
        sequencer.output(&mut outputs);
        sequencer
            .output_ports()
            .iter()
            .filter_map(|port| outputs.get(port).map(|signal| (*port, *signal)))
            .collect()
    }

    #[test]
    fn starts_idle_and_initializes_into_fetch1() {
        let mut sequencer = Sequencer::new(DecodeTable::default());
        assert_eq!(sequencer.phase(), Phase::Idle);
        assert_eq!(sequencer.time_advance(), Sigma::Passive);

        sequencer.initialize();
        assert_eq!(sequencer.phase(), Phase::Fetch1);
        assert_eq!(sequencer.time_advance(), Sigma::After(1));
        assert_eq!(sequencer.ledger().entries(), &[(Phase::Fetch1, 1)]);
    }

    #[rstest]
    #[case(Phase::Fetch1, vec![(IP_READ, Signal::Control(true))])]
    #[case(Phase::Fetch2, vec![])]
    #[case(
        Phase::Fetch3,
        vec![
            (IP_INC, Signal::Control(true)),
            (MEM_READ, Signal::Access(MemoryAccess::Read)),
        ]
    )]
    #[case(Phase::Exec1, vec![])]
    #[case(Phase::Exec2, vec![(REG_READ, Signal::Select(RegisterId::BL))])]
    #[case(Phase::Exec3, vec![])]
    #[case(Phase::Exec4, vec![(REG_WRITE, Signal::Select(RegisterId::AL))])]
    #[case(Phase::Done, vec![])]
    fn phases_assert_their_control_lines(
        #[case] phase: Phase,
        #[case] mut expected: Vec<(&'static str, Signal)>,
    ) {
        let mut sequencer = Sequencer::new(DecodeTable::default());
        sequencer.initialize();
        deliver(&mut sequencer, &[("opcode_in", Signal::Byte(MOV_AL_BL))]);
        advance_to(&mut sequencer, phase);

        let mut actual = emitted(&sequencer);
        actual.sort_by_key(|(port, _)| *port);
        expected.sort_by_key(|(port, _)| *port);
        assert_eq!(actual, expected);
    }

    #[test]
    fn late_opcode_keeps_the_remaining_delay() {
        let mut sequencer = Sequencer::new(DecodeTable::default());
        sequencer.initialize();
        advance_to(&mut sequencer, Phase::Exec3);
        assert_eq!(sequencer.time_advance(), Sigma::After(2));

        deliver_after(&mut sequencer, 1, &[("opcode_in", Signal::Byte(0x02))]);
        assert_eq!(sequencer.time_advance(), Sigma::After(1));
        assert_eq!(sequencer.instruction_code(), 0x02);
        assert_eq!(sequencer.phase(), Phase::Exec3);
    }

    #[test]
    fn unknown_opcode_asserts_no_register_enable() {
        let mut sequencer = Sequencer::new(DecodeTable::default());
        sequencer.initialize();
        deliver(&mut sequencer, &[("opcode_in", Signal::Byte(0x7E))]);

        advance_to(&mut sequencer, Phase::Exec2);
        assert!(sequencer.decoded().is_some_and(|d| d.is_nop()));
        assert!(emitted(&sequencer).is_empty());

        advance_to(&mut sequencer, Phase::Exec4);
        assert!(emitted(&sequencer).is_empty());

        advance_to(&mut sequencer, Phase::Done);
        assert_eq!(sequencer.cycles().total, 14);
    }

    #[test]
    fn done_is_passive_and_terminal() {
        let mut sequencer = Sequencer::new(DecodeTable::default());
        sequencer.initialize();
        advance_to(&mut sequencer, Phase::Done);

        assert_eq!(sequencer.time_advance(), Sigma::Passive);
        let breakdown = sequencer.cycles();
        assert_eq!((breakdown.total, breakdown.fetch, breakdown.execute), (14, 8, 6));
    }
}
