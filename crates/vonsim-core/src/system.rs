//! The assembled VonSim8 machine: topology, run entry points, and snapshots.

use devs_kernel::{
    Atomic, RunSummary, Simulation, SimulationError, StepReport, Time, TopologyBuilder,
    TopologyError, TransitionObserver,
};
use thiserror::Error;

use crate::bank::RegisterBank;
use crate::components::{
    mar, memory, pointer, register, InstructionPointer, Memory, MemoryAddressRegister,
    NamedRegister, SimpleRegister,
};
use crate::config::SystemConfig;
use crate::decode::DecodedInstruction;
use crate::sequencer::{self, CycleBreakdown, Phase, Sequencer};
use crate::signal::{RegisterId, Signal, REGISTER_COUNT};

/// Instance name of the memory buffer register.
pub const MBR: &str = "MBR";
/// Instance name of the instruction register.
pub const IR: &str = "IR";

/// Failures building or running a [`VonSim8`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    /// The wiring was rejected at construction.
    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),
    /// The coordinator stopped with an error.
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
    /// A component expected by the snapshot is not registered under its name.
    #[error("component `{0}` is missing from the system")]
    MissingComponent(&'static str),
}

/// Architectural and control state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SystemSnapshot {
    /// Simulated time.
    pub clock: Time,
    /// Sequencer phase.
    pub phase: Phase,
    /// Opcode last delivered to the sequencer.
    pub instruction_code: u8,
    /// Decode result once available.
    pub decoded: Option<DecodedInstruction>,
    /// Instruction pointer.
    pub ip: u8,
    /// Memory address register.
    pub mar: u8,
    /// Memory buffer register.
    pub mbr: u8,
    /// Instruction register.
    pub ir: u8,
    /// `AL`, `BL`, `CL`, `DL`.
    pub registers: [u8; REGISTER_COUNT],
    /// Cycle totals folded from the sequencer's ledger.
    pub cycles: CycleBreakdown,
}

impl SystemSnapshot {
    /// Value of one general-purpose register.
    #[must_use]
    pub const fn register(&self, id: RegisterId) -> u8 {
        self.registers[id.index()]
    }
}

/// Outcome of [`VonSim8::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunReport {
    /// Kernel step and transition counts.
    pub summary: RunSummary,
    /// State once the machine went quiescent.
    pub snapshot: SystemSnapshot,
}

/// The wired CPU.
///
/// Control lines fan out from the sequencer (`CU`) to the instruction
/// pointer, memory, the MBR/IR latches, and the register bank. Addresses flow
/// `IP -> MAR -> MEM`, fetched bytes `MEM -> MBR -> IR -> CU`, and register
/// data over the bank mesh.
#[derive(Debug)]
pub struct VonSim8 {
    config: SystemConfig,
    simulation: Simulation<Signal>,
}

impl VonSim8 {
    /// Wires and initializes a machine.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Topology`] if the wiring is rejected.
    pub fn new(config: SystemConfig) -> Result<Self, SystemError> {
        let simulation = wire(&config)?;
        Ok(Self { config, simulation })
    }

    /// Machine loaded with the canonical `MOV AL, BL` program.
    ///
    /// # Errors
    ///
    /// See [`VonSim8::new`].
    pub fn canonical() -> Result<Self, SystemError> {
        Self::new(SystemConfig::default())
    }

    /// Configuration the machine was built from.
    #[must_use]
    pub const fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Current simulated time.
    #[must_use]
    pub const fn clock(&self) -> Time {
        self.simulation.clock()
    }

    /// Underlying coordinator, for typed component access.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation<Signal> {
        &self.simulation
    }

    /// Streams every kernel transition to `observer`.
    pub fn set_observer(&mut self, observer: impl TransitionObserver + 'static) {
        self.simulation.set_observer(observer);
    }

    /// Rewinds to the configured initial state.
    pub fn reset(&mut self) {
        self.simulation.initialize();
    }

    /// Advances one coordinator step.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Simulation`] on a port collision.
    pub fn step(&mut self) -> Result<Option<StepReport>, SystemError> {
        Ok(self.simulation.step()?)
    }

    /// Runs until every component is passive.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Simulation`] on a port collision or when the
    /// configured step budget runs out.
    pub fn run(&mut self) -> Result<RunReport, SystemError> {
        let summary = self.simulation.run(self.config.max_steps)?;
        let snapshot = self.snapshot()?;
        log::info!(
            "run finished at t={} in phase {} after {} steps",
            summary.clock,
            snapshot.phase,
            summary.steps
        );
        Ok(RunReport { summary, snapshot })
    }

    /// Captures the current machine state.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::MissingComponent`] if a part cannot be found.
    pub fn snapshot(&self) -> Result<SystemSnapshot, SystemError> {
        let sequencer = self.part::<Sequencer>(Sequencer::NAME)?;
        let mut registers = [0; REGISTER_COUNT];
        for id in RegisterId::ALL {
            registers[id.index()] = self.part::<NamedRegister>(id.name())?.value();
        }

        Ok(SystemSnapshot {
            clock: self.simulation.clock(),
            phase: sequencer.phase(),
            instruction_code: sequencer.instruction_code(),
            decoded: sequencer.decoded(),
            ip: self
                .part::<InstructionPointer>(InstructionPointer::NAME)?
                .value(),
            mar: self
                .part::<MemoryAddressRegister>(MemoryAddressRegister::NAME)?
                .address(),
            mbr: self.part::<SimpleRegister>(MBR)?.value(),
            ir: self.part::<SimpleRegister>(IR)?.value(),
            registers,
            cycles: sequencer.cycles(),
        })
    }

    /// Reads one byte of memory without going through the access protocol.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::MissingComponent`] if memory cannot be found.
    pub fn peek(&self, address: u8) -> Result<u8, SystemError> {
        Ok(self.part::<Memory>(Memory::NAME)?.peek(address))
    }

    fn part<T: Atomic<Signal>>(&self, name: &'static str) -> Result<&T, SystemError> {
        self.simulation
            .component::<T>(name)
            .ok_or(SystemError::MissingComponent(name))
    }
}

fn wire(config: &SystemConfig) -> Result<Simulation<Signal>, TopologyError> {
    let mut builder = TopologyBuilder::new();

    let cu = builder.add(Sequencer::new(config.decode.clone()))?;
    let ip = builder.add(InstructionPointer::new(config.ip))?;
    let mar_id = builder.add(MemoryAddressRegister::new())?;
    let mem = builder.add(Memory::new(config.memory.iter().copied()))?;
    let mbr = builder.add(SimpleRegister::gated(MBR, 0))?;
    let ir = builder.add(SimpleRegister::gated(IR, 0))?;
    let bank = RegisterBank::install(&mut builder, config.registers)?;

    builder
        .connect(cu.port(sequencer::IP_READ), ip.port(pointer::READ))
        .connect(cu.port(sequencer::IP_INC), ip.port(pointer::INC))
        .connect(ip.port(pointer::ADDR_OUT), mar_id.port(mar::ADDR_IN))
        .connect(mar_id.port(mar::ADDR_OUT), mem.port(memory::ADDR))
        .connect(cu.port(sequencer::MEM_READ), mem.port(memory::ACCESS))
        .connect(mem.port(memory::DATA_OUT), mbr.port(register::DATA_IN))
        .connect(cu.port(sequencer::MBR_WRITE), mbr.port(register::WRITE))
        .connect(cu.port(sequencer::IR_LOAD), mbr.port(register::READ))
        .connect(cu.port(sequencer::IR_LOAD), ir.port(register::WRITE))
        .connect(mbr.port(register::DATA_OUT), ir.port(register::DATA_IN))
        .connect(cu.port(sequencer::IR_READ), ir.port(register::READ))
        .connect(ir.port(register::DATA_OUT), cu.port(sequencer::OPCODE_IN));
    bank.connect_enables(
        &mut builder,
        cu.port(sequencer::REG_READ),
        cu.port(sequencer::REG_WRITE),
    );

    builder.build()
}
