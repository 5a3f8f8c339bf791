//! Cycle-level model of the VonSim8 8-bit von Neumann CPU.
//!
//! Registers, the instruction pointer, the MAR, memory, and the sequencer are
//! timed state machines on the [`devs_kernel`] coordinator. [`VonSim8`] wires
//! them into one machine and runs a fetch/decode/execute cycle to quiescence.

/// Port values: control lines, bytes, register selects.
pub mod signal;
pub use signal::{select_route, MemoryAccess, RegisterId, RequesterId, Signal, REGISTER_COUNT};

/// Leaf components.
pub mod components;
pub use components::{
    new_address_space, BusArbiter, InstructionPointer, Memory, MemoryAddressRegister,
    NamedRegister, SimpleRegister, WriteGate, ADDRESS_SPACE_BYTES,
};

/// Opcode decode table.
pub mod decode;
pub use decode::{DecodeEntry, DecodeTable, DecodedInstruction, Mnemonic, Operands, MOV_AL_BL};

/// Control unit, phase table, and cycle ledger.
pub mod sequencer;
pub use sequencer::{
    phase_delay, CycleBreakdown, CycleLedger, Phase, Sequencer, PHASE_DELAY_TABLE,
};

/// Register bank wiring.
pub mod bank;
pub use bank::RegisterBank;

/// Construction-time configuration.
pub mod config;
pub use config::{SystemConfig, DEFAULT_STEP_BUDGET};

/// Assembled machine.
pub mod system;
pub use system::{RunReport, SystemError, SystemSnapshot, VonSim8};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
