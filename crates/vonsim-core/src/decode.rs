//! Opcode decode table.
//!
//! Every entry is a register-to-register, two-operand instruction. The
//! sequencer's execute phases read the source and write the destination, so a
//! new opcode of that shape only needs a table entry.

use std::fmt;

use crate::signal::RegisterId;

/// Instruction mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Mnemonic {
    /// Copy source register into destination register.
    Mov,
    /// No operation; also the result of decoding an unknown opcode.
    Nop,
}

impl Mnemonic {
    /// Assembly spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mov => "MOV",
            Self::Nop => "NOP",
        }
    }
}

/// Destination and source register of a two-operand instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Operands {
    /// Register written in the execute phase.
    pub dest: RegisterId,
    /// Register read in the execute phase.
    pub src: RegisterId,
}

/// One row of a [`DecodeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodeEntry {
    /// Instruction byte.
    pub opcode: u8,
    /// Mnemonic it decodes to.
    pub mnemonic: Mnemonic,
    /// Register operands.
    pub operands: Operands,
}

/// Result of looking an opcode up in a [`DecodeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// Instruction byte that was decoded.
    pub opcode: u8,
    /// Decoded mnemonic.
    pub mnemonic: Mnemonic,
    /// Operands to drive; `None` means no register enable is asserted.
    pub operands: Option<Operands>,
}

impl DecodedInstruction {
    /// No-operation record for `opcode`.
    #[must_use]
    pub const fn nop(opcode: u8) -> Self {
        Self {
            opcode,
            mnemonic: Mnemonic::Nop,
            operands: None,
        }
    }

    /// Returns `true` when nothing is driven during execute.
    #[must_use]
    pub const fn is_nop(&self) -> bool {
        self.operands.is_none()
    }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operands {
            Some(Operands { dest, src }) => {
                write!(f, "{} {dest}, {src}", self.mnemonic.as_str())
            }
            None => write!(f, "{} ; opcode {:#04X}", self.mnemonic.as_str(), self.opcode),
        }
    }
}

/// Canonical program opcode: `MOV AL, BL`.
pub const MOV_AL_BL: u8 = 0x01;

/// Static opcode lookup used by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodeTable {
    entries: Vec<DecodeEntry>,
}

impl Default for DecodeTable {
    fn default() -> Self {
        Self::empty().with(MOV_AL_BL, Mnemonic::Mov, RegisterId::AL, RegisterId::BL)
    }
}

impl DecodeTable {
    /// Table with no entries; every opcode decodes to NOP.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds or replaces the entry for `opcode`.
    pub fn insert(&mut self, entry: DecodeEntry) -> Option<DecodeEntry> {
        match self.entries.iter_mut().find(|e| e.opcode == entry.opcode) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Builder form of [`DecodeTable::insert`].
    #[must_use]
    pub fn with(
        mut self,
        opcode: u8,
        mnemonic: Mnemonic,
        dest: RegisterId,
        src: RegisterId,
    ) -> Self {
        let _ = self.insert(DecodeEntry {
            opcode,
            mnemonic,
            operands: Operands { dest, src },
        });
        self
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[DecodeEntry] {
        &self.entries
    }

    /// Decodes `opcode`; misses and NOP rows yield [`DecodedInstruction::nop`].
    #[must_use]
    pub fn decode(&self, opcode: u8) -> DecodedInstruction {
        self.entries
            .iter()
            .find(|entry| entry.opcode == opcode && entry.mnemonic != Mnemonic::Nop)
            .map_or_else(
                || DecodedInstruction::nop(opcode),
                |entry| DecodedInstruction {
                    opcode,
                    mnemonic: entry.mnemonic,
                    operands: Some(entry.operands),
                },
            )
    }
}
