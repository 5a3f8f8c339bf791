//! Construction-time parameters for a [`crate::system::VonSim8`].

use crate::decode::{DecodeTable, MOV_AL_BL};
use crate::signal::{RegisterId, REGISTER_COUNT};

/// Coordinator step budget used when none is configured.
///
/// The canonical instruction settles in well under a hundred steps.
pub const DEFAULT_STEP_BUDGET: u64 = 1_000;

/// Initial machine state and run limits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SystemConfig {
    /// Initial `AL`, `BL`, `CL`, `DL`.
    pub registers: [u8; REGISTER_COUNT],
    /// Initial instruction pointer.
    pub ip: u8,
    /// `(address, byte)` pairs loaded into memory; later pairs win.
    pub memory: Vec<(u8, u8)>,
    /// Opcode table used by the sequencer.
    pub decode: DecodeTable,
    /// Upper bound on coordinator steps for a full run.
    pub max_steps: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            registers: [0x01, 0x0A, 0x00, 0x00],
            ip: 0x00,
            memory: vec![(0x00, MOV_AL_BL)],
            decode: DecodeTable::default(),
            max_steps: DEFAULT_STEP_BUDGET,
        }
    }
}

impl SystemConfig {
    /// Sets the initial value of one register.
    #[must_use]
    pub const fn with_register(mut self, id: RegisterId, value: u8) -> Self {
        self.registers[id.index()] = value;
        self
    }

    /// Stores `byte` at `address` in the initial memory image.
    #[must_use]
    pub fn with_byte(mut self, address: u8, byte: u8) -> Self {
        self.poke(address, byte);
        self
    }

    /// In-place form of [`SystemConfig::with_byte`].
    pub fn poke(&mut self, address: u8, byte: u8) {
        self.memory.retain(|(existing, _)| *existing != address);
        self.memory.push((address, byte));
    }

    /// Initial value of one register.
    #[must_use]
    pub const fn register(&self, id: RegisterId) -> u8 {
        self.registers[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::{SystemConfig, DEFAULT_STEP_BUDGET};
    use crate::decode::MOV_AL_BL;
    use crate::signal::RegisterId;

    #[test]
    fn default_config_is_the_canonical_program() {
        let config = SystemConfig::default();

        assert_eq!(config.register(RegisterId::AL), 0x01);
        assert_eq!(config.register(RegisterId::BL), 0x0A);
        assert_eq!(config.register(RegisterId::CL), 0x00);
        assert_eq!(config.register(RegisterId::DL), 0x00);
        assert_eq!(config.ip, 0x00);
        assert_eq!(config.memory, vec![(0x00, MOV_AL_BL)]);
        assert_eq!(config.max_steps, DEFAULT_STEP_BUDGET);
    }

    #[test]
    fn poke_replaces_an_existing_address() {
        let config = SystemConfig::default()
            .with_byte(0x00, 0x02)
            .with_byte(0x10, 0xFF)
            .with_register(RegisterId::DL, 0x7F);

        assert_eq!(config.memory, vec![(0x00, 0x02), (0x10, 0xFF)]);
        assert_eq!(config.register(RegisterId::DL), 0x7F);
    }
}
