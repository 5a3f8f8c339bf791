//! Values carried on the wires between components.

use std::fmt;

/// Number of general-purpose registers in the bank.
pub const REGISTER_COUNT: usize = 4;

/// General-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum RegisterId {
    AL = 0,
    BL = 1,
    CL = 2,
    DL = 3,
}

impl RegisterId {
    /// Registers in bank order.
    pub const ALL: [Self; REGISTER_COUNT] = [Self::AL, Self::BL, Self::CL, Self::DL];

    /// Position of this register in the bank (`0..=3`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`RegisterId::index`].
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::AL),
            1 => Some(Self::BL),
            2 => Some(Self::CL),
            3 => Some(Self::DL),
            _ => None,
        }
    }

    /// Assembly name, also used as the component instance name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AL => "AL",
            Self::BL => "BL",
            Self::CL => "CL",
            Self::DL => "DL",
        }
    }

    /// Parses an assembly name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryAccess {
    /// Emit the addressed byte.
    Read,
    /// Store the staged data byte at the address.
    Write,
}

/// Identifier a component presents when claiming the shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RequesterId(pub u8);

/// A single value on a component port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Unconditioned enable or request line.
    Control(bool),
    /// Data or address byte.
    Byte(u8),
    /// Enable addressed to one register of the bank.
    Select(RegisterId),
    /// Memory access direction.
    Access(MemoryAccess),
    /// Bus claim.
    Claim(RequesterId),
    /// Bus grant for the named requester.
    Grant(RequesterId),
    /// Frees the bus.
    Release,
}

impl Signal {
    /// Payload of a [`Signal::Byte`].
    #[must_use]
    pub const fn byte(&self) -> Option<u8> {
        match self {
            Self::Byte(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns `true` for an asserted control line.
    #[must_use]
    pub const fn is_asserted(&self) -> bool {
        matches!(self, Self::Control(true))
    }

    /// Register named by a [`Signal::Select`].
    #[must_use]
    pub const fn selected(&self) -> Option<RegisterId> {
        match self {
            Self::Select(id) => Some(*id),
            _ => None,
        }
    }

    /// Direction carried by a [`Signal::Access`].
    #[must_use]
    pub const fn access(&self) -> Option<MemoryAccess> {
        match self {
            Self::Access(access) => Some(*access),
            _ => None,
        }
    }
}

/// Routes an addressed register enable to its bank slot.
#[must_use]
pub const fn select_route(signal: &Signal) -> Option<usize> {
    match signal.selected() {
        Some(id) => Some(id.index()),
        None => None,
    }
}
