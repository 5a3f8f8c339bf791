//! Simulated time and per-component time advance.

/// Simulated time in whole clock cycles.
pub type Time = u64;

/// Time advance a component schedules before its next internal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sigma {
    /// Internal transition fires after the given number of cycles.
    ///
    /// `After(0)` fires on the next coordinator step at the same clock value.
    After(Time),
    /// Dormant: no internal transition until an input arrives.
    #[default]
    Passive,
}

impl Sigma {
    /// Zero-length delay: next coordinator step, same simulated instant.
    pub const NOW: Self = Self::After(0);

    /// Consumes `elapsed` cycles of the remaining delay.
    ///
    /// Passive stays passive and a delay never goes below zero.
    #[must_use]
    pub const fn elapse(self, elapsed: Time) -> Self {
        match self {
            Self::After(remaining) => Self::After(remaining.saturating_sub(elapsed)),
            Self::Passive => Self::Passive,
        }
    }

    /// Absolute time of the next internal transition when scheduled at `from`.
    #[must_use]
    pub const fn deadline(self, from: Time) -> Option<Time> {
        match self {
            Self::After(delay) => Some(from.saturating_add(delay)),
            Self::Passive => None,
        }
    }

    /// Returns `true` when no internal transition is scheduled.
    #[must_use]
    pub const fn is_passive(self) -> bool {
        matches!(self, Self::Passive)
    }
}
