use std::fmt;

use devs_kernel::Time;

/// Sequencer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Phase {
    /// Before initialization.
    Idle,
    Fetch1,
    Fetch2,
    Fetch3,
    Fetch4,
    Fetch5,
    Fetch6,
    Exec1,
    Exec2,
    Exec3,
    Exec4,
    Exec5,
    /// Instruction complete; terminal.
    Done,
}

/// Cycles spent in each timed phase.
pub const PHASE_DELAY_TABLE: &[(Phase, Time)] = &[
    (Phase::Fetch1, 1),
    (Phase::Fetch2, 1),
    (Phase::Fetch3, 2),
    (Phase::Fetch4, 1),
    (Phase::Fetch5, 2),
    (Phase::Fetch6, 1),
    (Phase::Exec1, 1),
    (Phase::Exec2, 1),
    (Phase::Exec3, 2),
    (Phase::Exec4, 1),
    (Phase::Exec5, 1),
];

/// Looks up the delay of a phase; `None` for the untimed `Idle` and `Done`.
#[must_use]
pub fn phase_delay(phase: Phase) -> Option<Time> {
    PHASE_DELAY_TABLE
        .iter()
        .find_map(|(entry, delay)| (*entry == phase).then_some(*delay))
}

impl Phase {
    /// Phase entered when this one's delay expires.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::Fetch1,
            Self::Fetch1 => Self::Fetch2,
            Self::Fetch2 => Self::Fetch3,
            Self::Fetch3 => Self::Fetch4,
            Self::Fetch4 => Self::Fetch5,
            Self::Fetch5 => Self::Fetch6,
            Self::Fetch6 => Self::Exec1,
            Self::Exec1 => Self::Exec2,
            Self::Exec2 => Self::Exec3,
            Self::Exec3 => Self::Exec4,
            Self::Exec4 => Self::Exec5,
            Self::Exec5 | Self::Done => Self::Done,
        }
    }

    /// Part of the fetch half of the cycle.
    #[must_use]
    pub const fn is_fetch(self) -> bool {
        matches!(
            self,
            Self::Fetch1 | Self::Fetch2 | Self::Fetch3 | Self::Fetch4 | Self::Fetch5 | Self::Fetch6
        )
    }

    /// Part of the execute half of the cycle.
    #[must_use]
    pub const fn is_execute(self) -> bool {
        matches!(
            self,
            Self::Exec1 | Self::Exec2 | Self::Exec3 | Self::Exec4 | Self::Exec5
        )
    }

    /// Upper-case trace label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Fetch1 => "FETCH1",
            Self::Fetch2 => "FETCH2",
            Self::Fetch3 => "FETCH3",
            Self::Fetch4 => "FETCH4",
            Self::Fetch5 => "FETCH5",
            Self::Fetch6 => "FETCH6",
            Self::Exec1 => "EXEC1",
            Self::Exec2 => "EXEC2",
            Self::Exec3 => "EXEC3",
            Self::Exec4 => "EXEC4",
            Self::Exec5 => "EXEC5",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
