use devs_kernel::Time;

use super::phase::{phase_delay, Phase};

/// Cycle totals folded from a [`CycleLedger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CycleBreakdown {
    /// All cycles spent in timed phases.
    pub total: Time,
    /// Cycles in `FETCH1..FETCH6`.
    pub fetch: Time,
    /// Cycles in `EXEC1..EXEC5`.
    pub execute: Time,
    /// Instructions that reached `DONE`.
    pub instructions: u64,
}

impl CycleBreakdown {
    /// Cycles per completed instruction.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cpi(&self) -> Option<f64> {
        (self.instructions > 0).then(|| self.total as f64 / self.instructions as f64)
    }
}

/// Append-only record of the phases the sequencer entered, with their cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleLedger {
    entries: Vec<(Phase, Time)>,
}

impl CycleLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records entry into `phase`; untimed phases cost nothing.
    pub fn record(&mut self, phase: Phase) {
        self.entries.push((phase, phase_delay(phase).unwrap_or(0)));
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in the order they were recorded.
    #[must_use]
    pub fn entries(&self) -> &[(Phase, Time)] {
        &self.entries
    }

    /// Folds the ledger into totals.
    #[must_use]
    pub fn breakdown(&self) -> CycleBreakdown {
        self.entries
            .iter()
            .fold(CycleBreakdown::default(), |mut acc, &(phase, cost)| {
                acc.total += cost;
                if phase.is_fetch() {
                    acc.fetch += cost;
                } else if phase.is_execute() {
                    acc.execute += cost;
                } else if phase == Phase::Done {
                    acc.instructions += 1;
                }
                acc
            })
    }
}
