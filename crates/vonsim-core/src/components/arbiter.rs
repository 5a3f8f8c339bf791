//! Shared-bus arbiter.
//!
//! Not wired into [`crate::system::VonSim8`]: the register mesh relies on the
//! sequencer never driving two sources at once. Kept as a catalog component
//! for topologies that share a line between several requesters.

use devs_kernel::{Atomic, Inputs, Outputs, Sigma, Time};

use crate::signal::{RequesterId, Signal};

/// Cycles between an accepted claim and its grant.
pub const GRANT_LATENCY: Time = 1;

/// Bus claim from a requester.
pub const CLAIM: &str = "claim";
/// Frees the bus.
pub const RELEASE: &str = "release";
/// Data to relay.
pub const DATA_IN: &str = "data_in";
/// Grant for the current holder.
pub const GRANT: &str = "grant";
/// Relayed data.
pub const DATA_OUT: &str = "data_out";

/// Grants exclusive ownership of a shared line and relays data across it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusArbiter {
    holder: Option<RequesterId>,
    grant_due: Option<(RequesterId, Sigma)>,
    data: Option<u8>,
}

impl BusArbiter {
    /// Instance name in a topology.
    pub const NAME: &'static str = "BUS";

    /// Creates a free arbiter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            holder: None,
            grant_due: None,
            data: None,
        }
    }

    /// Requester currently owning the line.
    #[must_use]
    pub const fn holder(&self) -> Option<RequesterId> {
        self.holder
    }

    /// The grant fires when it is what the current delay is waiting on.
    const fn grant_fires(&self) -> bool {
        match self.grant_due {
            Some((_, sigma)) => self.data.is_none() || matches!(sigma, Sigma::After(0)),
            None => false,
        }
    }
}

impl Atomic<Signal> for BusArbiter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &[CLAIM, RELEASE, DATA_IN]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &[GRANT, DATA_OUT]
    }

    fn initialize(&mut self) {
        *self = Self::new();
    }

    fn time_advance(&self) -> Sigma {
        if self.data.is_some() {
            return Sigma::NOW;
        }
        self.grant_due.map_or(Sigma::Passive, |(_, sigma)| sigma)
    }

    fn internal(&mut self) {
        if self.grant_fires() {
            self.grant_due = None;
        }
        self.data = None;
    }

    fn external(&mut self, elapsed: Time, inputs: &Inputs<'_, Signal>) {
        if let Some((_, sigma)) = self.grant_due.as_mut() {
            *sigma = sigma.elapse(elapsed);
        }

        if matches!(inputs.get(RELEASE), Some(Signal::Release)) {
            log::debug!("BUS: released by {:?}", self.holder);
            self.holder = None;
        }

        if let Some(Signal::Claim(requester)) = inputs.get(CLAIM) {
            match self.holder {
                None => {
                    self.holder = Some(*requester);
                    self.grant_due = Some((*requester, Sigma::After(GRANT_LATENCY)));
                }
                Some(holder) => {
                    log::warn!("BUS: claim by {requester:?} ignored, held by {holder:?}");
                }
            }
        }

        if let Some(byte) = inputs.get(DATA_IN).and_then(Signal::byte) {
            self.data = Some(byte);
        }
    }

    fn output(&self, outputs: &mut Outputs<Signal>) {
        if let Some(byte) = self.data {
            outputs.emit(DATA_OUT, Signal::Byte(byte));
        }
        if let (true, Some((requester, _))) = (self.grant_fires(), self.grant_due) {
            outputs.emit(GRANT, Signal::Grant(requester));
        }
    }
}
