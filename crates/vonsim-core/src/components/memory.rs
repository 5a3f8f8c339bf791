//! Byte-addressable main memory.

use devs_kernel::{Atomic, Inputs, Outputs, Sigma, Time};

use crate::signal::{MemoryAccess, Signal};

/// Total addressable bytes (one 8-bit address space).
pub const ADDRESS_SPACE_BYTES: usize = u8::MAX as usize + 1;
/// Cycles between a complete request and its result.
pub const ACCESS_LATENCY: Time = 1;

/// Address from the MAR.
pub const ADDR: &str = "addr";
/// Access direction.
pub const ACCESS: &str = "access";
/// Byte to store on a write.
pub const DATA_IN: &str = "data_in";
/// Byte read.
pub const DATA_OUT: &str = "data_out";

/// Allocates a zeroed address space.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}

/// 256-byte store answering one access at a time after [`ACCESS_LATENCY`].
///
/// Address and direction may arrive in separate deliveries; each is buffered
/// until the other shows up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    image: Vec<(u8, u8)>,
    storage: Box<[u8]>,
    address: Option<u8>,
    access: Option<MemoryAccess>,
    data: Option<u8>,
    in_flight: Option<(MemoryAccess, u8)>,
    sigma: Sigma,
}

impl Memory {
    /// Instance name in the system topology.
    pub const NAME: &'static str = "MEM";

    /// Creates a memory preloaded with `(address, byte)` pairs on every initialization.
    #[must_use]
    pub fn new(image: impl IntoIterator<Item = (u8, u8)>) -> Self {
        let image: Vec<_> = image.into_iter().collect();
        Self {
            storage: Self::load(&image),
            image,
            address: None,
            access: None,
            data: None,
            in_flight: None,
            sigma: Sigma::Passive,
        }
    }

    fn load(image: &[(u8, u8)]) -> Box<[u8]> {
        let mut storage = new_address_space();
        for &(address, byte) in image {
            storage[usize::from(address)] = byte;
        }
        storage
    }

    /// Byte stored at `address`, bypassing the access protocol.
    #[must_use]
    pub fn peek(&self, address: u8) -> u8 {
        self.storage[usize::from(address)]
    }

    /// Whole backing store.
    #[must_use]
    pub fn storage(&self) -> &[u8] {
        &self.storage
    }

    fn try_start(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        if let (Some(address), Some(access)) = (self.address, self.access) {
            self.address = None;
            self.access = None;
            self.in_flight = Some((access, address));
            self.sigma = Sigma::After(ACCESS_LATENCY);
            log::debug!("MEM: {access:?} at {address:02X}");
        }
    }
}

impl Atomic<Signal> for Memory {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &[ADDR, ACCESS, DATA_IN]
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &[DATA_OUT]
    }

    fn initialize(&mut self) {
        self.storage = Self::load(&self.image);
        self.address = None;
        self.access = None;
        self.data = None;
        self.in_flight = None;
        self.sigma = Sigma::Passive;
    }

    fn time_advance(&self) -> Sigma {
        self.sigma
    }

    fn internal(&mut self) {
        if let Some((MemoryAccess::Write, address)) = self.in_flight {
            match self.data.take() {
                Some(byte) => self.storage[usize::from(address)] = byte,
                None => log::warn!("MEM: write at {address:02X} with no data staged, ignored"),
            }
        }
        self.in_flight = None;
        self.sigma = Sigma::Passive;
        self.try_start();
    }

    fn external(&mut self, elapsed: Time, inputs: &Inputs<'_, Signal>) {
        self.sigma = self.sigma.elapse(elapsed);
        if let Some(address) = inputs.get(ADDR).and_then(Signal::byte) {
            self.address = Some(address);
        }
        if let Some(access) = inputs.get(ACCESS).and_then(Signal::access) {
            self.access = Some(access);
        }
        if let Some(byte) = inputs.get(DATA_IN).and_then(Signal::byte) {
            self.data = Some(byte);
        }
        self.try_start();
    }

    fn output(&self, outputs: &mut Outputs<Signal>) {
        if let Some((MemoryAccess::Read, address)) = self.in_flight {
            outputs.emit(DATA_OUT, Signal::Byte(self.peek(address)));
        }
    }
}
