//! Transition-trace fingerprint of the canonical run, for cross-host comparison.

use std::cell::RefCell;
use std::rc::Rc;

use devs_kernel::{TransitionEvent, TransitionKind};
use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use vonsim_core::VonSim8;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let mut system = VonSim8::canonical().expect("canonical wiring");
    let hash = Rc::new(RefCell::new(0xcbf2_9ce4_8422_2325_u64));
    let sink = Rc::clone(&hash);
    system.set_observer(move |event: &TransitionEvent<'_>| {
        let mut hash = sink.borrow_mut();
        hash_bytes(&mut hash, &event.time.to_le_bytes());
        hash_bytes(&mut hash, event.component.as_bytes());
        let tag = match event.kind {
            TransitionKind::Internal => 0x10,
            TransitionKind::External => 0x11,
            TransitionKind::Confluent => 0x12,
        };
        hash_bytes(&mut hash, &[tag]);
    });

    let report = system.run().expect("canonical run settles");
    let mut hash = *hash.borrow();
    hash_bytes(&mut hash, &report.summary.steps.to_le_bytes());
    hash_bytes(&mut hash, &report.snapshot.registers);
    hash_bytes(&mut hash, &[report.snapshot.ip, report.snapshot.ir]);
    hash_bytes(&mut hash, &report.snapshot.cycles.total.to_le_bytes());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
