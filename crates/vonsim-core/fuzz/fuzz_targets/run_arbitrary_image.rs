#![no_main]

use libfuzzer_sys::fuzz_target;
use vonsim_core::{DecodeTable, Mnemonic, RegisterId, SystemConfig, VonSim8};

fuzz_target!(|data: &[u8]| {
    if data.len() < 7 {
        return;
    }

    let dest = RegisterId::from_index(usize::from(data[2] % 4)).unwrap_or(RegisterId::AL);
    let src = RegisterId::from_index(usize::from(data[3] % 4)).unwrap_or(RegisterId::BL);
    let mut config = SystemConfig {
        registers: [data[4], data[5], data[6], data[0]],
        ip: data[0],
        memory: Vec::new(),
        decode: DecodeTable::empty().with(data[1], Mnemonic::Mov, dest, src),
        ..SystemConfig::default()
    };
    for pair in data[7..].chunks_exact(2) {
        config.poke(pair[0], pair[1]);
    }

    let Ok(mut system) = VonSim8::new(config) else {
        return;
    };
    let report = system.run().expect("single instruction settles within budget");
    assert_eq!(report.snapshot.cycles.total, 14);
    assert_eq!(report.snapshot.ip, data[0].wrapping_add(1));
});
