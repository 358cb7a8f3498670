#![no_main]

use libfuzzer_sys::fuzz_target;

use fieldnode_wire::{decode, encode, FrameAssembler};

fuzz_target!(|data: &[u8]| {
    // Direct decode must never panic
    if let Ok(envelope) = decode(data) {
        // Whatever decodes must survive a re-encode
        let again = decode(&encode(&envelope));
        assert!(again.is_ok());
    }

    // Same bytes as a stream, split at an input-derived point
    let cut = data.first().map(|b| *b as usize % (data.len() + 1)).unwrap_or(0);
    let mut asm = FrameAssembler::new(1024);
    for chunk in [&data[..cut], &data[cut..]] {
        asm.push(chunk);
        while let Some(frame) = asm.next_frame() {
            if let Ok(bytes) = frame {
                let _ = decode(&bytes);
            }
        }
    }
    let _ = asm.end_of_message();
});
