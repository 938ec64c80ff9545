#![no_main]

use libfuzzer_sys::fuzz_target;

use bucket_arena::{Arena, Handle};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // First two bytes pick the bucket size, kept small so buckets overflow often
    let bucket = usize::from(u16::from_le_bytes([data[0], data[1]]) % 512);
    let arena = Arena::new(bucket);

    let mut live: Vec<(Handle<u32>, u32)> = Vec::new();
    let mut stale: Vec<Handle<u32>> = Vec::new();
    for (i, &op) in data[2..].iter().enumerate() {
        match op % 8 {
            0 => arena.reset(),
            1 => {
                arena.clear();
                stale.extend(live.drain(..).map(|(h, _)| h));
            }
            _ => {
                let value = i as u32;
                if let Ok(handle) = arena.allocate_with(value) {
                    live.push((handle, value));
                }
            }
        }
        assert_eq!(
            arena.total_mem_bytes(),
            arena.bucket_size_bytes() * arena.num_buckets()
        );
    }

    for handle in &stale {
        assert!(handle.resolve().is_none());
    }
    for (handle, _) in &live {
        assert!(handle.resolve().is_some());
    }
});
