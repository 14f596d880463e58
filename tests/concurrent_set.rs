// tests/concurrent_set.rs
//
// Конкурентные set_tag: каждое значение по отдельности влезает, все вместе — нет.
// Должно зафиксироваться ровно то подмножество, которое помещается в бюджет.

use anyhow::Result;
use std::sync::{Arc, Barrier};
use std::thread;

use advault::consts::{DATA_LENGTH, FIXED_OVERHEAD, TAG_HDR_LEN};
use advault::Adv;

#[test]
fn concurrent_growers_never_overflow() -> Result<()> {
    const THREADS: usize = 8;
    const FIT: usize = 3;
    // ровно FIT записей помещаются, FIT+1 — уже нет
    let value_len = (DATA_LENGTH - FIXED_OVERHEAD) / FIT - TAG_HDR_LEN;

    for round in 0..4 {
        let adv = Arc::new(Adv::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let adv = Arc::clone(&adv);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let tag = 0x10 + i as u8;
                    barrier.wait();
                    (tag, adv.set_tag(tag, vec![tag; value_len]))
                })
            })
            .collect();

        let mut committed = Vec::new();
        for h in handles {
            let (tag, ok) = h.join().expect("worker panicked");
            if ok {
                committed.push(tag);
            }
        }

        assert_eq!(committed.len(), FIT, "round {round}: {committed:?}");
        assert!(adv.usage() <= DATA_LENGTH);

        let tags = adv.tags();
        assert_eq!(tags.len(), FIT);
        for tag in &committed {
            let v = &tags[tag];
            assert_eq!(v.len(), value_len);
            assert!(v.iter().all(|b| b == tag), "round {round}: tag {tag:#x} corrupted");
        }

        let back = Adv::decode(&adv.encode()?)?;
        assert_eq!(back.tags(), tags);
    }
    Ok(())
}

#[test]
fn concurrent_small_sets_all_commit() {
    let adv = Arc::new(Adv::new());
    let handles: Vec<_> = (0..16u8)
        .map(|i| {
            let adv = Arc::clone(&adv);
            thread::spawn(move || {
                for j in 0..16u8 {
                    assert!(adv.set_tag(i * 16 + j, vec![i ^ j; 64]));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker panicked");
    }
    assert_eq!(adv.len(), 256);
    assert_eq!(adv.get_tag(0xFF), Some(vec![0x0F ^ 0x0F; 64]));
}
