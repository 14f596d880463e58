// tests/roundtrip.rs
//
// decode(encode(m)) == m для случайных карт тегов в пределах бюджета,
// плюс проверка, что encode детерминирован для одной и той же карты,
// независимо от порядка вставки.

use anyhow::Result;
use oorandom::Rand64;

use advault::adv::{decode_tags, TagMap};
use advault::consts::{DATA_LENGTH, OFF_TAGS, RECORD_LENGTH, TAGS_END};
use advault::Adv;

fn random_map(rng: &mut Rand64, budget: usize) -> TagMap {
    let mut map = TagMap::new();
    let mut used = 20usize;
    let count = rng.rand_range(0..40) as usize;
    for _ in 0..count {
        let tag = rng.rand_range(0..256) as u8;
        let len = match rng.rand_range(0..10) {
            0 => 0,
            1 => rng.rand_range(4096..32768) as usize,
            _ => rng.rand_range(1..512) as usize,
        };
        // (0, пусто) зарезервировано под паддинг
        if tag == 0 && len == 0 {
            continue;
        }
        let replaced = map.get(&tag).map(|v| 8 + v.len()).unwrap_or(0);
        if used - replaced + 8 + len > budget {
            continue;
        }
        let value: Vec<u8> = (0..len).map(|_| rng.rand_u64() as u8).collect();
        used = used - replaced + 8 + len;
        map.insert(tag, value);
    }
    map
}

#[test]
fn random_maps_roundtrip() -> Result<()> {
    for seed in [1u128, 7, 42, 0xADF, 0xC0FFEE] {
        let mut rng = Rand64::new(seed);
        let map = random_map(&mut rng, DATA_LENGTH);

        let adv = Adv::new();
        for (tag, v) in &map {
            assert!(adv.set_tag(*tag, v.clone()), "seed {seed}: tag {tag} must fit");
        }

        let image = adv.encode()?;
        assert_eq!(image.len(), RECORD_LENGTH);

        let back = Adv::decode(&image)?;
        assert_eq!(back.tags(), map, "seed {seed}: roundtrip mismatch");

        // регион напрямую тоже разбирается в ту же карту
        assert_eq!(decode_tags(&image[OFF_TAGS..TAGS_END])?, map);
    }
    Ok(())
}

#[test]
fn insertion_order_does_not_change_image() -> Result<()> {
    let a = Adv::new();
    a.set_tag(3, b"three".to_vec());
    a.set_tag(1, b"one".to_vec());
    a.set_tag(2, b"two".to_vec());

    let b = Adv::new();
    b.set_tag(2, b"two".to_vec());
    b.set_tag(1, b"uno".to_vec());
    b.set_tag(3, b"three".to_vec());
    b.set_tag(1, b"one".to_vec());

    assert_eq!(a.encode()?, b.encode()?);
    Ok(())
}

#[test]
fn full_budget_record_roundtrips() -> Result<()> {
    // Несколько тегов, суммарно ровно DATA_LENGTH
    let adv = Adv::new();
    let first = 1000usize;
    assert!(adv.set_tag(1, vec![0x11; first]));
    let rest = DATA_LENGTH - 20 - (8 + first) - 8;
    assert!(adv.set_tag(2, vec![0x22; rest]));
    assert_eq!(adv.usage(), DATA_LENGTH);
    assert!(!adv.set_tag(3, Vec::new()));

    let back = Adv::decode(&adv.encode()?)?;
    assert_eq!(back.tags(), adv.tags());
    Ok(())
}
