// tests/metrics.rs
//
// Один тест на бинарник: глобальные счётчики не делятся с параллельными тестами.

use anyhow::Result;
use std::io::Cursor;

use advault::consts::{DATA_LENGTH, RECORD_LENGTH};
use advault::metrics;
use advault::Adv;

#[test]
fn counters_follow_load_set_and_reject() -> Result<()> {
    metrics::reset();

    let adv = Adv::new();
    assert!(adv.set_tag(1, b"a".to_vec()));
    assert!(!adv.set_tag(2, vec![0u8; DATA_LENGTH]));

    let image = adv.encode()?;
    let _ = Adv::load(Some(Cursor::new(image)))?;
    let _ = Adv::load(Some(Cursor::new(vec![0u8; RECORD_LENGTH])))?;

    let m = metrics::snapshot();
    assert_eq!(m.tags_set, 1);
    assert_eq!(m.capacity_rejections, 1);
    assert_eq!(m.records_loaded, 1);
    assert_eq!(m.records_invalid, 1);
    assert!((m.invalid_ratio() - 0.5).abs() < f64::EPSILON);
    Ok(())
}
