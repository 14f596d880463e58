// tests/rejection.rs
//
// Невалидные образы: неверные magic, порченый дайджест, обрезанный TLV.
// Во всех случаях load даёт пустую запись, а не ошибку.

use anyhow::Result;
use byteorder::{BigEndian, ByteOrder};
use oorandom::Rand64;
use std::io::Cursor;

use advault::adv::{update_checksum, write_magics};
use advault::consts::{CONFIG_TAG, OFF_TAGS, RECORD_LENGTH, TAGS_END};
use advault::{Adv, AdvError, LoadStatus};

fn valid_image() -> Result<Vec<u8>> {
    let adv = Adv::new();
    assert!(adv.set_tag(CONFIG_TAG, b"network:\n  mtu: 9000\n".to_vec()));
    assert!(adv.set_tag(0x01, vec![0x5A; 4096]));
    Ok(adv.encode()?)
}

fn load(image: Vec<u8>) -> Result<(Adv, LoadStatus)> {
    Adv::load_with_status(Some(Cursor::new(image)))
}

#[test]
fn any_magic_bit_flip_yields_empty_record() -> Result<()> {
    let image = valid_image()?;
    let magic_bytes = (0..4).chain(RECORD_LENGTH - 4..RECORD_LENGTH);

    for byte in magic_bytes {
        for bit in 0..8 {
            let mut img = image.clone();
            img[byte] ^= 1 << bit;

            let err = Adv::decode(&img).unwrap_err();
            assert!(err.is_foreign(), "byte {byte} bit {bit}: {err}");

            let (adv, st) = load(img)?;
            assert!(adv.is_empty());
            assert_eq!(st, LoadStatus::Foreign);
        }
    }
    Ok(())
}

#[test]
fn tag_region_mutation_yields_empty_record() -> Result<()> {
    let image = valid_image()?;
    let mut rng = Rand64::new(0xBAD);

    for _ in 0..32 {
        let pos = rng.rand_range(OFF_TAGS as u64..TAGS_END as u64) as usize;
        let mut img = image.clone();
        img[pos] = img[pos].wrapping_add(1 + (rng.rand_u64() % 255) as u8);

        assert_eq!(Adv::decode(&img).unwrap_err(), AdvError::BadChecksum, "pos {pos}");
        let (adv, st) = load(img)?;
        assert!(adv.is_empty());
        assert_eq!(st, LoadStatus::Corrupt);
    }
    Ok(())
}

#[test]
fn truncated_tlv_with_valid_checksum_is_rejected() -> Result<()> {
    // Корректные magic и дайджест, но вторая запись заявляет длину больше остатка.
    let mut img = vec![0u8; RECORD_LENGTH];
    write_magics(&mut img)?;

    let region_len = TAGS_END - OFF_TAGS;
    let mut at = OFF_TAGS;
    BigEndian::write_u32(&mut img[at..at + 4], 1);
    BigEndian::write_u32(&mut img[at + 4..at + 8], 3);
    img[at + 8..at + 11].copy_from_slice(b"abc");
    at += 11;
    let remaining = region_len - 11 - 8;
    BigEndian::write_u32(&mut img[at..at + 4], 7);
    BigEndian::write_u32(&mut img[at + 4..at + 8], (remaining + 1) as u32);
    update_checksum(&mut img)?;

    match Adv::decode(&img) {
        Err(AdvError::ValueOverflow { offset, len, remaining: left }) => {
            assert_eq!(offset, 11);
            assert_eq!(len, remaining + 1);
            assert_eq!(left, remaining);
        }
        other => panic!("expected ValueOverflow, got {:?}", other.map(|a| a.tags())),
    }

    let (adv, st) = load(img)?;
    assert!(adv.is_empty());
    assert_eq!(st, LoadStatus::Corrupt);
    Ok(())
}

#[test]
fn oversized_length_field_never_panics() -> Result<()> {
    let mut img = vec![0u8; RECORD_LENGTH];
    write_magics(&mut img)?;
    BigEndian::write_u32(&mut img[OFF_TAGS + 4..OFF_TAGS + 8], u32::MAX);
    update_checksum(&mut img)?;

    assert!(matches!(Adv::decode(&img), Err(AdvError::ValueOverflow { .. })));
    Ok(())
}

#[test]
fn short_source_is_io_error_not_empty() {
    let err = Adv::load(Some(Cursor::new(vec![0u8; 1024]))).unwrap_err();
    let msg = format!("{:#}", err).to_ascii_lowercase();
    assert!(msg.contains("read"), "unexpected error: {msg}");
}
