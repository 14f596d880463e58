//! adv/checksum — магические сигнатуры и 32-байтовый SHA-256 дайджест записи.
//!
//! - buf[0..4]                        — MAGIC1 (BE);
//! - buf[RECORD_LENGTH-36..-4]        — SHA-256 по всей записи с занулённым полем дайджеста;
//! - buf[RECORD_LENGTH-4..]           — MAGIC2 (BE).
//!
//! Все функции принимают только буфер длины RECORD_LENGTH; другой размер —
//! ошибка (или false для verify_*), без выхода за границы.

use byteorder::{BigEndian, ByteOrder};
use sha2::{Digest, Sha256};

use crate::consts::{CHECKSUM_LEN, MAGIC1, MAGIC2, OFF_CHECKSUM, OFF_MAGIC2, RECORD_LENGTH};
use crate::error::AdvError;

#[inline]
fn check_len(buf: &[u8]) -> Result<(), AdvError> {
    if buf.len() != RECORD_LENGTH {
        return Err(AdvError::BadLength {
            expected: RECORD_LENGTH,
            got: buf.len(),
        });
    }
    Ok(())
}

#[inline]
fn zero_checksum_field(buf: &mut [u8]) {
    buf[OFF_CHECKSUM..OFF_CHECKSUM + CHECKSUM_LEN].fill(0);
}

// ---------- Magics ----------

/// Проверить обе сигнатуры. Magic1 проверяется первым.
pub fn check_magics(buf: &[u8]) -> Result<(), AdvError> {
    check_len(buf)?;
    let m1 = BigEndian::read_u32(&buf[0..4]);
    if m1 != MAGIC1 {
        return Err(AdvError::BadMagic1(m1));
    }
    let m2 = BigEndian::read_u32(&buf[OFF_MAGIC2..]);
    if m2 != MAGIC2 {
        return Err(AdvError::BadMagic2(m2));
    }
    Ok(())
}

pub fn verify_magics(buf: &[u8]) -> bool {
    check_magics(buf).is_ok()
}

pub fn write_magics(buf: &mut [u8]) -> Result<(), AdvError> {
    check_len(buf)?;
    BigEndian::write_u32(&mut buf[0..4], MAGIC1);
    BigEndian::write_u32(&mut buf[OFF_MAGIC2..], MAGIC2);
    Ok(())
}

// ---------- SHA-256 ----------

/// SHA-256 по всему буферу. Поле дайджеста должно быть уже занулено вызывающим.
pub fn compute_checksum(buf: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(buf);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Прочитать сохранённый дайджест (как есть).
pub fn stored_checksum(buf: &[u8]) -> Result<[u8; CHECKSUM_LEN], AdvError> {
    check_len(buf)?;
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&buf[OFF_CHECKSUM..OFF_CHECKSUM + CHECKSUM_LEN]);
    Ok(out)
}

/// Занулить поле, посчитать SHA-256 и записать его на место.
pub fn update_checksum(buf: &mut [u8]) -> Result<(), AdvError> {
    check_len(buf)?;
    zero_checksum_field(buf);
    let digest = compute_checksum(buf);
    buf[OFF_CHECKSUM..OFF_CHECKSUM + CHECKSUM_LEN].copy_from_slice(&digest);
    Ok(())
}

/// Проверить дайджест на рабочей копии (исходный буфер не меняется).
pub fn check_checksum(buf: &[u8]) -> Result<(), AdvError> {
    let stored = stored_checksum(buf)?;
    let mut copy = buf.to_vec();
    zero_checksum_field(&mut copy);
    if compute_checksum(&copy) != stored {
        return Err(AdvError::BadChecksum);
    }
    Ok(())
}

pub fn verify_checksum(buf: &[u8]) -> bool {
    check_checksum(buf).is_ok()
}
