//! adv/tags — TLV-регион записи ADV.
//!
//! Формат одной записи (BE):
//! [tag u32][len u32][value; len]
//!
//! - tag занимает младший байт 4-байтового поля, старшие 3 байта пишутся нулями
//!   и игнорируются при чтении;
//! - терминатора нет: разбор заканчивается, когда осталось < 8 байт или
//!   встретился нулевой заголовок (tag=0, len=0): это начало паддинга;
//! - поэтому пара (0, пустое значение) зарезервирована и в запись не попадает;
//! - дубликаты тегов: побеждает последний (tail-wins по физическому порядку).
//!
//! Порядок записи при encode — по возрастанию id тега (BTreeMap), поэтому
//! одинаковая карта всегда даёт одинаковые байты и одинаковый дайджест.

use std::collections::BTreeMap;

use byteorder::{BigEndian, ByteOrder};

use crate::consts::{FIXED_OVERHEAD, TAG_HDR_LEN};
use crate::error::AdvError;

/// Карта тегов записи.
pub type TagMap = BTreeMap<u8, Vec<u8>>;

/// Место, занимаемое одной записью в регионе.
#[inline]
pub fn entry_len(value: &[u8]) -> usize {
    TAG_HDR_LEN + value.len()
}

/// Учётный размер карты для проверки ёмкости: FIXED_OVERHEAD + Σ entry_len.
pub fn usage(map: &TagMap) -> usize {
    FIXED_OVERHEAD + map.values().map(|v| entry_len(v)).sum::<usize>()
}

/// Учётный размер карты после гипотетической установки `tag = value`.
/// Старое значение того же тега не учитывается.
pub fn usage_with(map: &TagMap, tag: u8, value: &[u8]) -> usize {
    let replaced = map.get(&tag).map(|v| entry_len(v)).unwrap_or(0);
    usage(map) - replaced + entry_len(value)
}

/// Пара (0, пусто) неотличима от нулевого паддинга.
#[inline]
pub fn is_reserved(tag: u8, value: &[u8]) -> bool {
    tag == 0 && value.is_empty()
}

/// Разобрать TLV-регион.
pub fn decode_tags(region: &[u8]) -> Result<TagMap, AdvError> {
    let mut out = TagMap::new();
    let mut off = 0usize;

    while region.len() - off >= TAG_HDR_LEN {
        let hdr = &region[off..off + TAG_HDR_LEN];
        if hdr.iter().all(|&b| b == 0) {
            break;
        }
        // id — младший байт поля tag; верхние 3 байта не проверяем
        let tag = hdr[3];
        let len = BigEndian::read_u32(&hdr[4..8]) as usize;

        let remaining = region.len() - off - TAG_HDR_LEN;
        if len > remaining {
            return Err(AdvError::ValueOverflow {
                offset: off,
                len,
                remaining,
            });
        }

        let base = off + TAG_HDR_LEN;
        out.insert(tag, region[base..base + len].to_vec());
        off = base + len;
    }

    Ok(out)
}

/// Записать карту в регион, начиная со смещения 0. Регион должен быть занулён
/// вызывающим (хвост не трогаем). Возвращает число занятых байт.
pub fn encode_tags(map: &TagMap, region: &mut [u8]) -> Result<usize, AdvError> {
    let need: usize = map.values().map(|v| entry_len(v)).sum();
    if need > region.len() {
        return Err(AdvError::Invariant(format!(
            "tags need {} bytes, region holds {}",
            need,
            region.len()
        )));
    }

    if let Some(v) = map.get(&0) {
        if is_reserved(0, v) {
            return Err(AdvError::Invariant(
                "tag 0 with an empty value would read back as padding".to_string(),
            ));
        }
    }

    let mut off = 0usize;
    for (&tag, value) in map {
        BigEndian::write_u32(&mut region[off..off + 4], tag as u32);
        BigEndian::write_u32(&mut region[off + 4..off + 8], value.len() as u32);
        let base = off + TAG_HDR_LEN;
        region[base..base + value.len()].copy_from_slice(value);
        off = base + value.len();
    }
    Ok(off)
}
