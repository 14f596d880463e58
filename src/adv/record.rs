//! adv/record — модель записи ADV: карта тегов + decode/encode.
//!
//! Жизненный цикл:
//! - load(None) или невалидный образ → пустая запись (не ошибка, лог info);
//! - короткое чтение существующего источника → I/O ошибка (фатально);
//! - set_tag: проверка ёмкости и вставка под одним Mutex;
//! - encode: magic1 + теги + magic2 + SHA-256, ровно RECORD_LENGTH байт.

use std::io::Read;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use super::checksum::{check_checksum, check_magics, update_checksum, write_magics};
use super::tags::{decode_tags, encode_tags, is_reserved, usage, usage_with, TagMap};
use crate::consts::{DATA_LENGTH, OFF_TAGS, RECORD_LENGTH, TAGS_END};
use crate::error::AdvError;
use crate::metrics::{
    record_capacity_rejection, record_invalid, record_loaded, record_tag_set,
};

/// Результат чтения образа с устройства.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Образ прошёл все проверки.
    Valid,
    /// Источника нет (устройство ещё не инициализировано).
    Absent,
    /// Неверный magic: пустое или чужое устройство.
    Foreign,
    /// Magic на месте, но дайджест или TLV повреждены.
    Corrupt,
}

impl LoadStatus {
    pub fn is_valid(self) -> bool {
        self == LoadStatus::Valid
    }

    pub(crate) fn from_error(e: &AdvError) -> Self {
        if e.is_foreign() {
            LoadStatus::Foreign
        } else {
            LoadStatus::Corrupt
        }
    }
}

/// Auxiliary Data Vault record.
///
/// `set_tag`/`try_set_tag` are safe to call concurrently through `&Adv`.
/// Other operations are meant for a single owner.
#[derive(Debug, Default)]
pub struct Adv {
    tags: Mutex<TagMap>,
}

impl Clone for Adv {
    fn clone(&self) -> Self {
        Adv::from_tags(self.tags())
    }
}

impl Adv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tags(tags: TagMap) -> Self {
        Self {
            tags: Mutex::new(tags),
        }
    }

    // Отравленный Mutex не страшен: карта меняется одной вставкой.
    fn guard(&self) -> MutexGuard<'_, TagMap> {
        self.tags.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ---------------- Load / decode ----------------

    /// Прочитать запись из источника. Невалидный образ даёт пустую запись.
    pub fn load<R: Read>(source: Option<R>) -> Result<Self> {
        Ok(Self::load_with_status(source)?.0)
    }

    /// То же, что load, но сообщает, что именно найдено на источнике.
    pub fn load_with_status<R: Read>(source: Option<R>) -> Result<(Self, LoadStatus)> {
        let mut r = match source {
            Some(r) => r,
            None => {
                debug!("adv load: no source, starting with an empty record");
                return Ok((Self::new(), LoadStatus::Absent));
            }
        };

        let mut buf = vec![0u8; RECORD_LENGTH];
        r.read_exact(&mut buf)
            .with_context(|| format!("read {} bytes of adv record", RECORD_LENGTH))?;

        Ok(Self::from_image(&buf))
    }

    /// Разобрать уже прочитанный образ; ошибки валидации сворачиваются в пустую запись.
    pub fn from_image(buf: &[u8]) -> (Self, LoadStatus) {
        match Self::decode(buf) {
            Ok(adv) => {
                record_loaded();
                debug!("adv load: valid record with {} tag(s)", adv.len());
                (adv, LoadStatus::Valid)
            }
            Err(e) => {
                record_invalid();
                let status = LoadStatus::from_error(&e);
                info!(
                    "adv does not contain a valid record ({}): initializing a new ADV",
                    e
                );
                (Self::new(), status)
            }
        }
    }

    /// Строгий разбор образа: magic1, magic2, checksum, затем TLV.
    pub fn decode(buf: &[u8]) -> Result<Self, AdvError> {
        check_magics(buf)?;
        check_checksum(buf)?;
        let tags = decode_tags(&buf[OFF_TAGS..TAGS_END])?;
        Ok(Self::from_tags(tags))
    }

    // ---------------- Tags ----------------

    /// Установить тег, если запись останется в пределах DATA_LENGTH.
    /// false: места не хватило (или пара зарезервирована), карта не изменилась.
    pub fn set_tag(&self, tag: u8, value: impl Into<Vec<u8>>) -> bool {
        self.try_set_tag(tag, value).is_ok()
    }

    pub fn try_set_tag(&self, tag: u8, value: impl Into<Vec<u8>>) -> Result<(), AdvError> {
        let value = value.into();
        if is_reserved(tag, &value) {
            return Err(AdvError::ReservedTag);
        }
        let mut tags = self.guard();

        let need = usage_with(&tags, tag, &value);
        if need > DATA_LENGTH {
            record_capacity_rejection();
            debug!(
                "adv set_tag {:#04x}: {} bytes rejected (usage would be {}, limit {})",
                tag,
                value.len(),
                need,
                DATA_LENGTH
            );
            return Err(AdvError::Capacity {
                need,
                avail: DATA_LENGTH,
            });
        }

        tags.insert(tag, value);
        record_tag_set();
        Ok(())
    }

    pub fn get_tag(&self, tag: u8) -> Option<Vec<u8>> {
        self.guard().get(&tag).cloned()
    }

    pub fn remove_tag(&self, tag: u8) -> Option<Vec<u8>> {
        self.guard().remove(&tag)
    }

    /// Снимок карты тегов.
    pub fn tags(&self) -> TagMap {
        self.guard().clone()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Учётный размер (FIXED_OVERHEAD + заголовки + значения).
    pub fn usage(&self) -> usize {
        usage(&self.guard())
    }

    // ---------------- Encode ----------------

    /// Собрать образ ровно RECORD_LENGTH байт.
    pub fn encode(&self) -> Result<Vec<u8>, AdvError> {
        let tags = self.guard();

        let total = usage(&tags);
        if total > DATA_LENGTH {
            return Err(AdvError::Invariant(format!(
                "record usage {} exceeds budget {}",
                total, DATA_LENGTH
            )));
        }

        let mut buf = vec![0u8; RECORD_LENGTH];
        write_magics(&mut buf)?;
        let used = encode_tags(&tags, &mut buf[OFF_TAGS..TAGS_END])?;
        update_checksum(&mut buf)?;

        debug!("adv encode: {} tag(s), {} region bytes", tags.len(), used);
        Ok(buf)
    }
}
