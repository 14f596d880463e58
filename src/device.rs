//! device — физическое размещение записи ADV на устройстве (или в файле-образе).
//!
//! Раскладка:
//! - [0 .. RECORD_LENGTH)                 — основная копия;
//! - [RECORD_LENGTH .. 2*RECORD_LENGTH)   — зеркальная копия (те же байты).
//!
//! Политика:
//! - Чтение и запись — два явных открытия (read-only / read-write), не один хэндл.
//! - Обе записи идут по явным смещениям; курсор файла не используется.
//! - Копии не связаны транзакционно: падение между записями может оставить их
//!   разными. inspect() показывает такое состояние, load_from_device() умеет
//!   прочитать зеркало, если основная копия не проходит проверку.

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use crate::adv::{Adv, LoadStatus};
use crate::config::AdvConfig;
use crate::consts::{MIRROR_OFFSET, PRIMARY_OFFSET, RECORD_LENGTH};
use crate::metrics::{record_mirror_fallback, record_persisted};

// ---------------- Primitive I/O ----------------

// pread/pwrite: позиция курсора не меняется, хэндл можно делить по &File

#[cfg(unix)]
pub fn read_at(f: &File, offset: u64, buf: &mut [u8]) -> Result<()> {
    use std::os::unix::fs::FileExt;
    f.read_exact_at(buf, offset)
        .with_context(|| format!("read {} bytes at offset {}", buf.len(), offset))
}

#[cfg(unix)]
pub fn write_at(f: &File, offset: u64, buf: &[u8]) -> Result<()> {
    use std::os::unix::fs::FileExt;
    f.write_all_at(buf, offset)
        .with_context(|| format!("write {} bytes at offset {}", buf.len(), offset))
}

#[cfg(not(unix))]
pub fn read_at(mut f: &File, offset: u64, buf: &mut [u8]) -> Result<()> {
    use std::io::{Read, Seek, SeekFrom};
    f.seek(SeekFrom::Start(offset))?;
    f.read_exact(buf)
        .with_context(|| format!("read {} bytes at offset {}", buf.len(), offset))
}

#[cfg(not(unix))]
pub fn write_at(mut f: &File, offset: u64, buf: &[u8]) -> Result<()> {
    use std::io::{Seek, SeekFrom, Write};
    f.seek(SeekFrom::Start(offset))?;
    f.write_all(buf)
        .with_context(|| format!("write {} bytes at offset {}", buf.len(), offset))
}

/// Открыть устройство на чтение. Ok(None) — пути нет (устройство не инициализировано).
pub fn open_for_read(path: &Path) -> Result<Option<File>> {
    match OpenOptions::new().read(true).open(path) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("open_for_read: {} not found", path.display());
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("open {} for read", path.display())),
    }
}

/// Открыть устройство на запись (read-write, без create/truncate).
pub fn open_for_write(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("open {} for write", path.display()))
}

// ---------------- Load ----------------

/// Прочитать запись с устройства с настройками из окружения.
pub fn load_from_device(path: &Path) -> Result<(Adv, LoadStatus)> {
    load_from_device_with_config(path, &AdvConfig::from_env())
}

/// Прочитать основную копию; если она невалидна и разрешён fallback — зеркало.
/// Короткое чтение основной копии — ошибка; отсутствие зеркала — нет.
pub fn load_from_device_with_config(path: &Path, cfg: &AdvConfig) -> Result<(Adv, LoadStatus)> {
    let mut f = match open_for_read(path)? {
        Some(f) => f,
        None => return Adv::load_with_status::<File>(None),
    };

    let (adv, status) = Adv::load_with_status(Some(&mut f))
        .with_context(|| format!("load adv from {}", path.display()))?;
    if status.is_valid() || !cfg.mirror_fallback {
        return Ok((adv, status));
    }

    let mut buf = vec![0u8; RECORD_LENGTH];
    if let Err(e) = read_at(&f, MIRROR_OFFSET, &mut buf) {
        debug!("load_from_device: no mirror copy on {}: {}", path.display(), e);
        return Ok((adv, status));
    }

    match Adv::decode(&buf) {
        Ok(mirror) => {
            record_mirror_fallback();
            warn!(
                "primary adv copy on {} is {:?}, using mirror copy at offset {}",
                path.display(),
                status,
                MIRROR_OFFSET
            );
            Ok((mirror, LoadStatus::Valid))
        }
        Err(e) => {
            debug!("load_from_device: mirror copy is invalid too: {}", e);
            Ok((adv, status))
        }
    }
}

// ---------------- Persist ----------------

/// Закодировать запись и записать обе копии (настройки из окружения).
pub fn persist(adv: &Adv, path: &Path) -> Result<()> {
    persist_with_config(adv, path, &AdvConfig::from_env())
}

pub fn persist_with_config(adv: &Adv, path: &Path, cfg: &AdvConfig) -> Result<()> {
    // encode до open: при ошибке кодирования устройство не трогаем
    let image = adv.encode().context("encode adv record")?;
    let f = open_for_write(path)?;
    write_image(&f, &image, cfg)
        .with_context(|| format!("write adv to {}", path.display()))?;
    info!(
        "adv with {} tag(s) written to {} (offsets {} and {})",
        adv.len(),
        path.display(),
        PRIMARY_OFFSET,
        MIRROR_OFFSET
    );
    Ok(())
}

/// То же на уже открытом хэндле.
pub fn persist_to(adv: &Adv, f: &File, cfg: &AdvConfig) -> Result<()> {
    let image = adv.encode().context("encode adv record")?;
    write_image(f, &image, cfg)
}

fn write_image(f: &File, image: &[u8], cfg: &AdvConfig) -> Result<()> {
    if image.len() != RECORD_LENGTH {
        return Err(anyhow!(
            "adv image must be {} bytes, got {}",
            RECORD_LENGTH,
            image.len()
        ));
    }

    write_at(f, PRIMARY_OFFSET, image).context("write primary copy")?;
    write_at(f, MIRROR_OFFSET, image).context("write mirror copy")?;
    if cfg.fsync {
        f.sync_all().context("sync device")?;
    }

    record_persisted(image.len() * 2);
    Ok(())
}

// ---------------- Inspect ----------------

#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub offset: u64,
    pub status: LoadStatus,
    pub tags: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    pub primary: CopyReport,
    pub mirror: CopyReport,
    /// Обе копии валидны и содержат одинаковую карту тегов.
    pub in_sync: bool,
}

impl MirrorReport {
    pub fn any_valid(&self) -> bool {
        self.primary.status.is_valid() || self.mirror.status.is_valid()
    }
}

fn inspect_copy(f: &File, offset: u64) -> (CopyReport, Option<Adv>) {
    let mut buf = vec![0u8; RECORD_LENGTH];
    if let Err(e) = read_at(f, offset, &mut buf) {
        let report = CopyReport {
            offset,
            status: LoadStatus::Absent,
            tags: 0,
            error: Some(format!("{:#}", e)),
        };
        return (report, None);
    }
    match Adv::decode(&buf) {
        Ok(adv) => {
            let report = CopyReport {
                offset,
                status: LoadStatus::Valid,
                tags: adv.len(),
                error: None,
            };
            (report, Some(adv))
        }
        Err(e) => {
            let report = CopyReport {
                offset,
                status: LoadStatus::from_error(&e),
                tags: 0,
                error: Some(e.to_string()),
            };
            (report, None)
        }
    }
}

/// Проверить обе копии без изменения устройства.
pub fn inspect(path: &Path) -> Result<MirrorReport> {
    let f = open_for_read(path)?
        .ok_or_else(|| anyhow!("device {} not found", path.display()))?;

    let (primary, p) = inspect_copy(&f, PRIMARY_OFFSET);
    let (mirror, m) = inspect_copy(&f, MIRROR_OFFSET);

    let in_sync = match (&p, &m) {
        (Some(a), Some(b)) => a.tags() == b.tags(),
        _ => false,
    };
    if p.is_some() && m.is_some() && !in_sync {
        warn!("adv copies on {} diverge", path.display());
    }

    Ok(MirrorReport {
        primary,
        mirror,
        in_sync,
    })
}
