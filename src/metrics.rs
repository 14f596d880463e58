//! Lightweight global metrics for advault.
//!
//! Потокобезопасные атомарные счётчики:
//! - Load (валидные/невалидные образы, fallback на зеркальную копию)
//! - Tags (успешные set_tag и отказы по ёмкости)
//! - Persist (записанные образы и байты, включая зеркало)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Load -----
static RECORDS_LOADED: AtomicU64 = AtomicU64::new(0);
static RECORDS_INVALID: AtomicU64 = AtomicU64::new(0);
static MIRROR_FALLBACKS: AtomicU64 = AtomicU64::new(0);

// ----- Tags -----
static TAGS_SET: AtomicU64 = AtomicU64::new(0);
static CAPACITY_REJECTIONS: AtomicU64 = AtomicU64::new(0);

// ----- Persist -----
static RECORDS_PERSISTED: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Load
    pub records_loaded: u64,
    pub records_invalid: u64,
    pub mirror_fallbacks: u64,

    // Tags
    pub tags_set: u64,
    pub capacity_rejections: u64,

    // Persist
    pub records_persisted: u64,
    pub bytes_written: u64,
}

impl MetricsSnapshot {
    pub fn invalid_ratio(&self) -> f64 {
        let total = self.records_loaded + self.records_invalid;
        if total == 0 {
            0.0
        } else {
            self.records_invalid as f64 / total as f64
        }
    }
}

// ----- Recorders (Load) -----
pub fn record_loaded() {
    RECORDS_LOADED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_invalid() {
    RECORDS_INVALID.fetch_add(1, Ordering::Relaxed);
}

pub fn record_mirror_fallback() {
    MIRROR_FALLBACKS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Tags) -----
pub fn record_tag_set() {
    TAGS_SET.fetch_add(1, Ordering::Relaxed);
}
pub fn record_capacity_rejection() {
    CAPACITY_REJECTIONS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Persist) -----
pub fn record_persisted(bytes: usize) {
    RECORDS_PERSISTED.fetch_add(1, Ordering::Relaxed);
    BYTES_WRITTEN.fetch_add(bytes as u64, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        records_loaded: RECORDS_LOADED.load(Ordering::Relaxed),
        records_invalid: RECORDS_INVALID.load(Ordering::Relaxed),
        mirror_fallbacks: MIRROR_FALLBACKS.load(Ordering::Relaxed),

        tags_set: TAGS_SET.load(Ordering::Relaxed),
        capacity_rejections: CAPACITY_REJECTIONS.load(Ordering::Relaxed),

        records_persisted: RECORDS_PERSISTED.load(Ordering::Relaxed),
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    RECORDS_LOADED.store(0, Ordering::Relaxed);
    RECORDS_INVALID.store(0, Ordering::Relaxed);
    MIRROR_FALLBACKS.store(0, Ordering::Relaxed);

    TAGS_SET.store(0, Ordering::Relaxed);
    CAPACITY_REJECTIONS.store(0, Ordering::Relaxed);

    RECORDS_PERSISTED.store(0, Ordering::Relaxed);
    BYTES_WRITTEN.store(0, Ordering::Relaxed);
}
