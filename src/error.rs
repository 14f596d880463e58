//! Typed failures of the ADV codec.
//!
//! Validation kinds (magic/checksum/TLV/length) mean "this image holds no valid
//! record" and are collapsed into an empty record by the loader. Capacity and
//! invariant kinds are surfaced to the caller.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdvError {
    #[error("adv: incorrect magic1 value: {0:#010x}")]
    BadMagic1(u32),

    #[error("adv: incorrect magic2 value: {0:#010x}")]
    BadMagic2(u32),

    #[error("adv: invalid checksum")]
    BadChecksum,

    #[error("adv: value exceeds buffer limits (entry at {offset}, len {len}, {remaining} bytes left)")]
    ValueOverflow {
        offset: usize,
        len: usize,
        remaining: usize,
    },

    #[error("adv: record buffer must be exactly {expected} bytes, got {got}")]
    BadLength { expected: usize, got: usize },

    #[error("adv: not enough space ({need} bytes needed, {avail} available)")]
    Capacity { need: usize, avail: usize },

    #[error("adv: tag 0 with an empty value is reserved (reads back as padding)")]
    ReservedTag,

    #[error("adv: internal invariant violated: {0}")]
    Invariant(String),
}

impl AdvError {
    /// true для ошибок, означающих «на устройстве нет валидной записи».
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AdvError::BadMagic1(_)
                | AdvError::BadMagic2(_)
                | AdvError::BadChecksum
                | AdvError::ValueOverflow { .. }
                | AdvError::BadLength { .. }
        )
    }

    /// Неверный magic: устройство пустое или чужое (не ADV).
    pub fn is_foreign(&self) -> bool {
        matches!(self, AdvError::BadMagic1(_) | AdvError::BadMagic2(_))
    }
}
