//! Константы формата ADV (Auxiliary Data Vault).
//!
//! Layout записи (BE, ровно RECORD_LENGTH байт):
//! [magic1 u32][tag region .. RECORD_LENGTH-36][sha256 32][magic2 u32]
//!
//! На устройстве запись лежит дважды: по смещению 0 и по смещению RECORD_LENGTH.

// -------- Record --------
pub const RECORD_LENGTH: usize = 256 * 1024;
pub const MAGIC1: u32 = 0x5a4b3c2d;
pub const MAGIC2: u32 = 0xa5b4c3d2;
pub const MAGIC_LEN: usize = 4;

/// Payload budget: RECORD_LENGTH минус два magic, checksum и резерв.
pub const DATA_LENGTH: usize = RECORD_LENGTH - 40;

// -------- Checksum (SHA-256) --------
pub const CHECKSUM_LEN: usize = 32;
pub const OFF_CHECKSUM: usize = RECORD_LENGTH - 36;
pub const OFF_MAGIC2: usize = RECORD_LENGTH - MAGIC_LEN;

// -------- Tag region --------
pub const OFF_TAGS: usize = MAGIC_LEN;
pub const TAGS_END: usize = OFF_CHECKSUM;

// TLV entry: [tag u32 (low byte = id)][len u32][value]
pub const TAG_HDR_LEN: usize = 8;

/// Fixed framing allowance counted by the capacity check.
pub const FIXED_OVERHEAD: usize = 20;

// -------- Well-known tags --------
pub const CONFIG_TAG: u8 = 0x0A;

// -------- Device placement --------
pub const PRIMARY_OFFSET: u64 = 0;
pub const MIRROR_OFFSET: u64 = RECORD_LENGTH as u64;
