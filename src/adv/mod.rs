//! adv — запись Auxiliary Data Vault.
//!
//! Состав:
//! - checksum: magic-сигнатуры и SHA-256 дайджест;
//! - tags: TLV-регион (decode/encode, учёт ёмкости);
//! - record: модель Adv (load/set_tag/encode).

pub mod checksum;
pub mod record;
pub mod tags;

pub use checksum::{
    check_checksum, check_magics, compute_checksum, update_checksum, verify_checksum,
    verify_magics, write_magics,
};
pub use record::{Adv, LoadStatus};
pub use tags::{decode_tags, encode_tags, entry_len, is_reserved, usage, TagMap};
