// Формат и константы
pub mod consts;
pub mod error;

// Запись ADV: src/adv/{mod,checksum,tags,record}.rs
pub mod adv;

// Устройство: чтение/двойная запись по смещениям
pub mod device;

pub mod config;
pub mod metrics;
pub mod cli;

// Удобные реэкспорты
pub use adv::{Adv, LoadStatus, TagMap};
pub use config::AdvConfig;
pub use device::{
    inspect, load_from_device, load_from_device_with_config, open_for_read, open_for_write,
    persist, persist_to, persist_with_config, MirrorReport,
};
pub use error::AdvError;
