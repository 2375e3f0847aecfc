//! Raw volume access

mod device_path;
mod file_volume;

pub use device_path::{mount_source, resolve_raw_device};
pub use file_volume::{FileVolume, SECTOR_ALIGN};
