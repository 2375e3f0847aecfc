//! Raw device resolution
//!
//! Maps the volume identifier a user picked (a mount point or drive root)
//! to the identifier that opens its raw bytes.

use std::path::Path;

/// Resolves the raw device behind a volume identifier
///
/// - Windows drive roots (`E:`, `E:\`) become `\\.\E:`.
/// - On Linux, a mounted directory resolves to its source device through
///   `/proc/self/mounts`.
/// - Anything else (a device node, a disk image) is returned unchanged.
pub fn resolve_raw_device(volume_id: &str) -> String {
    if let Some(letter) = drive_letter(volume_id) {
        return format!(r"\\.\{}:", letter);
    }

    #[cfg(target_os = "linux")]
    {
        let path = Path::new(volume_id);
        if path.is_dir() {
            let mount_point = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if let Ok(mounts) = std::fs::read_to_string("/proc/self/mounts") {
                if let Some(device) = mount_source(&mounts, &mount_point) {
                    return device;
                }
            }
        }
    }

    volume_id.to_string()
}

/// Returns the drive letter of a Windows drive root such as `C:` or `C:\`
fn drive_letter(volume_id: &str) -> Option<char> {
    let mut chars = volume_id.chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    if chars.next() != Some(':') {
        return None;
    }
    match chars.as_str() {
        "" | "\\" | "/" => Some(letter.to_ascii_uppercase()),
        _ => None,
    }
}

/// Finds the device mounted at `mount_point` in a mounts table
///
/// The last matching line wins (later mounts shadow earlier ones). Only
/// sources that are device paths are accepted.
pub fn mount_source(mounts: &str, mount_point: &Path) -> Option<String> {
    mounts
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let source = fields.next()?;
            let target = fields.next()?;
            Some((unescape_mount_field(source), unescape_mount_field(target)))
        })
        .filter(|(source, target)| source.starts_with('/') && Path::new(target) == mount_point)
        .map(|(source, _)| source)
        .last()
}

/// Decodes the octal escapes (`\040` for space) used in the mounts table
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
