use std::fs;

const SOURCES: &[&str] = &[
    "/etc/machine-id",
    "/var/lib/dbus/machine-id",
    "/sys/class/dmi/id/product_uuid",
    "/sys/class/dmi/id/board_serial",
];

/// Readable, non-empty identifiers from the usual Linux locations.
///
/// DMI files are often root-only; unreadable sources are skipped.
pub fn machine_identifiers() -> Vec<String> {
    let mut ids: Vec<String> = SOURCES
        .iter()
        .filter_map(|path| fs::read_to_string(path).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    // /etc/machine-id and the dbus copy are usually the same file.
    ids.dedup();
    ids
}
