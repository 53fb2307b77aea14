use std::process::Command;

/// `IOPlatformUUID` and `IOPlatformSerialNumber` from the I/O registry.
pub fn machine_identifiers() -> Vec<String> {
    let Ok(output) = Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
    else {
        return Vec::new();
    };
    let text = String::from_utf8_lossy(&output.stdout);

    ["IOPlatformUUID", "IOPlatformSerialNumber"]
        .iter()
        .filter_map(|field| registry_value(&text, field))
        .collect()
}

fn registry_value(text: &str, field: &str) -> Option<String> {
    let line = text.lines().find(|l| l.contains(field))?;
    let value = line.split('=').nth(1)?.trim().trim_matches('"');
    (!value.is_empty()).then(|| value.to_string())
}
