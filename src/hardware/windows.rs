use std::process::Command;

/// The `MachineGuid` written by Windows setup.
pub fn machine_identifiers() -> Vec<String> {
    let Ok(output) = Command::new("reg")
        .args([
            "query",
            r"HKLM\SOFTWARE\Microsoft\Cryptography",
            "/v",
            "MachineGuid",
        ])
        .output()
    else {
        return Vec::new();
    };

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find(|l| l.contains("MachineGuid"))
        .and_then(|l| l.split_whitespace().last())
        .map(|guid| vec![guid.to_string()])
        .unwrap_or_default()
}
