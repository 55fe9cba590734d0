//! Base64 obfuscation of usernames and passwords ("Encrypted: true" exports).

use base64::{engine::general_purpose::STANDARD as B64, engine::general_purpose::STANDARD_NO_PAD, Engine};
use pwbackup_core::{BackupError, BackupResult};

pub fn obfuscate(value: &str) -> String {
    B64.encode(value.as_bytes())
}

/// Reverse [`obfuscate`]. Whitespace and missing padding are tolerated;
/// bytes that are not UTF-8 were written by the older engine from Latin-1
/// text and are read back that way.
pub fn deobfuscate(value: &str) -> BackupResult<String> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = if compact.len() % 4 == 0 {
        B64.decode(&compact)
    } else {
        STANDARD_NO_PAD.decode(compact.trim_end_matches('='))
    }
    .map_err(|e| BackupError::invalid_entry(format!("Value is not valid base64: {e}")))?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    })
}
