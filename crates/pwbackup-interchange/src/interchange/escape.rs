//! Escaping and tokenizing helpers shared by the XML and CSV dialects.

use pwbackup_core::{BackupError, BackupResult};
use std::borrow::Cow;

/// Escape a value for use inside a double-quoted XML attribute.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Resolve entity and character references in an attribute value.
pub fn unescape_xml(s: &str) -> BackupResult<Cow<'_, str>> {
    quick_xml::escape::unescape(s)
        .map_err(|e| BackupError::malformed(format!("Bad XML reference in \"{s}\": {e}")))
}

/// Characters allowed by XML 1.0. Anything else makes the document
/// unreadable, so such records are refused at export time.
pub fn is_xml_char(ch: char) -> bool {
    matches!(ch,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Double embedded quotes; the caller supplies the surrounding quotes.
pub fn csv_escape(s: &str) -> String {
    s.replace('"', "\"\"")
}

/// Split one CSV line into fields, honouring double quotes.
///
/// `""` inside a quoted field is a literal quote. An unterminated quote
/// keeps the rest of the line in the last field.
pub fn split_quoted_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Percent-decoding as browsers' legacy `unescape()` does it: `%XX` is a
/// Latin-1 code point, `%uXXXX` a UTF-16 unit, anything else is literal.
pub fn unescape_legacy(s: &str) -> String {
    if !s.contains('%') {
        return s.to_string();
    }

    let chars: Vec<char> = s.chars().collect();
    let mut units: Vec<u16> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '%' {
            if chars.get(i + 1) == Some(&'u') {
                if let Some(unit) = hex_value(&chars, i + 2, 4) {
                    units.push(unit);
                    i += 6;
                    continue;
                }
            } else if let Some(byte) = hex_value(&chars, i + 1, 2) {
                units.push(byte);
                i += 3;
                continue;
            }
        }
        let mut buf = [0u16; 2];
        units.extend_from_slice(ch.encode_utf16(&mut buf));
        i += 1;
    }
    String::from_utf16_lossy(&units)
}

fn hex_value(chars: &[char], start: usize, len: usize) -> Option<u16> {
    let digits = chars.get(start..start + len)?;
    digits
        .iter()
        .try_fold(0u16, |acc, c| c.to_digit(16).map(|d| acc * 16 + d as u16))
}
