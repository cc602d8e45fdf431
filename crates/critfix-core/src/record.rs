//! Line-indexed model of the colon-delimited backup text.
//!
//! A backup is a sequence of lines, some of the form `key : value`. Only
//! the first line matching a key is authoritative. Everything else
//! (unknown lines, duplicate keys, spacing, `\r` endings, a trailing
//! newline) is reproduced byte-for-byte by [`TextRecord::render`].

/// Field key carrying the critical-data hex payload.
pub const KEY_CRITICAL_DATA: &str = "criticalData";
/// Misspelled form of [`KEY_CRITICAL_DATA`] found in backups in the wild.
/// Accepted on input and preserved on output, never rewritten to the
/// other spelling.
pub const KEY_CRITICAL_DATA_ALIAS: &str = "crticalData";
/// Device public key modulus field.
pub const KEY_DEV_PUB_KEY_MODULUS: &str = "devPubKeyModulus";
/// Device public key signature field.
pub const KEY_DEV_PUB_KEY_SIGN: &str = "devPubKeySign";
/// Critical-data signature field. The misspelling is the format's own.
pub const KEY_CRITICAL_DATA_SIGN: &str = "crticalDataSign";

/// A `key : value` field located in a [`TextRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef<'a> {
    /// The key exactly as spelled in the document.
    pub key: &'a str,
    /// The value with surrounding whitespace trimmed.
    pub value: &'a str,
}

/// A backup document parsed into lines.
#[derive(Debug, Clone)]
pub struct TextRecord {
    lines: Vec<String>,
}

impl TextRecord {
    /// Parse a document. Never fails; lines that are not `key : value`
    /// fields are carried through untouched.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_owned).collect(),
        }
    }

    /// Find the first field whose key matches any of `keys`
    /// (ASCII-case-insensitive). The key may sit anywhere in the line as
    /// long as a colon follows it; the spelling actually present in the
    /// document is returned so a rewrite can preserve it.
    pub fn find_first<'a>(&'a self, keys: &[&str]) -> Option<FieldRef<'a>> {
        self.lines.iter().find_map(|line| find_in_line(line, keys))
    }

    /// Replace the value of the first line that starts with `key`
    /// (ASCII-case-insensitive) followed by a colon and a non-empty value.
    ///
    /// Returns `false` when no such line exists; the document is then
    /// unchanged. Key spelling, spacing around the colon, and a `\r`
    /// terminator all survive the rewrite.
    pub fn replace_first(&mut self, key: &str, new_value: &str) -> bool {
        for line in &mut self.lines {
            let Some(colon) = line.find(':') else { continue };
            let line_key = &line[..colon];
            if line_key.trim_start().len() != line_key.len() {
                // Keys are only recognized at the start of a line.
                continue;
            }
            if !line_key.trim_end().eq_ignore_ascii_case(key) {
                continue;
            }
            if line[colon + 1..].trim().is_empty() {
                continue;
            }
            *line = rebuild(line, colon, new_value);
            return true;
        }
        false
    }

    /// Reassemble the document, byte-identical outside replaced values.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

fn find_in_line<'a>(line: &'a str, keys: &[&str]) -> Option<FieldRef<'a>> {
    for start in 0..line.len() {
        if !line.is_char_boundary(start) {
            continue;
        }
        for key in keys {
            let end = start + key.len();
            if end > line.len() || !line.is_char_boundary(end) {
                continue;
            }
            if !line[start..end].eq_ignore_ascii_case(key) {
                continue;
            }
            let rest = line[end..].trim_start();
            if let Some(value) = rest.strip_prefix(':') {
                return Some(FieldRef {
                    key: &line[start..end],
                    value: value.trim(),
                });
            }
        }
    }
    None
}

/// Rebuild a field line around a new value, keeping the `key : ` prefix
/// (including whitespace) and any `\r` terminator.
fn rebuild(line: &str, colon: usize, new_value: &str) -> String {
    let after = &line[colon + 1..];
    let ws_len = after.len() - after.trim_start().len();
    let prefix = &line[..colon + 1 + ws_len];

    let mut out = String::with_capacity(prefix.len() + new_value.len() + 1);
    out.push_str(prefix);
    out.push_str(new_value);
    if line.ends_with('\r') && !out.ends_with('\r') {
        out.push('\r');
    }
    out
}
