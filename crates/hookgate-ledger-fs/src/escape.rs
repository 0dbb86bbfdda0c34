//! Reversible `%XX` escaping for free text stored in ledger lines.
//!
//! Only the characters that would break the line structure are encoded, so
//! ordinary paths and agent names stay readable in the markdown. Whitespace
//! at either end is encoded as well because field values are trimmed when
//! they are read back.

/// Line breaks, backtick spans and the escape character itself.
const TEXT: &[char] = &['%', '\n', '\r', '`'];
/// Text plus the `, ` list separator.
const ITEM: &[char] = &['%', '\n', '\r', '`', ','];
/// Items plus the `holder (purpose)` and `actor / topic` delimiters.
const NAME: &[char] = &['%', '\n', '\r', '`', ',', '(', ')', '/'];

/// Field values and backticked paths.
pub fn escape_text(s: &str) -> String {
    escape(s, TEXT)
}

/// Entries of a comma-separated list.
pub fn escape_item(s: &str) -> String {
    escape(s, ITEM)
}

/// Agent names, topics and lock purposes inside headers and lock lines.
pub fn escape_name(s: &str) -> String {
    escape(s, NAME)
}

fn escape(s: &str, special: &[char]) -> String {
    let start = s.len() - s.trim_start().len();
    let end = s.trim_end().len();
    let mut out = String::with_capacity(s.len());
    let mut buf = [0u8; 4];
    for (i, c) in s.char_indices() {
        let edge = c.is_whitespace() && (i < start || i >= end);
        if special.contains(&c) || edge {
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{b:02X}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn hex(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Inverse of the `escape_*` functions. A `%` not followed by two hex
/// digits is kept literally, so text written by older hooks reads as-is.
pub fn unescape(s: &str) -> String {
    if !s.contains('%') {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let digit = |at: usize| bytes.get(at).copied().and_then(hex);
            if let (Some(hi), Some(lo)) = (digit(i + 1), digit(i + 2)) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_are_left_readable() {
        assert_eq!(escape_text("src/api/server.py"), "src/api/server.py");
        assert_eq!(escape_name("python-pro"), "python-pro");
        assert_eq!(escape_text("my file (v2).py"), "my file (v2).py");
    }

    #[test]
    fn structural_characters_are_encoded_and_restored() {
        let cases = [
            "Refactor module\n\n## Summary\nsplit helpers",
            "odd\nname.py",
            "tick`ed",
            "100% done\r\n",
            "  padded  ",
            "\u{a0}nbsp edge",
        ];
        for s in cases {
            let e = escape_text(s);
            assert!(!e.contains('\n') && !e.contains('`'), "{e}");
            assert_eq!(e.trim(), e);
            assert_eq!(unescape(&e), s);
        }
        let name = "qa (night) / ops, east";
        let e = escape_name(name);
        assert!(!e.contains(" (") && !e.contains(" / ") && !e.contains(','), "{e}");
        assert_eq!(unescape(&e), name);
        assert_eq!(unescape(&escape_item("a,b.py")), "a,b.py");
    }

    #[test]
    fn stray_percent_is_literal() {
        assert_eq!(unescape("50%"), "50%");
        assert_eq!(unescape("%zz and %4"), "%zz and %4");
        assert_eq!(unescape("%+1"), "%+1");
    }
}
