//! Strips code points that cannot survive as standalone text.
//!
//! Rust strings are always valid UTF-8, but model output can still carry
//! lone surrogate *escapes* (`\ud83d` without its pair), which `serde_json`
//! rejects, plus replacement characters, byte-order marks and control
//! characters left over from lossy decoding upstream.

/// Returns `text` without invalid escapes and unprintable code points.
///
/// Tab, newline and carriage return are kept.
pub fn sanitize(text: &str) -> String {
    let chars: Vec<char> = text.chars().filter(|&c| keep_char(c)).collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }

        match unicode_escape(&chars, i) {
            Some(unit) if is_high_surrogate(unit) => {
                if unicode_escape(&chars, i + 6).is_some_and(is_low_surrogate) {
                    out.extend(&chars[i..i + 12]);
                    i += 12;
                } else {
                    i += 6;
                }
            }
            Some(unit) if is_low_surrogate(unit) => i += 6,
            _ => {
                // Copy the escape pair as a unit so `\\ud800` stays literal.
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 2;
                } else {
                    i += 1;
                }
            }
        }
    }

    out
}

fn keep_char(c: char) -> bool {
    match c {
        '\n' | '\t' | '\r' => true,
        '\u{FFFD}' | '\u{FEFF}' => false,
        c => !c.is_control(),
    }
}

/// Parses a `\uXXXX` escape starting at `at`.
fn unicode_escape(chars: &[char], at: usize) -> Option<u32> {
    if chars.get(at) != Some(&'\\') || chars.get(at + 1) != Some(&'u') {
        return None;
    }
    let hex: String = chars.get(at + 2..at + 6)?.iter().collect();
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok()
}

fn is_high_surrogate(unit: u32) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lone_surrogate_escapes_dropped() {
        assert_eq!(sanitize(r#"{"a": "x\ud83dy"}"#), r#"{"a": "xy"}"#);
        assert_eq!(sanitize(r#""\udc00tail""#), r#""tail""#);
    }

    #[test]
    fn test_paired_surrogates_kept() {
        let text = r#""\ud83d\ude00""#;
        assert_eq!(sanitize(text), text);
        let parsed: String = serde_json::from_str(&sanitize(text)).unwrap();
        assert_eq!(parsed, "\u{1F600}");
    }

    #[test]
    fn test_escaped_backslash_is_not_an_escape() {
        let text = r#""C:\\ud800""#;
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn test_unprintable_code_points_removed() {
        assert_eq!(sanitize("\u{FEFF}a\u{FFFD}b\u{0}c\u{7}"), "abc");
        assert_eq!(sanitize("line\n\tindent\r\n"), "line\n\tindent\r\n");
    }

    #[test]
    fn test_ordinary_escapes_untouched() {
        let text = r#"{"s": "quote \" and \u00e9 and \n"}"#;
        assert_eq!(sanitize(text), text);
    }
}
