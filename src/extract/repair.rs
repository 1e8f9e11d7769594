//! Tolerant JSON repair for tool calls written as free text.
//!
//! Models without native function calling often emit almost-JSON: missing
//! closing brackets, trailing or missing commas, unescaped quotes inside
//! string values, Python literals. [`repair_json`] rewrites such text into
//! valid JSON in a single pass, or reports why it could not.
//!
//! Text that does not start with `[` or `{` (after removing a Markdown code
//! fence) is rejected outright so ordinary prose is never turned into JSON.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::MalformedToolCall;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[\w-]*[ \t]*\r?\n?(.*?)(?:\r?\n?```)?\s*$")
        .expect("code fence pattern is valid")
});

/// Repairs near-JSON `text` and returns it as valid JSON.
///
/// Several top-level values in a row are wrapped into one array. Text after
/// the last top-level value is ignored.
///
/// # Errors
///
/// [`MalformedToolCall::NotJson`] when the text does not begin with a JSON
/// container, [`MalformedToolCall::Unrepairable`] when the structure cannot
/// be recovered.
pub fn repair_json(text: &str) -> Result<String, MalformedToolCall> {
    let body = strip_code_fence(text.trim()).trim();
    if !body.starts_with(['[', '{']) {
        return Err(MalformedToolCall::NotJson);
    }

    let repaired = Repairer::new(body).run()?;
    serde_json::from_str::<Value>(&repaired)
        .map_err(|e| MalformedToolCall::Unrepairable(e.to_string()))?;
    Ok(repaired)
}

fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }
    CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Object,
    Array,
}

/// What an object expects next. Arrays always expect a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Key,
    Colon,
    Value,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: Kind,
    slot: Slot,
    /// Completed members; a separator is written before every later one.
    count: usize,
}

enum Token {
    /// Already a valid JSON string literal, quotes included.
    Str(String),
    /// Bare word: literal, number, or unquoted text.
    Word(String),
}

/// Single-pass rewriter. Separators from the input are never copied: commas
/// are emitted between members as they are written, so trailing and missing
/// commas both come out right.
struct Repairer {
    chars: Vec<char>,
    pos: usize,
    out: String,
    stack: Vec<Frame>,
    values: Vec<String>,
}

impl Repairer {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            out: String::with_capacity(text.len()),
            stack: Vec::new(),
            values: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn run(mut self) -> Result<String, MalformedToolCall> {
        while let Some(c) = self.peek() {
            if self.stack.is_empty() && !self.values.is_empty() {
                let next = self.chars[self.pos..]
                    .iter()
                    .find(|c| !c.is_whitespace())
                    .copied();
                if !matches!(next, Some('{' | '[')) {
                    break;
                }
            }

            match c {
                c if c.is_whitespace() => self.pos += 1,
                '{' | '[' => {
                    self.pos += 1;
                    self.open(c)?;
                }
                '}' | ']' => {
                    self.pos += 1;
                    self.close(c);
                }
                ',' => self.pos += 1,
                ':' => {
                    self.pos += 1;
                    if let Some(frame) = self.stack.last_mut() {
                        if frame.kind == Kind::Object && frame.slot == Slot::Colon {
                            self.out.push(':');
                            frame.slot = Slot::Value;
                        }
                    }
                }
                '"' | '\'' => {
                    let literal = self.read_string(c);
                    self.scalar(Token::Str(literal))?;
                }
                _ => {
                    let word = self.read_word();
                    self.scalar(Token::Word(word))?;
                }
            }
        }

        while !self.stack.is_empty() {
            self.close_top();
        }

        match self.values.len() {
            0 => Err(MalformedToolCall::Unrepairable("no JSON value found".into())),
            1 => Ok(self.values.remove(0)),
            _ => Ok(format!("[{}]", self.values.join(","))),
        }
    }

    fn open(&mut self, c: char) -> Result<(), MalformedToolCall> {
        self.before_value()?;
        self.out.push(c);
        let (kind, slot) = if c == '{' {
            (Kind::Object, Slot::Key)
        } else {
            (Kind::Array, Slot::Value)
        };
        self.stack.push(Frame {
            kind,
            slot,
            count: 0,
        });
        Ok(())
    }

    /// Closes up to and including the innermost container matching `c`.
    /// A closer with no matching opener is dropped.
    fn close(&mut self, c: char) {
        let kind = if c == '}' { Kind::Object } else { Kind::Array };
        let Some(idx) = self.stack.iter().rposition(|f| f.kind == kind) else {
            return;
        };
        while self.stack.len() > idx {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match (frame.kind, frame.slot) {
            (Kind::Object, Slot::Colon) => self.out.push_str(":null"),
            (Kind::Object, Slot::Value) => self.out.push_str("null"),
            _ => {}
        }
        self.out.push(match frame.kind {
            Kind::Object => '}',
            Kind::Array => ']',
        });
        self.value_done();
    }

    /// Writes whatever must precede a value in the innermost container.
    fn before_value(&mut self) -> Result<(), MalformedToolCall> {
        let Some(frame) = self.stack.last_mut() else {
            return Ok(());
        };
        match (frame.kind, frame.slot) {
            (Kind::Array, _) => {
                if frame.count > 0 {
                    self.out.push(',');
                }
            }
            (Kind::Object, Slot::Colon) => {
                self.out.push(':');
                frame.slot = Slot::Value;
            }
            (Kind::Object, Slot::Value) => {}
            (Kind::Object, Slot::Key) => {
                return Err(MalformedToolCall::Unrepairable(
                    "container where an object key was expected".into(),
                ));
            }
        }
        Ok(())
    }

    fn value_done(&mut self) {
        match self.stack.last_mut() {
            None => self.values.push(std::mem::take(&mut self.out)),
            Some(frame) => {
                frame.count += 1;
                if frame.kind == Kind::Object {
                    frame.slot = Slot::Key;
                }
            }
        }
    }

    fn scalar(&mut self, token: Token) -> Result<(), MalformedToolCall> {
        // Stray text between top-level values.
        let Some(frame) = self.stack.last_mut() else {
            return Ok(());
        };

        if frame.kind == Kind::Object && frame.slot == Slot::Key {
            if frame.count > 0 {
                self.out.push(',');
            }
            match token {
                Token::Str(literal) => self.out.push_str(&literal),
                Token::Word(word) => self.out.push_str(&quote(&word)),
            }
            frame.slot = Slot::Colon;
            return Ok(());
        }

        self.before_value()?;
        match token {
            Token::Str(literal) => self.out.push_str(&literal),
            Token::Word(word) => self.out.push_str(&word_literal(&word)),
        }
        self.value_done();
        Ok(())
    }

    /// Reads a string delimited by `quote` and returns it as a JSON literal.
    fn read_string(&mut self, quote: char) -> String {
        self.pos += 1;
        let mut literal = String::from('"');

        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => match self.peek() {
                    Some(e @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't')) => {
                        literal.push('\\');
                        literal.push(e);
                        self.pos += 1;
                    }
                    Some('u') if self.hex4_at(self.pos + 1) => {
                        literal.push_str("\\u");
                        self.pos += 1;
                    }
                    Some('\'') => {
                        literal.push('\'');
                        self.pos += 1;
                    }
                    _ => literal.push_str("\\\\"),
                },
                c if c == quote && self.string_ends_here() => {
                    literal.push('"');
                    return literal;
                }
                '"' => literal.push_str("\\\""),
                '\n' => literal.push_str("\\n"),
                '\r' => literal.push_str("\\r"),
                '\t' => literal.push_str("\\t"),
                c if c.is_control() => literal.push_str(&format!("\\u{:04x}", c as u32)),
                c => literal.push(c),
            }
        }

        // Unterminated string at end of input.
        literal.push('"');
        literal
    }

    /// Decides whether a quote just consumed closes the string or is an
    /// unescaped quote inside it, by looking at what follows.
    fn string_ends_here(&self) -> bool {
        let mut i = self.skip_whitespace(self.pos);
        match self.chars.get(i) {
            None | Some(':' | '}' | ']') => true,
            Some('"') => self.quoted_key_at(i),
            Some(',') => {
                i = self.skip_whitespace(i + 1);
                match self.chars.get(i) {
                    None => true,
                    Some(c) => self.member_starts_at(i, *c),
                }
            }
            _ => false,
        }
    }

    /// True when position `i` plausibly begins the next array element or
    /// object member.
    fn member_starts_at(&self, i: usize, c: char) -> bool {
        if matches!(c, '"' | '\'' | '{' | '[' | '}' | ']' | '-') || c.is_ascii_digit() {
            return true;
        }
        if !(c.is_alphabetic() || c == '_') {
            return false;
        }
        let end = (i..self.chars.len())
            .find(|&j| !(self.chars[j].is_alphanumeric() || self.chars[j] == '_'))
            .unwrap_or(self.chars.len());
        let word: String = self.chars[i..end].iter().collect();
        if matches!(
            word.as_str(),
            "true" | "false" | "null" | "True" | "False" | "None"
        ) {
            return true;
        }
        // An unquoted key.
        self.chars.get(self.skip_whitespace(end)) == Some(&':')
    }

    /// True when a double-quoted key and its `:` start at `i`, as when the
    /// comma before the next member is missing.
    fn quoted_key_at(&self, i: usize) -> bool {
        let Some(len) = self.chars[i + 1..].iter().position(|&c| c == '"') else {
            return false;
        };
        let close = i + 1 + len;
        self.chars.get(self.skip_whitespace(close + 1)) == Some(&':')
    }

    fn skip_whitespace(&self, mut i: usize) -> usize {
        while self.chars.get(i).is_some_and(|c| c.is_whitespace()) {
            i += 1;
        }
        i
    }

    fn hex4_at(&self, i: usize) -> bool {
        self.chars
            .get(i..i + 4)
            .is_some_and(|digits| digits.iter().all(|c| c.is_ascii_hexdigit()))
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || ",:[]{}\"'".contains(c) {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn word_literal(word: &str) -> String {
    match word {
        "true" | "True" => "true".into(),
        "false" | "False" => "false".into(),
        "null" | "None" | "undefined" => "null".into(),
        w if serde_json::from_str::<serde_json::Number>(w).is_ok() => w.into(),
        w => quote(w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repaired(text: &str) -> Value {
        serde_json::from_str(&repair_json(text).unwrap()).unwrap()
    }

    #[test]
    fn test_valid_json_is_preserved() {
        let text = r#"[{"id": "c1", "type": "function", "function": {"name": "read_file", "arguments": "{\"path\": \"a.txt\"}"}}]"#;
        let expected: Value = serde_json::from_str(text).unwrap();
        assert_eq!(repaired(text), expected);
    }

    #[test]
    fn test_trailing_commas_removed() {
        assert_eq!(repaired(r#"[{"a": 1, "b": [1, 2,],},]"#), json!([{"a": 1, "b": [1, 2]}]));
    }

    #[test]
    fn test_unbalanced_brackets_closed() {
        assert_eq!(
            repaired(r#"[{"name": "read_file", "arguments": {"path": "a.txt""#),
            json!([{"name": "read_file", "arguments": {"path": "a.txt"}}])
        );
    }

    #[test]
    fn test_mismatched_closer_closes_inner_containers() {
        assert_eq!(repaired(r#"{"a": [1, 2}"#), json!({"a": [1, 2]}));
        assert_eq!(repaired(r#"[1, 2]]]"#), json!([1, 2]));
    }

    #[test]
    fn test_unescaped_embedded_quotes() {
        assert_eq!(
            repaired(r#"{"new_str": "Hello, "World"!", "path": "hello.txt"}"#),
            json!({"new_str": "Hello, \"World\"!", "path": "hello.txt"})
        );
    }

    #[test]
    fn test_raw_newlines_in_strings_escaped() {
        assert_eq!(repaired("{\"s\": \"line1\nline2\"}"), json!({"s": "line1\nline2"}));
    }

    #[test]
    fn test_missing_commas_inserted() {
        assert_eq!(
            repaired(r#"[{"a": 1} {"b": 2}]"#),
            json!([{"a": 1}, {"b": 2}])
        );
        assert_eq!(repaired(r#"{"a": 1 "b": 2}"#), json!({"a": 1, "b": 2}));
        assert_eq!(
            repaired(r#"{"path": "a.txt" "old_str": "x", "new_str": "y"}"#),
            json!({"path": "a.txt", "old_str": "x", "new_str": "y"})
        );
        assert_eq!(
            repaired(r#"{"path": "a.txt""old_str": "x"}"#),
            json!({"path": "a.txt", "old_str": "x"})
        );
    }

    #[test]
    fn test_python_literals_and_single_quotes() {
        assert_eq!(
            repaired("{'flag': True, 'other': None, 'off': False, 'it': 'it\\'s'}"),
            json!({"flag": true, "other": null, "off": false, "it": "it's"})
        );
    }

    #[test]
    fn test_unquoted_keys_and_words() {
        assert_eq!(repaired("{path: notes.md, n: 3}"), json!({"path": "notes.md", "n": 3}));
    }

    #[test]
    fn test_concatenated_values_wrapped_in_array() {
        assert_eq!(
            repaired("{\"a\": 1}\n{\"b\": 2}"),
            json!([{"a": 1}, {"b": 2}])
        );
    }

    #[test]
    fn test_trailing_prose_ignored() {
        assert_eq!(
            repaired(r#"[{"a": 1}] I will now read the file."#),
            json!([{"a": 1}])
        );
    }

    #[test]
    fn test_code_fence_stripped() {
        assert_eq!(
            repaired("```json\n[{\"a\": 1}]\n```"),
            json!([{"a": 1}])
        );
        assert_eq!(repaired("```\n{\"a\": 1}"), json!({"a": 1}));
    }

    #[test]
    fn test_dangling_key_gets_null() {
        assert_eq!(repaired(r#"{"a": 1, "b""#), json!({"a": 1, "b": null}));
        assert_eq!(repaired(r#"{"a":"#), json!({"a": null}));
    }

    #[test]
    fn test_prose_is_rejected() {
        assert_eq!(
            repair_json("Sure! The file contains {braces}."),
            Err(MalformedToolCall::NotJson)
        );
        assert_eq!(repair_json(""), Err(MalformedToolCall::NotJson));
    }

    #[test]
    fn test_garbled_object_repairs_to_plain_object() {
        assert_eq!(
            repaired("[{not valid json"),
            json!([{"not": "valid", "json": null}])
        );
    }

    #[test]
    fn test_container_in_key_position_is_unrepairable() {
        assert!(matches!(
            repair_json(r#"{{"a": 1}}"#),
            Err(MalformedToolCall::Unrepairable(_))
        ));
    }
}
