//! Shields interpolation variables from the translation provider.
//!
//! Every match of the configured pattern is rewritten to `<x>captured</x>`,
//! which providers running in XML tag mode leave untouched. On the way back
//! the wrapper is turned into the original placeholder again by putting the
//! captured content between the literal text that surrounds the capture group
//! in the pattern.

use regex::{Captures, Regex};

use crate::error::{SyncError, SyncResult};

pub const DEFAULT_PATTERN: &str = "%{(.*?)}";
pub const WRAPPER_TAG: &str = "x";

#[derive(Debug, Clone)]
pub struct PlaceholderCodec {
    pattern: Regex,
    wrapper: Regex,
    prefix: String,
    suffix: String,
}

impl PlaceholderCodec {
    pub fn new(pattern: &str) -> SyncResult<Self> {
        let invalid = |message: &str| SyncError::InvalidPattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        };
        let source = escape_literal_braces(pattern);
        let compiled = Regex::new(&source).map_err(|err| invalid(&err.to_string()))?;
        if compiled.captures_len() != 2 {
            return Err(invalid("expected exactly one capture group"));
        }
        let (open, close) =
            first_group_span(&source).ok_or_else(|| invalid("capture group not found"))?;
        let wrapper = Regex::new(&format!("(?s)<{0}>(.*?)</{0}>", WRAPPER_TAG))
            .map_err(|err| invalid(&err.to_string()))?;
        Ok(Self {
            pattern: compiled,
            wrapper,
            prefix: unescape_literal(&source[..open]),
            suffix: unescape_literal(&source[close + 1..]),
        })
    }

    pub fn protect(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                let inner = caps.get(1).map_or("", |m| m.as_str());
                format!("<{0}>{1}</{0}>", WRAPPER_TAG, inner)
            })
            .into_owned()
    }

    pub fn restore(&self, text: &str) -> String {
        self.wrapper
            .replace_all(text, |caps: &Captures| {
                let inner = caps.get(1).map_or("", |m| m.as_str());
                format!("{}{}{}", self.prefix, inner, self.suffix)
            })
            .into_owned()
    }
}

/// Escapes `{` and `}` that do not form a counted repetition such as `{2}` or
/// `{1,3}`, so patterns written for engines that accept bare braces compile.
fn escape_literal_braces(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '\\' => {
                out.push(ch);
                if let Some(next) = chars.get(i + 1) {
                    out.push(*next);
                }
                i += 2;
                // `\p{L}`, `\x{41}` and friends keep their braces.
                let braced = matches!(chars.get(i - 1), Some('p' | 'P' | 'x' | 'u'));
                if braced && chars.get(i) == Some(&'{') {
                    while let Some(inner) = chars.get(i) {
                        out.push(*inner);
                        i += 1;
                        if *inner == '}' {
                            break;
                        }
                    }
                }
                continue;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => {
                if let Some(len) = repetition_len(&chars[i..]) {
                    out.extend(&chars[i..i + len]);
                    i += len;
                    continue;
                }
                out.push_str("\\{");
                i += 1;
                continue;
            }
            '}' if !in_class => {
                out.push_str("\\}");
                i += 1;
                continue;
            }
            _ => {}
        }
        out.push(ch);
        i += 1;
    }
    out
}

/// Length of a `{n}`, `{n,}` or `{n,m}` quantifier at the start of `chars`.
fn repetition_len(chars: &[char]) -> Option<usize> {
    let mut i = 1;
    let digits_start = i;
    while chars.get(i).is_some_and(char::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    if chars.get(i) == Some(&',') {
        i += 1;
        while chars.get(i).is_some_and(char::is_ascii_digit) {
            i += 1;
        }
    }
    (chars.get(i) == Some(&'}')).then_some(i + 1)
}

/// Byte offsets of the opening and closing parenthesis of the first capturing
/// group in `pattern`.
fn first_group_span(pattern: &str) -> Option<(usize, usize)> {
    let bytes = pattern.as_bytes();
    let mut in_class = false;
    let mut open: Option<usize> = None;
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'(' if !in_class => {
                if open.is_some() {
                    depth += 1;
                } else if is_capturing(&bytes[i + 1..]) {
                    open = Some(i);
                    depth = 1;
                }
            }
            b')' if !in_class => {
                if let Some(start) = open {
                    depth -= 1;
                    if depth == 0 {
                        return Some((start, i));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_capturing(rest: &[u8]) -> bool {
    match rest {
        [b'?', b'P', b'<', ..] | [b'?', b'<', ..] => true,
        [b'?', ..] => false,
        _ => true,
    }
}

fn unescape_literal(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut chars = fragment.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next) if next.is_ascii_punctuation() => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}
