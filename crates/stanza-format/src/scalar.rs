//! Scalar handling for DSL output.
//!
//! Decides whether content can be written bare or must be quoted so that
//! reading it back yields exactly the same text.

use std::borrow::Cow;

use stanza_parse::{Error, Result, Syntax};

/// Characters that end an identifier.
fn is_structural(c: char, syntax: Syntax) -> bool {
    c.is_whitespace()
        || c == syntax.assign
        || c == syntax.comment
        || matches!(c, '{' | '}' | '[' | ']' | ',' | ';' | '(' | ')')
}

/// Check if content can be written bare on the right-hand side.
///
/// Bare content is valid when:
/// 1. It's not empty and has no leading or trailing whitespace
/// 2. It doesn't start with a quote, and no quote follows whitespace or punctuation
/// 3. Outside a single level of `( ... )` it has no `{}`, `;`, `)`, line breaks,
///    assignment or comment characters, and no whitespace besides space and tab
pub fn can_be_bare(s: &str, syntax: Syntax) -> bool {
    let (Some(first), Some(last)) = (s.chars().next(), s.chars().last()) else {
        return false;
    };
    if first.is_whitespace() || last.is_whitespace() || s.contains('\r') {
        return false;
    }

    let mut in_block = false;
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if in_block {
            match c {
                ')' => in_block = false,
                '(' | '{' | '}' => return false,
                _ => {}
            }
        } else {
            match c {
                '(' => in_block = true,
                ')' | '{' | '}' | ';' | '\n' => return false,
                c if c.is_whitespace() && !matches!(c, ' ' | '\t') => return false,
                '\'' | '"' if prev.is_none_or(|p| is_structural(p, syntax)) => return false,
                c if c == syntax.assign || c == syntax.comment => return false,
                _ => {}
            }
        }
        prev = Some(c);
    }
    !in_block
}

/// Surround `s` with quotes, preferring `prefer`.
///
/// Returns `None` when `s` contains a line break or both quote characters.
pub fn quote(s: &str, prefer: char) -> Option<String> {
    if s.contains(['\r', '\n']) {
        return None;
    }
    let other = if prefer == '"' { '\'' } else { '"' };
    [prefer, other]
        .into_iter()
        .find(|q| !s.contains(*q))
        .map(|q| format!("{q}{s}{q}"))
}

/// Format content for the right-hand side of an assignment.
pub fn format_scalar(s: &str, syntax: Syntax) -> Result<Cow<'_, str>> {
    if can_be_bare(s, syntax) {
        return Ok(Cow::Borrowed(s));
    }
    quote(s, '\'')
        .map(Cow::Owned)
        .ok_or_else(|| Error::structural(format!("Content cannot be represented: {s:?}")))
}

/// Format a context name or attribute key.
pub fn format_name(s: &str, syntax: Syntax) -> Result<Cow<'_, str>> {
    let bare = s
        .chars()
        .next()
        .is_some_and(|first| first != '\'' && first != '"')
        && !s.chars().any(|c| is_structural(c, syntax));
    if bare {
        return Ok(Cow::Borrowed(s));
    }
    quote(s, '\'')
        .map(Cow::Owned)
        .ok_or_else(|| Error::structural(format!("Name cannot be represented: {s:?}")))
}

/// Split a comment into lines that fit in `width` columns.
///
/// Existing line breaks are kept. Long lines are broken between words; a
/// leading space on the comment is repeated on every wrapped line.
pub fn wrap_comment(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        if line.chars().count() <= width {
            lines.push(line.to_string());
            continue;
        }
        let lead = if line.starts_with(' ') { " " } else { "" };
        let mut current = String::new();
        for word in line.split_whitespace() {
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut current));
            }
            if current.is_empty() {
                current.push_str(lead);
                current.push_str(word);
            } else {
                current.push(' ');
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
