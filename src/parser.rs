use std::borrow::Cow;
use std::collections::HashMap;
use std::convert::Infallible;
use std::iter::Zip;
use std::ops::RangeFrom;
use std::path::Path;
use std::str::Split;

use crate::error::{Error, ParseError, ParseErrorKind};
use crate::model::Entry;

/// Source lines numbered from 1. Quoted values pull their continuation lines
/// from the same iterator.
type Lines<'a> = Zip<Split<'a, char>, RangeFrom<u32>>;

/// Parse dotenv entries from UTF-8 text, failing on the first malformed
/// statement.
pub fn parse_str(input: &str) -> Result<Vec<Entry>, Error> {
    parse_statements(input, None, |err| Err(Error::from(err)))
}

/// Parse dotenv entries from UTF-8 text, skipping malformed statements.
///
/// Skipped statements are reported through `tracing` at `warn` level with
/// their position only; the offending text is never logged.
pub fn parse_str_lenient(input: &str) -> Vec<Entry> {
    parse_lenient_with_source(input, None)
}

pub(crate) fn parse_lenient_with_source(input: &str, source: Option<&Path>) -> Vec<Entry> {
    let parsed = parse_statements(input, source, |err| {
        tracing::warn!(
            line = err.line,
            column = err.column,
            kind = %err.kind,
            source = ?source,
            "skipping malformed dotenv statement"
        );
        Ok::<(), Infallible>(())
    });
    match parsed {
        Ok(entries) => entries,
        Err(never) => match never {},
    }
}

/// Parse `input` line by line. `on_error` decides whether a malformed
/// statement aborts the parse or is skipped.
///
/// A key assigned twice keeps its first position with the later value.
fn parse_statements<E>(
    input: &str,
    source: Option<&Path>,
    mut on_error: impl FnMut(ParseError) -> Result<(), E>,
) -> Result<Vec<Entry>, E> {
    let text = unify_line_breaks(input);
    let mut lines: Lines<'_> = text.split('\n').zip(1..);

    let mut entries: Vec<Entry> = Vec::new();
    let mut slots = HashMap::<String, usize>::new();

    while let Some((line, line_num)) = lines.next() {
        let (key, value) = match parse_assignment(line, line_num, &mut lines) {
            Ok(Some(pair)) => pair,
            Ok(None) => continue,
            Err(err) => {
                on_error(err)?;
                continue;
            }
        };

        let entry = Entry {
            key,
            value,
            source: source.map(Path::to_path_buf),
            line: line_num,
        };
        match slots.get(&entry.key) {
            Some(&slot) => entries[slot] = entry,
            None => {
                slots.insert(entry.key.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

/// `\r\n` and lone `\r` both end a line.
fn unify_line_breaks(input: &str) -> Cow<'_, str> {
    if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    }
}

/// Parse one `KEY=value` statement starting at `line`. Blank lines and
/// comments yield `None`.
fn parse_assignment<'a>(
    line: &'a str,
    line_num: u32,
    rest: &mut Lines<'a>,
) -> Result<Option<(String, String)>, ParseError> {
    let body = line.trim_start();
    if body.is_empty() || body.starts_with('#') {
        return Ok(None);
    }
    let body = strip_export(body);
    let fail = |at: &str, kind| ParseError::new(line_num, column_of(line, at), kind);

    let Some((key, value)) = body.split_once('=') else {
        return Err(fail(body, ParseErrorKind::InvalidSyntax));
    };
    let key = key.trim_end();
    if key.is_empty() {
        return Err(fail(body, ParseErrorKind::MissingKey));
    }
    if let Some(bad) = key.find(|ch: char| !is_key_char(ch)) {
        return Err(fail(&key[bad..], ParseErrorKind::InvalidKey));
    }

    let value = value.trim_start();
    let value = match value.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let (inner, tail) = read_quoted(&value[1..], quote, rest)
                .ok_or_else(|| fail(value, ParseErrorKind::UnterminatedQuote))?;
            let tail = tail.trim_start();
            if !tail.is_empty() && !tail.starts_with('#') {
                return Err(fail(value, ParseErrorKind::InvalidSyntax));
            }
            if quote == '"' {
                inner.replace("\\n", "\n").replace("\\r", "\r")
            } else {
                inner
            }
        }
        _ => value
            .split_once('#')
            .map_or(value, |(head, _)| head)
            .trim()
            .to_owned(),
    };

    Ok(Some((key.to_owned(), value)))
}

fn strip_export(body: &str) -> &str {
    match body.strip_prefix("export") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => body,
    }
}

/// Collect a quoted value that may continue over the following lines.
/// Returns the text between the quotes and whatever follows the closing
/// quote. `rest` only advances once the closing quote is found, so an
/// unterminated value costs a single line.
fn read_quoted<'a>(
    opened: &'a str,
    quote: char,
    rest: &mut Lines<'a>,
) -> Option<(String, &'a str)> {
    let mut ahead = rest.clone();
    let mut inner = String::new();
    let mut segment = opened;

    loop {
        if let Some(end) = closing_quote(segment, quote) {
            inner.push_str(&segment[..end]);
            *rest = ahead;
            return Some((inner, &segment[end + 1..]));
        }
        inner.push_str(segment);
        inner.push('\n');
        (segment, _) = ahead.next()?;
    }
}

/// Single quotes close at the next `'`; inside double quotes `\"` does not
/// close the value.
fn closing_quote(segment: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in segment.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' && quote == '"' {
            escaped = true;
        } else if ch == quote {
            return Some(idx);
        }
    }
    None
}

/// 1-based character column of `part`, a slice of `line`.
fn column_of(line: &str, part: &str) -> u32 {
    let offset = (part.as_ptr() as usize).saturating_sub(line.as_ptr() as usize);
    line.get(..offset).map_or(0, |head| head.chars().count()) as u32 + 1
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')
}
