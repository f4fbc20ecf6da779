use std::collections::HashMap;

use crate::store::ProcessStore;

/// Raw values of one parse pass, keyed by variable name.
pub type ParsedSet = HashMap<String, String>;

/// Resolve `$NAME`, `${NAME}` and `\$` escapes in `value`.
///
/// Names are looked up in `store` first (taken as-is), then in `parsed`
/// (interpolated recursively), and resolve to an empty string otherwise.
/// A reference back to a name that is still being resolved also resolves to
/// an empty string.
pub fn interpolate(value: &str, parsed: &ParsedSet, store: &ProcessStore) -> String {
    Resolver::new(parsed, store).expand(value)
}

/// Resolve the raw value of `key` itself, so that references back to `key`
/// count as cyclic from the first level.
pub(crate) fn interpolate_entry(
    key: &str,
    raw: &str,
    parsed: &ParsedSet,
    store: &ProcessStore,
) -> String {
    let mut resolver = Resolver::new(parsed, store);
    resolver.stack.push(key.to_owned());
    resolver.expand(raw)
}

struct Resolver<'a> {
    parsed: &'a ParsedSet,
    store: &'a ProcessStore,
    stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(parsed: &'a ParsedSet, store: &'a ProcessStore) -> Self {
        Self {
            parsed,
            store,
            stack: Vec::new(),
        }
    }

    fn expand(&mut self, value: &str) -> String {
        let mut tokens = value.split('$').peekable();
        let mut out = String::with_capacity(value.len());
        let mut first = true;

        while let Some(token) = tokens.next() {
            if first {
                // Only a backslash right before the first `$` is an escape here.
                match token.strip_suffix('\\') {
                    Some(head) if tokens.peek().is_some() => {
                        out.push_str(head);
                        out.push('$');
                        out.push_str(tokens.next().unwrap_or_default());
                    }
                    _ => out.push_str(token),
                }
            } else if token.starts_with('\\') {
                // `$\`: a literal `$`, then the next token unexpanded.
                out.push('$');
                if let Some(literal) = tokens.next() {
                    out.push_str(literal);
                }
            } else if token.starts_with('{') {
                self.expand_mustache(token, &mut out);
            } else {
                self.expand_bare(token, &mut out);
            }
            first = false;
        }

        out
    }

    fn expand_mustache(&mut self, token: &str, out: &mut String) {
        let Some(close) = token.find('}') else {
            out.push_str(token);
            return;
        };

        let name = token[1..close].trim();
        let resolved = self.lookup(name);
        out.push_str(&resolved);
        out.push_str(&token[close + 1..]);
    }

    /// Replace the leading run of name characters; a token without one is
    /// kept as is.
    fn expand_bare(&mut self, token: &str, out: &mut String) {
        let name_end = token
            .find(|ch: char| !is_name_char(ch))
            .unwrap_or(token.len());
        let resolved = self.lookup(&token[..name_end]);
        out.push_str(&resolved);
        out.push_str(&token[name_end..]);
    }

    fn lookup(&mut self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        if let Some(value) = self.store.get(name) {
            return value;
        }

        let parsed = self.parsed;
        let Some(raw) = parsed.get(name) else {
            return String::new();
        };

        if self.stack.iter().any(|item| item == name) {
            tracing::warn!(
                variable = name,
                path = ?self.stack,
                "cyclic variable reference resolved to an empty string"
            );
            return String::new();
        }

        self.stack.push(name.to_owned());
        let expanded = self.expand(raw);
        self.stack.pop();
        expanded
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(pairs: &[(&str, &str)]) -> ParsedSet {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn expand(value: &str, pairs: &[(&str, &str)]) -> String {
        interpolate(value, &parsed(pairs), &ProcessStore::memory())
    }

    #[test]
    fn resolves_bare_and_mustache_references() {
        assert_eq!(expand("$FOO", &[("FOO", "bar")]), "bar");
        assert_eq!(expand("${FOO}baz", &[("FOO", "bar")]), "barbaz");
        assert_eq!(expand("${ FOO }", &[("FOO", "bar")]), "bar");
        assert_eq!(
            expand("http://$HOST:$PORT/", &[("HOST", "h"), ("PORT", "80")]),
            "http://h:80/"
        );
    }

    #[test]
    fn bare_reference_stops_at_first_non_name_char() {
        assert_eq!(expand("$FOO-suffix", &[("FOO", "bar")]), "bar-suffix");
        assert_eq!(expand("$FOO.baz", &[("FOO", "bar")]), "bar.baz");
    }

    #[test]
    fn leading_escape_keeps_dollar_literal() {
        assert_eq!(expand("\\$FOO", &[]), "$FOO");
        assert_eq!(expand("\\$FOO", &[("FOO", "bar")]), "$FOO");
    }

    #[test]
    fn escape_before_first_dollar() {
        assert_eq!(expand("cost \\$5", &[("5", "five")]), "cost $5");
        assert_eq!(expand("\\x\\$FOO", &[("FOO", "bar")]), "\\x$FOO");
    }

    #[test]
    fn backslash_after_later_reference_is_plain_text() {
        let pairs = [("A", "a"), ("B", "b")];
        assert_eq!(expand("$A\\$B", &pairs), "a\\b");
        assert_eq!(expand("${A}\\$B", &pairs), "a\\b");
    }

    #[test]
    fn dollar_backslash_token_emits_next_token_raw() {
        assert_eq!(expand("$\\$FOO", &[("FOO", "bar")]), "$FOO");
        assert_eq!(expand("$\\x$FOO", &[("FOO", "bar")]), "$FOO");
        assert_eq!(expand("a$\\b", &[]), "a$");
    }

    #[test]
    fn missing_references_resolve_to_empty() {
        assert_eq!(expand("$MISSING", &[]), "");
        assert_eq!(expand("pre-${MISSING}-post", &[]), "pre--post");
    }

    #[test]
    fn malformed_references_drop_the_dollar() {
        assert_eq!(expand("${FOO", &[("FOO", "bar")]), "{FOO");
        assert_eq!(expand("5$", &[]), "5");
        assert_eq!(expand("a $ b", &[]), "a  b");
        assert_eq!(expand("$-x", &[]), "-x");
    }

    #[test]
    fn resolves_transitively() {
        let set = parsed(&[("A", "1"), ("B", "$A-2")]);
        assert_eq!(interpolate("$B", &set, &ProcessStore::memory()), "1-2");
    }

    #[test]
    fn store_values_win_and_are_not_reinterpolated() {
        let mut store = ProcessStore::memory();
        store.set("A", "$NOT_EXPANDED");
        let set = parsed(&[("A", "from-parse"), ("NOT_EXPANDED", "x")]);

        assert_eq!(interpolate("$A", &set, &store), "$NOT_EXPANDED");
    }

    #[test]
    fn cycles_resolve_to_empty() {
        let set = parsed(&[("A", "a$B"), ("B", "b$A")]);
        assert_eq!(interpolate("$A", &set, &ProcessStore::memory()), "ab");

        let set = parsed(&[("SELF", "x${SELF}y")]);
        assert_eq!(interpolate("$SELF", &set, &ProcessStore::memory()), "xy");
    }

    #[test]
    fn entry_resolution_treats_own_key_as_cyclic() {
        let set = parsed(&[("SELF", "x${SELF}y")]);
        let store = ProcessStore::memory();

        assert_eq!(interpolate_entry("SELF", "x${SELF}y", &set, &store), "xy");
    }

    #[test]
    fn text_without_dollar_is_untouched() {
        assert_eq!(expand("C:\\Temp\\dir", &[]), "C:\\Temp\\dir");
    }
}
