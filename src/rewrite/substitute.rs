//! Single-pass multi-pattern literal substitution.
//!
//! All patterns are matched in one left-to-right scan. At each position the
//! longest matching pattern wins and the scan resumes after the inserted
//! replacement, so replaced text is never matched again.

use std::borrow::Cow;

use regex::{Captures, Regex, RegexBuilder};
use rustc_hash::FxHashMap;

/// Compiled pattern sets for large sites can be big.
const SIZE_LIMIT: usize = 64 * (1 << 20);

/// A set of `pattern → replacement` pairs applied together.
#[derive(Debug)]
pub struct Substitutions {
    matcher: Option<Regex>,
    /// Patterns ordered longest first.
    patterns: Vec<String>,
    replacements: FxHashMap<String, String>,
    token_bounded: bool,
}

impl Substitutions {
    /// Compile a substitution set. Empty patterns are ignored; for duplicate
    /// patterns the last replacement wins.
    pub fn new<I, K, V>(pairs: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let replacements: FxHashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        let mut patterns: Vec<String> = replacements.keys().cloned().collect();
        patterns.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let matcher = if patterns.is_empty() {
            None
        } else {
            let alternation = patterns
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            Some(RegexBuilder::new(&alternation).size_limit(SIZE_LIMIT).build()?)
        };

        Ok(Self {
            matcher,
            patterns,
            replacements,
            token_bounded: false,
        })
    }

    /// Only match occurrences not adjacent to `[A-Za-z0-9_$-]`.
    pub fn token_bounded(mut self) -> Self {
        self.token_bounded = true;
        self
    }

    /// Apply every substitution to `text`.
    ///
    /// Returns `Cow::Borrowed` when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let Some(matcher) = &self.matcher else {
            return Cow::Borrowed(text);
        };
        if self.token_bounded {
            self.apply_bounded(matcher, text)
        } else {
            // Alternation is leftmost-first and patterns are sorted longest
            // first, so the regex already picks the longest match.
            matcher.replace_all(text, |caps: &Captures| {
                let found = &caps[0];
                self.replacements
                    .get(found)
                    .cloned()
                    .unwrap_or_else(|| found.to_string())
            })
        }
    }

    fn apply_bounded<'t>(&self, matcher: &Regex, text: &'t str) -> Cow<'t, str> {
        let mut out = String::new();
        let mut copied = 0;
        let mut pos = 0;

        while let Some(found) = matcher.find_at(text, pos) {
            let start = found.start();
            match self.bounded_match_at(text, start) {
                Some(pattern) => {
                    out.push_str(&text[copied..start]);
                    out.push_str(&self.replacements[pattern]);
                    copied = start + pattern.len();
                    pos = copied;
                }
                None => {
                    pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }

        if copied == 0 {
            Cow::Borrowed(text)
        } else {
            out.push_str(&text[copied..]);
            Cow::Owned(out)
        }
    }

    /// Longest pattern starting at `start` with token boundaries on both sides.
    fn bounded_match_at(&self, text: &str, start: usize) -> Option<&str> {
        let before = text[..start].chars().next_back();
        if before.is_some_and(is_token_char) {
            return None;
        }
        let rest = &text[start..];
        self.patterns
            .iter()
            .filter(|p| rest.starts_with(p.as_str()))
            .find(|p| !rest[p.len()..].chars().next().is_some_and(is_token_char))
            .map(String::as_str)
    }
}

/// Characters that continue an identifier or chunk name.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_borrows() {
        let subs = Substitutions::new(Vec::<(String, String)>::new()).unwrap();
        assert!(matches!(subs.apply("abc"), Cow::Borrowed("abc")));
    }

    #[test]
    fn test_longest_pattern_wins() {
        let subs = Substitutions::new([("/a.js", "A"), ("/a.js.map", "M")]).unwrap();
        assert_eq!(subs.apply("x /a.js.map /a.js"), "x M A");
    }

    #[test]
    fn test_replaced_text_is_not_rescanned() {
        let subs = Substitutions::new([("app", "//cdn/app-data-1"), ("app-data", "//cdn/ad")])
            .unwrap()
            .token_bounded();
        assert_eq!(subs.apply(r#"["app","app-data"]"#), r#"["//cdn/app-data-1","//cdn/ad"]"#);
    }

    #[test]
    fn test_token_boundaries() {
        let subs = Substitutions::new([("app", "X")]).unwrap().token_bounded();
        assert_eq!(subs.apply("app webapp app_1 app-2 $app (app)"), "X webapp app_1 app-2 $app (X)");
    }

    #[test]
    fn test_unbounded_replaces_everywhere() {
        let subs = Substitutions::new([("/app.js", "https://cdn/app.1.js")]).unwrap();
        assert_eq!(
            subs.apply(r#"<script src="/app.js"></script><link href="/app.js">"#),
            r#"<script src="https://cdn/app.1.js"></script><link href="https://cdn/app.1.js">"#
        );
    }

    #[test]
    fn test_bounded_rejects_embedded_prefix() {
        // neither pattern ends on a boundary inside `ab-cd`
        let subs = Substitutions::new([("ab-c", "L"), ("ab", "S")]).unwrap().token_bounded();
        assert_eq!(subs.apply("ab-cd ab"), "ab-cd S");
    }
}
