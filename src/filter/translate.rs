//! Translation of gitignore-style patterns into anchored regular expressions.
//!
//! The translation is a single left-to-right scan over the pattern. Wildcard
//! syntax becomes regex fragments; every other character is passed through
//! [`regex::escape`], so the output is always a valid expression.

/// How a pattern is anchored against a relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Leading `/`: matches from the root, tolerating a leading slash in the path.
    Root,
    /// Leading `**/`: matches starting at any directory depth.
    AnyDepth,
    /// Neither: matches at the root level only.
    Bare,
}

impl Anchor {
    fn prefix(self) -> &'static str {
        match self {
            Anchor::Root => "^(?:|/)",
            Anchor::AnyDepth => "^(?:|.*/)",
            Anchor::Bare => "^",
        }
    }
}

/// Translate one pattern (negation prefixes already stripped) into regex source.
///
/// Rules, in scan priority:
///
/// - `/**/` matches a single `/` or any run of directories between slashes
/// - `**/` optionally matches any leading run ending in `/`
/// - `/**` optionally matches `/` followed by anything
/// - `*` matches any run of characters other than `/`
/// - `?` matches exactly one character other than `/`
/// - `[...]` is a character class; `[!...]` and `[^...]` negate it
/// - `\c` matches `c` literally (this is how `\#`, `\!` and `\*` work)
///
/// A trailing `/` makes the pattern match the directory and everything
/// beneath it. Otherwise the pattern matches the exact path or, if that path
/// is a directory, everything beneath it.
pub(crate) fn translate(pattern: &str) -> String {
    let dir_only = pattern.ends_with('/');

    let (anchor, body) = if pattern.starts_with("/**/") {
        // Keep the double-star so it can also match zero directories.
        (Anchor::Root, &pattern[1..])
    } else if let Some(rest) = pattern.strip_prefix('/') {
        (Anchor::Root, rest)
    } else if let Some(rest) = pattern.strip_prefix("**/") {
        (Anchor::AnyDepth, rest)
    } else {
        (Anchor::Bare, pattern)
    };

    let mut expr = String::with_capacity(pattern.len() * 2 + 16);
    expr.push_str(anchor.prefix());
    translate_body(body, &mut expr);
    expr.push_str(if dir_only { "(?:|.*)$" } else { "(?:|/.*)$" });
    expr
}

const SLASH_STARS_SLASH: [char; 4] = ['/', '*', '*', '/'];
const STARS_SLASH: [char; 3] = ['*', '*', '/'];
const SLASH_STARS: [char; 3] = ['/', '*', '*'];

fn translate_body(body: &str, out: &mut String) {
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let rest = &chars[i..];

        if rest.starts_with(&SLASH_STARS_SLASH) {
            out.push_str("(?:/|/.+/)");
            i += SLASH_STARS_SLASH.len();
            continue;
        }
        if rest.starts_with(&STARS_SLASH) {
            out.push_str("(?:|.*/)");
            i += STARS_SLASH.len();
            continue;
        }
        if rest.starts_with(&SLASH_STARS) {
            out.push_str("(?:|/.*)");
            i += SLASH_STARS.len();
            continue;
        }

        match chars[i] {
            '\\' => match chars.get(i + 1) {
                Some(&escaped) => {
                    push_literal(out, escaped);
                    i += 2;
                }
                None => {
                    push_literal(out, '\\');
                    i += 1;
                }
            },
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => match translate_class(rest) {
                Some((class, consumed)) => {
                    out.push_str(&class);
                    i += consumed;
                }
                None => {
                    push_literal(out, '[');
                    i += 1;
                }
            },
            c => {
                push_literal(out, c);
                i += 1;
            }
        }
    }
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Translate a bracket expression starting at `chars[0] == '['`.
///
/// Returns the regex class and the number of pattern characters consumed,
/// or `None` if the bracket is never closed.
fn translate_class(chars: &[char]) -> Option<(String, usize)> {
    let mut i = 1;
    let negated = matches!(chars.get(i), Some('!' | '^'));
    if negated {
        i += 1;
    }

    let start = i;
    // A `]` right after the opening bracket is a member, not the terminator.
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() && chars[i] != ']' {
        if chars[i] == '\\' {
            i += 1;
        }
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }

    let members = unescape_members(&chars[start..i]);

    let mut class = String::from("[");
    if negated {
        class.push_str("^/");
    }

    let mut j = 0;
    while j < members.len() {
        let lo = members[j];
        if j + 2 < members.len() && members[j + 1] == '-' {
            let hi = members[j + 2];
            if lo <= hi {
                push_literal(&mut class, lo);
                class.push('-');
                push_literal(&mut class, hi);
            } else {
                // Reversed range: keep the characters, drop the range.
                push_literal(&mut class, lo);
                push_literal(&mut class, '-');
                push_literal(&mut class, hi);
            }
            j += 3;
        } else {
            push_literal(&mut class, lo);
            j += 1;
        }
    }

    class.push(']');
    Some((class, i + 1))
}

fn unescape_members(raw: &[char]) -> Vec<char> {
    let mut members = Vec::with_capacity(raw.len());
    let mut iter = raw.iter();
    while let Some(&c) = iter.next() {
        if c == '\\' {
            members.push(iter.next().copied().unwrap_or('\\'));
        } else {
            members.push(c);
        }
    }
    members
}
