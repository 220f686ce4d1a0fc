/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Inline markup for formatted text.
//!
//! Citation markers and bibliography entries are produced as strings carrying a
//! small HTML-like tag set. Document writers split them into [`Run`]s, each a
//! piece of text with uniform character attributes.

use serde::{Deserialize, Serialize};

/// Direct character attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharFormat {
    pub bold: bool,
    pub italic: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub small_caps: bool,
    pub monospace: bool,
}

impl CharFormat {
    pub fn is_plain(&self) -> bool {
        *self == CharFormat::default()
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }

    /// Attributes set in either format.
    pub fn union(self, other: CharFormat) -> CharFormat {
        CharFormat {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            superscript: self.superscript || other.superscript,
            subscript: self.subscript || other.subscript,
            underline: self.underline || other.underline,
            strikeout: self.strikeout || other.strikeout,
            small_caps: self.small_caps || other.small_caps,
            monospace: self.monospace || other.monospace,
        }
    }
}

/// Text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub format: CharFormat,
}

#[derive(Clone, Copy)]
enum Tag {
    Bold,
    Italic,
    Superscript,
    Subscript,
    Underline,
    Strikeout,
    SmallCaps,
    Monospace,
}

const TAGS: [(&str, Tag); 9] = [
    ("b", Tag::Bold),
    ("i", Tag::Italic),
    ("em", Tag::Italic),
    ("sup", Tag::Superscript),
    ("sub", Tag::Subscript),
    ("u", Tag::Underline),
    ("s", Tag::Strikeout),
    ("smallcaps", Tag::SmallCaps),
    ("tt", Tag::Monospace),
];

const ENTITIES: [(&str, char); 6] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
    ("&nbsp;", '\u{a0}'),
];

#[derive(Default)]
struct Depths([usize; 8]);

impl Depths {
    fn format(&self) -> CharFormat {
        let on = |t: Tag| self.0[t as usize] > 0;
        CharFormat {
            bold: on(Tag::Bold),
            italic: on(Tag::Italic),
            superscript: on(Tag::Superscript),
            subscript: on(Tag::Subscript),
            underline: on(Tag::Underline),
            strikeout: on(Tag::Strikeout),
            small_caps: on(Tag::SmallCaps),
            monospace: on(Tag::Monospace),
        }
    }
}

/// Matches a known tag at the start of `rest`: returns its length, the tag,
/// and whether it closes.
fn match_tag(rest: &str) -> Option<(usize, Tag, bool)> {
    let inner_start = if rest.starts_with("</") { 2 } else { 1 };
    let close = rest[inner_start..].find('>')? + inner_start;
    let name = &rest[inner_start..close];
    TAGS.iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, tag)| (close + 1, *tag, inner_start == 2))
}

fn match_entity(rest: &str) -> Option<(usize, char)> {
    ENTITIES
        .iter()
        .find(|(e, _)| rest.starts_with(e))
        .map(|(e, c)| (e.len(), *c))
}

/// Splits markup into formatted runs. Unknown tags and stray `<`/`&` are
/// kept as literal text.
pub fn parse(markup: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut depths = Depths::default();
    let mut text = String::new();

    let flush = |runs: &mut Vec<Run>, text: &mut String, format: CharFormat| {
        if text.is_empty() {
            return;
        }
        match runs.last_mut() {
            Some(last) if last.format == format => last.text.push_str(text),
            _ => runs.push(Run {
                text: text.clone(),
                format,
            }),
        }
        text.clear();
    };

    let mut i = 0;
    while i < markup.len() {
        let rest = &markup[i..];
        if rest.starts_with('<') {
            if let Some((len, tag, closing)) = match_tag(rest) {
                flush(&mut runs, &mut text, depths.format());
                let depth = &mut depths.0[tag as usize];
                if closing {
                    *depth = depth.saturating_sub(1);
                } else {
                    *depth += 1;
                }
                i += len;
                continue;
            }
        } else if rest.starts_with('&') {
            if let Some((len, c)) = match_entity(rest) {
                text.push(c);
                i += len;
                continue;
            }
        }
        let c = rest.chars().next().unwrap_or_default();
        text.push(c);
        i += c.len_utf8();
    }
    flush(&mut runs, &mut text, depths.format());
    runs
}

/// Markup with tags removed and entities decoded.
pub fn to_plain_text(markup: &str) -> String {
    parse(markup).into_iter().map(|r| r.text).collect()
}

/// Escapes text so it survives [`parse`] unchanged.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Wraps `inner` in the tag for each attribute set in `format`.
pub fn wrap(inner: &str, format: CharFormat) -> String {
    let mut out = inner.to_string();
    let pairs = [
        (format.italic, "i"),
        (format.bold, "b"),
        (format.superscript, "sup"),
        (format.subscript, "sub"),
        (format.underline, "u"),
        (format.strikeout, "s"),
        (format.small_caps, "smallcaps"),
        (format.monospace, "tt"),
    ];
    for (on, tag) in pairs {
        if on {
            out = format!("<{tag}>{out}</{tag}>");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_one_run() {
        let runs = parse("Smith, 2000");
        assert_eq!(runs.len(), 1);
        assert!(runs[0].format.is_plain());
    }

    #[test]
    fn test_nested_tags() {
        let runs = parse("A <b>bold <i>both</i></b> end");
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["A ", "bold ", "both", " end"]);
        assert!(runs[1].format.bold && !runs[1].format.italic);
        assert!(runs[2].format.bold && runs[2].format.italic);
        assert!(runs[3].format.is_plain());
    }

    #[test]
    fn test_entities_and_stray_characters() {
        assert_eq!(to_plain_text("Smith &amp; Jones"), "Smith & Jones");
        assert_eq!(to_plain_text("a < b & c"), "a < b & c");
        assert_eq!(to_plain_text("<span>x</span>"), "<span>x</span>");
    }

    #[test]
    fn test_wrap_then_parse() {
        let format = CharFormat {
            superscript: true,
            ..CharFormat::default()
        };
        let runs = parse(&wrap("[1]", format));
        assert_eq!(runs, vec![Run { text: "[1]".to_string(), format }]);
    }
}
