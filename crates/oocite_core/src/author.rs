/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! BibTeX name lists.

/// One parsed personal or corporate name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub first: Option<String>,
    pub von: Option<String>,
    pub last: Option<String>,
    pub jr: Option<String>,
}

impl Author {
    /// "van Beethoven" style family name.
    pub fn last_with_von(&self) -> String {
        [self.von.as_deref(), self.last.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Given names reduced to initials: "John Paul" becomes "J. P.".
    pub fn first_abbreviated(&self) -> Option<String> {
        let first = self.first.as_deref()?;
        let parts: Vec<String> = first
            .split_whitespace()
            .map(|part| {
                part.split('-')
                    .filter_map(|p| p.chars().next())
                    .map(|c| format!("{c}."))
                    .collect::<Vec<_>>()
                    .join("-")
            })
            .collect();
        Some(parts.join(" "))
    }

    /// "von Last, Jr., First" or "von Last, F." when abbreviated.
    pub fn last_first(&self, abbreviate: bool) -> String {
        let mut out = self.last_with_von();
        if let Some(jr) = &self.jr {
            out.push_str(", ");
            out.push_str(jr);
        }
        let first = if abbreviate {
            self.first_abbreviated()
        } else {
            self.first.clone()
        };
        if let Some(first) = first {
            out.push_str(", ");
            out.push_str(&first);
        }
        out
    }

    /// "First von Last, Jr."
    pub fn first_last(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(first) = &self.first {
            parts.push(first);
        }
        let family = self.last_with_von();
        if !family.is_empty() {
            parts.push(&family);
        }
        let mut out = parts.join(" ");
        if let Some(jr) = &self.jr {
            out.push_str(", ");
            out.push_str(jr);
        }
        out
    }

    fn parse(name: &str) -> Author {
        let parts: Vec<&str> = split_top_level(name, |s| s.starts_with(','), 1)
            .into_iter()
            .map(str::trim)
            .collect();
        match parts.as_slice() {
            [single] => parse_first_von_last(single),
            [von_last, first] => {
                let (von, last) = split_von_last(von_last);
                Author {
                    first: non_empty(first),
                    von,
                    last,
                    jr: None,
                }
            }
            [von_last, jr, first, ..] => {
                let (von, last) = split_von_last(von_last);
                Author {
                    first: non_empty(first),
                    von,
                    last,
                    jr: non_empty(jr),
                }
            }
            [] => Author::default(),
        }
    }
}

/// A parsed `and`-separated list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorList(Vec<Author>);

impl AuthorList {
    pub fn parse(value: &str) -> Self {
        let names = split_top_level(value, starts_with_and, 3);
        Self(
            names
                .into_iter()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(Author::parse)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Author> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Author> {
        self.0.iter()
    }

    /// "Last, First and Last, First", BibTeX-style.
    pub fn as_last_first(&self, abbreviate: bool) -> String {
        self.0
            .iter()
            .map(|a| a.last_first(abbreviate))
            .collect::<Vec<_>>()
            .join(" and ")
    }

    pub fn as_first_last(&self) -> String {
        self.0
            .iter()
            .map(Author::first_last)
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Names joined with `separator`, the last one with `last_separator`.
    pub fn join_with(
        &self,
        render: impl Fn(&Author) -> String,
        separator: &str,
        last_separator: &str,
    ) -> String {
        let names: Vec<String> = self.0.iter().map(render).collect();
        match names.len() {
            0 => String::new(),
            1 => names[0].clone(),
            n => format!(
                "{}{}{}",
                names[..n - 1].join(separator),
                last_separator,
                names[n - 1]
            ),
        }
    }
}

impl<'a> IntoIterator for &'a AuthorList {
    type Item = &'a Author;
    type IntoIter = std::slice::Iter<'a, Author>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| strip_braces(s))
}

fn strip_braces(s: &str) -> String {
    s.chars().filter(|c| *c != '{' && *c != '}').collect()
}

fn starts_with_and(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    bytes.len() >= 5
        && bytes[0].is_ascii_whitespace()
        && bytes[1..4].eq_ignore_ascii_case(b"and")
        && bytes[4].is_ascii_whitespace()
}

/// Splits at brace depth zero wherever `is_separator` matches the remaining
/// input; the separator is `width` bytes long (plus surrounding whitespace).
fn split_top_level(value: &str, is_separator: impl Fn(&str) -> bool, width: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    let bytes = value.as_bytes();
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && value.is_char_boundary(i) && is_separator(&value[i..]) => {
                parts.push(&value[start..i]);
                let skip = if bytes[i] == b',' { 1 } else { width + 1 };
                i += skip;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&value[start..]);
    parts
}

fn is_lowercase_word(word: &str) -> bool {
    word.chars()
        .find(|c| c.is_alphabetic() || *c == '{')
        .is_some_and(|c| c.is_lowercase())
}

fn words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(st) = start.take() {
                words.push(&s[st..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        words.push(&s[st..]);
    }
    words
}

fn split_von_last(von_last: &str) -> (Option<String>, Option<String>) {
    let words = words(von_last);
    let von_len = words
        .iter()
        .take(words.len().saturating_sub(1))
        .take_while(|w| is_lowercase_word(w))
        .count();
    let von = words[..von_len].join(" ");
    let last = words[von_len..].join(" ");
    (non_empty(&von), non_empty(&last))
}

fn parse_first_von_last(name: &str) -> Author {
    let words = words(name);
    if words.len() <= 1 {
        return Author {
            last: non_empty(name),
            ..Author::default()
        };
    }
    let first_len = words[..words.len() - 1]
        .iter()
        .take_while(|w| !is_lowercase_word(w))
        .count()
        .max(if is_lowercase_word(words[0]) { 0 } else { 1 });
    let von_len = words[first_len..words.len() - 1]
        .iter()
        .take_while(|w| is_lowercase_word(w))
        .count();
    let first = words[..first_len].join(" ");
    let von = words[first_len..first_len + von_len].join(" ");
    let last = words[first_len + von_len..].join(" ");
    Author {
        first: non_empty(&first),
        von: non_empty(&von),
        last: non_empty(&last),
        jr: None,
    }
}
