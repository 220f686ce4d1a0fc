/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Names of the reference marks that hold citation groups.
//!
//! A name has the form `JR_cite<serial>_<type>_<key>,<key>...`. The serial is
//! empty for the first group citing a given key list and `0`, `1`, ... for
//! later ones; the type digit is a [`CitationType`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MARK_PREFIX: &str = "JR_cite";

/// Bookmark covering the bibliography section.
pub const BIBLIOGRAPHY_BOOKMARK: &str = "JR_bib";

/// Collapsed bookmark at the end of the bibliography section.
pub const BIBLIOGRAPHY_END_BOOKMARK: &str = "JR_bib_end";

static MARK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^JR_cite(\d*)_([123])_(.*)$").expect("valid mark name regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CitationType {
    /// `(Smith, 2000)`
    Parenthetical,
    /// `Smith (2000)`
    InText,
    /// Present in the document and the bibliography, but not rendered.
    Invisible,
}

impl CitationType {
    pub fn code(self) -> u8 {
        match self {
            CitationType::Parenthetical => 1,
            CitationType::InText => 2,
            CitationType::Invisible => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CitationType::Parenthetical),
            2 => Some(CitationType::InText),
            3 => Some(CitationType::Invisible),
            _ => None,
        }
    }

    /// Type chosen by the insert dialog's two check boxes.
    pub fn from_options(with_text: bool, in_parenthesis: bool) -> Self {
        match (with_text, in_parenthesis) {
            (false, _) => CitationType::Invisible,
            (true, true) => CitationType::Parenthetical,
            (true, false) => CitationType::InText,
        }
    }

    pub fn in_parenthesis(self) -> bool {
        self != CitationType::InText
    }

    pub fn with_text(self) -> bool {
        self != CitationType::Invisible
    }
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CitationType::Parenthetical => "parenthetical",
            CitationType::InText => "in-text",
            CitationType::Invisible => "invisible",
        };
        write!(f, "{name}")
    }
}

/// The fields encoded in a mark name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMarkName {
    pub serial: Option<u32>,
    pub citation_type: CitationType,
    pub keys: Vec<String>,
}

/// Decodes a mark name; `None` for foreign names and for names without keys.
pub fn parse_mark_name(name: &str) -> Option<ParsedMarkName> {
    let caps = MARK_NAME.captures(name)?;
    let serial = match &caps[1] {
        "" => None,
        digits => Some(digits.parse().ok()?),
    };
    let citation_type = CitationType::from_code(caps[2].parse().ok()?)?;
    let keys: Vec<String> = caps[3].split(',').map(str::to_string).collect();
    if keys.iter().any(|k| k.is_empty()) {
        return None;
    }
    Some(ParsedMarkName {
        serial,
        citation_type,
        keys,
    })
}

pub fn is_citation_mark_name(name: &str) -> bool {
    MARK_NAME.is_match(name)
}

fn mark_name(serial: Option<u32>, keys: &str, citation_type: CitationType) -> String {
    let serial = serial.map(|s| s.to_string()).unwrap_or_default();
    format!("{MARK_PREFIX}{serial}_{}_{keys}", citation_type.code())
}

/// A name for a new mark that does not collide with `used_names`.
pub fn unique_mark_name<S: AsRef<str>>(
    keys: &[S],
    citation_type: CitationType,
    used_names: &[String],
) -> String {
    let joined = keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
    let taken = |name: &String| used_names.iter().any(|n| n == name);
    let first = mark_name(None, &joined, citation_type);
    if !taken(&first) {
        return first;
    }
    (0u32..)
        .map(|i| mark_name(Some(i), &joined, citation_type))
        .find(|name| !taken(name))
        .unwrap_or(first)
}
