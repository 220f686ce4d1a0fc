/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Line-based parser for style descriptor files.

use super::{Layout, PropertyValue, Style};
use crate::error::{CoreError, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("valid integer regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    None,
    Name,
    Layout,
    Properties,
    Citation,
    Journals,
}

impl Mode {
    fn from_header(line: &str) -> Option<Self> {
        match line {
            "NAME" => Some(Mode::Name),
            "LAYOUT" => Some(Mode::Layout),
            "PROPERTIES" => Some(Mode::Properties),
            "CITATION" => Some(Mode::Citation),
            "JOURNALS" => Some(Mode::Journals),
            _ => None,
        }
    }
}

pub(super) fn parse(src: &str) -> Result<Style> {
    let mut style = Style::with_defaults();
    let mut default_layout: Option<Layout> = None;
    let mut mode = Mode::None;

    for raw in src.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(next) = Mode::from_header(line.trim()) {
            mode = next;
            continue;
        }
        match mode {
            Mode::Name => style.name = line.trim().to_string(),
            Mode::Layout => {
                let Some((entry_type, format)) = line.split_once('=') else {
                    tracing::warn!(line, "layout line without `=`");
                    continue;
                };
                let entry_type = entry_type.trim().to_lowercase();
                let layout = Layout::parse(format).map_err(|message| CoreError::Layout {
                    entry_type: entry_type.clone(),
                    message,
                })?;
                if entry_type == "default" {
                    default_layout = Some(layout);
                } else {
                    style.layouts.insert(entry_type, layout);
                }
            }
            Mode::Properties => set_property(&mut style.properties, line),
            Mode::Citation => set_property(&mut style.citation_properties, line),
            Mode::Journals => {
                style.journals.insert(line.trim().to_string());
            }
            Mode::None => tracing::debug!(line, "ignoring text outside any section"),
        }
    }

    style.default_layout =
        default_layout.ok_or_else(|| CoreError::MissingDefaultLayout(style.name.clone()))?;
    Ok(style)
}

fn set_property(bag: &mut IndexMap<String, PropertyValue>, line: &str) {
    let Some((name, value)) = line.split_once('=') else {
        tracing::warn!(line, "property line without `=`");
        return;
    };
    bag.insert(name.trim().to_string(), property_value(value));
}

fn property_value(value: &str) -> PropertyValue {
    let trimmed = value.trim();
    let value = if trimmed.len() > 1 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    if INTEGER.is_match(value) {
        if let Ok(n) = value.parse() {
            return PropertyValue::Int(n);
        }
    }
    if value.eq_ignore_ascii_case("true") {
        return PropertyValue::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return PropertyValue::Bool(false);
    }
    PropertyValue::Str(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_values() {
        assert_eq!(property_value("3"), PropertyValue::Int(3));
        assert_eq!(property_value("-1"), PropertyValue::Int(-1));
        assert_eq!(property_value(" true"), PropertyValue::Bool(true));
        assert_eq!(property_value("\"; \""), PropertyValue::Str("; ".to_string()));
        assert_eq!(property_value("["), PropertyValue::Str("[".to_string()));
        assert_eq!(property_value("\"\""), PropertyValue::Str(String::new()));
    }

    #[test]
    fn test_comments_and_crlf() {
        let src = "# a comment\r\nNAME\r\nDemo\r\n\r\nLAYOUT\r\ndefault=\\title\r\n";
        let style = parse(src).unwrap();
        assert_eq!(style.name(), "Demo");
    }

    #[test]
    fn test_missing_default_layout() {
        let err = parse("NAME\nBroken\nLAYOUT\narticle=\\title\n").unwrap_err();
        assert!(matches!(err, CoreError::MissingDefaultLayout(name) if name == "Broken"));
    }

    #[test]
    fn test_invalid_layout() {
        let err = parse("LAYOUT\ndefault=\\begin{title}x\\end{year}\n").unwrap_err();
        assert!(matches!(err, CoreError::Layout { entry_type, .. } if entry_type == "default"));
    }
}
