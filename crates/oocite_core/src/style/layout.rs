/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Reference layouts: the per-entry-type templates of a style's `LAYOUT` section.
//!
//! A layout mixes literal text with field references:
//!
//! ```text
//! \author: \begin{title}<i>\title</i>. \end{title}\format[Upper]{\journal} (\year\uniq)
//! ```
//!
//! `\begin{f}...\end{f}` renders its body only when field `f` is non-empty, and
//! `\format[F1,F2]{...}` pipes its body through the named formatters in order.

use crate::author::AuthorList;
use crate::database::Database;
use crate::entry::Entry;
use crate::latex;
use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, not, preceded, repeat, separated, terminated};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutNode {
    Text(String),
    Field(String),
    Block {
        field: String,
        body: Vec<LayoutNode>,
    },
    Format {
        formatters: Vec<LayoutFormatter>,
        body: Vec<LayoutNode>,
    },
}

/// Named text transformations available to `\format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutFormatter {
    AuthorLastFirst,
    AuthorFirstFirst,
    AuthorLastFirstAbbreviator,
    AuthorAndsReplacer,
    Upper,
    Lower,
    FormatPagesForHtml,
    HtmlChars,
    Unknown(String),
}

impl LayoutFormatter {
    pub fn from_name(name: &str) -> Self {
        match name {
            "AuthorLastFirst" => Self::AuthorLastFirst,
            "AuthorFirstFirst" => Self::AuthorFirstFirst,
            "AuthorLastFirstAbbreviator" | "AuthorLastFirstAbbr" => Self::AuthorLastFirstAbbreviator,
            "AuthorAndsReplacer" => Self::AuthorAndsReplacer,
            "Upper" | "ToUpperCase" => Self::Upper,
            "Lower" | "ToLowerCase" => Self::Lower,
            "FormatPagesForHTML" => Self::FormatPagesForHtml,
            "HTMLChars" => Self::HtmlChars,
            other => {
                tracing::warn!(
                    formatter = other,
                    "unknown layout formatter, output left unchanged"
                );
                Self::Unknown(other.to_string())
            }
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::AuthorLastFirst => AuthorList::parse(value).as_last_first(false),
            Self::AuthorFirstFirst => AuthorList::parse(value).as_first_last(),
            Self::AuthorLastFirstAbbreviator => AuthorList::parse(value).as_last_first(true),
            Self::AuthorAndsReplacer => {
                let names: Vec<&str> = value.split(" and ").collect();
                match names.as_slice() {
                    [] => String::new(),
                    [one] => one.to_string(),
                    [init @ .., last] => format!("{} & {}", init.join(", "), last),
                }
            }
            Self::Upper => value.to_uppercase(),
            Self::Lower => value.to_lowercase(),
            Self::FormatPagesForHtml => value.replace("--", "–"),
            Self::HtmlChars | Self::Unknown(_) => value.to_string(),
        }
    }
}

/// Values a layout can reference while rendering one entry.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub entry: &'a Entry,
    pub database: &'a Database,
    pub unique_letter: Option<&'a str>,
}

impl LayoutContext<'_> {
    /// Unconverted field value.
    fn raw(&self, field: &str) -> Option<String> {
        match field {
            "uniq" => self.unique_letter.map(str::to_string),
            "key" | "bibtexkey" | "citationkey" => self.entry.citation_key().map(str::to_string),
            "entrytype" => Some(self.entry.entry_type.clone()),
            _ => self.entry.resolved_field(field, self.database),
        }
        .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    nodes: Vec<LayoutNode>,
}

impl Layout {
    pub fn parse(src: &str) -> Result<Self, String> {
        let nodes = top_level.parse(src).map_err(|e| e.to_string())?;
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    /// Renders the layout into inline markup.
    pub fn render(&self, ctx: &LayoutContext<'_>) -> String {
        render_nodes(&self.nodes, ctx)
    }
}

fn render_nodes(nodes: &[LayoutNode], ctx: &LayoutContext<'_>) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            LayoutNode::Text(text) => out.push_str(text),
            LayoutNode::Field(name) => {
                if let Some(value) = ctx.raw(name) {
                    out.push_str(&latex::to_markup(&value));
                }
            }
            LayoutNode::Block { field, body } => {
                if ctx.raw(field).is_some() {
                    out.push_str(&render_nodes(body, ctx));
                }
            }
            LayoutNode::Format { formatters, body } => {
                // A lone field is formatted before LaTeX conversion so that
                // name parsing still sees braces.
                if let [LayoutNode::Field(name)] = body.as_slice() {
                    if let Some(raw) = ctx.raw(name) {
                        let formatted = formatters.iter().fold(raw, |acc, f| f.apply(&acc));
                        out.push_str(&latex::to_markup(&formatted));
                    }
                } else {
                    let rendered = render_nodes(body, ctx);
                    out.push_str(&formatters.iter().fold(rendered, |acc, f| f.apply(&acc)));
                }
            }
        }
    }
    out
}

fn identifier<'s>(input: &mut &'s str) -> winnow::Result<&'s str, ContextError> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

fn field_ref(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    let name = preceded(
        '\\',
        identifier.verify(|n: &str| !matches!(n, "begin" | "end" | "format")),
    )
    .parse_next(input)?;
    Ok(LayoutNode::Field(name.to_lowercase()))
}

fn block(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    let field = delimited("\\begin{", identifier, '}').parse_next(input)?;
    let body = nodes.parse_next(input)?;
    let _ = delimited(
        "\\end{",
        identifier.verify(|n: &str| n.eq_ignore_ascii_case(field)),
        '}',
    )
    .parse_next(input)?;
    Ok(LayoutNode::Block {
        field: field.to_lowercase(),
        body,
    })
}

fn formatter_name<'s>(input: &mut &'s str) -> winnow::Result<&'s str, ContextError> {
    delimited(
        space0,
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
        space0,
    )
    .parse_next(input)
}

fn format_call(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    let names: Vec<&str> =
        delimited("\\format[", separated(1.., formatter_name, ','), ']').parse_next(input)?;
    let body = delimited('{', nodes, '}').parse_next(input)?;
    Ok(LayoutNode::Format {
        formatters: names.into_iter().map(LayoutFormatter::from_name).collect(),
        body,
    })
}

fn escaped(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    let c = preceded('\\', one_of(['\\', '{', '}'])).parse_next(input)?;
    Ok(LayoutNode::Text(c.to_string()))
}

fn text(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    let s = take_while(1.., |c: char| c != '\\' && c != '}').parse_next(input)?;
    Ok(LayoutNode::Text(s.to_string()))
}

fn lone_backslash(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    let _ = terminated('\\', not("end{")).parse_next(input)?;
    Ok(LayoutNode::Text("\\".to_string()))
}

fn node(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    alt((block, format_call, field_ref, escaped, text, lone_backslash)).parse_next(input)
}

fn nodes(input: &mut &str) -> winnow::Result<Vec<LayoutNode>, ContextError> {
    repeat(0.., node).parse_next(input)
}

fn closing_brace(input: &mut &str) -> winnow::Result<LayoutNode, ContextError> {
    let _ = '}'.parse_next(input)?;
    Ok(LayoutNode::Text("}".to_string()))
}

fn top_level(input: &mut &str) -> winnow::Result<Vec<LayoutNode>, ContextError> {
    let parts: Vec<LayoutNode> = repeat(0.., alt((node, closing_brace))).parse_next(input)?;
    // Merge adjacent literals so equal layouts compare equal.
    let mut merged: Vec<LayoutNode> = Vec::with_capacity(parts.len());
    for part in parts {
        match (merged.last_mut(), part) {
            (Some(LayoutNode::Text(prev)), LayoutNode::Text(t)) => prev.push_str(&t),
            (_, part) => merged.push(part),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(layout: &str, entry: &Entry) -> String {
        let db = Database::default();
        let ctx = LayoutContext {
            entry,
            database: &db,
            unique_letter: Some("b"),
        };
        Layout::parse(layout).unwrap().render(&ctx)
    }

    fn sample() -> Entry {
        Entry::new("smith2000", "article")
            .with_field("author", "Smith, John and Doe, Jane")
            .with_field("title", r"On \emph{Things}")
            .with_field("year", "2000")
    }

    #[test]
    fn test_fields_and_text() {
        assert_eq!(
            render(r"\title (\year\uniq).", &sample()),
            "On <i>Things</i> (2000b)."
        );
    }

    #[test]
    fn test_conditional_block() {
        let layout = r"\begin{journal}in \journal. \end{journal}\year";
        assert_eq!(render(layout, &sample()), "2000");
        let with_journal = sample().with_field("journal", "Nature");
        assert_eq!(render(layout, &with_journal), "in Nature. 2000");
    }

    #[test]
    fn test_formatters() {
        assert_eq!(
            render(r"\format[AuthorFirstFirst]{\author}", &sample()),
            "John Smith and Jane Doe"
        );
        assert_eq!(
            render(r"\format[AuthorLastFirstAbbreviator,AuthorAndsReplacer]{\author}", &sample()),
            "Smith, J. &amp; Doe, J."
        );
        assert_eq!(render(r"\format[Lower]{\year: \title}", &sample()), "2000: on <i>things</i>");
    }

    #[test]
    fn test_unknown_formatter_is_identity() {
        assert_eq!(render(r"\format[NoSuchThing]{\year}", &sample()), "2000");
    }

    #[test]
    fn test_mismatched_block_is_an_error() {
        assert!(Layout::parse(r"\begin{title}\title\end{year}").is_err());
    }
}
