/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

#![allow(dead_code)]

use oocite_core::{Database, Style};

/// A complete author-year style file, as shipped to users.
pub const JOURNAL_STYLE: &str = r#"# Example style for the integration tests
NAME
Journal of Examples

JOURNALS
Journal of Examples
J. Ex.

PROPERTIES
Title=References
IsSortByPosition=false
IsNumberEntries=false
ReferenceParagraphFormat=Text body
ReferenceHeaderParagraphFormat=Heading 2

CITATION
AuthorField=author/editor
YearField=year
MaxAuthors=2
MaxAuthorsFirst=4
AuthorSeparator=", "
AuthorLastSeparator=" & "
EtAlString=" et al."
YearSeparator=" "
BracketBefore=[
BracketAfter=]
ItalicEtAl=true

LAYOUT
article=\format[AuthorLastFirst,AuthorAndsReplacer]{\author} (\year\uniq). \title. <i>\journal</i>\begin{volume}, \volume\end{volume}.
incollection=\format[AuthorLastFirst]{\author} (\year\uniq). \title. In \booktitle\begin{publisher}, \publisher\end{publisher}.
default=\format[AuthorLastFirst]{\author} (\year\uniq). <i>\title</i>.
"#;

pub const SAMPLE_BIB: &str = r#"@Comment{jabref-meta: databaseType:biblatex;}

@article{Smith2020,
  author = {Smith, John and Doe, Jane},
  title = {Counting Things},
  journaltitle = {Journal of Examples},
  volume = {12},
  date = {2020-05-01},
}

@collection{Ed2019,
  editor = {Ed, Edna},
  title = {Collected Essays},
  publisher = {Example Press},
  year = {2019},
}

@incollection{Roe2019,
  author = {Roe, Richard},
  title = {An Essay},
  year = {2019},
  crossref = {Ed2019},
}
"#;

pub fn journal_style() -> Style {
    Style::parse(JOURNAL_STYLE).expect("journal style parses")
}

pub fn sample_database() -> Database {
    Database::from_bibtex(SAMPLE_BIB).expect("sample bibliography parses")
}
