/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Citation processing independent of any document.
//!
//! Given the citation groups found in a document (in storage order), the
//! bibliographic databases and a [`Style`](oocite_core::Style), the processor
//! resolves keys, orders citations, assigns numbers or disambiguation letters
//! and produces the text of every marker plus the bibliography.
//!
//! # Example
//!
//! ```rust
//! use oocite_core::{CitationType, Database, Entry, Style};
//! use oocite_processor::{produce_citation_markers, Citation, CitationGroup, CitationGroupId, CitationGroups};
//!
//! let style = Style::parse(
//!     "LAYOUT\ndefault=\\author\nPROPERTIES\nIsNumberEntries=true\nIsSortByPosition=true\nCITATION\nBracketBefore=[\nBracketAfter=]\n",
//! )
//! .unwrap();
//! let db: Database = vec![Entry::new("a", "book").with_field("author", "Smith, J.")]
//!     .into_iter()
//!     .collect();
//!
//! let group = CitationGroup::new(
//!     CitationGroupId::new("JR_cite_1_a"),
//!     CitationType::Parenthetical,
//!     vec![Citation::new("a")],
//!     None,
//! );
//! let mut groups = CitationGroups::new(vec![group]);
//! let result = produce_citation_markers(&mut groups, &[db], &style);
//! assert_eq!(result.markers[&CitationGroupId::new("JR_cite_1_a")], "[1]");
//! ```

pub mod bibliography;
pub mod error;
pub mod markers;
pub mod model;
pub mod process;
pub mod sorting;

pub use bibliography::{format_bibliography, BibliographyEntry, FormattedBibliography};
pub use error::{ProcessorError, Result};
pub use model::{
    Citation, CitationGroup, CitationGroupId, CitationGroups, CitationPath, CitedKey, CitedKeys,
    Resolution,
};
pub use process::{produce_citation_markers, CitationMarkers};
pub use sorting::EntrySortOrder;
