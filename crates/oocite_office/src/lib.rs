/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Citations inside a live word-processor document.
//!
//! A [`CitationManager`] inserts, merges, splits and refreshes citation
//! markers and the bibliography of a document reached through the
//! [`TextDocument`] trait. [`MemoryDocument`] implements that trait in memory.
//!
//! # Example
//!
//! ```rust
//! use oocite_core::{Database, Entry, Style};
//! use oocite_office::{CitationManager, MemoryDocument, Preferences};
//!
//! let style = Style::parse(
//!     "LAYOUT\ndefault=\\author: \\title\nPROPERTIES\nIsNumberEntries=true\nIsSortByPosition=true\nCITATION\nBracketBefore=[\nBracketAfter=]\n",
//! )
//! .unwrap();
//! let smith = Entry::new("smith2000", "book")
//!     .with_field("author", "Smith, John")
//!     .with_field("title", "A Book");
//! let db: Database = vec![smith.clone()].into_iter().collect();
//!
//! let doc = MemoryDocument::from_text("Paper", "As shown");
//! let mut manager = CitationManager::with_document(doc.clone(), Preferences::default());
//! let unresolved = manager
//!     .insert_citation(&[smith], &[db], &style, true, true, None, true)
//!     .unwrap();
//! assert!(unresolved.is_empty());
//! assert!(doc.body_text().starts_with("As shown[1] "));
//! ```

pub mod backend;
pub mod bibliography;
pub mod config;
pub mod document;
pub mod error;
pub mod manager;
pub mod range;
pub mod update;
pub mod visual_order;

pub use backend::CitationEntry;
pub use config::{ChangeTrackingPolicy, Preferences};
pub use document::{
    DocumentChooser, DocumentProvider, MemoryDocument, MemoryOffice, ScreenPoint, TextDocument,
};
pub use error::{OfficeError, Result};
pub use manager::{CitationManager, HealthReport};
pub use range::{Flow, FootnoteId, OverlapKind, TextRange};
pub use update::BibliographyUpdate;
