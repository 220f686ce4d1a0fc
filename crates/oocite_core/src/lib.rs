/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

//! Core types for word-processor citation integration.
//!
//! This crate holds everything that does not need a live document: bibliographic
//! entries and the databases they come from, author-name parsing, the inline
//! markup understood by document writers, the naming scheme used for citation
//! marks, and the parser for style descriptor files.
//!
//! # Example
//!
//! ```rust
//! use oocite_core::{codec, CitationType, Style};
//!
//! let style = Style::parse(
//!     "NAME\nDemo\n\nLAYOUT\ndefault=\\author: \\title.\n\nPROPERTIES\nIsNumberEntries=true\n",
//! )
//! .unwrap();
//! assert!(style.is_numeric());
//!
//! let name = codec::unique_mark_name(&["smith2000"], CitationType::Parenthetical, &[]);
//! assert_eq!(name, "JR_cite_1_smith2000");
//! ```

pub mod author;
pub mod codec;
pub mod database;
pub mod entry;
pub mod error;
pub mod latex;
pub mod markup;
pub mod style;

pub use author::{Author, AuthorList};
pub use codec::{CitationType, ParsedMarkName};
pub use database::{Database, DatabaseMode};
pub use entry::Entry;
pub use error::{CoreError, Result};
pub use markup::{CharFormat, Run};
pub use style::{Layout, LayoutContext, PropertyValue, Style};
