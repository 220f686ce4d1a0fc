/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

use oocite_core::CoreError;
use oocite_processor::ProcessorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OfficeError {
    #[error("not connected to a document")]
    NoDocument,

    #[error("connection to the document was lost")]
    ConnectionLost,

    #[error("cannot get a usable cursor: {0}")]
    CursorUnavailable(String),

    #[error("paragraph style `{0}` is not defined in the document")]
    UndefinedParagraphFormat(String),

    #[error("character style `{0}` is not defined in the document")]
    UndefinedCharacterFormat(String),

    #[error("no entries selected for citation")]
    NoEntriesSelected,

    #[error("overlapping citation ranges: {}", .0.join("; "))]
    Overlap(Vec<String>),

    #[error("cannot parse style: {0}")]
    ParseStyle(String),

    #[error("the document rejected the change: {0}")]
    Creation(String),

    #[error("document error: {0}")]
    WrappedTarget(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("change tracking is active (recording: {recording}, tracked changes: {redlines})")]
    ChangeTracking { recording: bool, redlines: usize },

    #[error("document is inconsistent: {0}")]
    Inconsistent(String),

    #[error("cannot read preferences: {0}")]
    Config(String),
}

impl OfficeError {
    /// Message for the user, with a recovery hint where one exists.
    pub fn user_message(&self) -> String {
        let hint = match self {
            OfficeError::NoDocument => Some("Select a Writer document first."),
            OfficeError::ConnectionLost => Some("Reconnect to the document and try again."),
            OfficeError::CursorUnavailable(_) => {
                Some("Please move the cursor into the document text and try again.")
            }
            OfficeError::UndefinedParagraphFormat(_) => {
                Some("Define the paragraph style in the document, or change the citation style file.")
            }
            OfficeError::UndefinedCharacterFormat(_) => {
                Some("Define the character style in the document, or change the citation style file.")
            }
            OfficeError::NoEntriesSelected => Some("Select at least one entry to cite."),
            OfficeError::Overlap(_) => {
                Some("Move or remove the overlapping citations, then try again.")
            }
            OfficeError::ChangeTracking { .. } => {
                Some("Accept or reject the tracked changes and switch off change recording.")
            }
            OfficeError::Inconsistent(_) => {
                Some("Remove the damaged bibliography and refresh again.")
            }
            _ => None,
        };
        match hint {
            Some(hint) => format!("{self}. {hint}"),
            None => self.to_string(),
        }
    }
}

impl From<CoreError> for OfficeError {
    fn from(e: CoreError) -> Self {
        OfficeError::ParseStyle(e.to_string())
    }
}

impl From<ProcessorError> for OfficeError {
    fn from(e: ProcessorError) -> Self {
        OfficeError::Inconsistent(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OfficeError>;
