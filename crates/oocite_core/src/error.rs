/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("style `{0}` has no default layout")]
    MissingDefaultLayout(String),

    #[error("invalid layout for `{entry_type}`: {message}")]
    Layout { entry_type: String, message: String },

    #[error("parse error in {format} source: {message}")]
    Parse { format: String, message: String },

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Parse {
            format: "JSON".to_string(),
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CoreError {
    fn from(e: serde_yaml::Error) -> Self {
        CoreError::Parse {
            format: "YAML".to_string(),
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
