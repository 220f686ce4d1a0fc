/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("citation group `{0}` is not known")]
    UnknownGroup(String),

    #[error("global order lists {given} citation groups, expected {expected}")]
    GlobalOrderMismatch { given: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
