// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types shared by the schema compiler and the rule resolver.
//!
//! Every variant is a configuration error: something in the field
//! declarations or in a merchandising rule is malformed. Nothing here is
//! transient, so there is no retry classification.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("id field '{0}' is not declared by any field source")]
    UnknownIdField(String),
    #[error("unknown analyzer '{0}'")]
    UnknownAnalyzer(String),
    #[error("unknown default search field '{0}'")]
    UnknownDefaultField(String),
    #[error("operator '{operator}' is not supported for attribute '{attribute}'")]
    UnsupportedOperator { attribute: String, operator: String },
    #[error("invalid value for attribute '{attribute}': {reason}")]
    InvalidConditionValue { attribute: String, reason: String },
    #[error("query fragment codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
