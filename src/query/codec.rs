// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Versioned encoding of compiled fragments for the shared cache.
//!
//! ```text
//! {"version": 2, "fragment": {...}, "consulted": [2, 3]}   - compiled restriction
//! {"version": 2, "fragment": null, "consulted": [4]}       - cached "no restriction"
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::QueryFragment;
use crate::error::{Result, SearchError};

/// Current envelope version. Bump when [`QueryFragment`] changes shape.
pub const FRAGMENT_CODEC_VERSION: u32 = 2;

/// A compiled result as cached.
///
/// `consulted` holds every category id checked against the call path while
/// compiling. The entry can stand in for a fresh compilation under any path
/// that shares none of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedQuery {
    pub fragment: Option<QueryFragment>,
    pub consulted: BTreeSet<u64>,
}

impl CachedQuery {
    pub fn new(fragment: Option<QueryFragment>, consulted: BTreeSet<u64>) -> Self {
        Self {
            fragment,
            consulted,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    fragment: Option<&'a QueryFragment>,
    consulted: &'a BTreeSet<u64>,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    fragment: Option<QueryFragment>,
    #[serde(default)]
    consulted: BTreeSet<u64>,
}

/// Why a stored entry could not be read back
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed fragment envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported fragment envelope version {0}")]
    Version(u32),
}

/// Encode a compiled result (including "no restriction") for storage.
pub fn encode(entry: &CachedQuery) -> Result<String> {
    serde_json::to_string(&EnvelopeRef {
        version: FRAGMENT_CODEC_VERSION,
        fragment: entry.fragment.as_ref(),
        consulted: &entry.consulted,
    })
    .map_err(|e| SearchError::Codec(e.to_string()))
}

/// Decode an entry written by [`encode`].
pub fn decode(raw: &str) -> std::result::Result<CachedQuery, DecodeError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.version != FRAGMENT_CODEC_VERSION {
        return Err(DecodeError::Version(envelope.version));
    }
    Ok(CachedQuery::new(envelope.fragment, envelope.consulted))
}
