// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Two-tier cache for compiled category queries
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Local (per resolver)        │  bounded, oldest-evicted, skipped for drafts
//! └──────────────────────────────┘
//!               │ miss
//!               ▼
//! ┌──────────────────────────────┐
//! │  Shared (persistent)         │  opaque string keys, tagged per category,
//! │                              │  invalidated by the catalog platform
//! └──────────────────────────────┘
//! ```

mod key;
mod local;
mod shared;

pub use key::CacheKey;
pub use local::{LocalCacheStats, LocalQueryCache};
pub use shared::{InMemorySharedCache, SharedQueryCache};
