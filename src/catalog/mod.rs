// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Catalog platform collaborators: the category entity and read access to it.

pub mod memory;
mod model;
pub mod traits;

pub use memory::InMemoryCatalog;
pub use model::Category;
pub use traits::CategoryRepository;
