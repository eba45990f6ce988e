//! Catalog implementation submodules.
//!
//! Each submodule contains `impl Catalog` blocks that extend the public API
//! with domain-specific methods. The struct definition remains in `lib.rs`.

mod builder;
mod maintenance;
mod records;
mod search;
mod state;

pub use builder::CatalogBuilder;
pub use maintenance::{CatalogStatus, ConsistencyReport, ReindexHandle};
pub(crate) use state::CatalogState;
