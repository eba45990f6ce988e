//! JSON-RPC 2.0 shim over HTTP for the dataset catalog.
//!
//! Every method maps onto one [`catalog_core::Catalog`] call; no search logic
//! lives here.

mod handlers;
pub mod server;
mod wrapper;

pub use server::{build_router, start_server, AppState};
