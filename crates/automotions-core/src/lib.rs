//! Core of automotions: reconciles tournament motions from the API feed with
//! the statistics page, and reads/writes the motion ledger.

pub mod api;
pub mod config;
pub mod export;
pub mod format;
pub mod ledger;
pub mod markup;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod similarity;
pub mod stats;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
