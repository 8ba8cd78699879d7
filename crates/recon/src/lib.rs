//! `cardex-recon` — Multi-source automotive catalog reconciliation engine.
//!
//! Pure engine crate: receives pre-parsed source payloads, returns a
//! consolidated brand/model catalog and merged specification records.
//! No CLI or IO dependencies.

pub mod catalog;
pub mod config;
pub mod derived;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod normalize;
pub mod specmerge;

pub use config::MergeConfig;
pub use engine::{run_consolidation, run_spec_merge};
pub use error::CatalogError;
pub use model::{
    BrandModelRecord, Catalog, Confidence, ConsolidatedEntry, DuplicateRecord, MergedSpecRecord,
    SpecCategory, SpecRecord,
};
