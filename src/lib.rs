//! Adaptive search client for BOAMP procurement notices on Opendatasoft
//! portals.
//!
//! Portals drift in two ways this crate absorbs: dataset column names vary
//! between deployments (resolved once per process by the schema resolver),
//! and the same data is reachable through two incompatible query dialects
//! (compiled side by side, executed with fallback). Rows of either shape
//! normalize into one canonical record view.

pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod extractor;
pub mod lifecycle;
pub mod pagination;
pub mod service;
