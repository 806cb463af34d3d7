//! # stepseq-catalog
//!
//! Procedure catalog loading for stepseq.
//!
//! This crate provides:
//! - JSON catalog file parsing
//! - Load-time validation of procedures and steps
//! - Checksummed, id-indexed lookup implementing
//!   [`stepseq_core::ProcedureCatalog`]

pub mod catalog;
pub mod error;

pub use catalog::Catalog;
pub use error::CatalogError;
