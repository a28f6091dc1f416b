//! courseharvest - course document harvesting and acquisition pipeline.
//!
//! Harvests document metadata from a paginated search catalog, ranks and
//! deduplicates the results into a CSV contract, then drives a third-party
//! conversion site to retrieve each document onto disk.

pub mod acquire;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod harvest;
pub mod models;
pub mod rank;
pub mod storage;
