//! Error types for the harvest-and-acquire pipeline.
//!
//! Per-item errors (`ExtractError`, `AcquireError`) are logged and absorbed
//! at the item boundary; only whole-pipeline preconditions (`ExportError`)
//! abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the browser capability.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out waiting for '{selector}' after {waited_secs}s")]
    Timeout { selector: String, waited_secs: u64 },

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Browser not available: {0}")]
    Unavailable(String),
}

/// One result item could not produce a candidate record.
///
/// Always local: the caller logs it and moves on to the sibling items.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Mandatory field '{0}' missing or empty")]
    MissingField(&'static str),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Phase of the acquisition state machine an item failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquirePhase {
    Submitted,
    AwaitingReady,
    Polling,
}

impl std::fmt::Display for AcquirePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::AwaitingReady => write!(f, "awaiting-ready"),
            Self::Polling => write!(f, "polling"),
        }
    }
}

/// One ranked record could not be acquired. Local to the item.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("Item exceeded its {limit_secs}s deadline during {phase}")]
    TimedOut { phase: AcquirePhase, limit_secs: u64 },

    #[error("Acquisition failed during {phase}: {reason}")]
    Failed { phase: AcquirePhase, reason: String },
}

/// The ranked-record CSV contract could not be written or read back.
///
/// These are the fatal preconditions: with no usable export there is
/// nothing to acquire.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export file not found: {0}")]
    Missing(PathBuf),

    #[error("Export file is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Export file contains no records")]
    NoRows,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
