// src/lib.rs

//! Problem detection and reconciliation for La Serenissima.
//!
//! Detectors scan a snapshot of the citizen, building and contract tables
//! and report problems per citizen; the reconciler keeps the PROBLEMS table
//! in step with each fresh detection.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod problems;
pub mod state;
pub mod store;
pub mod tables;

pub use error::{Result, SerenissimaError};
