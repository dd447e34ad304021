//! Chemical equipment dataset pipeline.
//!
//! Uploaded CSV files are parsed into typed rows ([`parser`]), summarized
//! ([`stats`]), persisted with a per-owner retention window ([`store`]) and
//! rendered as PDF or terminal reports ([`report`]). [`service::Service`]
//! ties the stages together; the `chemviz` binary is a thin shell over it.

pub mod cli;
pub mod config;
pub mod console_format;
pub mod error;
pub mod parser;
pub mod report;
pub mod service;
pub mod stats;
pub mod store;
pub mod types;
pub mod ui;

pub use error::{Error, Result};
pub use service::{Service, UploadOutcome};
