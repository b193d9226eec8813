//! Data access and aggregation for maintenance reports
//!
//! [`DataService`] abstracts the maintenance backend. [`Aggregator`] fans out
//! the per-inspection fetches and produces a [`shared_types::ReportData`]
//! snapshot that [`ReportGenerator`] renders to PDF.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod generate;
pub mod http;
pub mod memory;
pub mod service;

pub use aggregate::{Aggregator, RecordSelection};
pub use config::ServiceConfig;
pub use error::DataError;
pub use generate::{submit_draft, GeneratedReport, ReportGenerator};
pub use http::HttpDataService;
pub use memory::{Fetch, InMemoryDataService};
pub use service::DataService;
