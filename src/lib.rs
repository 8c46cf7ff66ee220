//! Course complexity analysis from per-student unit completion times.
//!
//! Data flows one way: [`ingest`] validates the table, [`preprocess`] types
//! and annotates it, and [`analysis`] derives per-course metrics using the
//! pure functions in [`scoring`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod insight;
pub mod models;
pub mod preprocess;
pub mod report;
pub mod scoring;
pub mod stats;
pub mod student;

pub use analysis::{analyze, Analyzer};
pub use config::Config;
pub use error::{AnalysisWarning, IngestError};
pub use ingest::ingest;
pub use models::{AnalysisReport, AnnotatedDataset, CourseAnalysis};
pub use preprocess::preprocess;
