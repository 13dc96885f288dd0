pub mod cleaner;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod logging;
pub mod pipeline;
pub mod summary;
pub mod table;
pub mod validation;

pub use cleaner::{CleanerState, CleaningOptions, CleaningOutcome, DatasetCleaner};
pub use config::AppConfig;
pub use dataset::{DatasetDescriptor, DatasetKind};
pub use error::{CleanerError, Result};
pub use pipeline::{FisheriesPipeline, PipelineRun};
pub use summary::{CombinedSummary, DatasetSummary};
