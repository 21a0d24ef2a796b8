pub mod config;
pub mod constants;
pub mod extinction;

pub use config::{AnalysisConfig, ErrorAnchor, OutputNames};
pub use extinction::{ReddeningTable, cardelli};
