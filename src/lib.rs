#![allow(async_fn_in_trait)]

pub mod assembler;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod output;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ConvertConfig;
pub use error::{PageError, PipelineError};
pub use pipeline::{Job, run};
pub use results::{OutputMode, RunSummary};
