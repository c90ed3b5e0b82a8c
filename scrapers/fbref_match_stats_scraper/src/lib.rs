pub mod config;
pub mod discovery;
pub mod enricher;
pub mod error;
pub mod fetch;
pub mod normalizer;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod selector;
pub mod sink;
pub mod table_locator;
pub mod types;
pub mod upload;
pub mod utils;
