pub mod app;
pub mod config;
pub mod describe;
pub mod error;
pub mod generate;
pub mod image_processing;
pub mod materialize;
pub mod mcp_server;
pub mod normalize;
pub mod pipeline;
pub mod profile;
pub mod providers;
pub mod records;
pub mod storage;
pub mod store;
pub mod styles;
pub mod tools;
pub mod web_pages;

#[cfg(test)]
pub(crate) mod test_support;

pub use pipeline::TattooPipeline;
pub use records::{GenerationRequest, GenerationResult, ImageRecord};
