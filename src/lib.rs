pub mod cli;
pub mod config;
pub mod env_mapping;
pub mod generate;
pub mod nuspec;
pub mod scripts;
pub mod targets;
pub mod version;
pub mod xml;

pub use generate::{GenContext, generate_all};
