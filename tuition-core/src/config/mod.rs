mod config;
pub mod reader;

pub use config::*;
