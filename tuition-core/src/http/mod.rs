pub mod client;
pub mod envelope;
pub mod error;
pub mod response;

pub use client::{ApiClient, ApiRequest};
pub use error::ApiError;
