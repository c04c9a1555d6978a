mod client;
mod config;

pub use client::HttpActivityApi;
pub use config::{DEFAULT_TIMEOUT, HttpApiConfig};
