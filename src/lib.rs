//! Library crate for the lottery console, exposing the session, cache and
//! sync layers to the binary and to integration tests.

pub mod config;
/// Durable session storage and the remote activity service client.
pub mod dao;
pub mod dto;
/// Error types surfaced by the service layer.
pub mod error;
/// Operations run against the shared console state.
pub mod services;
/// Shared console state and the cached collections.
pub mod state;
