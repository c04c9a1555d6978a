/// Remote activity service client.
pub mod activity_api;
/// Key-value store implementations.
pub mod kv;
/// Typed access to the durable session fields.
pub mod session_store;
/// Storage abstraction for the durable session fields.
pub mod storage;
