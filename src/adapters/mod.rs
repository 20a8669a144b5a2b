// Adapters layer: concrete implementations for external systems (remote API, credential storage, token decoding).

pub mod claims;
pub mod http;
pub mod storage;

pub use claims::JwtExpiryChecker;
pub use http::RedditApiClient;
pub use storage::{FileCredentialStore, MemoryCredentialStore};
