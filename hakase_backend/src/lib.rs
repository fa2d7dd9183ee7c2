mod backend;
pub mod http;

pub use backend::{BackendClient, BackendError};
pub use http::HttpBackendClient;
