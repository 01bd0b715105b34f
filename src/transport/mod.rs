//! Transport adapters feeding the shared dispatch path.

pub mod http;
pub mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;
