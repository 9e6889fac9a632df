//! Real implementations of the installer's host capabilities

mod http;
mod system;

pub use http::HttpFetcher;
pub use system::HostSystem;
