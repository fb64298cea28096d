//! Proxy module - gateway between chat clients and the agent backend

pub mod context;
pub mod error;
pub mod handlers;
pub mod path_guard;
pub mod relay;
pub mod server;
pub mod upstream;

pub use context::ProxyRequestContext;
pub use error::ProxyError;
pub use server::{build_router, AppState, ProxyServer};
