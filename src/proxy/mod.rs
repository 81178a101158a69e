// proxy module - reverse proxy in front of the Bakong OpenAPI

pub mod common;
pub mod handlers; // Route handlers
pub mod middleware; // Axum middleware
pub mod observer;
pub mod server;
pub mod upstream; // Upstream client

pub use observer::{GatewayObserver, NoopObserver, TracingObserver};
pub use server::{build_router, AppState, AxumServer};
