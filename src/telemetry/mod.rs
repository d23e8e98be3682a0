pub mod database;
pub mod events;
pub mod http;
pub mod otel;
pub mod subscriber;

pub use events::BusinessEvent;
pub use http::request_logging_middleware;
pub use subscriber::init_tracing;
