pub mod client;

pub use client::{OutboundRequest, UpstreamClient, UpstreamResponse};
