//! HTTP client for the ShadowPilot advice backend.

mod client;

pub use client::HttpBackendClient;
