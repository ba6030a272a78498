//! HTTP transport

mod client;

pub use client::{transport_failure, HttpClient, HttpClientBuilder};
