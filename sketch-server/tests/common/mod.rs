//! Shared helpers for sketch-server integration tests.

pub mod server;

#[allow(unused_imports)]
pub use server::{quiet_config, sketch_data_uri, TestServer};
