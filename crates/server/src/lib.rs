//! HTTP host for the hlsforge transcoding worker.
//!
//! The binary in `main.rs` wires configuration, storage and the encoder
//! together; this library exposes the router so it can be driven in-process
//! by tests.

pub mod api;
pub mod metrics;
pub mod state;
