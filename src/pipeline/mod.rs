//! End-to-end render-and-encode orchestration.
//!
//! [`controller::generate_video`] is the one-call entry point: validate the request, drive the
//! sequencer, stream frames into an encoder sink and return the finished stream.

/// Cooperative cancellation.
pub mod cancel;
/// Render request and output configuration.
pub mod config;
/// The render-and-encode controller.
pub mod controller;
