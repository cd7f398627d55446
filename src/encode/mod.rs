//! Encoding sinks.
//!
//! Sinks consume rendered frames in order and turn them into one [`EncodedVideo`].

/// `ffmpeg`-based sink (VP9 in WebM via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;

pub use sink::EncodedVideo;
