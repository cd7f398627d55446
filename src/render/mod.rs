//! Frame rasterization and sequencing.

/// Frame buffer type shared by renderers and sinks.
pub mod backend;
/// CPU frame renderer powered by `vello_cpu`.
pub mod cpu;
/// Progress sequencing and the render loop.
pub mod sequencer;
