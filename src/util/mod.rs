//! Shared utilities for the viewer.

/// Frame pacing and FPS smoothing.
pub mod frame_timing;
