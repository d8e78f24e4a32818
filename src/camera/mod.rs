//! Camera system for 3D scene viewing.
//!
//! Provides an orbit camera with rotation, panning, zoom and optional
//! damping between the input state and the rendered state.

/// Orbit camera and the control trait input handling drives.
pub mod controller;
/// Orbit state and projection parameters.
pub mod core;
