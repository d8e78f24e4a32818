//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization, growable buffers, uniform
//! blocks, material slots, texture storage, and shader composition.

/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// Scene and loading-view uniform blocks with partial updates.
pub mod globals;
/// Material texture slot naming and binding resolution.
pub mod material;
/// Shared wgpu boilerplate helpers.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Render-target texture abstraction.
pub mod texture;
/// Owned, deduplicating material texture store.
pub mod texture_registry;
