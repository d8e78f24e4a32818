//! Model data, GPU upload and background loading.

mod gpu_model;
mod loader;
mod mesh;

pub use gpu_model::GpuModel;
pub use loader::{ModelLoader, DEFAULT_BACKGROUND_THRESHOLD};
pub use mesh::{DecodedImage, MeshData, ModelData, TextureRef, Vertex};
