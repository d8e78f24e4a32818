// -- Lint policy ---------------------------------------------------------
// Groups and allowances live in Cargo.toml; these are the hard lines.

// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

//! Instanced mesh viewer built on wgpu.
//!
//! instaview loads a mesh, draws several transformed copies of it into a
//! multisampled off-screen target, and lets the user orbit the camera and
//! pick and drag individual copies. Picking renders instance ids into an
//! integer target and reads back the texel under the pointer.
//!
//! # Key entry points
//!
//! - [`SceneRenderer`] - owns the GPU resources and runs the frame
//! - [`input::Interactor`] - pointer and touch state machine
//! - [`options::Options`] - runtime configuration with TOML presets
//! - `Viewer` - a ready-made winit window (feature `viewer`)
//!
//! # Architecture
//!
//! Large models are parsed on a background [`model::ModelLoader`] thread;
//! the render thread uploads them on the first frame after parsing
//! finishes and shows a loading view until then. Input from any thread is
//! queued through an [`input::InputSender`] and drained at the top of each
//! frame, each requested pick running at its place in the queue. Each frame
//! then runs: camera → scene pass → resolve → blit.

pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod model;
pub mod options;
pub mod renderer;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use engine::SceneRenderer;
pub use error::ViewerError;
pub use input::{InputEvent, PointerButton};
pub use renderer::picking::PickResult;
#[cfg(feature = "viewer")]
pub use viewer::{Viewer, ViewerBuilder};
