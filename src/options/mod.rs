//! Centralized viewer options with TOML preset support.
//!
//! All tweakable settings (camera, input sensitivity, render target, scene
//! layout) are consolidated here. Options serialize to/from TOML so presets
//! can live next to the models they were tuned for.

mod camera;
mod input;
mod render;
mod scene;

use std::path::Path;

pub use camera::CameraOptions;
pub use input::InputOptions;
pub use render::RenderOptions;
pub use scene::SceneOptions;
use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[camera]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Camera projection and control parameters.
    pub camera: CameraOptions,
    /// Pointer and gesture sensitivity.
    pub input: InputOptions,
    /// Frame target and presentation parameters.
    pub render: RenderOptions,
    /// Instance layout, loading and animation parameters.
    pub scene: SceneOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Io`] if the file cannot be read, or
    /// [`ViewerError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let content = std::fs::read_to_string(path).map_err(ViewerError::Io)?;
        toml::from_str(&content)
            .map_err(|e| ViewerError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OptionsParse`] if serialization fails, or
    /// [`ViewerError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ViewerError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ViewerError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ViewerError::Io)?;
        }
        std::fs::write(path, content).map_err(ViewerError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[camera]
damping = true

[scene.layout]
scale = 0.5
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert!(opts.camera.damping);
        assert_eq!(opts.scene.layout.scale, 0.5);
        // Everything else should be default
        assert_eq!(opts.camera.pitch, 15.0);
        assert_eq!(opts.scene.layout.spacing, 1.0);
        assert_eq!(opts.scene.instance_count, 4);
        assert_eq!(opts.render.msaa_samples, 4);
    }

    #[test]
    fn defaults_match_viewer_constants() {
        let opts = Options::default();
        assert_eq!(opts.camera.znear, 0.1);
        assert_eq!(opts.camera.zfar, 5000.0);
        assert_eq!(opts.input.drag_scale, 0.01);
        assert_eq!(opts.render.clear_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(opts.scene.background_load_threshold, 1_000_000);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = std::env::temp_dir()
            .join(format!("instaview-opts-{}", std::process::id()));
        let path = dir.join("broken.toml");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "[camera\nfovy = ").unwrap();
        assert!(matches!(
            Options::load(&path),
            Err(ViewerError::OptionsParse(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn save_then_list_presets() {
        let dir = std::env::temp_dir()
            .join(format!("instaview-presets-{}", std::process::id()));
        let mut opts = Options::default();
        opts.scene.instance_count = 7;
        opts.save(&dir.join("seven.toml")).unwrap();
        Options::default().save(&dir.join("default.toml")).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(Options::list_presets(&dir), ["default", "seven"]);
        let loaded = Options::load(&dir.join("seven.toml")).unwrap();
        assert_eq!(loaded.scene.instance_count, 7);
        let _ = std::fs::remove_dir_all(dir);
    }
}
