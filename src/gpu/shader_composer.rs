use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, ComposerError, NagaModuleDescriptor,
    ShaderLanguage, ShaderType,
};

use crate::error::ViewerError;
use crate::gpu::globals::GlobalsSchema;

/// The closed set of shader programs the viewer builds.
///
/// Each kind carries its WGSL source and the uniform block it expects at
/// group 0, so pipelines are selected by value rather than by subclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Lit, textured, instanced mesh into the MSAA scene target.
    Scene,
    /// Instance-ID output into the R32Uint pick surface.
    Picking,
    /// World-axis helper lines.
    Axis,
    /// Model and per-instance bounding-box lines.
    BoundingBox,
    /// Resolved scene texture onto the screen.
    Blit,
    /// Placeholder gradient shown while no model is ready.
    Loading,
}

impl ShaderKind {
    /// Every kind, for pre-composition and tests.
    pub const ALL: [Self; 6] = [
        Self::Scene,
        Self::Picking,
        Self::Axis,
        Self::BoundingBox,
        Self::Blit,
        Self::Loading,
    ];

    /// Human-readable label used for wgpu object names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Scene => "Scene",
            Self::Picking => "Picking",
            Self::Axis => "Axis",
            Self::BoundingBox => "Bounding Box",
            Self::Blit => "Blit",
            Self::Loading => "Loading",
        }
    }

    /// Uniform block expected at group 0.
    pub fn globals(self) -> GlobalsSchema {
        match self {
            Self::Scene | Self::Picking | Self::Axis | Self::BoundingBox => {
                GlobalsSchema::Scene
            }
            Self::Loading => GlobalsSchema::Loading,
            Self::Blit => GlobalsSchema::None,
        }
    }

    fn source(self) -> &'static str {
        match self {
            Self::Scene => {
                include_str!("../../assets/shaders/raster/instanced_mesh.wgsl")
            }
            Self::Picking => {
                include_str!("../../assets/shaders/utility/picking_mesh.wgsl")
            }
            Self::Axis => include_str!("../../assets/shaders/raster/axis.wgsl"),
            Self::BoundingBox => {
                include_str!("../../assets/shaders/raster/bounding_box.wgsl")
            }
            Self::Blit => include_str!("../../assets/shaders/screen/blit.wgsl"),
            Self::Loading => {
                include_str!("../../assets/shaders/screen/loading.wgsl")
            }
        }
    }

    fn file_path(self) -> &'static str {
        match self {
            Self::Scene => "raster/instanced_mesh.wgsl",
            Self::Picking => "utility/picking_mesh.wgsl",
            Self::Axis => "raster/axis.wgsl",
            Self::BoundingBox => "raster/bounding_box.wgsl",
            Self::Blit => "screen/blit.wgsl",
            Self::Loading => "screen/loading.wgsl",
        }
    }
}

/// Shared module definition.
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

/// Shared modules in dependency order.
const MODULES: &[ModuleDef] = &[
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/fullscreen.wgsl"),
        file_path: "modules/fullscreen.wgsl",
    },
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/globals.wgsl"),
        file_path: "modules/globals.wgsl",
    },
    ModuleDef {
        source: include_str!("../../assets/shaders/modules/instancing.wgsl"),
        file_path: "modules/instancing.wgsl",
    },
];

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Shared WGSL modules are registered once at construction. Shaders pull
/// them in with `#import instaview::<module>`; the composer hands wgpu
/// `naga::Module` IR directly.
pub struct ShaderComposer {
    composer: Composer,
}

impl ShaderComposer {
    /// Register the shared modules.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] if a shared module fails to parse.
    pub fn new() -> Result<Self, ViewerError> {
        let mut composer = Composer::default();
        for m in MODULES {
            let registered = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map(|_| ());
            if let Err(e) = registered {
                return Err(ViewerError::Shader(format!(
                    "module '{}': {}",
                    m.file_path,
                    e.emit_to_string(&composer)
                )));
            }
        }
        Ok(Self { composer })
    }

    /// Compose `kind` into a `wgpu::ShaderModule` ready for pipeline
    /// creation.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Shader`] if composition fails. Callers treat
    /// this as a setup failure.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        kind: ShaderKind,
    ) -> Result<wgpu::ShaderModule, ViewerError> {
        let naga_module = self.compose_naga(kind).map_err(|e| {
            ViewerError::Shader(format!(
                "'{}': {}",
                kind.file_path(),
                e.emit_to_string(&self.composer)
            ))
        })?;

        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose `kind` into a `naga::Module` without touching the GPU.
    ///
    /// # Errors
    ///
    /// Returns the composer error unchanged.
    pub fn compose_naga(
        &mut self,
        kind: ShaderKind,
    ) -> Result<naga::Module, Box<ComposerError>> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source: kind.source(),
                file_path: kind.file_path(),
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_shaders_compose() {
        let mut composer = ShaderComposer::new().unwrap();
        for kind in ShaderKind::ALL {
            if let Err(e) = composer.compose_naga(kind) {
                panic!(
                    "shader '{}' failed to compose: {}",
                    kind.file_path(),
                    e.emit_to_string(&composer.composer)
                );
            }
        }
    }

    #[test]
    fn composed_shaders_validate() {
        let mut composer = ShaderComposer::new().unwrap();
        for kind in ShaderKind::ALL {
            let module = composer.compose_naga(kind).unwrap();
            let mut validator = naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::default(),
            );
            assert!(
                validator.validate(&module).is_ok(),
                "{} failed validation",
                kind.label()
            );
        }
    }

    #[test]
    fn entry_points_exist() {
        let mut composer = ShaderComposer::new().unwrap();
        for kind in ShaderKind::ALL {
            let module = composer.compose_naga(kind).unwrap();
            let names: Vec<&str> =
                module.entry_points.iter().map(|e| e.name.as_str()).collect();
            assert!(names.contains(&"vs_main"), "{kind:?} lacks vs_main");
            assert!(names.contains(&"fs_main"), "{kind:?} lacks fs_main");
        }
    }

    #[test]
    fn picking_shares_scene_globals() {
        assert_eq!(ShaderKind::Picking.globals(), ShaderKind::Scene.globals());
        assert_eq!(ShaderKind::Blit.globals(), GlobalsSchema::None);
    }

    /// naga_oil mangles module-level names with a `_<digits>` suffix, so a
    /// shared module may not declare identifiers that already look mangled.
    #[test]
    fn shared_modules_avoid_mangled_looking_names() {
        for m in MODULES {
            let offending: Vec<&str> = m
                .source
                .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .filter(|word| {
                    word.rsplit_once('_').is_some_and(|(head, tail)| {
                        !head.is_empty()
                            && !tail.is_empty()
                            && tail.chars().all(|c| c.is_ascii_digit())
                    })
                })
                .collect();
            assert!(
                offending.is_empty(),
                "{} declares {offending:?}",
                m.file_path
            );
        }
    }

    #[test]
    fn scene_and_picking_take_instance_inputs() {
        let mut composer = ShaderComposer::new().unwrap();
        for kind in [ShaderKind::Scene, ShaderKind::Picking] {
            let module = composer.compose_naga(kind).unwrap();
            let vs = module
                .entry_points
                .iter()
                .find(|e| e.name == "vs_main")
                .unwrap();
            assert!(
                !vs.function.arguments.is_empty(),
                "{kind:?} vs_main has no inputs"
            );
        }
    }
}
