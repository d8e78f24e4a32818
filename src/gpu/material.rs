//! Material texture slots.
//!
//! Meshes name their textures by convention: `material.texture_<role><k>`,
//! with `k` counting from 1 in encounter order per role. Each shader kind
//! declares which of those names it actually has a binding for. The
//! [`SlotTable`] resolves names to bindings once, when the pipeline is
//! built, so draw code only ever does enum lookups.

use std::fmt;

use crate::gpu::pipeline_helpers;
use crate::gpu::shader_composer::ShaderKind;

/// What a material texture is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// Base color.
    Diffuse,
    /// Specular intensity.
    Specular,
    /// Tangent-space normals.
    Normal,
    /// Ambient occlusion / ambient color.
    Ambient,
}

impl TextureRole {
    /// All roles, in binding order.
    pub const ALL: [Self; 4] =
        [Self::Diffuse, Self::Specular, Self::Normal, Self::Ambient];

    /// Name stem used in the uniform naming convention.
    pub fn stem(self) -> &'static str {
        match self {
            Self::Diffuse => "texture_diffuse",
            Self::Specular => "texture_specular",
            Self::Normal => "texture_normal",
            Self::Ambient => "texture_ambient",
        }
    }
}

/// One named texture slot, e.g. `material.texture_diffuse1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialSlot {
    /// Texture role.
    pub role: TextureRole,
    /// 1-based index within the role.
    pub index: u32,
}

impl fmt::Display for MaterialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material.{}{}", self.role.stem(), self.index)
    }
}

/// Number a mesh's textures in encounter order: the first diffuse texture
/// is `texture_diffuse1`, the second `texture_diffuse2`, and so on, with an
/// independent counter per role.
pub fn number_slots(
    roles: impl IntoIterator<Item = TextureRole>,
) -> Vec<MaterialSlot> {
    let mut counters = [0u32; TextureRole::ALL.len()];
    roles
        .into_iter()
        .map(|role| {
            let counter = &mut counters[role as usize];
            *counter += 1;
            MaterialSlot {
                role,
                index: *counter,
            }
        })
        .collect()
}

/// Slot-to-binding map for one shader kind, resolved once.
#[derive(Debug, Clone)]
pub struct SlotTable {
    kind: ShaderKind,
    bindings: Vec<(MaterialSlot, u32)>,
    sampler_binding: Option<u32>,
}

impl SlotTable {
    /// Build the table for `kind`.
    ///
    /// The scene shader binds one texture per role at bindings 0..4 and the
    /// material sampler at 4. Other kinds have no material group.
    pub fn for_kind(kind: ShaderKind) -> Self {
        match kind {
            ShaderKind::Scene => {
                let bindings = TextureRole::ALL
                    .iter()
                    .zip(0u32..)
                    .map(|(&role, binding)| {
                        (MaterialSlot { role, index: 1 }, binding)
                    })
                    .collect::<Vec<_>>();
                let sampler_binding = Some(bindings.len() as u32);
                Self {
                    kind,
                    bindings,
                    sampler_binding,
                }
            }
            _ => Self {
                kind,
                bindings: Vec::new(),
                sampler_binding: None,
            },
        }
    }

    /// Shader kind this table was resolved for.
    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    /// Binding for `slot`, or `None` if the shader has no such texture.
    pub fn binding(&self, slot: MaterialSlot) -> Option<u32> {
        self.bindings
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|&(_, binding)| binding)
    }

    /// Every resolved slot with its binding, in binding order.
    pub fn slots(&self) -> &[(MaterialSlot, u32)] {
        &self.bindings
    }

    /// Binding of the material sampler, if the shader has one.
    pub fn sampler_binding(&self) -> Option<u32> {
        self.sampler_binding
    }

    /// `true` if the shader takes no material group.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind group layout covering every slot plus the sampler.
    pub fn bind_group_layout(
        &self,
        device: &wgpu::Device,
    ) -> wgpu::BindGroupLayout {
        let mut entries: Vec<wgpu::BindGroupLayoutEntry> = self
            .bindings
            .iter()
            .map(|&(_, binding)| pipeline_helpers::texture_2d(binding))
            .collect();
        if let Some(binding) = self.sampler_binding {
            entries.push(pipeline_helpers::filtering_sampler(binding));
        }
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Material Layout", self.kind.label())),
            entries: &entries,
        })
    }
}

/// Collects texture views for one material bind group.
///
/// Starts with every slot pointing at the fallback view; [`assign`]
/// replaces the ones a mesh provides.
///
/// [`assign`]: MaterialBinder::assign
pub struct MaterialBinder<'a> {
    table: &'a SlotTable,
    views: Vec<&'a wgpu::TextureView>,
}

impl<'a> MaterialBinder<'a> {
    /// Start a binder with every slot filled by `fallback`.
    pub fn new(table: &'a SlotTable, fallback: &'a wgpu::TextureView) -> Self {
        Self {
            table,
            views: vec![fallback; table.bindings.len()],
        }
    }

    /// Put `view` in `slot`.
    ///
    /// Returns `false` (and logs) when the shader has no binding for the
    /// slot; the texture is then simply not used.
    pub fn assign(&mut self, slot: MaterialSlot, view: &'a wgpu::TextureView) -> bool {
        let Some(position) =
            self.table.bindings.iter().position(|(s, _)| *s == slot)
        else {
            log::warn!(
                "{} has no binding for {slot}; texture ignored",
                self.table.kind.label()
            );
            return false;
        };
        self.views[position] = view;
        true
    }

    /// Create the bind group.
    pub fn build(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        label: &str,
    ) -> wgpu::BindGroup {
        let mut entries: Vec<wgpu::BindGroupEntry<'_>> = self
            .table
            .bindings
            .iter()
            .zip(&self.views)
            .map(|(&(_, binding), &view)| wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        if let Some(binding) = self.table.sampler_binding {
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_names_follow_convention() {
        let slot = MaterialSlot {
            role: TextureRole::Diffuse,
            index: 1,
        };
        assert_eq!(slot.to_string(), "material.texture_diffuse1");
        let slot = MaterialSlot {
            role: TextureRole::Ambient,
            index: 3,
        };
        assert_eq!(slot.to_string(), "material.texture_ambient3");
    }

    #[test]
    fn numbering_is_per_role_in_encounter_order() {
        use TextureRole::{Diffuse, Normal, Specular};
        let slots = number_slots([Diffuse, Specular, Diffuse, Normal]);
        let names: Vec<String> = slots.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            [
                "material.texture_diffuse1",
                "material.texture_specular1",
                "material.texture_diffuse2",
                "material.texture_normal1",
            ]
        );
    }

    #[test]
    fn scene_table_resolves_first_slot_of_each_role() {
        let table = SlotTable::for_kind(ShaderKind::Scene);
        for (expected, role) in TextureRole::ALL.into_iter().enumerate() {
            let slot = MaterialSlot { role, index: 1 };
            assert_eq!(table.binding(slot), Some(expected as u32));
        }
        assert_eq!(table.sampler_binding(), Some(4));
    }

    #[test]
    fn unknown_slot_is_unresolved() {
        let table = SlotTable::for_kind(ShaderKind::Scene);
        let slot = MaterialSlot {
            role: TextureRole::Diffuse,
            index: 2,
        };
        assert_eq!(table.binding(slot), None);
    }

    #[test]
    fn non_material_kinds_have_empty_tables() {
        assert!(SlotTable::for_kind(ShaderKind::Picking).is_empty());
        assert!(SlotTable::for_kind(ShaderKind::Blit).sampler_binding().is_none());
    }
}
