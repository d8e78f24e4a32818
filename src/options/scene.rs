use serde::{Deserialize, Serialize};

use crate::renderer::instances::LayoutPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Instance layout, loading and animation parameters.
pub struct SceneOptions {
    /// Number of model copies.
    pub instance_count: u32,
    /// Placement of the copies.
    pub layout: LayoutPolicy,
    /// Files larger than this many bytes load on a background thread.
    pub background_load_threshold: u64,
    /// Wind sway amplitude.
    pub wave_amp: f32,
    /// Wind sway speed.
    pub wave_speed: f32,
    /// Loading view pulse frequency in radians per second.
    pub loading_pulse_speed: f32,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            instance_count: 4,
            layout: LayoutPolicy::default(),
            background_load_threshold: 1_000_000,
            wave_amp: 1.0,
            wave_speed: 5.0,
            loading_pulse_speed: 3.0,
        }
    }
}
