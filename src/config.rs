use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Every tunable of the engine. Each section falls back to its defaults when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub force: ForceConfig,
    pub tree: TreeConfig,
    pub style: StyleConfig,
    pub search: SearchConfig,
    pub camera: CameraConfig,
    pub limits: PayloadLimits,
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> EngineResult<Self> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.camera = config.camera.clamped();
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Repulsion between every pair of nodes.
    pub charge: f32,
    /// Rest length of link springs.
    pub link_distance: f32,
    pub link_strength: f32,
    /// Pull of every node towards the origin.
    pub center_strength: f32,
    /// Minimum spacing between node centres, as a multiple of node radius.
    pub collision_radius: f32,
    pub collision_strength: f32,
    pub velocity_damping: f32,
    pub max_speed: f32,
    /// Per-tick cooling factor applied to the simulation energy.
    pub alpha_decay: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            charge: 9_000.0,
            link_distance: 60.0,
            link_strength: 0.04,
            center_strength: 0.002,
            collision_radius: 2.2,
            collision_strength: 0.9,
            velocity_damping: 0.86,
            max_speed: 24.0,
            alpha_decay: 0.0228,
        }
    }
}

impl ForceConfig {
    pub fn clamped(self) -> Self {
        Self {
            charge: self.charge.clamp(0.0, 200_000.0),
            link_distance: self.link_distance.clamp(1.0, 2_000.0),
            link_strength: self.link_strength.clamp(0.0, 1.0),
            center_strength: self.center_strength.clamp(0.0, 0.2),
            collision_radius: self.collision_radius.clamp(0.0, 10.0),
            collision_strength: self.collision_strength.clamp(0.0, 4.0),
            velocity_damping: self.velocity_damping.clamp(0.5, 0.99),
            max_speed: self.max_speed.clamp(0.5, 400.0),
            alpha_decay: self.alpha_decay.clamp(0.0, 0.5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Distance between consecutive depth levels.
    pub level_spacing: f32,
    /// Distance between neighbouring leaf slots.
    pub sibling_spacing: f32,
    /// Extra slots left between disconnected components.
    pub component_gap: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            level_spacing: 40.0,
            sibling_spacing: 24.0,
            component_gap: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Edge thickness slider, 0-100.
    pub edge_thickness: f32,
    /// Node size slider, 0-100.
    pub node_size: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            edge_thickness: 25.0,
            node_size: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub cache_capacity: usize,
    /// Nodes indexed per frame while a rebuild is in progress.
    pub index_chunk: usize,
    pub suggestion_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            cache_capacity: 100,
            index_chunk: 2_000,
            suggestion_limit: 12,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    /// Multiplier applied to the exact fit distance.
    pub fit_margin: f32,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Seconds a camera transition takes to settle.
    pub transition_secs: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            fit_margin: 1.3,
            zoom_in_factor: 0.8,
            zoom_out_factor: 1.25,
            min_distance: 5.0,
            max_distance: 20_000.0,
            transition_secs: 0.6,
        }
    }
}

impl CameraConfig {
    /// Orders the distance bounds and keeps every value in a usable range.
    pub fn clamped(self) -> Self {
        let near = self.min_distance.min(self.max_distance).max(0.5);
        let far = self.min_distance.max(self.max_distance).max(near);
        Self {
            fov_degrees: self.fov_degrees.clamp(10.0, 150.0),
            fit_margin: self.fit_margin.clamp(0.1, 10.0),
            zoom_in_factor: self.zoom_in_factor.clamp(0.05, 0.99),
            zoom_out_factor: self.zoom_out_factor.clamp(1.01, 20.0),
            min_distance: near,
            max_distance: far,
            transition_secs: self.transition_secs.clamp(0.0, 10.0),
        }
    }
}

/// Caps applied to payloads with more than `threshold` nodes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadLimits {
    pub threshold: usize,
    pub max_nodes: usize,
    pub max_links: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            threshold: 100,
            max_nodes: 2_000,
            max_links: 5_000,
        }
    }
}
