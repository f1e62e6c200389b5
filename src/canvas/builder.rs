use super::CanvasState;
use crate::error::CanvasError;
use serde::{Deserialize, Serialize};

/// Upper bound for `nudge_max_rings`. The search visits `(2n + 1)^2` slots.
pub const MAX_NUDGE_RINGS: usize = 64;

/// What to do when a shape lands on top of another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave overlapping shapes where they are.
    Allow,
    /// Send the shape back to where it was before the gesture.
    #[default]
    Reject,
    /// Move the shape to the nearest free slot.
    Nudge,
}

/// Tunables for one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub magnet_radius: f64,
    /// Extra slack around a magnet when hit-testing pointer events.
    pub hit_tolerance: f64,
    pub nudge_step: f64,
    pub nudge_max_rings: usize,
    /// Applied when a drag ends (free authoring).
    pub drag_collision: CollisionPolicy,
    /// Applied to click-to-place.
    pub placement_collision: CollisionPolicy,
    /// Applied to every shape created while loading a pipeline (auto-layout).
    pub load_collision: CollisionPolicy,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            magnet_radius: 5.0,
            hit_tolerance: 3.0,
            nudge_step: 8.0,
            nudge_max_rings: 24,
            drag_collision: CollisionPolicy::Reject,
            placement_collision: CollisionPolicy::Nudge,
            load_collision: CollisionPolicy::Nudge,
        }
    }
}

impl CanvasConfig {
    /// Parses a configuration, falling back to defaults for missing keys.
    pub fn from_json(json: &str) -> Result<Self, CanvasError> {
        let config: CanvasConfig = serde_json::from_str(json)
            .map_err(|e| CanvasError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CanvasError> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(CanvasError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !self.magnet_radius.is_finite() || self.magnet_radius <= 0.0 {
            return Err(CanvasError::InvalidConfig(format!(
                "magnet_radius must be positive, got {}",
                self.magnet_radius
            )));
        }
        if !self.hit_tolerance.is_finite() || self.hit_tolerance < 0.0 {
            return Err(CanvasError::InvalidConfig(format!(
                "hit_tolerance must not be negative, got {}",
                self.hit_tolerance
            )));
        }
        if !self.nudge_step.is_finite() || self.nudge_step <= 0.0 {
            return Err(CanvasError::InvalidConfig(format!(
                "nudge_step must be positive, got {}",
                self.nudge_step
            )));
        }
        if self.nudge_max_rings > MAX_NUDGE_RINGS {
            return Err(CanvasError::InvalidConfig(format!(
                "nudge_max_rings must be at most {}, got {}",
                MAX_NUDGE_RINGS, self.nudge_max_rings
            )));
        }
        Ok(())
    }
}

pub struct CanvasBuilder {
    config: CanvasConfig,
}

impl CanvasBuilder {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            config: CanvasConfig {
                width,
                height,
                ..CanvasConfig::default()
            },
        }
    }

    pub fn from_config(config: CanvasConfig) -> Self {
        Self { config }
    }

    pub fn with_magnet_radius(mut self, radius: f64) -> Self {
        self.config.magnet_radius = radius;
        self
    }

    pub fn with_hit_tolerance(mut self, tolerance: f64) -> Self {
        self.config.hit_tolerance = tolerance;
        self
    }

    pub fn with_drag_collision(mut self, policy: CollisionPolicy) -> Self {
        self.config.drag_collision = policy;
        self
    }

    pub fn with_placement_collision(mut self, policy: CollisionPolicy) -> Self {
        self.config.placement_collision = policy;
        self
    }

    pub fn with_load_collision(mut self, policy: CollisionPolicy) -> Self {
        self.config.load_collision = policy;
        self
    }

    pub fn with_nudge(mut self, step: f64, max_rings: usize) -> Self {
        self.config.nudge_step = step;
        self.config.nudge_max_rings = max_rings;
        self
    }

    /// Validates the configuration. A bad configuration is a wiring bug and fails here,
    /// before any shape exists.
    pub fn build(self) -> Result<CanvasState, CanvasError> {
        self.config.validate()?;
        Ok(CanvasState::from_config(self.config))
    }
}
