use std::collections::BTreeSet;

use procrig_kernel_core::math::curves::move_towards;
use procrig_rig_core::{HumanBone, Pose};
use serde::{Deserialize, Serialize};

/// How a layer combines with everything applied before it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Slerp the accumulated rotation toward the layer's rotation by weight.
    #[default]
    Override,
    /// Slerp identity toward the layer's rotation by weight, then post-multiply it onto
    /// the accumulated rotation.
    Additive,
}

/// Configuration for adding a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerDesc {
    pub id: String,
    pub pose: Pose,
    /// Target weight in `[0, 1]`.
    pub weight: f32,
    /// Start silent and fade up to `weight` instead of starting at it.
    pub fade_in: bool,
    pub blend_mode: BlendMode,
    /// Bones this layer may touch; `None` means every bone in its pose.
    pub mask: Option<BTreeSet<HumanBone>>,
    pub priority: i32,
    /// Weight units per second; the mixer default when `None`.
    pub fade_speed: Option<f32>,
}

impl Default for LayerDesc {
    fn default() -> Self {
        Self {
            id: String::new(),
            pose: Pose::new(),
            weight: 1.0,
            fade_in: false,
            blend_mode: BlendMode::Override,
            mask: None,
            priority: 0,
            fade_speed: None,
        }
    }
}

impl LayerDesc {
    pub fn new(id: impl Into<String>, pose: Pose) -> Self {
        Self {
            id: id.into(),
            pose,
            ..Self::default()
        }
    }

    pub fn additive(mut self) -> Self {
        self.blend_mode = BlendMode::Additive;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_mask(mut self, bones: impl IntoIterator<Item = HumanBone>) -> Self {
        self.mask = Some(bones.into_iter().collect());
        self
    }

    pub fn fading_in(mut self, fade_speed: f32) -> Self {
        self.fade_in = true;
        self.fade_speed = Some(fade_speed);
        self
    }
}

/// Clamp into `[0, 1]`; non-finite weights are rejected.
pub(crate) fn sanitize_weight(weight: f32) -> Option<f32> {
    weight.is_finite().then(|| weight.clamp(0.0, 1.0))
}

/// A named, weighted, independently faded pose contribution.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationLayer {
    pub(crate) id: String,
    pub(crate) pose: Pose,
    pub(crate) weight: f32,
    pub(crate) target_weight: f32,
    pub(crate) blend_mode: BlendMode,
    pub(crate) mask: Option<BTreeSet<HumanBone>>,
    pub(crate) priority: i32,
    pub(crate) fade_speed: f32,
    /// Insertion sequence, used to break priority ties.
    pub(crate) order: u64,
}

impl AnimationLayer {
    pub(crate) fn from_desc(desc: LayerDesc, default_fade_speed: f32, order: u64) -> Self {
        let target = sanitize_weight(desc.weight).unwrap_or(0.0);
        let fade_speed = desc
            .fade_speed
            .filter(|s| s.is_finite() && *s >= 0.0)
            .unwrap_or(default_fade_speed);
        Self {
            id: desc.id,
            pose: desc.pose,
            weight: if desc.fade_in { 0.0 } else { target },
            target_weight: target,
            blend_mode: desc.blend_mode,
            mask: desc.mask,
            priority: desc.priority,
            fade_speed,
            order,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Effective weight this tick.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn target_weight(&self) -> f32 {
        self.target_weight
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn mask(&self) -> Option<&BTreeSet<HumanBone>> {
        self.mask.as_ref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn fade_speed(&self) -> f32 {
        self.fade_speed
    }

    /// Whether the mask lets this layer write `bone`.
    pub fn affects(&self, bone: HumanBone) -> bool {
        self.mask.as_ref().map_or(true, |m| m.contains(&bone))
    }

    pub fn is_fading(&self) -> bool {
        self.weight != self.target_weight
    }

    pub(crate) fn step(&mut self, dt: f32) {
        self.weight = move_towards(self.weight, self.target_weight, self.fade_speed * dt);
    }
}
