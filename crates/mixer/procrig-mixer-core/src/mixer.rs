//! Layer bookkeeping and the blend pass.

use std::collections::BTreeSet;

use log::debug;
use nalgebra::Vector3;
use procrig_kernel_core::math::quat::{compose, identity, renormalize, slerp};
use procrig_kernel_core::math::vec::lerp_vec3;
use procrig_rig_core::{HumanBone, HumanoidRig, Pose};

use crate::config::MixerConfig;
use crate::layer::{sanitize_weight, AnimationLayer, BlendMode, LayerDesc};

/// Priority-ordered pose layers.
///
/// Layers are applied lowest priority first; equal priorities apply in insertion order.
/// Additive layers do not commute: swapping two of them changes the result.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    config: MixerConfig,
    /// Kept sorted by `(priority, order)`.
    layers: Vec<AnimationLayer>,
    next_order: u64,
}

impl AnimationMixer {
    pub fn new(config: MixerConfig) -> Self {
        Self {
            config,
            layers: Vec::new(),
            next_order: 0,
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    fn sort(&mut self) {
        self.layers.sort_by_key(|l| (l.priority, l.order));
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut AnimationLayer> {
        let found = self.layers.iter_mut().find(|l| l.id == id);
        if found.is_none() {
            debug!("mixer: no layer '{id}'");
        }
        found
    }

    /// Insert a layer. Returns `true` when it replaced an existing layer with the same
    /// id; the replacement keeps that layer's place among equal priorities.
    pub fn add_layer(&mut self, desc: LayerDesc) -> bool {
        let existing = self.layers.iter().position(|l| l.id == desc.id);
        let order = match existing {
            Some(i) => self.layers.remove(i).order,
            None => {
                let order = self.next_order;
                self.next_order += 1;
                order
            }
        };
        self.layers.push(AnimationLayer::from_desc(
            desc,
            self.config.default_fade_speed,
            order,
        ));
        self.sort();
        existing.is_some()
    }

    pub fn remove_layer(&mut self, id: &str) -> bool {
        match self.layers.iter().position(|l| l.id == id) {
            Some(i) => {
                self.layers.remove(i);
                true
            }
            None => {
                debug!("mixer: remove of unknown layer '{id}'");
                false
            }
        }
    }

    /// Retarget a layer's weight. Unless `immediate`, the effective weight fades toward
    /// it during [`update`](Self::update). Non-finite weights are rejected.
    pub fn set_layer_weight(&mut self, id: &str, weight: f32, immediate: bool) -> bool {
        let Some(weight) = sanitize_weight(weight) else {
            return false;
        };
        match self.find_mut(id) {
            Some(layer) => {
                layer.target_weight = weight;
                if immediate {
                    layer.weight = weight;
                }
                true
            }
            None => false,
        }
    }

    pub fn set_layer_pose(&mut self, id: &str, pose: Pose) -> bool {
        match self.find_mut(id) {
            Some(layer) => {
                layer.pose = pose;
                true
            }
            None => false,
        }
    }

    pub fn set_layer_mask(&mut self, id: &str, mask: Option<BTreeSet<HumanBone>>) -> bool {
        match self.find_mut(id) {
            Some(layer) => {
                layer.mask = mask;
                true
            }
            None => false,
        }
    }

    pub fn set_layer_priority(&mut self, id: &str, priority: i32) -> bool {
        let Some(layer) = self.find_mut(id) else {
            return false;
        };
        layer.priority = priority;
        self.sort();
        true
    }

    pub fn set_layer_fade_speed(&mut self, id: &str, speed: f32) -> bool {
        if !speed.is_finite() || speed < 0.0 {
            return false;
        }
        match self.find_mut(id) {
            Some(layer) => {
                layer.fade_speed = speed;
                true
            }
            None => false,
        }
    }

    /// Advance every layer's weight toward its target by `fade_speed * dt`.
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for layer in &mut self.layers {
            layer.step(dt);
        }
        if self.config.auto_prune {
            self.prune_faded();
        }
    }

    /// Retarget every layer to zero. A positive `speed` also replaces each layer's fade
    /// speed.
    pub fn fade_out_all(&mut self, speed: f32) {
        let speed = (speed.is_finite() && speed > 0.0).then_some(speed);
        for layer in &mut self.layers {
            layer.target_weight = 0.0;
            if let Some(speed) = speed {
                layer.fade_speed = speed;
            }
        }
    }

    /// Remove layers that are silent and not fading back in. Returns how many were
    /// removed.
    pub fn prune_faded(&mut self) -> usize {
        let threshold = self.config.silence_threshold;
        let before = self.layers.len();
        self.layers.retain(|l| l.weight > threshold || l.target_weight > threshold);
        before - self.layers.len()
    }

    pub fn layer(&self, id: &str) -> Option<&AnimationLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layer ids in application order.
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn layers(&self) -> impl Iterator<Item = &AnimationLayer> + '_ {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    /// Blend every layer over an empty pose.
    pub fn blended_pose(&self) -> Pose {
        self.blend_over(&Pose::new())
    }

    /// Blend every layer, in application order, over `base`.
    ///
    /// Bones a layer mentions but `base` lacks start from identity; a missing hips
    /// offset starts from zero. Every rotation in the result is renormalized.
    pub fn blend_over(&self, base: &Pose) -> Pose {
        let mut acc = base.clone();
        let threshold = self.config.silence_threshold;

        for layer in &self.layers {
            let w = layer.weight;
            if w <= threshold {
                continue;
            }
            for (bone, rotation) in layer.pose.iter() {
                if !layer.affects(bone) {
                    continue;
                }
                let from = acc.rotation(bone).unwrap_or_else(identity);
                let blended = match layer.blend_mode {
                    BlendMode::Override => slerp(&from, &rotation, w),
                    BlendMode::Additive => compose(&from, &slerp(&identity(), &rotation, w)),
                };
                acc.set_rotation(bone, blended);
            }
            if let Some(offset) = layer.pose.hips_offset() {
                if layer.affects(HumanBone::Hips) {
                    let from = acc.hips_offset().unwrap_or_else(Vector3::zeros);
                    let blended = match layer.blend_mode {
                        BlendMode::Override => lerp_vec3(&from, &offset, w),
                        BlendMode::Additive => from + offset * w,
                    };
                    acc.set_hips_offset(blended);
                }
            }
        }

        let mut out = Pose::new();
        for (bone, rotation) in acc.iter() {
            out.set_rotation(bone, renormalize(&rotation));
        }
        if let Some(offset) = acc.hips_offset() {
            out.set_hips_offset(offset);
        }
        out
    }

    /// Blend over the rig's current pose and write the result back. Returns how many
    /// bones were written.
    pub fn apply(&self, rig: &mut dyn HumanoidRig) -> usize {
        self.blend_over(&Pose::capture(rig)).apply_to(rig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use procrig_kernel_core::math::quat::{angle_between, axis_angle};

    fn pose_with(bone: HumanBone, rotation: procrig_kernel_core::Rotation) -> Pose {
        let mut pose = Pose::new();
        pose.set_rotation(bone, rotation);
        pose
    }

    #[test]
    fn add_reports_replacement() {
        let mut mixer = AnimationMixer::default();
        assert!(!mixer.add_layer(LayerDesc::new("a", Pose::new())));
        assert!(!mixer.add_layer(LayerDesc::new("b", Pose::new())));
        assert!(mixer.add_layer(LayerDesc::new("a", Pose::new()).with_weight(0.5)));
        assert_eq!(mixer.len(), 2);
        // Replacement keeps its original slot.
        assert_eq!(mixer.layer_ids(), vec!["a", "b"]);
        assert_eq!(mixer.layer("a").unwrap().weight(), 0.5);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut mixer = AnimationMixer::default();
        assert!(!mixer.remove_layer("ghost"));
        assert!(!mixer.set_layer_weight("ghost", 1.0, true));
        assert!(!mixer.set_layer_pose("ghost", Pose::new()));
        assert!(!mixer.set_layer_mask("ghost", None));
        assert!(!mixer.set_layer_priority("ghost", 3));
        assert!(!mixer.set_layer_fade_speed("ghost", 1.0));
    }

    /// it should order by priority, then by insertion
    #[test]
    fn application_order() {
        let mut mixer = AnimationMixer::default();
        mixer.add_layer(LayerDesc::new("late", Pose::new()).with_priority(5));
        mixer.add_layer(LayerDesc::new("first", Pose::new()).with_priority(-1));
        mixer.add_layer(LayerDesc::new("tie_a", Pose::new()).with_priority(2));
        mixer.add_layer(LayerDesc::new("tie_b", Pose::new()).with_priority(2));
        assert_eq!(mixer.layer_ids(), vec!["first", "tie_a", "tie_b", "late"]);

        mixer.set_layer_priority("late", 0);
        assert_eq!(mixer.layer_ids(), vec!["first", "late", "tie_a", "tie_b"]);
    }

    /// it should fade weight at the configured speed rather than snapping
    #[test]
    fn weights_fade() {
        let mut mixer = AnimationMixer::new(MixerConfig {
            default_fade_speed: 2.0,
            ..MixerConfig::default()
        });
        mixer.add_layer(LayerDesc::new("a", Pose::new()));
        assert!(mixer.set_layer_weight("a", 0.0, false));
        assert_eq!(mixer.layer("a").unwrap().weight(), 1.0);

        mixer.update(0.1);
        assert_relative_eq!(mixer.layer("a").unwrap().weight(), 0.8, epsilon = 1e-6);
        mixer.update(1.0);
        assert_eq!(mixer.layer("a").unwrap().weight(), 0.0);

        assert!(mixer.set_layer_weight("a", 0.7, true));
        assert_eq!(mixer.layer("a").unwrap().weight(), 0.7);
        assert!(!mixer.set_layer_weight("a", f32::NAN, true));

        mixer.update(f32::INFINITY);
        assert_eq!(mixer.layer("a").unwrap().weight(), 0.7);
    }

    #[test]
    fn fade_out_all_then_prune() {
        let mut mixer = AnimationMixer::default();
        mixer.add_layer(LayerDesc::new("a", Pose::new()));
        mixer.add_layer(LayerDesc::new("b", Pose::new()).with_weight(0.4));
        mixer.fade_out_all(1.0);
        assert_eq!(mixer.prune_faded(), 0);

        mixer.update(0.5);
        assert_relative_eq!(mixer.layer("a").unwrap().weight(), 0.5, epsilon = 1e-6);
        assert_eq!(mixer.layer("b").unwrap().weight(), 0.0);
        assert_eq!(mixer.prune_faded(), 1);
        assert_eq!(mixer.layer_ids(), vec!["a"]);
    }

    #[test]
    fn auto_prune_drops_silent_layers() {
        let mut mixer = AnimationMixer::new(MixerConfig {
            auto_prune: true,
            ..MixerConfig::default()
        });
        mixer.add_layer(LayerDesc::new("a", Pose::new()));
        mixer.fade_out_all(10.0);
        mixer.update(0.2);
        assert!(mixer.is_empty());
    }

    #[test]
    fn override_slerps_by_weight() {
        let target = axis_angle(&Vector3::x(), 1.0);
        let mut mixer = AnimationMixer::default();
        let desc = LayerDesc::new("a", pose_with(HumanBone::Neck, target)).with_weight(0.25);
        mixer.add_layer(desc);
        let out = mixer.blended_pose().rotation(HumanBone::Neck).unwrap();
        assert_relative_eq!(angle_between(&out, &identity()), 0.25, epsilon = 1e-4);
    }

    #[test]
    fn silent_layers_are_skipped() {
        let mut mixer = AnimationMixer::default();
        let q = axis_angle(&Vector3::y(), 0.5);
        mixer.add_layer(LayerDesc::new("a", pose_with(HumanBone::Head, q)).with_weight(0.0));
        assert!(mixer.blended_pose().is_empty());
    }

    #[test]
    fn mask_filters_bones() {
        let mut pose = pose_with(HumanBone::Neck, axis_angle(&Vector3::x(), 0.3));
        pose.set_rotation(HumanBone::Head, axis_angle(&Vector3::x(), 0.6));
        pose.set_hips_offset(Vector3::new(0.0, 0.1, 0.0));

        let mut mixer = AnimationMixer::default();
        mixer.add_layer(LayerDesc::new("a", pose).with_mask([HumanBone::Head]));
        let out = mixer.blended_pose();
        assert!(out.contains(HumanBone::Head));
        assert!(!out.contains(HumanBone::Neck));
        assert_eq!(out.hips_offset(), None);

        assert!(mixer.set_layer_mask("a", None));
        let out = mixer.blended_pose();
        assert!(out.contains(HumanBone::Neck));
        assert_eq!(out.hips_offset(), Some(Vector3::new(0.0, 0.1, 0.0)));
    }

    #[test]
    fn hips_offset_blends_per_mode() {
        let mut base = Pose::new();
        base.set_hips_offset(Vector3::new(0.0, 0.2, 0.0));

        let mut over = Pose::new();
        over.set_hips_offset(Vector3::new(0.4, 0.2, 0.0));
        let mut add = Pose::new();
        add.set_hips_offset(Vector3::new(0.0, 0.0, 0.2));

        let mut mixer = AnimationMixer::default();
        mixer.add_layer(LayerDesc::new("over", over).with_weight(0.5));
        mixer.add_layer(LayerDesc::new("add", add).additive().with_weight(0.5));
        let offset = mixer.blend_over(&base).hips_offset().unwrap();
        assert_relative_eq!(offset, Vector3::new(0.2, 0.2, 0.1), epsilon = 1e-6);
    }
}
