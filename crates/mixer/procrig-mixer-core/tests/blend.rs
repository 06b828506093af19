use approx::assert_relative_eq;
use nalgebra::Vector3;
use procrig_kernel_core::math::quat::{angle_between, axis_angle, compose, identity, norm_error};
use procrig_mixer_core::{AnimationMixer, LayerDesc, MixerConfig};
use procrig_rig_core::{HumanBone, HumanoidRig, Pose, Skeleton, SkeletonDef};

fn skeleton(name: &str) -> Skeleton {
    let def: SkeletonDef =
        procrig_test_fixtures::skeletons::load(name).expect("load skeleton fixture");
    Skeleton::from_def(&def).expect("build skeleton")
}

fn single(bone: HumanBone, angle: f32, axis: Vector3<f32>) -> Pose {
    let mut pose = Pose::new();
    pose.set_rotation(bone, axis_angle(&axis, angle));
    pose
}

/// it should compose two full-weight additive layers in priority order
#[test]
fn additive_layers_multiply_in_priority_order() {
    let a = axis_angle(&Vector3::x(), 0.4);
    let b = axis_angle(&Vector3::y(), 0.9);

    let mut mixer = AnimationMixer::default();
    // Inserted out of order; priority decides.
    mixer.add_layer(
        LayerDesc::new("second", single(HumanBone::Chest, 0.9, Vector3::y()))
            .additive()
            .with_priority(1),
    );
    mixer.add_layer(
        LayerDesc::new("first", single(HumanBone::Chest, 0.4, Vector3::x())).additive(),
    );

    let out = mixer.blended_pose().rotation(HumanBone::Chest).unwrap();
    assert!(angle_between(&out, &(a * b)) < 1e-4);
    // Non-commutative: the reverse product is measurably different.
    assert!(angle_between(&out, &(b * a)) > 1e-2);
}

/// it should reproduce rest ∘ delta through a single full-weight override layer
#[test]
fn override_layer_round_trips_relative_rotations() {
    for name in procrig_test_fixtures::skeletons::keys() {
        let mut rig = skeleton(&name);
        let deltas = [
            (HumanBone::Spine, axis_angle(&Vector3::x(), 0.2)),
            (HumanBone::Neck, axis_angle(&Vector3::y(), -0.35)),
            (HumanBone::LeftUpperArm, axis_angle(&Vector3::z(), 0.8)),
            (HumanBone::RightLowerLeg, axis_angle(&Vector3::x(), -1.1)),
        ];
        for (bone, delta) in &deltas {
            assert!(rig.set_rotation_rel(*bone, *delta), "{name}: {bone}");
        }

        let mut mixer = AnimationMixer::new(MixerConfig::default());
        mixer.add_layer(LayerDesc::new("capture", Pose::capture(&rig)));
        let out = mixer.blended_pose();

        for (bone, delta) in &deltas {
            let expected = compose(&rig.rest_rotation(*bone).unwrap(), delta);
            let got = out.rotation(*bone).unwrap();
            assert!(angle_between(&got, &expected) < 1e-4, "{name}: {bone}");
        }
    }
}

/// it should blend over the rig's live pose and write back
#[test]
fn apply_blends_over_current_pose() {
    let mut rig = skeleton("reference");
    let rest_head = rig.rotation(HumanBone::Head).unwrap();

    let mut mixer = AnimationMixer::default();
    mixer.add_layer(
        LayerDesc::new("nod", single(HumanBone::Head, 0.6, Vector3::x()))
            .additive()
            .with_weight(0.5),
    );
    let written = mixer.apply(&mut rig);
    assert_eq!(written, rig.available_bones().len());

    let head = rig.rotation(HumanBone::Head).unwrap();
    assert_relative_eq!(angle_between(&head, &rest_head), 0.3, epsilon = 1e-4);
    assert_eq!(rig.hips_offset(), Vector3::zeros());
}

/// it should keep every output rotation unit length under long-running accumulation
#[test]
fn outputs_stay_normalized() {
    let mut mixer = AnimationMixer::default();
    for i in 0..8 {
        let axis = Vector3::new(1.0, i as f32 * 0.3, 0.5);
        let pose = single(HumanBone::UpperChest, 0.01 * i as f32, axis);
        mixer.add_layer(LayerDesc::new(format!("l{i}"), pose).additive().with_priority(i));
    }
    let mut pose = Pose::new();
    for _ in 0..1000 {
        pose = mixer.blend_over(&pose);
    }
    let q = pose.rotation(HumanBone::UpperChest).unwrap();
    assert!(norm_error(&q) < 1e-3);
}

/// it should fade layers in and out without popping
#[test]
fn fade_in_then_out() {
    let mut mixer = AnimationMixer::default();
    let wave = single(HumanBone::RightUpperArm, 1.0, Vector3::z());
    mixer.add_layer(LayerDesc::new("wave", wave).fading_in(2.0));

    let mut last = 0.0;
    for _ in 0..5 {
        mixer.update(0.1);
        let w = mixer.layer("wave").unwrap().weight();
        assert!(w > last && w - last <= 0.2 + 1e-6);
        last = w;
    }
    assert_relative_eq!(last, 1.0, epsilon = 1e-5);

    mixer.fade_out_all(4.0);
    mixer.update(0.1);
    let w = mixer.layer("wave").unwrap().weight();
    assert_relative_eq!(w, 0.6, epsilon = 1e-5);
    let out = mixer.blended_pose().rotation(HumanBone::RightUpperArm).unwrap();
    assert_relative_eq!(angle_between(&out, &identity()), 0.6, epsilon = 1e-3);
}
