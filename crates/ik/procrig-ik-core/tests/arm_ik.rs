use approx::assert_relative_eq;
use nalgebra::Vector3;
use procrig_ik_core::{ArmIkSolver, ArmTarget, IkConfig, LegIkSolver, LegTarget};
use procrig_kernel_core::math::quat::norm_error;
use procrig_kernel_core::math::vec::project_on_plane;
use procrig_rig_core::{
    ArmBones, HumanBone, HumanoidRig, Landmark, RigCalibration, Side, Skeleton, SkeletonDef,
};

fn calibrated(name: &str) -> (Skeleton, RigCalibration) {
    let def: SkeletonDef =
        procrig_test_fixtures::skeletons::load(name).expect("load skeleton fixture");
    let mut skel = Skeleton::from_def(&def).expect("build skeleton");
    let calib = RigCalibration::calibrate(&mut skel).expect("calibrate");
    (skel, calib)
}

fn hand_end(rig: &Skeleton, calib: &RigCalibration, side: Side) -> Vector3<f32> {
    let hand = ArmBones::of(side).hand;
    let cal = calib.bone(hand).unwrap();
    let world = rig.world_rotation(hand).unwrap();
    rig.world_position(hand).unwrap() + world * cal.direction_local * cal.length
}

/// it should drive the hand end onto a reachable target on every fixture
#[test]
fn reaches_target_on_all_fixtures() {
    let solver = ArmIkSolver::new(IkConfig::default());
    for name in procrig_test_fixtures::skeletons::keys() {
        let (mut rig, calib) = calibrated(&name);
        for side in Side::BOTH {
            rig.reset_to_rest_pose();
            let shoulder = rig.world_position(ArmBones::of(side).upper).unwrap();
            let target = shoulder + Vector3::new(side.sign() * 0.15, -0.25, 0.3);

            let solution = solver
                .solve(&rig, &calib, side, &ArmTarget::new(target))
                .unwrap_or_else(|| panic!("{name} {side:?}: arm bones missing"));
            assert!(solution.reached, "{name} {side:?}: error {}", solution.error);

            solution.apply(&mut rig, 1.0);
            let elbow = rig.world_position(ArmBones::of(side).lower).unwrap();
            let wrist = rig.world_position(ArmBones::of(side).hand).unwrap();
            assert_relative_eq!(elbow, solution.positions[1], epsilon = 1e-3);
            assert_relative_eq!(wrist, solution.positions[2], epsilon = 1e-3);
            assert!((hand_end(&rig, &calib, side) - target).norm() <= 0.011);
        }
    }
}

/// it should bend the elbow toward the pole direction
#[test]
fn pole_vector_places_elbow() {
    let (rig, calib) = calibrated("reference");
    let shoulder = rig.world_position(HumanBone::LeftUpperArm).unwrap();
    let target = shoulder + Vector3::new(0.18, -0.27, 0.35);

    for pole in [-Vector3::y(), Vector3::y()] {
        let solution = ArmIkSolver::default()
            .solve(&rig, &calib, Side::Left, &ArmTarget::new(target).with_pole(pole))
            .unwrap();
        let end = solution.end_effector().unwrap();
        assert_relative_eq!(end, solution.positions[3], epsilon = 1e-6);
        let axis = (end - shoulder).normalize();
        let bend = project_on_plane(&(solution.positions[1] - shoulder), &axis);
        assert!(bend.dot(&pole) > 0.0, "pole {pole:?}");
    }
}

/// it should stretch toward out-of-reach targets and report the miss
#[test]
fn unreachable_target_reports_error() {
    let (mut rig, calib) = calibrated("reference");
    let target = Vector3::new(3.0, 1.42, 0.0);
    let solution = ArmIkSolver::default()
        .solve(&rig, &calib, Side::Left, &ArmTarget::new(target))
        .unwrap();
    assert!(!solution.reached);
    assert!(solution.error > 1.0);

    solution.apply(&mut rig, 1.0);
    for bone in rig.available_bones() {
        assert!(norm_error(&rig.rotation(bone).unwrap()) < 1e-5, "{bone}");
    }
    let hand = calib.landmark_position(&rig, Landmark::LeftHand).unwrap();
    assert!(hand.x > 0.7);
}

/// it should blend partially between rest and the solved pose
#[test]
fn half_weight_lands_between_rest_and_solution() {
    let (mut rig, calib) = calibrated("rotated_rest");
    let rest_wrist = rig.world_position(HumanBone::RightHand).unwrap();
    let shoulder = rig.world_position(HumanBone::RightUpperArm).unwrap();
    let target = shoulder + Vector3::new(-0.1, -0.4, 0.25);

    let solution = ArmIkSolver::default()
        .solve(&rig, &calib, Side::Right, &ArmTarget::new(target))
        .unwrap();
    solution.apply(&mut rig, 0.5);
    let wrist = rig.world_position(HumanBone::RightHand).unwrap();
    assert!((wrist - rest_wrist).norm() > 0.05);
    assert!((wrist - solution.positions[2]).norm() > 0.05);
}

#[test]
fn leg_solver_is_inert() {
    let (mut rig, calib) = calibrated("reference");
    let before = rig.world_position(HumanBone::LeftFoot).unwrap();
    let solution = LegIkSolver::default().solve(
        &rig,
        &calib,
        Side::Left,
        &LegTarget::new(Vector3::new(0.2, 0.3, 0.2)),
    );
    assert!(!solution.reached);
    assert!(solution.deltas.is_empty());
    assert_eq!(solution.apply(&mut rig, 1.0), 0);
    assert_eq!(rig.world_position(HumanBone::LeftFoot).unwrap(), before);
}
