use approx::assert_relative_eq;
use capstan::*;

const G: f64 = 9.81;

/// 100 t spreader hanging from one hook by four slings.
///
/// Yaw about the hook is a mechanism (no sling changes length), so it is fixed.
fn four_point_lift() -> (Scene, NodeId, NodeId, Vec<NodeId>) {
    let mut scene = Scene::new();
    let hook = scene
        .new_point("hook", None, DVec3::new(0.0, 0.0, 8.0))
        .unwrap();
    let mut body = RigidBody::new(100.0);
    body.frame.fixed = FixedMask([false, false, false, false, false, true]);
    let body = scene.add_rigidbody("spreader", body).unwrap();

    let mut slings = Vec::new();
    for (i, (x, y)) in [(2.0, 1.0), (-2.0, 1.0), (-2.0, -1.0), (2.0, -1.0)]
        .into_iter()
        .enumerate()
    {
        let corner = scene
            .new_point(&format!("corner{i}"), Some(body), DVec3::new(x, y, 0.0))
            .unwrap();
        let sling = scene
            .add_cable(&format!("sling{i}"), Cable::new(&[hook, corner], 8.3, 1.0e5))
            .unwrap();
        slings.push(sling);
    }
    (scene, hook, body, slings)
}

#[test]
fn four_point_lift_reaches_equilibrium() {
    let (mut scene, hook, body, slings) = four_point_lift();
    let result = scene.solve_statics().unwrap();
    assert!(result.success, "{result:?}");
    assert_eq!(result.status, SolveStatus::Converged);
    assert!(result.residual_norm < scene.solver_settings.tolerance);

    let residual = scene.residual().unwrap();
    assert_eq!(residual.len(), 5);
    assert!(residual.iter().all(|r| r.abs() < 1e-6), "{residual:?}");

    // hook takes the weight, the body stays level under it
    let reaction = scene.applied_force(hook).unwrap();
    assert!((reaction.force.z + 100.0 * G).abs() < 1e-5, "{reaction:?}");
    let position = scene.global_position(body).unwrap();
    assert!(position.x.abs() < 1e-6 && position.y.abs() < 1e-6);
    assert!(position.z < 0.0);
    assert!(scene.global_rotation_deg(body).unwrap().length() < 1e-4);

    let tensions: Vec<f64> = slings
        .iter()
        .map(|s| scene.cable_state(*s).unwrap().max_tension())
        .collect();
    for t in &tensions {
        assert!(*t > 0.0);
        assert_relative_eq!(*t, tensions[0], epsilon = 1e-4);
    }
}

#[test]
fn repeated_solves_are_identical() {
    let (mut a, _, _, _) = four_point_lift();
    let (mut b, _, _, _) = four_point_lift();
    let ra = a.solve_statics().unwrap();
    let rb = b.solve_statics().unwrap();
    assert_eq!(ra, rb);
    assert_eq!(a.get_dofs().unwrap(), b.get_dofs().unwrap());
}

#[test]
fn free_yaw_under_a_single_hook_is_reported() {
    let (mut scene, _, body, _) = four_point_lift();
    scene.set_fixed(body, FixedMask::ALL_FREE).unwrap();
    let result = scene.solve_statics().unwrap();
    assert_eq!(result.status, SolveStatus::Unconstrained);
    assert_eq!(result.unconstrained_labels, vec!["spreader.rz".to_string()]);
}

#[test]
fn solving_an_equilibrium_state_is_a_no_op() {
    let (mut scene, _, _, _) = four_point_lift();
    scene.solve_statics().unwrap();
    let before = scene.get_dofs().unwrap();
    let again = scene.solve_statics().unwrap();
    assert!(again.success);
    assert_eq!(again.iterations_used, 0);
    for (a, b) in scene.get_dofs().unwrap().iter().zip(&before) {
        assert!((a - b).abs() < 1e-12);
    }
}

/// 32 kg body on vertical guides on a single sling; with `length` 30 the sling starts slack.
fn sling_rig(length: f64) -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let mut body = RigidBody::new(32.0);
    body.frame.fixed = FixedMask::HEAVE_ONLY;
    let body = scene.add_rigidbody("body", body).unwrap();
    let left = scene
        .new_point("left", Some(body), DVec3::new(-0.4, 0.0, 0.0))
        .unwrap();
    let right = scene
        .new_point("right", Some(body), DVec3::new(0.4, 0.0, 0.0))
        .unwrap();
    let hook = scene
        .new_point("hook", None, DVec3::new(0.0, 0.0, 10.0))
        .unwrap();
    let sheave = scene.new_circle("sheave", hook, DVec3::Y, 0.4).unwrap();
    scene
        .add_cable("sling", Cable::new(&[left, sheave, right], length, 1.0e6))
        .unwrap();
    (scene, body)
}

fn newton_only() -> SolverSettings {
    SolverSettings {
        do_linear_first: false,
        do_local_descent: false,
        do_global_descent: false,
        max_newton_iterations: 5,
        ..SolverSettings::default()
    }
}

#[test]
fn exhausted_budget_reports_failure_and_keeps_best_state() {
    let (mut scene, body) = sling_rig(30.0);
    let result = solve_statics(&mut scene, &newton_only()).unwrap();

    assert!(!result.success);
    assert_eq!(result.status, SolveStatus::Failed);
    assert_relative_eq!(result.residual_norm, 32.0 * G, epsilon = 1e-9);
    assert_eq!(scene.global_position(body).unwrap().z, 0.0);

    match result.into_result() {
        Err(StaticsError::ConvergenceFailure { residual, .. }) => {
            assert_relative_eq!(residual, 32.0 * G, epsilon = 1e-9)
        }
        other => panic!("expected a convergence failure, got {other:?}"),
    }
}

#[test]
fn linear_warm_start_recovers_a_slack_start() {
    let (mut scene, body) = sling_rig(30.0);
    let result = scene.solve_statics().unwrap();
    assert!(result.success, "{result:?}");
    assert_eq!(result.phases[0].phase, Phase::LinearWarmStart);
    assert!(scene.global_position(body).unwrap().z < -4.0);
}

#[test]
fn deterministic_global_search_escapes_a_slack_start() {
    let settings = SolverSettings {
        do_global_descent: true,
        do_deterministic: true,
        ..newton_only()
    };
    let (mut first, body) = sling_rig(30.0);
    let (mut second, _) = sling_rig(30.0);

    let a = solve_statics(&mut first, &settings).unwrap();
    let b = solve_statics(&mut second, &settings).unwrap();
    assert!(a.success, "{a:?}");
    assert!(a.phases.iter().any(|p| p.phase == Phase::GlobalSearch));
    assert!(first.global_position(body).unwrap().z < -4.0);

    assert_eq!(a, b);
    assert_eq!(first.get_dofs().unwrap(), second.get_dofs().unwrap());
}

#[test]
fn seeded_global_search_is_reproducible() {
    let settings = SolverSettings {
        do_global_descent: true,
        do_deterministic: false,
        seed: 42,
        ..newton_only()
    };
    let (mut first, _) = sling_rig(30.0);
    let (mut second, _) = sling_rig(30.0);
    let a = solve_statics(&mut first, &settings).unwrap();
    let b = solve_statics(&mut second, &settings).unwrap();
    assert_eq!(a, b);
    assert_eq!(first.get_dofs().unwrap(), second.get_dofs().unwrap());
}

#[test]
fn unrestrained_direction_is_reported_not_solved() {
    let mut scene = Scene::new();
    let mut barge = RigidBody::new(10.0);
    barge.frame.fixed = FixedMask([false, true, false, true, true, true]);
    barge.frame.position = DVec3::new(3.0, 0.0, 0.5);
    let barge = scene.add_rigidbody("barge", barge).unwrap();
    let mut spring = HydSpring::new(barge);
    spring.displacement_kn = 10.0 * G;
    spring.k_heave = 50.0;
    scene.add_hydspring("hydrostatics", spring).unwrap();

    let result = scene.solve_statics().unwrap();
    assert!(!result.success);
    assert_eq!(result.status, SolveStatus::Unconstrained);
    assert_eq!(result.unconstrained_dofs, vec![0]);
    assert_eq!(result.unconstrained_labels, vec!["barge.x".to_string()]);
    // nothing was moved
    assert_eq!(scene.global_position(barge).unwrap(), DVec3::new(3.0, 0.0, 0.5));

    match result.into_result() {
        Err(StaticsError::Unconstrained { dofs }) => assert_eq!(dofs, vec!["barge.x"]),
        other => panic!("expected unconstrained, got {other:?}"),
    }
}

#[test]
fn pendulum_held_only_by_tension_is_not_flagged() {
    let mut scene = Scene::new();
    let hook = scene
        .new_point("hook", None, DVec3::new(0.0, 0.0, 5.0))
        .unwrap();
    let mut bob = RigidBody::new(2.0);
    bob.frame.fixed = FixedMask([false, true, false, true, true, true]);
    let bob = scene.add_rigidbody("bob", bob).unwrap();
    let eye = scene.new_point("eye", Some(bob), DVec3::ZERO).unwrap();
    // unstretched at the start: no first-order sway stiffness yet
    scene
        .add_cable("wire", Cable::new(&[hook, eye], 5.0, 1.0e4))
        .unwrap();

    let result = scene.solve_statics().unwrap();
    assert_ne!(result.status, SolveStatus::Unconstrained, "{result:?}");
    assert!(result.success, "{result:?}");
    let position = scene.global_position(bob).unwrap();
    assert!(position.x.abs() < 1e-6);
    assert!(position.z < 0.0);
}

#[test]
fn scene_without_free_dofs_is_trivially_converged() {
    let mut scene = Scene::new();
    scene.add_rigidbody("fixed", RigidBody::new(5.0)).unwrap();
    let result = scene.solve_statics().unwrap();
    assert!(result.success);
    assert_eq!(result.iterations_used, 0);
    assert_eq!(result.residual_norm, 0.0);
}

#[test]
fn geometry_errors_at_the_start_state_propagate() {
    let mut scene = Scene::new();
    let mut body = RigidBody::new(1.0);
    body.frame.fixed = FixedMask::HEAVE_ONLY;
    let body = scene.add_rigidbody("body", body).unwrap();
    let hub = scene.new_point("hub", None, DVec3::ZERO).unwrap();
    let drum = scene.new_circle("drum", hub, DVec3::Y, 1.0).unwrap();
    let inside = scene
        .new_point("inside", Some(body), DVec3::new(0.2, 0.0, 0.0))
        .unwrap();
    let outside = scene
        .new_point("outside", None, DVec3::new(5.0, 0.0, -5.0))
        .unwrap();
    scene
        .add_cable("rope", Cable::new(&[inside, drum, outside], 5.0, 1.0e4))
        .unwrap();

    let err = scene.solve_statics().unwrap_err();
    assert!(err.is_geometry(), "{err}");
}

#[test]
fn invalid_settings_are_rejected_before_solving() {
    let (mut scene, _) = sling_rig(21.0);
    let settings = SolverSettings {
        fd_step: 0.0,
        ..SolverSettings::default()
    };
    let err = solve_statics(&mut scene, &settings).unwrap_err();
    assert!(matches!(err, StaticsError::Configuration(_)));
}

#[test]
fn settings_load_from_partial_json() {
    let settings: SolverSettings =
        serde_json::from_str(r#"{ "tolerance": 1e-8, "do_global_descent": true, "seed": 7 }"#)
            .unwrap();
    assert_eq!(settings.tolerance, 1e-8);
    assert!(settings.do_global_descent);
    assert_eq!(settings.seed, 7);
    assert_eq!(
        settings.max_newton_iterations,
        SolverSettings::default().max_newton_iterations
    );
    assert!(settings.validate().is_ok());
}

#[test]
fn convergence_result_serializes() {
    let (mut scene, _) = sling_rig(21.0);
    let result = scene.solve_statics().unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "Converged");
    assert_eq!(json["success"], true);
    assert!(json["phases"].as_array().is_some_and(|p| !p.is_empty()));
}

/// 2 t body on vertical guides whose sling eye starts exactly at the hook.
fn eye_at_hook() -> (Scene, NodeId, NodeId) {
    let mut scene = Scene::new();
    let hook = scene.new_point("hook", None, DVec3::ZERO).unwrap();
    let mut body = RigidBody::new(2.0);
    body.frame.fixed = FixedMask::HEAVE_ONLY;
    let body = scene.add_rigidbody("body", body).unwrap();
    let eye = scene.new_point("eye", Some(body), DVec3::ZERO).unwrap();
    let sling = scene
        .add_cable("sling", Cable::new(&[hook, eye], 5.0, 1.0e4))
        .unwrap();
    (scene, body, sling)
}

#[test]
fn coincident_sling_ends_are_a_valid_start() {
    let (mut scene, body, sling) = eye_at_hook();
    assert_eq!(scene.residual().unwrap(), vec![-2.0 * G]);
    assert!(scene.cable_state(sling).unwrap().is_slack());

    // local phases cannot leave the slack plateau, but they must not abort
    let result = scene.solve_statics().unwrap();
    assert_eq!(result.status, SolveStatus::Failed);
    assert_eq!(scene.global_position(body).unwrap().z, 0.0);

    let settings = SolverSettings {
        do_global_descent: true,
        do_deterministic: true,
        ..SolverSettings::default()
    };
    let result = solve_statics(&mut scene, &settings).unwrap();
    assert!(result.success, "{result:?}");
    let stretch = 2.0 * G * 5.0 / 1.0e4;
    assert_relative_eq!(scene.global_position(body).unwrap().z, -(5.0 + stretch), epsilon = 1e-8);
    assert_relative_eq!(
        scene.cable_state(sling).unwrap().max_tension(),
        2.0 * G,
        epsilon = 1e-6
    );
}

#[test]
fn descent_alone_reaches_equilibrium() {
    let settings = SolverSettings {
        do_linear_first: false,
        do_newton: false,
        do_local_descent: true,
        ..SolverSettings::default()
    };
    let (mut scene, body) = sling_rig(21.0);
    let result = solve_statics(&mut scene, &settings).unwrap();
    assert!(result.success, "{result:?}");
    assert!(!result.phases.is_empty());
    assert!(result.phases.iter().all(|p| p.phase == Phase::LocalDescent));
    assert!(result.iterations_used > 0);
    assert!(scene.global_position(body).unwrap().z > 0.0);
}

#[test]
fn descent_takes_over_when_newton_is_singular() {
    // the slack sling leaves an exactly zero row, the slider a solvable spring
    let (mut scene, _) = sling_rig(30.0);
    let base = scene.add_frame("base", Frame::new()).unwrap();
    let mut slider = Frame::new();
    slider.fixed = FixedMask([false, true, true, true, true, true]);
    let slider = scene.add_frame("slider", slider).unwrap();
    let handle = scene.new_point("handle", Some(slider), DVec3::ZERO).unwrap();
    scene
        .add_force(
            "push",
            ExternalForce {
                parent: handle,
                force: DVec3::new(300.0, 0.0, 0.0),
                moment: DVec3::ZERO,
            },
        )
        .unwrap();
    scene
        .add_connector(
            "spring",
            LinearConnector6d {
                main: base,
                secondary: slider,
                stiffness: [1000.0; 6],
            },
        )
        .unwrap();

    let settings = SolverSettings {
        do_linear_first: false,
        ..SolverSettings::default()
    };
    let result = solve_statics(&mut scene, &settings).unwrap();
    assert_eq!(result.status, SolveStatus::Failed);
    assert_eq!(result.phases[0].phase, Phase::Newton);
    assert_eq!(result.phases[0].iterations, 0);
    assert_eq!(result.phases[1].phase, Phase::LocalDescent);
    assert!(result.phases[1].iterations > 0);
    assert_relative_eq!(scene.global_position(slider).unwrap().x, 0.3, epsilon = 1e-6);
    // only the hanging weight is left unbalanced
    assert_relative_eq!(result.residual_norm, 32.0 * G, epsilon = 1e-6);
}
