use std::sync::Arc;

use approx::assert_relative_eq;
use capstan::*;

const G: f64 = 9.81;

#[test]
fn dof_vector_round_trips_through_the_scene() {
    let mut scene = Scene::new();
    let mut body = RigidBody::new(1.0);
    body.frame.fixed = FixedMask::TRANSLATION_ONLY;
    let body = scene.add_rigidbody("body", body).unwrap();
    let point = scene
        .new_point("tip", Some(body), DVec3::new(1.0, 0.0, 0.0))
        .unwrap();

    assert_eq!(scene.dof_map().labels(), &["body.x", "body.y", "body.z"]);
    scene.set_dofs(&[1.0, 2.0, 3.0]).unwrap();
    scene.change_dofs(&[0.5, 0.0, -1.0]).unwrap();
    assert_eq!(scene.get_dofs().unwrap(), vec![1.5, 2.0, 2.0]);
    // children follow through the transform cache
    assert_eq!(
        scene.global_position(point).unwrap(),
        DVec3::new(2.5, 2.0, 2.0)
    );

    let err = scene.set_dofs(&[1.0]).unwrap_err();
    assert!(matches!(err, StaticsError::Configuration(_)));

    scene.set_fixed(body, FixedMask::ALL_FIXED).unwrap();
    assert_eq!(scene.get_dofs().unwrap(), Vec::<f64>::new());
}

#[test]
fn stale_dof_map_is_rejected() {
    let mut scene = Scene::new();
    let mut body = RigidBody::new(1.0);
    body.frame.fixed = FixedMask::HEAVE_ONLY;
    let body = scene.add_rigidbody("body", body).unwrap();

    let map = scene.dof_map();
    scene.set_fixed(body, FixedMask::TRANSLATION_ONLY).unwrap();
    assert!(!map.is_current(&scene));

    let err = map.set_dofs(&mut scene, &[0.0]).unwrap_err();
    assert!(matches!(err, StaticsError::Configuration(_)), "{err}");
    assert!(map.get_dofs(&scene).is_err());

    // a fresh map works again
    let map = scene.dof_map();
    assert_eq!(map.len(), 3);
    assert!(map.set_dofs(&mut scene, &[0.0, 0.0, 1.0]).is_ok());
}

#[test]
fn reparenting_keeps_the_global_pose_and_refuses_cycles() {
    let mut scene = Scene::new();
    let mut outer = Frame::at(DVec3::new(10.0, 0.0, 0.0));
    outer.rotation = DVec3::new(0.0, 0.0, 90.0);
    let outer = scene.add_frame("outer", outer).unwrap();
    let mut inner = Frame::at(DVec3::new(1.0, 0.0, 0.0));
    inner.parent = Some(outer);
    let inner = scene.add_frame("inner", inner).unwrap();
    let pin = scene
        .new_point("pin", Some(inner), DVec3::new(0.0, 0.0, 1.0))
        .unwrap();

    let before = scene.global_position(inner).unwrap();
    assert_relative_eq!(before.x, 10.0, epsilon = 1e-12);
    assert_relative_eq!(before.y, 1.0, epsilon = 1e-12);

    let err = scene.change_parent(outer, Some(inner)).unwrap_err();
    assert!(matches!(err, StaticsError::Configuration(_)), "{err}");
    assert!(scene.change_parent(outer, Some(outer)).is_err());

    scene.change_parent(inner, None).unwrap();
    assert_eq!(scene.frame(inner).unwrap().parent, None);
    let after = scene.global_position(inner).unwrap();
    assert!((after - before).length() < 1e-12);
    let rotation = scene.global_rotation_deg(inner).unwrap();
    assert_relative_eq!(rotation.z, 90.0, epsilon = 1e-9);
    assert!((scene.global_position(pin).unwrap() - DVec3::new(10.0, 1.0, 1.0)).length() < 1e-12);

    // now the former parent may hang below
    scene.change_parent(outer, Some(inner)).unwrap();
    assert_relative_eq!(scene.global_position(outer).unwrap().x, 10.0, epsilon = 1e-12);
}

#[test]
fn nodes_in_use_cannot_be_deleted() {
    let mut scene = Scene::new();
    let a = scene.new_point("a", None, DVec3::ZERO).unwrap();
    let b = scene.new_point("b", None, DVec3::new(0.0, 0.0, 5.0)).unwrap();
    let cable = scene
        .add_cable("wire", Cable::new(&[a, b], 5.0, 1.0e4))
        .unwrap();

    let err = scene.delete(a).unwrap_err();
    assert!(err.to_string().contains("wire"), "{err}");
    assert!(scene.contains(a));

    scene.delete(cable).unwrap();
    scene.delete(a).unwrap();
    assert!(!scene.contains(a));
    assert!(scene.id("a").is_err());
    assert!(matches!(scene.node(a), Err(StaticsError::UnknownNode(_))));
}

#[test]
fn names_must_be_unique_and_references_valid() {
    let mut scene = Scene::new();
    let a = scene.new_point("a", None, DVec3::ZERO).unwrap();
    assert!(scene.new_point("a", None, DVec3::X).is_err());

    // a circle has to sit on a point, not on a frame
    let frame = scene.add_frame("frame", Frame::new()).unwrap();
    assert!(scene.new_circle("bad", frame, DVec3::Y, 1.0).is_err());
    assert!(scene.new_circle("flat", a, DVec3::ZERO, 1.0).is_err());

    // open cables end on points
    let c = scene.new_circle("c", a, DVec3::Y, 1.0).unwrap();
    let b = scene.new_point("b", None, DVec3::new(0.0, 0.0, 5.0)).unwrap();
    assert!(scene.add_cable("w", Cable::new(&[c, b], 5.0, 1.0e4)).is_err());
    assert!(scene.add_cable("w", Cable::new(&[a, b], -1.0, 1.0e4)).is_err());
    assert_eq!(scene.len(), 4);
}

#[test]
fn connector_responds_linearly() {
    let mut scene = Scene::new();
    let base = scene.add_frame("base", Frame::new()).unwrap();
    let mut slider = Frame::new();
    slider.fixed = FixedMask([false, true, true, true, true, false]);
    let slider = scene.add_frame("slider", slider).unwrap();
    let handle = scene.new_point("handle", Some(slider), DVec3::ZERO).unwrap();
    scene
        .add_force(
            "push",
            ExternalForce {
                parent: handle,
                force: DVec3::new(300.0, 0.0, 0.0),
                moment: DVec3::new(0.0, 0.0, 20.0),
            },
        )
        .unwrap();
    scene
        .add_connector(
            "spring",
            LinearConnector6d {
                main: base,
                secondary: slider,
                stiffness: [1000.0, 1000.0, 1000.0, 400.0, 400.0, 400.0],
            },
        )
        .unwrap();

    let result = scene.solve_statics().unwrap();
    assert!(result.success, "{result:?}");
    let x = scene.global_position(slider).unwrap().x;
    assert_relative_eq!(x, 300.0 / 1000.0, epsilon = 1e-8);
    let rz = scene.global_rotation_deg(slider).unwrap().z.to_radians();
    assert_relative_eq!(rz, 20.0 / 400.0, epsilon = 1e-8);

    // the stretched spring drags the base along
    let reaction = scene.applied_force(base).unwrap();
    assert_relative_eq!(reaction.force.x, 300.0, epsilon = 1e-6);
}

fn pontoon(mass: f64, displacement: f64) -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let mut body = RigidBody::new(mass);
    body.frame.fixed = FixedMask([true, true, false, false, true, true]);
    let body = scene.add_rigidbody("pontoon", body).unwrap();
    let mut spring = HydSpring::new(body);
    spring.displacement_kn = displacement;
    spring.k_heave = 200.0;
    spring.bm_t = 4.0;
    spring.bm_l = 12.0;
    scene.add_hydspring("hydrostatics", spring).unwrap();
    (scene, body)
}

#[test]
fn hydspring_floats_at_the_heave_balance() {
    let mass = 20.0;
    // 0.2 m of extra buoyancy above the weight
    let (mut scene, body) = pontoon(mass, mass * G + 200.0 * 0.2);
    let result = scene.solve_statics().unwrap();
    assert!(result.success, "{result:?}");
    assert_relative_eq!(scene.global_position(body).unwrap().z, 0.2, epsilon = 1e-8);
}

#[test]
fn hydspring_restores_heel() {
    let mass = 20.0;
    let (mut scene, body) = pontoon(mass, mass * G);
    let deck = scene.new_point("deck", Some(body), DVec3::ZERO).unwrap();
    let heeling = 50.0;
    scene
        .add_force(
            "wind",
            ExternalForce {
                parent: deck,
                force: DVec3::ZERO,
                moment: DVec3::new(heeling, 0.0, 0.0),
            },
        )
        .unwrap();

    let result = scene.solve_statics().unwrap();
    assert!(result.success, "{result:?}");
    let heel = scene.global_rotation_deg(body).unwrap().x.to_radians();
    assert_relative_eq!(heel, (heeling / (mass * G * 4.0)).asin(), epsilon = 1e-8);
}

#[test]
fn sphere_floats_half_submerged() {
    let mut scene = Scene::new();
    let radius: f64 = 1.0;
    let half_volume = 2.0 / 3.0 * std::f64::consts::PI * radius.powi(3);
    let mass = scene.water.density * half_volume;

    let mut buoy = RigidBody::new(mass);
    buoy.frame.fixed = FixedMask::HEAVE_ONLY;
    buoy.frame.position = DVec3::new(0.0, 0.0, 0.3);
    let buoy = scene.add_rigidbody("buoy", buoy).unwrap();
    scene
        .add_buoyancy(
            "hull",
            Buoyancy {
                parent: buoy,
                model: Arc::new(SphereFloat::new(DVec3::ZERO, radius)),
            },
        )
        .unwrap();

    let result = scene.solve_statics().unwrap();
    assert!(result.success, "{result:?}");
    assert!(scene.global_position(buoy).unwrap().z.abs() < 1e-6);
}

#[test]
fn child_loads_reach_the_parent_frame() {
    let mut scene = Scene::new();
    let crane = scene.add_frame("crane", Frame::new()).unwrap();
    let mut boom = Frame::at(DVec3::new(5.0, 0.0, 0.0));
    boom.parent = Some(crane);
    let boom = scene.add_frame("boom", boom).unwrap();
    let mut load = RigidBody::new(2.0);
    load.frame.parent = Some(boom);
    load.frame.position = DVec3::new(1.0, 0.0, 0.0);
    scene.add_rigidbody("load", load).unwrap();

    let total = scene.applied_force(crane).unwrap();
    assert_relative_eq!(total.force.z, -2.0 * G, epsilon = 1e-12);
    // 6 m lever arm about the crane origin
    assert_relative_eq!(total.moment.y, 6.0 * 2.0 * G, epsilon = 1e-12);
    let on_boom = scene.applied_force(boom).unwrap();
    assert_relative_eq!(on_boom.moment.y, 2.0 * G, epsilon = 1e-12);
}
