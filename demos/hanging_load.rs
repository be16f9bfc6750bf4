use capstan::*;

fn main() -> Result<(), StaticsError> {
    let mut scene = Scene::new();

    let hook = scene.new_point("hook", None, DVec3::new(0.0, 0.0, 10.0))?;
    let sheave = scene.new_circle("sheave", hook, DVec3::Y, 0.4)?;

    let mut body = RigidBody::new(32.0);
    body.frame.fixed = FixedMask::HEAVE_ONLY;
    let body = scene.add_rigidbody("body", body)?;
    let left = scene.new_point("left", Some(body), DVec3::new(-0.4, 0.0, 0.0))?;
    let right = scene.new_point("right", Some(body), DVec3::new(0.4, 0.0, 0.0))?;

    let sling = scene.add_cable(
        "sling",
        Cable::new(&[left, sheave, right], 21.0, 1.0e6)
            .with_friction(&[None, Some(0.1), None])
            .with_friction_model(FrictionModel::Sheave),
    )?;

    let result = scene.solve_statics()?.into_result()?;
    println!(
        "converged in {} iterations, residual {:.3e}",
        result.iterations_used, result.residual_norm
    );
    println!("body at z = {:.6}", scene.global_position(body)?.z);

    let state = scene.cable_state(sling)?;
    for (i, tension) in state.segment_tensions.iter().enumerate() {
        println!("segment {i}: tension {tension:.3}");
    }
    println!("hook load: {:?}", scene.applied_force(sheave)?.force);
    Ok(())
}
