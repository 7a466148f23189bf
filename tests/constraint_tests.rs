use verlet_sandbox::{
    Anchor, BoundsConstraint, CircleBoundary, Constraint, Friction, NoOpStepObserver, NoPointer,
    Particle, PointForce, Polarity, Simulation, SimulationConfig, StepContext, Vec2, World,
};

#[test]
fn circle_boundary_projects_onto_rim() {
    let boundary = CircleBoundary::new(Vec2::new(100.0, 100.0), 50.0);
    let mut p = Particle::at_rest((300.0, 100.0)).with_radius(5.0);

    boundary.apply(&mut p);

    assert!((p.position.distance(boundary.center) - 45.0).abs() < 1e-12);
    assert_eq!(p.position, Vec2::new(145.0, 100.0));
}

#[test]
fn circle_boundary_is_idempotent() {
    let boundary = CircleBoundary::new(Vec2::ZERO, 50.0);

    let mut inside = Particle::at_rest((10.0, -20.0));
    boundary.apply(&mut inside);
    boundary.apply(&mut inside);
    assert_eq!(inside.position, Vec2::new(10.0, -20.0));

    let mut outside = Particle::at_rest((80.0, 60.0));
    boundary.apply(&mut outside);
    let once = outside.position;
    boundary.apply(&mut outside);
    assert!((outside.position.distance(once)) < 1e-12);
}

#[test]
fn friction_never_speeds_up() {
    let config = SimulationConfig::new().with_iterations(1).with_idle_skip(false);
    let mut sim = Simulation::new(config)
        .unwrap()
        .with_single_pass(Constraint::friction(0.9));
    let key = sim.spawn(Particle::new((0.0, 0.0), (-4.0, 3.0))).unwrap();

    let mut last = sim.world().get(key).unwrap().velocity().length();
    for _ in 0..50 {
        sim.step(&NoPointer, &mut NoOpStepObserver);
        let speed = sim.world().get(key).unwrap().velocity().length();
        assert!(speed <= last, "speed grew from {} to {}", last, speed);
        last = speed;
    }
    assert!(last < 0.05);
}

#[test]
fn property_friction_reads_each_particle() {
    let friction = Friction::from_property(1.0);
    let mut sticky = Particle::new((1.0, 0.0), (0.0, 0.0)).with_friction(0.0);
    let mut slick = Particle::new((1.0, 0.0), (0.0, 0.0));
    friction.apply(&mut sticky);
    friction.apply(&mut slick);
    assert_eq!(sticky.velocity(), Vec2::ZERO);
    assert_eq!(slick.velocity(), Vec2::new(1.0, 0.0));
}

#[test]
fn link_moves_only_constrained_particle() {
    let mut world = World::new(10.0).unwrap();
    let anchor = world.spawn(Particle::at_rest((0.0, 0.0))).unwrap();
    let bob = world.spawn(Particle::new((0.0, 30.0), (0.0, 28.0))).unwrap();

    Constraint::link(anchor, 20.0, 0.5).apply(bob, &mut world, StepContext::default());

    let a = world.get(anchor).unwrap();
    let b = world.get(bob).unwrap();
    assert_eq!(a.position, Vec2::ZERO);
    assert!((b.position.distance(a.position) - 20.0).abs() < 1e-12);
    assert_eq!(b.old_position, Vec2::new(0.0, 29.0));
}

#[test]
fn link_to_despawned_particle_is_ignored() {
    let mut world = World::new(10.0).unwrap();
    let anchor = world.spawn(Particle::at_rest((0.0, 0.0))).unwrap();
    let bob = world.spawn(Particle::at_rest((0.0, 30.0))).unwrap();
    world.despawn(anchor).unwrap();

    Constraint::link(anchor, 20.0, 1.0).apply(bob, &mut world, StepContext::default());

    assert_eq!(world.get(bob).unwrap().position, Vec2::new(0.0, 30.0));
}

#[test]
fn pointer_effectors_follow_live_point() {
    let config = SimulationConfig::new().with_iterations(1).with_idle_skip(false);
    let mut sim = Simulation::new(config)
        .unwrap()
        .with_single_pass(Constraint::repulsive(2.0, 50.0, Anchor::Pointer));
    let key = sim.spawn(Particle::at_rest((10.0, 0.0))).unwrap();

    let pointer = || Some(Vec2::new(0.0, 0.0));
    sim.step(&pointer, &mut NoOpStepObserver);
    assert_eq!(sim.world().get(key).unwrap().position, Vec2::new(12.0, 0.0));

    // No pointer: the effector does nothing, the particle coasts.
    sim.step(&NoPointer, &mut NoOpStepObserver);
    assert_eq!(sim.world().get(key).unwrap().position, Vec2::new(14.0, 0.0));
}

#[test]
fn rotational_swirls_around_fixed_point() {
    let swirl = Constraint::rotational(1.0, 100.0, Anchor::Fixed(Vec2::ZERO), true);
    let mut p = Particle::at_rest((0.0, 10.0));
    swirl.apply_local(&mut p, None);
    // Tangent is perpendicular to the radius vector.
    assert_eq!(p.position, Vec2::new(-1.0, 10.0));
}

#[test]
fn rect_boundary_with_offset_origin() {
    let bounds = BoundsConstraint::new(Vec2::new(-50.0, 20.0), Vec2::new(50.0, 80.0));

    let mut left_low = Particle::at_rest((-70.0, 100.0)).with_radius(5.0);
    bounds.apply(&mut left_low);
    assert_eq!(left_low.position, Vec2::new(-45.0, 75.0));

    let mut right_high = Particle::at_rest((48.0, 0.0)).with_radius(5.0);
    bounds.apply(&mut right_high);
    assert_eq!(right_high.position, Vec2::new(45.0, 25.0));

    let mut inside = Particle::at_rest((-10.0, 40.0)).with_radius(5.0);
    bounds.apply(&mut inside);
    assert_eq!(inside.position, Vec2::new(-10.0, 40.0));
}

#[test]
fn rect_constraint_runs_through_world() {
    let mut world = World::new(10.0).unwrap();
    let key = world.spawn(Particle::at_rest((-200.0, -200.0))).unwrap();
    Constraint::rect(Vec2::new(-100.0, -60.0), Vec2::new(0.0, 0.0))
        .apply(key, &mut world, StepContext::default());
    assert_eq!(world.get(key).unwrap().position, Vec2::new(-95.0, -55.0));
}

#[test]
fn magnetic_pulls_toward_fixed_point() {
    let magnet = PointForce::magnetic(1.0, 20.0, Anchor::Fixed(Vec2::new(0.0, 0.0)));
    assert_eq!(magnet.polarity, Polarity::Attract);

    let mut p = Particle::at_rest((0.0, 10.0));
    magnet.apply(&mut p, None);
    assert_eq!(p.position, Vec2::new(0.0, 9.0));

    let mut far = Particle::at_rest((0.0, 30.0));
    magnet.apply(&mut far, None);
    assert_eq!(far.position, Vec2::new(0.0, 30.0));
}
