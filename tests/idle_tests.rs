use verlet_sandbox::{
    Constraint, FrameStats, NoOpStepObserver, NoPointer, Particle, ParticleKey, Simulation,
    SimulationConfig, StepObserver, Vec2,
};

#[derive(Default)]
struct Recorder {
    skipped: Vec<ParticleKey>,
    frames: Vec<FrameStats>,
}

impl StepObserver for Recorder {
    fn on_skip(&mut self, key: ParticleKey) {
        self.skipped.push(key);
    }

    fn on_frame_complete(&mut self, stats: &FrameStats) {
        self.frames.push(*stats);
    }
}

fn resting_sim(idle_skip: bool) -> Simulation {
    let config = SimulationConfig::new().with_idle_skip(idle_skip).with_idle_threshold(10);
    let mut sim = Simulation::new(config).unwrap();
    sim.spawn(Particle::at_rest((50.0, 50.0))).unwrap();
    sim
}

#[test]
fn resting_particle_alternates_after_threshold() {
    let mut sim = resting_sim(true);
    let mut recorder = Recorder::default();
    for _ in 0..20 {
        sim.step(&NoPointer, &mut recorder);
    }

    let skipped_frames: Vec<u64> = recorder
        .frames
        .iter()
        .filter(|s| s.skipped == 1)
        .map(|s| s.frame)
        .collect();
    assert_eq!(skipped_frames, vec![11, 13, 15, 17, 19]);
    assert_eq!(recorder.skipped.len(), 5);
}

#[test]
fn idle_skip_disabled_never_skips() {
    let mut sim = resting_sim(false);
    for _ in 0..30 {
        sim.step(&NoPointer, &mut NoOpStepObserver);
        assert_eq!(sim.last_stats().skipped, 0);
        assert_eq!(sim.last_stats().simulated, 1);
    }
}

#[test]
fn movement_resets_idle_tracker() {
    let mut sim = resting_sim(true);
    let key = sim.world().keys()[0];
    for _ in 0..11 {
        sim.step(&NoPointer, &mut NoOpStepObserver);
    }
    assert_eq!(sim.last_stats().skipped, 1);

    sim.world_mut().get_mut(key).unwrap().set_velocity(Vec2::new(3.0, 0.0));
    sim.step(&NoPointer, &mut NoOpStepObserver);
    assert_eq!(sim.last_stats().skipped, 0);
    assert_eq!(sim.world().get(key).unwrap().position, Vec2::new(53.0, 50.0));
}

#[test]
fn tolerance_scales_with_radius() {
    let config = SimulationConfig::new().with_idle_threshold(0).with_iterations(0);
    let mut sim = Simulation::new(config)
        .unwrap()
        .with_single_pass(Constraint::friction(1.0));
    // Speed 0.15 per axis: idle for radius 10 (tolerance 0.2), moving for radius 5.
    let big = sim.spawn(Particle::new((0.0, 0.0), (-0.15, 0.0)).with_radius(10.0)).unwrap();
    let small = sim.spawn(Particle::new((100.0, 0.0), (99.85, 0.0))).unwrap();

    let mut recorder = Recorder::default();
    sim.step(&NoPointer, &mut recorder);
    assert_eq!(recorder.skipped, vec![big]);
    assert!(!recorder.skipped.contains(&small));
}
