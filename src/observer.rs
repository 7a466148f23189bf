//! Step observer trait for monitoring simulation progress.

use crate::particle::ParticleKey;

/// Summary of one simulated frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at 1 for the first step.
    pub frame: u64,
    /// Particles that ran the full pipeline.
    pub simulated: usize,
    /// Particles skipped by the idle heuristic.
    pub skipped: usize,
    /// Cell changes applied to the grid this frame.
    pub rebucketed: usize,
    /// Empty buckets removed by a sweep this frame.
    pub swept: usize,
}

/// Trait for observing simulation steps.
///
/// Implement this trait to monitor progress (e.g. for debugging, drawing or
/// profiling). All methods have default no-op implementations.
pub trait StepObserver {
    /// Called when the idle heuristic skips a particle for this frame.
    fn on_skip(&mut self, _key: ParticleKey) {}

    /// Called after a particle's pipeline ran and its grid cell was refreshed.
    fn on_particle(&mut self, _key: ParticleKey) {}

    /// Called after empty buckets were swept.
    fn on_sweep(&mut self, _removed: usize) {}

    /// Called when a frame is fully complete.
    fn on_frame_complete(&mut self, _stats: &FrameStats) {}
}

/// A no-op observer that does nothing. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}
