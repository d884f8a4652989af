//! Speed to action-time conversion.
//!
//! The queue never stores an actor's time. It asks a [`TimeProvider`] on every
//! comparison, so buffs and debuffs that change speed mid-stage reorder the
//! queue immediately.

use crate::actor::ActorStats;

/// Supplies the live "action time" of an actor. Lower values act sooner.
pub trait TimeProvider: Send + Sync {
    fn action_time(&self, stats: &ActorStats) -> f64;
}

impl<F> TimeProvider for F
where
    F: Fn(&ActorStats) -> f64 + Send + Sync,
{
    fn action_time(&self, stats: &ActorStats) -> f64 {
        self(stats)
    }
}

/// Default formula: `scale / speed`, with speed clamped to at least 1.
///
/// - speed 10, scale 1000: 100
/// - speed 20, scale 1000: 50
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedTimeProvider {
    pub scale: f64,
}

impl SpeedTimeProvider {
    pub const DEFAULT_SCALE: f64 = 1000.0;

    pub const fn new(scale: f64) -> Self {
        Self { scale }
    }
}

impl Default for SpeedTimeProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SCALE)
    }
}

impl TimeProvider for SpeedTimeProvider {
    fn action_time(&self, stats: &ActorStats) -> f64 {
        self.scale / f64::from(stats.speed.max(1))
    }
}
