/// Battle configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Number of upcoming turns materialised in the visible timeline.
    pub timeline_window: usize,

    /// Tolerance used when comparing action times before falling back to
    /// insertion order.
    pub time_epsilon: f64,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Upper bound of the visible timeline window.
    pub const MAX_TIMELINE: usize = 15;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TIMELINE_WINDOW: usize = 10;
    pub const DEFAULT_TIME_EPSILON: f64 = 1e-6;

    pub fn new() -> Self {
        Self {
            timeline_window: Self::DEFAULT_TIMELINE_WINDOW,
            time_epsilon: Self::DEFAULT_TIME_EPSILON,
        }
    }

    /// Overrides the timeline window, clamped to `1..=MAX_TIMELINE`.
    pub fn with_timeline_window(mut self, window: usize) -> Self {
        self.timeline_window = window.clamp(1, Self::MAX_TIMELINE);
        self
    }

    /// Effective window length, clamped even if the field was set directly.
    pub fn window(&self) -> usize {
        self.timeline_window.clamp(1, Self::MAX_TIMELINE)
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
