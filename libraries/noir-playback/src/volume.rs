//! Volume control with logarithmic scaling
//!
//! Volume range is 0-100%, mapped to -60 dB to 0 dB. The engine only ever
//! receives the resulting linear gain.

/// Volume controller with logarithmic scaling
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,

    /// Cached linear gain multiplier
    linear_gain: f32,
}

impl Volume {
    /// Create new volume controller, clamping `level` to 100
    pub fn new(level: u8) -> Self {
        let level = level.min(100);
        Self {
            level,
            muted: false,
            linear_gain: Self::calculate_linear_gain(level),
        }
    }

    /// Set volume level (0-100)
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
        self.linear_gain = Self::calculate_linear_gain(self.level);
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Linear gain sent to the engine
    ///
    /// Returns 0.0 if muted, otherwise logarithmic gain based on level
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.linear_gain
        }
    }

    /// Formula: gain = 10^((level% - 100) * 0.6 / 20)
    /// - 0%   → silence
    /// - 50%  → -30 dB → 0.0316 gain
    /// - 80%  → -12 dB → 0.251 gain (default)
    /// - 100% →   0 dB → 1.0 gain (unity)
    fn calculate_linear_gain(level: u8) -> f32 {
        if level == 0 {
            return 0.0;
        }

        let db = (f32::from(level) - 100.0) * 0.6;
        10.0_f32.powf(db / 20.0)
    }

    /// Current attenuation in dB, for logs
    pub fn to_db(&self) -> f32 {
        if self.level == 0 || self.muted {
            -60.0
        } else {
            20.0 * self.linear_gain.log10()
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(80)
    }
}
