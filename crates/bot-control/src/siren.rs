use std::time::Duration;

/// One deterrent "whoop": linear pitch sweep under an exponentially
/// decaying gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirenSweep {
    pub start_hz: f32,
    pub end_hz: f32,
    pub duration: Duration,
    pub start_gain: f32,
    pub end_gain: f32,
}

/// Emitted once per "on" half of the defense loop.
pub const WHOOP: SirenSweep = SirenSweep {
    start_hz: 800.0,
    end_hz: 1200.0,
    duration: Duration::from_millis(300),
    start_gain: 0.5,
    end_gain: 0.01,
};

impl SirenSweep {
    fn progress(&self, t: Duration) -> f32 {
        let d = self.duration.as_secs_f32();
        if d <= 0.0 {
            return 1.0;
        }
        (t.as_secs_f32() / d).clamp(0.0, 1.0)
    }

    pub fn frequency_at(&self, t: Duration) -> f32 {
        self.start_hz + (self.end_hz - self.start_hz) * self.progress(t)
    }

    // Exponential ramps need strictly positive endpoints.
    pub fn gain_at(&self, t: Duration) -> f32 {
        let g0 = self.start_gain.max(f32::MIN_POSITIVE);
        let g1 = self.end_gain.max(f32::MIN_POSITIVE);
        g0 * (g1 / g0).powf(self.progress(t))
    }

    /// Sawtooth samples in [-1, 1] scaled by the envelope, for backends that
    /// play the sweep themselves.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let n = (self.duration.as_secs_f64() * sample_rate as f64).round() as usize;
        let mut out = Vec::with_capacity(n);
        let mut phase = 0.0f32;
        for i in 0..n {
            let t = Duration::from_secs_f64(i as f64 / sample_rate as f64);
            phase = (phase + self.frequency_at(t) / sample_rate as f32).fract();
            out.push((2.0 * phase - 1.0) * self.gain_at(t));
        }
        out
    }
}
