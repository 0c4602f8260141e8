//! Parameter slewing.
//!
//! `SlewLimiter` is a one-pole smoother for arbitrary control signals. The
//! master gain runs through one so that a volume change lands as a short
//! exponential glide instead of a step.

use crate::dsp::{kill_denormals, one_pole_coeff_ms};

/// One-pole slew/smoother: `y += (x - y) * (1 - alpha)`.
#[derive(Copy, Clone, Debug)]
pub struct SlewLimiter {
    alpha: f32,
    y: f32,
}

impl SlewLimiter {
    #[inline]
    pub fn new(t_ms: f32, sr: f32) -> Self {
        Self { alpha: one_pole_coeff_ms(t_ms, sr), y: 0.0 }
    }

    #[inline]
    pub fn set_time_ms(&mut self, t_ms: f32, sr: f32) {
        self.alpha = one_pole_coeff_ms(t_ms, sr);
    }

    #[inline]
    pub fn reset(&mut self, y0: f32) { self.y = y0; }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.y += (x - self.y) * (1.0 - self.alpha);
        self.y = kill_denormals(self.y);
        self.y
    }

    #[inline]
    pub fn value(&self) -> f32 { self.y }
}
