//! Phase-accumulator oscillator.
//!
//! Frequency is **Hz**; `next` expects the current **sample rate**. The phase
//! lives in [0,1) and is wrapped every sample, so a frequency change only alters
//! the slope of the phase ramp and never jumps the waveform.

use crate::dsp::{sine, wrap_phase01, TAU};

/// Oscillator waveform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Wave {
    #[default]
    Sine,
    Tri,
    Saw,
}

/// Naive triangle and saw (not bandlimited); fine for steady drones.
#[inline]
fn wave_sample(phase01: f32, wave: Wave) -> f32 {
    match wave {
        Wave::Sine => sine(TAU * phase01),
        Wave::Tri => {
            let d = phase01 - 0.5;
            4.0 * (if d < 0.0 { -d } else { d }) - 1.0
        }
        Wave::Saw => 2.0 * phase01 - 1.0,
    }
}

/// Free-running oscillator.
#[derive(Copy, Clone, Debug)]
pub struct PhaseOsc {
    phase: f32, // [0,1)
    freq: f32,  // Hz
    wave: Wave,
}

impl PhaseOsc {
    #[inline] pub fn new(freq_hz: f32, wave: Wave) -> Self { Self { phase: 0.0, freq: freq_hz.max(0.0), wave } }
    #[inline] pub fn set_freq(&mut self, hz: f32) { if hz.is_finite() { self.freq = hz.max(0.0); } }
    #[inline] pub fn freq(&self) -> f32 { self.freq }
    #[inline] pub fn wave(&self) -> Wave { self.wave }
    #[inline] pub fn phase01(&self) -> f32 { self.phase }

    /// Return the sample at the current phase, then advance one sample.
    ///
    /// The per-sample increment is capped at Nyquist.
    #[inline]
    pub fn next(&mut self, sr: f32) -> f32 {
        let s = wave_sample(self.phase, self.wave);
        let inc = if sr > 0.0 { (self.freq / sr).min(0.5) } else { 0.0 };
        self.phase = wrap_phase01(self.phase + inc);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising_zero_crossings(osc: &mut PhaseOsc, sr: f32, n: usize) -> usize {
        let mut prev = osc.next(sr);
        let mut count = 0;
        for _ in 1..n {
            let s = osc.next(sr);
            if prev < 0.0 && s >= 0.0 {
                count += 1;
            }
            prev = s;
        }
        count
    }

    #[test]
    fn sine_starts_at_zero() {
        let mut osc = PhaseOsc::new(440.0, Wave::Sine);
        assert!(osc.next(48_000.0).abs() < 1e-6);
    }

    #[test]
    fn sine_completes_expected_cycles() {
        let sr = 48_000.0;
        let mut osc = PhaseOsc::new(432.0, Wave::Sine);
        let cycles = rising_zero_crossings(&mut osc, sr, sr as usize);
        assert!((431..=433).contains(&cycles), "cycles={cycles}");
    }

    #[test]
    fn frequency_change_keeps_phase() {
        let sr = 48_000.0;
        let mut osc = PhaseOsc::new(200.0, Wave::Sine);
        for _ in 0..100 { osc.next(sr); }
        let before = osc.phase01();
        osc.set_freq(800.0);
        assert_eq!(osc.phase01(), before);
        let cycles = rising_zero_crossings(&mut osc, sr, sr as usize);
        assert!((799..=801).contains(&cycles), "cycles={cycles}");
    }

    #[test]
    fn output_is_bounded_for_every_wave() {
        for wave in [Wave::Sine, Wave::Tri, Wave::Saw] {
            let mut osc = PhaseOsc::new(1234.5, wave);
            for _ in 0..10_000 {
                let s = osc.next(44_100.0);
                assert!((-1.0 - 1e-4..=1.0 + 1e-4).contains(&s), "{wave:?} s={s}");
            }
        }
    }

    #[test]
    fn increment_is_capped_at_nyquist() {
        let mut osc = PhaseOsc::new(1.0e6, Wave::Saw);
        osc.next(48_000.0);
        assert!((osc.phase01() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rejects_negative_and_nan_frequency() {
        let mut osc = PhaseOsc::new(300.0, Wave::Sine);
        osc.set_freq(f32::NAN);
        assert_eq!(osc.freq(), 300.0);
        osc.set_freq(-5.0);
        assert_eq!(osc.freq(), 0.0);
    }
}
