//! User-facing tone knobs and the controller that pushes them into a session.

use focusflow_core::dsp::{clamp, volume_to_gain};

pub const MIN_BASE_FREQUENCY_HZ: f32 = 200.0;
pub const MAX_BASE_FREQUENCY_HZ: f32 = 800.0;
pub const MIN_BEAT_FREQUENCY_HZ: f32 = 1.0;
pub const MAX_BEAT_FREQUENCY_HZ: f32 = 40.0;
pub const MIN_VOLUME_PERCENT: f32 = 0.0;
pub const MAX_VOLUME_PERCENT: f32 = 100.0;

/// Base carrier, beat offset and volume.
///
/// The left ear hears `base_frequency_hz`, the right ear
/// `base_frequency_hz + beat_frequency_hz`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ToneParameters {
    pub base_frequency_hz: f32,
    pub beat_frequency_hz: f32,
    pub volume_percent: f32,
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self {
            base_frequency_hz: 432.0,
            beat_frequency_hz: 35.0,
            volume_percent: 41.0,
        }
    }
}

impl ToneParameters {
    /// Copy with every field forced into its domain. Non-finite fields fall
    /// back to the defaults.
    pub fn clamped(self) -> Self {
        let d = Self::default();
        Self {
            base_frequency_hz: clamp_or(self.base_frequency_hz, MIN_BASE_FREQUENCY_HZ, MAX_BASE_FREQUENCY_HZ, d.base_frequency_hz),
            beat_frequency_hz: clamp_or(self.beat_frequency_hz, MIN_BEAT_FREQUENCY_HZ, MAX_BEAT_FREQUENCY_HZ, d.beat_frequency_hz),
            volume_percent: clamp_or(self.volume_percent, MIN_VOLUME_PERCENT, MAX_VOLUME_PERCENT, d.volume_percent),
        }
    }

    #[inline] pub fn left_frequency_hz(&self) -> f32 { self.base_frequency_hz }
    #[inline] pub fn right_frequency_hz(&self) -> f32 { self.base_frequency_hz + self.beat_frequency_hz }

    /// Master gain for this volume, `(volume / 100)^2`.
    #[inline] pub fn gain(&self) -> f32 { volume_to_gain(self.volume_percent) }
}

#[inline]
fn clamp_or(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if v.is_finite() { clamp(v, lo, hi) } else { fallback }
}

/// Anything that wants to hear about parameter changes as they happen.
pub trait ParameterSink {
    fn update_parameters(&mut self, params: ToneParameters);
}

impl<S: ParameterSink + ?Sized> ParameterSink for &mut S {
    fn update_parameters(&mut self, params: ToneParameters) {
        (**self).update_parameters(params);
    }
}

/// Owns the current [`ToneParameters`] and forwards every change to its sink
/// straight away (no debouncing).
#[derive(Debug)]
pub struct ParameterController<S: ParameterSink> {
    params: ToneParameters,
    sink: S,
}

impl<S: ParameterSink> ParameterController<S> {
    /// Attach to `sink` and hand it the initial parameters.
    pub fn new(mut sink: S, params: ToneParameters) -> Self {
        let params = params.clamped();
        sink.update_parameters(params);
        Self { params, sink }
    }

    pub fn parameters(&self) -> ToneParameters { self.params }

    /// Returns the value actually applied.
    pub fn set_base_frequency(&mut self, hz: f32) -> f32 {
        self.params.base_frequency_hz = clamp_or(hz, MIN_BASE_FREQUENCY_HZ, MAX_BASE_FREQUENCY_HZ, self.params.base_frequency_hz);
        self.propagate();
        self.params.base_frequency_hz
    }

    /// Returns the value actually applied.
    pub fn set_beat_frequency(&mut self, hz: f32) -> f32 {
        self.params.beat_frequency_hz = clamp_or(hz, MIN_BEAT_FREQUENCY_HZ, MAX_BEAT_FREQUENCY_HZ, self.params.beat_frequency_hz);
        self.propagate();
        self.params.beat_frequency_hz
    }

    /// Returns the value actually applied.
    pub fn set_volume(&mut self, percent: f32) -> f32 {
        self.params.volume_percent = clamp_or(percent, MIN_VOLUME_PERCENT, MAX_VOLUME_PERCENT, self.params.volume_percent);
        self.propagate();
        self.params.volume_percent
    }

    /// Replace all three knobs at once.
    pub fn set_parameters(&mut self, params: ToneParameters) -> ToneParameters {
        let d = self.params;
        self.params = ToneParameters {
            base_frequency_hz: clamp_or(params.base_frequency_hz, MIN_BASE_FREQUENCY_HZ, MAX_BASE_FREQUENCY_HZ, d.base_frequency_hz),
            beat_frequency_hz: clamp_or(params.beat_frequency_hz, MIN_BEAT_FREQUENCY_HZ, MAX_BEAT_FREQUENCY_HZ, d.beat_frequency_hz),
            volume_percent: clamp_or(params.volume_percent, MIN_VOLUME_PERCENT, MAX_VOLUME_PERCENT, d.volume_percent),
        };
        self.propagate();
        self.params
    }

    pub fn sink(&self) -> &S { &self.sink }
    pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }

    fn propagate(&mut self) {
        log::debug!(target: "params", "propagating {:?}", self.params);
        self.sink.update_parameters(self.params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<ToneParameters>);

    impl ParameterSink for Recorder {
        fn update_parameters(&mut self, params: ToneParameters) {
            self.0.push(params);
        }
    }

    #[test]
    fn defaults_match_factory_settings() {
        let p = ToneParameters::default();
        assert_eq!(p.base_frequency_hz, 432.0);
        assert_eq!(p.beat_frequency_hz, 35.0);
        assert_eq!(p.volume_percent, 41.0);
        assert_eq!(p.right_frequency_hz(), 467.0);
        assert!((p.gain() - 0.1681).abs() < 1e-6);
    }

    #[test]
    fn clamped_forces_domains() {
        let p = ToneParameters { base_frequency_hz: 50.0, beat_frequency_hz: 99.0, volume_percent: -3.0 }.clamped();
        assert_eq!(p.base_frequency_hz, 200.0);
        assert_eq!(p.beat_frequency_hz, 40.0);
        assert_eq!(p.volume_percent, 0.0);

        let p = ToneParameters { base_frequency_hz: f32::NAN, ..ToneParameters::default() }.clamped();
        assert_eq!(p.base_frequency_hz, 432.0);
    }

    #[test]
    fn new_pushes_initial_snapshot() {
        let ctl = ParameterController::new(Recorder::default(), ToneParameters::default());
        assert_eq!(ctl.sink().0, vec![ToneParameters::default()]);
    }

    #[test]
    fn every_setter_propagates_immediately() {
        let mut ctl = ParameterController::new(Recorder::default(), ToneParameters::default());
        ctl.set_base_frequency(500.0);
        ctl.set_beat_frequency(10.0);
        ctl.set_volume(80.0);
        let seen = &ctl.sink().0;
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1].base_frequency_hz, 500.0);
        assert_eq!(seen[2].beat_frequency_hz, 10.0);
        assert_eq!(seen[3], ToneParameters { base_frequency_hz: 500.0, beat_frequency_hz: 10.0, volume_percent: 80.0 });
    }

    #[test]
    fn setters_clamp_and_report_applied_value() {
        let mut ctl = ParameterController::new(Recorder::default(), ToneParameters::default());
        assert_eq!(ctl.set_base_frequency(10_000.0), 800.0);
        assert_eq!(ctl.set_beat_frequency(0.0), 1.0);
        assert_eq!(ctl.set_volume(150.0), 100.0);
        assert_eq!(ctl.set_volume(f32::INFINITY), 100.0);
        assert_eq!(ctl.set_base_frequency(f32::NAN), 800.0);
    }

    #[test]
    fn controller_can_borrow_its_sink() {
        let mut rec = Recorder::default();
        {
            let mut ctl = ParameterController::new(&mut rec, ToneParameters::default());
            ctl.set_volume(0.0);
        }
        assert_eq!(rec.0.last().map(|p| p.volume_percent), Some(0.0));
    }
}
