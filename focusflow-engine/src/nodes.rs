//! Render-side building blocks, owned by a [`GraphRenderer`](crate::graph::GraphRenderer).
//!
//! These are zero-allocation, per-sample components designed for realtime use.
//! The control thread never touches them directly: it talks to them through
//! the handles in [`tone`](crate::tone), [`mixer`](crate::mixer) and
//! [`master`](crate::master), which send commands over the graph link.
//!
//! Contents:
//! - `ToneVoice`  : one oscillator plus its started/stopped lifecycle
//! - `MixerNode`  : source → channel routing with per-source trim
//! - `MasterNode` : slewed master gain and destination connection

use focusflow_core::osc::{PhaseOsc, Wave};
use focusflow_core::slew::SlewLimiter;

/// Number of output channels (left, right).
pub const CHANNELS: usize = 2;

/// Sources per graph; one per channel in this design.
pub const MAX_SOURCES: usize = CHANNELS;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum VoiceState { Idle, Playing, Stopped }

/// Oscillator with start/stop semantics. Silent until started, silent forever
/// once stopped.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ToneVoice {
    osc: PhaseOsc,
    state: VoiceState,
}

impl ToneVoice {
    #[inline] pub(crate) fn new(freq_hz: f32, wave: Wave) -> Self { Self { osc: PhaseOsc::new(freq_hz, wave), state: VoiceState::Idle } }
    #[inline] pub(crate) fn set_freq(&mut self, hz: f32) { self.osc.set_freq(hz); }
    #[inline] pub(crate) fn freq(&self) -> f32 { self.osc.freq() }
    #[inline] pub(crate) fn state(&self) -> VoiceState { self.state }

    #[inline]
    pub(crate) fn start(&mut self) {
        if self.state == VoiceState::Idle {
            self.state = VoiceState::Playing;
        }
    }

    #[inline] pub(crate) fn stop(&mut self) { self.state = VoiceState::Stopped; }

    #[inline]
    pub(crate) fn next(&mut self, sr: f32) -> f32 {
        match self.state {
            VoiceState::Playing => self.osc.next(sr),
            VoiceState::Idle | VoiceState::Stopped => 0.0,
        }
    }
}

/// Routes each source slot to at most one channel, with a trim gain per slot.
#[derive(Copy, Clone, Debug)]
pub(crate) struct MixerNode {
    route: [Option<usize>; MAX_SOURCES],
    trim: [f32; MAX_SOURCES],
}

impl MixerNode {
    #[inline] pub(crate) fn new() -> Self { Self { route: [None; MAX_SOURCES], trim: [1.0; MAX_SOURCES] } }
    #[inline] pub(crate) fn set_route(&mut self, slot: usize, channel: Option<usize>) { if slot < MAX_SOURCES { self.route[slot] = channel.filter(|c| *c < CHANNELS); } }
    #[inline] pub(crate) fn set_trim(&mut self, slot: usize, g: f32) { if slot < MAX_SOURCES { self.trim[slot] = g.max(0.0); } }
    #[inline] pub(crate) fn route(&self, slot: usize) -> Option<usize> { self.route.get(slot).copied().flatten() }

    /// Accumulate one sample from `slot` into `out`.
    #[inline]
    pub(crate) fn mix(&self, slot: usize, sample: f32, out: &mut [f32; CHANNELS]) {
        if let Some(ch) = self.route(slot) {
            out[ch] += sample * self.trim[slot];
        }
    }
}

/// Master gain with one-pole slewing toward the scheduled target.
#[derive(Copy, Clone, Debug)]
pub(crate) struct MasterNode {
    target: f32,
    slew: SlewLimiter,
    smoothing_ms: f32,
    connected: bool,
}

impl MasterNode {
    /// Starts from silence so the first block fades in.
    #[inline]
    pub(crate) fn new(gain: f32, smoothing_ms: f32, sr: f32) -> Self {
        Self { target: gain.max(0.0), slew: SlewLimiter::new(smoothing_ms, sr), smoothing_ms, connected: true }
    }

    #[inline] pub(crate) fn reset_sr(&mut self, sr: f32) { self.slew.set_time_ms(self.smoothing_ms, sr); }
    #[inline] pub(crate) fn set_target(&mut self, g: f32) { self.target = if g.is_finite() { g.max(0.0) } else { 0.0 }; }
    #[inline] pub(crate) fn target(&self) -> f32 { self.target }
    #[inline] pub(crate) fn disconnect(&mut self) { self.connected = false; }
    #[inline] pub(crate) fn is_connected(&self) -> bool { self.connected }

    #[inline]
    pub(crate) fn process(&mut self, frame: [f32; CHANNELS]) -> [f32; CHANNELS] {
        let g = self.slew.process(self.target);
        if !self.connected {
            return [0.0; CHANNELS];
        }
        [(frame[0] * g).clamp(-1.0, 1.0), (frame[1] * g).clamp(-1.0, 1.0)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_is_silent_until_started_and_after_stop() {
        let mut v = ToneVoice::new(440.0, Wave::Saw);
        assert_eq!(v.next(48_000.0), 0.0);
        assert_eq!(v.next(48_000.0), 0.0);
        v.start();
        v.next(48_000.0);
        assert!(v.next(48_000.0) != 0.0);
        v.stop();
        v.start();
        assert_eq!(v.state(), VoiceState::Stopped);
        assert_eq!(v.next(48_000.0), 0.0);
    }

    #[test]
    fn mixer_keeps_channels_apart() {
        let mut m = MixerNode::new();
        m.set_route(0, Some(0));
        m.set_route(1, Some(1));
        m.set_trim(1, 0.5);
        let mut out = [0.0; CHANNELS];
        m.mix(0, 1.0, &mut out);
        m.mix(1, 1.0, &mut out);
        assert_eq!(out, [1.0, 0.5]);
    }

    #[test]
    fn mixer_drops_unrouted_and_invalid_channels() {
        let mut m = MixerNode::new();
        m.set_route(0, Some(7));
        let mut out = [0.0; CHANNELS];
        m.mix(0, 1.0, &mut out);
        m.mix(1, 1.0, &mut out);
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn master_fades_in_and_mutes_on_disconnect() {
        let mut g = MasterNode::new(1.0, 5.0, 48_000.0);
        let first = g.process([1.0, 1.0]);
        assert!(first[0] > 0.0 && first[0] < 0.1);
        for _ in 0..48_000 { g.process([1.0, 1.0]); }
        let settled = g.process([1.0, 1.0]);
        assert!((settled[0] - 1.0).abs() < 1e-3);
        g.disconnect();
        assert_eq!(g.process([1.0, 1.0]), [0.0, 0.0]);
    }

    #[test]
    fn master_rejects_negative_gain() {
        let mut g = MasterNode::new(0.5, 0.0, 48_000.0);
        g.set_target(-2.0);
        assert_eq!(g.target(), 0.0);
        g.set_target(f32::NAN);
        assert_eq!(g.target(), 0.0);
    }
}
