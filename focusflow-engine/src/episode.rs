//! Graph wiring for one playback episode.
//!
//! [`GraphBuilder`] hands out the control handles and the matching
//! [`GraphRenderer`]; [`AudioGraph`] is the fixed binaural layout the session
//! builds from it: left source → channel 0, right source → channel 1, both
//! through the mixer into the master stage.

use crate::error::{EngineError, EngineResult};
use crate::graph::{EngineSettings, GraphCommand, GraphLink, GraphRenderer};
use crate::master::MasterOutput;
use crate::mixer::{ChannelMixer, LEFT, RIGHT};
use crate::nodes::MAX_SOURCES;
use crate::params::ToneParameters;
use crate::tone::ToneSource;

/// Hands out handles bound to one renderer.
#[derive(Debug)]
pub struct GraphBuilder {
    link: GraphLink,
    renderer: GraphRenderer,
    next_slot: usize,
}

impl GraphBuilder {
    pub fn new(sample_rate: f32, settings: EngineSettings) -> Self {
        let (renderer, link) = GraphRenderer::new(sample_rate, settings, 0.0);
        Self { link, renderer, next_slot: 0 }
    }

    /// New tone source at `frequency_hz`, not yet started.
    pub fn create_source(&mut self, frequency_hz: f32) -> EngineResult<ToneSource> {
        if self.next_slot >= MAX_SOURCES {
            return Err(EngineError::TooManySources);
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        Ok(ToneSource::create(self.link.clone(), slot, frequency_hz))
    }

    pub fn mixer(&self) -> ChannelMixer { ChannelMixer::new(self.link.clone()) }

    /// Master stage starting at `gain`.
    pub fn master(&self, gain: f32) -> MasterOutput {
        let master = MasterOutput::new(self.link.clone(), gain);
        self.link.send(GraphCommand::Gain { value: master.gain(), at_frame: 0 });
        master
    }

    pub fn finish(self) -> GraphRenderer { self.renderer }
}

/// Control half of a live binaural graph. Owned by exactly one session for
/// exactly one episode.
#[derive(Debug)]
pub struct AudioGraph {
    left: ToneSource,
    right: ToneSource,
    mixer: ChannelMixer,
    master: MasterOutput,
}

impl AudioGraph {
    /// Wire a fresh graph for `params`. Sources are created but not started.
    pub fn build(sample_rate: f32, settings: EngineSettings, params: ToneParameters) -> EngineResult<(Self, GraphRenderer)> {
        let mut builder = GraphBuilder::new(sample_rate, settings);
        let left = builder.create_source(params.left_frequency_hz())?;
        let right = builder.create_source(params.right_frequency_hz())?;
        let mut mixer = builder.mixer();
        mixer.connect(&left, LEFT)?;
        mixer.connect(&right, RIGHT)?;
        let master = builder.master(params.gain());
        Ok((Self { left, right, mixer, master }, builder.finish()))
    }

    pub fn start(&mut self) -> EngineResult {
        self.left.start()?;
        self.right.start()
    }

    /// Retune both sources and regain the master at `at_time`.
    pub fn apply(&mut self, params: ToneParameters, at_time: f64) -> EngineResult {
        self.left.set_frequency(params.left_frequency_hz(), at_time)?;
        self.right.set_frequency(params.right_frequency_hz(), at_time)?;
        self.master.set_gain(params.gain(), at_time);
        Ok(())
    }

    /// Sources first, then the master stage, so nothing still feeds a
    /// dangling output.
    pub fn teardown(&mut self) {
        self.left.stop();
        self.mixer.disconnect(&self.left);
        self.right.stop();
        self.mixer.disconnect(&self.right);
        self.master.disconnect();
    }

    pub fn left(&self) -> &ToneSource { &self.left }
    pub fn right(&self) -> &ToneSource { &self.right }
    pub fn mixer(&self) -> &ChannelMixer { &self.mixer }
    pub fn master(&self) -> &MasterOutput { &self.master }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Destination, Generator};
    use focusflow_core::osc::Wave;

    const SR: f32 = 8_000.0;

    fn settings() -> EngineSettings {
        EngineSettings { wave: Wave::Sine, gain_smoothing_ms: 0.0 }
    }

    fn render(dest: &mut Destination<GraphRenderer>, frames: usize) -> Vec<[f32; 2]> {
        let mut out = Vec::with_capacity(frames);
        dest.render_frames(frames, |f| out.push(f));
        out
    }

    #[test]
    fn builder_allows_exactly_two_sources() {
        let mut b = GraphBuilder::new(SR, settings());
        assert!(b.create_source(300.0).is_ok());
        assert!(b.create_source(310.0).is_ok());
        assert_eq!(b.create_source(320.0).unwrap_err(), EngineError::TooManySources);
    }

    #[test]
    fn mixer_rejects_third_channel() {
        let mut b = GraphBuilder::new(SR, settings());
        let src = b.create_source(300.0).unwrap();
        let mut mixer = b.mixer();
        assert_eq!(mixer.connect(&src, 2), Err(EngineError::InvalidChannel(2)));
        assert!(mixer.connect(&src, RIGHT).is_ok());
        assert_eq!(mixer.channel_of(&src), Some(RIGHT));
        assert!(mixer.connect(&src, LEFT).is_ok());
        assert_eq!(mixer.channel_of(&src), Some(LEFT));
    }

    #[test]
    fn stopped_source_is_permanently_invalid() {
        let mut b = GraphBuilder::new(SR, settings());
        let mut src = b.create_source(300.0).unwrap();
        src.start().unwrap();
        src.stop();
        src.stop();
        assert_eq!(src.start(), Err(EngineError::SourceStopped));
        assert_eq!(src.set_frequency(400.0, 0.0), Err(EngineError::SourceStopped));
        assert_eq!(src.frequency_hz(), 300.0);
        let mut mixer = b.mixer();
        assert_eq!(mixer.connect(&src, LEFT), Err(EngineError::SourceStopped));
    }

    #[test]
    fn built_graph_routes_left_and_right() {
        let params = ToneParameters::default();
        let (mut graph, renderer) = AudioGraph::build(SR, settings(), params).unwrap();
        assert_eq!(graph.left().frequency_hz(), 432.0);
        assert_eq!(graph.right().frequency_hz(), 467.0);
        assert_eq!(graph.mixer().channel_of(graph.left()), Some(LEFT));
        assert_eq!(graph.mixer().channel_of(graph.right()), Some(RIGHT));
        assert!((graph.master().gain() - 0.1681).abs() < 1e-6);

        let mut dest = Destination::new(SR);
        dest.attach(renderer);
        graph.start().unwrap();
        let frames = render(&mut dest, 800);
        let peak_l = frames.iter().map(|f| f[0].abs()).fold(0.0_f32, f32::max);
        let peak_r = frames.iter().map(|f| f[1].abs()).fold(0.0_f32, f32::max);
        assert!((peak_l - 0.1681).abs() < 0.01, "peak_l={peak_l}");
        assert!((peak_r - 0.1681).abs() < 0.01, "peak_r={peak_r}");
        assert!(frames.iter().any(|f| (f[0] - f[1]).abs() > 1e-3));
    }

    #[test]
    fn trim_attenuates_one_side_only() {
        let mut b = GraphBuilder::new(SR, settings());
        let mut l = b.create_source(500.0).unwrap();
        let mut r = b.create_source(500.0).unwrap();
        let mut mixer = b.mixer();
        mixer.connect(&l, LEFT).unwrap();
        mixer.connect(&r, RIGHT).unwrap();
        mixer.set_trim(&r, 0.5);
        assert_eq!(mixer.trim_of(&r), 0.5);
        let _master = b.master(1.0);
        let mut renderer = b.finish();
        l.start().unwrap();
        r.start().unwrap();
        renderer.reset(SR);
        renderer.begin_block(0);
        for frame in 0..200 {
            let [a, c] = renderer.next(frame);
            assert!((a * 0.5 - c).abs() < 1e-5, "frame {frame}: {a} vs {c}");
        }
    }

    #[test]
    fn teardown_stops_sources_before_master() {
        use crate::nodes::VoiceState;

        let (mut graph, mut renderer) = AudioGraph::build(SR, settings(), ToneParameters::default()).unwrap();
        graph.start().unwrap();
        renderer.reset(SR);
        renderer.begin_block(0);
        assert!((0..64).any(|frame| renderer.next(frame) != [0.0, 0.0]));

        graph.teardown();
        let mut frame = 64;
        let mut silent_before_disconnect = false;
        let mut last = None;
        while let Some(cmd) = renderer.step_command() {
            let stopped = renderer.voice_state(0) == Some(VoiceState::Stopped)
                && renderer.voice_state(1) == Some(VoiceState::Stopped);
            if renderer.is_connected() {
                if stopped {
                    silent_before_disconnect = renderer.next(frame) == [0.0, 0.0];
                    frame += 1;
                }
            } else {
                assert!(stopped, "master disconnected while a voice was live");
            }
            last = Some(cmd);
        }
        assert!(silent_before_disconnect);
        assert_eq!(last, Some(GraphCommand::Disconnect));
        assert!(!renderer.is_connected());
    }

    #[test]
    fn frequency_updates_past_pending_capacity_keep_latest() {
        let mut b = GraphBuilder::new(SR, settings());
        let mut src = b.create_source(300.0).unwrap();
        let mut mixer = b.mixer();
        mixer.connect(&src, LEFT).unwrap();
        let _master = b.master(1.0);
        let mut dest = Destination::new(SR);
        dest.attach(b.finish());
        src.start().unwrap();
        for i in 0..70 {
            src.set_frequency(300.0 + i as f32, 0.5).unwrap();
        }
        render(&mut dest, (SR * 0.6) as usize);
        assert_eq!(src.frequency_hz(), 369.0);
        assert_eq!(dest.generator().and_then(|r| r.voice_frequency(0)), Some(369.0));
    }

    #[test]
    fn teardown_silences_and_is_repeatable() {
        let (mut graph, renderer) = AudioGraph::build(SR, settings(), ToneParameters::default()).unwrap();
        let mut dest = Destination::new(SR);
        dest.attach(renderer);
        graph.start().unwrap();
        render(&mut dest, 64);
        graph.teardown();
        graph.teardown();
        assert!(graph.left().is_stopped() && graph.right().is_stopped());
        assert!(!graph.master().is_connected());
        assert!(render(&mut dest, 64).iter().all(|f| *f == [0.0, 0.0]));
        assert_eq!(graph.mixer().channel_of(graph.left()), None);
    }
}
