//! Channel Mixer control handle.
//!
//! Two output channels: `0` is left, `1` is right. Each source feeds exactly
//! one channel through its own trim stage, so one side can be attenuated
//! without touching the other. Trims default to unity; overall loudness is the
//! master stage's job.

use crate::error::{EngineError, EngineResult};
use crate::graph::{GraphCommand, GraphLink};
use crate::nodes::{CHANNELS, MAX_SOURCES};
use crate::tone::ToneSource;

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

#[derive(Debug)]
pub struct ChannelMixer {
    routes: [Option<usize>; MAX_SOURCES],
    trims: [f32; MAX_SOURCES],
    link: GraphLink,
}

impl ChannelMixer {
    pub(crate) fn new(link: GraphLink) -> Self {
        Self { routes: [None; MAX_SOURCES], trims: [1.0; MAX_SOURCES], link }
    }

    /// Route `source` to `channel`. Reconnecting moves it.
    pub fn connect(&mut self, source: &ToneSource, channel: usize) -> EngineResult {
        if channel >= CHANNELS {
            return Err(EngineError::InvalidChannel(channel));
        }
        if source.is_stopped() {
            return Err(EngineError::SourceStopped);
        }
        self.routes[source.slot()] = Some(channel);
        self.link.send(GraphCommand::Route { slot: source.slot(), channel: Some(channel) });
        Ok(())
    }

    /// Unroute `source`. Harmless if it was never connected.
    pub fn disconnect(&mut self, source: &ToneSource) {
        if self.routes[source.slot()].take().is_some() {
            self.link.send(GraphCommand::Route { slot: source.slot(), channel: None });
        }
    }

    /// Per-source attenuation upstream of the mix point; clamped to `>= 0`.
    pub fn set_trim(&mut self, source: &ToneSource, gain: f32) {
        let gain = if gain.is_finite() { gain.max(0.0) } else { 0.0 };
        self.trims[source.slot()] = gain;
        self.link.send(GraphCommand::Trim { slot: source.slot(), gain });
    }

    pub fn channel_of(&self, source: &ToneSource) -> Option<usize> { self.routes[source.slot()] }
    pub fn trim_of(&self, source: &ToneSource) -> f32 { self.trims[source.slot()] }
}
