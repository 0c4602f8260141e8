//! Tone Source control handle.
//!
//! A `ToneSource` names one voice slot inside a graph. It is created at a
//! frequency, started once, retuned any number of times while alive, and
//! stopped once. After `stop` it is dead: it cannot be restarted or retuned,
//! and the graph must build a new one.

use crate::error::{EngineError, EngineResult};
use crate::graph::{GraphCommand, GraphLink};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceState {
    Created,
    Started,
    Stopped,
}

#[derive(Debug)]
pub struct ToneSource {
    slot: usize,
    frequency_hz: f32,
    state: SourceState,
    link: GraphLink,
}

impl ToneSource {
    pub(crate) fn create(link: GraphLink, slot: usize, frequency_hz: f32) -> Self {
        let frequency_hz = sanitize(frequency_hz);
        link.send(GraphCommand::Frequency { slot, hz: frequency_hz, at_frame: 0 });
        Self { slot, frequency_hz, state: SourceState::Created, link }
    }

    #[inline] pub(crate) fn slot(&self) -> usize { self.slot }
    #[inline] pub fn state(&self) -> SourceState { self.state }
    #[inline] pub fn is_stopped(&self) -> bool { self.state == SourceState::Stopped }

    /// Last frequency scheduled on this source.
    #[inline] pub fn frequency_hz(&self) -> f32 { self.frequency_hz }

    /// Schedule a new frequency at `at_time` (seconds on the context clock).
    /// Times in the past apply on the next rendered block.
    pub fn set_frequency(&mut self, frequency_hz: f32, at_time: f64) -> EngineResult {
        if self.is_stopped() {
            return Err(EngineError::SourceStopped);
        }
        self.frequency_hz = sanitize(frequency_hz);
        self.link.send(GraphCommand::Frequency {
            slot: self.slot,
            hz: self.frequency_hz,
            at_frame: self.link.frame_at(at_time),
        });
        Ok(())
    }

    /// Begin producing sound. Starting twice is harmless; starting a stopped
    /// source is an error.
    pub fn start(&mut self) -> EngineResult {
        match self.state {
            SourceState::Stopped => Err(EngineError::SourceStopped),
            SourceState::Started => Ok(()),
            SourceState::Created => {
                self.link.send(GraphCommand::Start { slot: self.slot });
                self.state = SourceState::Started;
                Ok(())
            }
        }
    }

    /// Silence the source for good. A no-op if already stopped.
    pub fn stop(&mut self) {
        if self.is_stopped() {
            return;
        }
        self.link.send(GraphCommand::Stop { slot: self.slot });
        self.state = SourceState::Stopped;
    }
}

#[inline]
fn sanitize(hz: f32) -> f32 {
    if hz.is_finite() { hz.max(0.0) } else { 0.0 }
}
