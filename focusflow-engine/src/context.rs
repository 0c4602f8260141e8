//! Audio host and audio context abstraction.
//!
//! An `AudioHost` knows how to open the platform's output; the resulting
//! `AudioContext` is long-lived, survives across playback episodes, and is the
//! destination each episode's graph renderer is attached to.
//!
//! Contexts may come up suspended (autoplay policies, a device that went away)
//! and need an explicit resume. Resuming may finish immediately or later; the
//! later case is reported as [`ResumeOutcome::Pending`] and the session waits
//! for the host to report completion.

use crate::error::EngineResult;
use crate::graph::GraphRenderer;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
    Closed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// The resume request has completed; check `state()` for the result.
    Settled,
    /// Completion will be reported later.
    Pending,
}

pub trait AudioContext {
    fn state(&self) -> ContextState;

    /// Ask a suspended context to start running. An error means the device
    /// refused outright.
    fn resume(&mut self) -> EngineResult<ResumeOutcome>;

    fn sample_rate(&self) -> f32;

    /// Context clock in seconds; the time base for scheduled parameter changes.
    fn current_time(&self) -> f64;

    /// Make `renderer` the single graph feeding the output. Anything attached
    /// before is released.
    fn attach(&mut self, renderer: Box<GraphRenderer>) -> EngineResult;

    /// Release the attached graph, if any. Never fails.
    fn detach(&mut self);
}

pub trait AudioHost {
    type Context: AudioContext;

    /// Open the output. `EngineError::AudioUnavailable` when there is none.
    fn open_context(&mut self) -> EngineResult<Self::Context>;
}
