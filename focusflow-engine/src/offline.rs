//! Deterministic in-memory host.
//!
//! Renders on demand instead of on a device callback, and can be told to come
//! up suspended, to refuse resumes, or to leave a resume hanging until the
//! caller settles it. Used by the test suites and by headless builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::context::{AudioContext, AudioHost, ContextState, ResumeOutcome};
use crate::error::{EngineError, EngineResult};
use crate::graph::{Destination, Frame, GraphRenderer};

/// What an offline context does when asked to resume.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ResumeBehavior {
    /// Become running immediately.
    #[default]
    Activate,
    /// Settle immediately but stay suspended.
    Refuse,
    /// Report `Pending`; the caller settles it with `complete_resume`.
    Defer,
}

#[derive(Clone, Debug)]
pub struct OfflineHost {
    sample_rate: f32,
    initial: ContextState,
    behavior: ResumeBehavior,
    available: bool,
    opened: usize,
    live: Arc<AtomicUsize>,
}

impl OfflineHost {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            initial: ContextState::Running,
            behavior: ResumeBehavior::Activate,
            available: true,
            opened: 0,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Contexts open suspended.
    pub fn suspended(mut self) -> Self { self.initial = ContextState::Suspended; self }

    pub fn with_resume(mut self, behavior: ResumeBehavior) -> Self { self.behavior = behavior; self }

    /// Opening fails with `AudioUnavailable`.
    pub fn unavailable(mut self) -> Self { self.available = false; self }

    /// How many contexts have been opened so far.
    pub fn opened(&self) -> usize { self.opened }

    /// Graphs attached right now across every context this host (or a clone
    /// of it) opened.
    pub fn live_graphs(&self) -> usize { self.live.load(Ordering::Relaxed) }
}

impl Default for OfflineHost {
    fn default() -> Self { Self::new(48_000.0) }
}

impl AudioHost for OfflineHost {
    type Context = OfflineContext;

    fn open_context(&mut self) -> EngineResult<OfflineContext> {
        if !self.available {
            return Err(EngineError::AudioUnavailable("offline host has no output".into()));
        }
        self.opened += 1;
        Ok(OfflineContext {
            state: self.initial,
            behavior: self.behavior,
            resume_pending: false,
            resume_requests: 0,
            destination: Destination::new(self.sample_rate),
            live: Arc::clone(&self.live),
        })
    }
}

#[derive(Debug)]
pub struct OfflineContext {
    state: ContextState,
    behavior: ResumeBehavior,
    resume_pending: bool,
    resume_requests: usize,
    destination: Destination<Box<GraphRenderer>>,
    live: Arc<AtomicUsize>,
}

impl OfflineContext {
    /// Pull `frames` stereo frames. A context that is not running outputs
    /// silence and its clock stands still.
    pub fn render(&mut self, frames: usize) -> Vec<Frame> {
        let mut out = Vec::with_capacity(frames);
        if self.state == ContextState::Running {
            self.destination.render_frames(frames, |f| out.push(f));
        } else {
            out.resize(frames, [0.0; 2]);
        }
        out
    }

    /// Settle a deferred resume. No effect when nothing is pending.
    pub fn complete_resume(&mut self, activate: bool) {
        if self.resume_pending {
            self.resume_pending = false;
            self.state = if activate { ContextState::Running } else { ContextState::Suspended };
        }
    }

    /// Force a state, e.g. to simulate the device going away.
    pub fn set_state(&mut self, state: ContextState) { self.state = state; }

    pub fn is_resume_pending(&self) -> bool { self.resume_pending }
    pub fn resume_requests(&self) -> usize { self.resume_requests }
    pub fn is_attached(&self) -> bool { self.destination.is_attached() }
    pub fn attached(&self) -> Option<&GraphRenderer> { self.destination.generator().map(|b| &**b) }
}

impl AudioContext for OfflineContext {
    fn state(&self) -> ContextState { self.state }

    fn resume(&mut self) -> EngineResult<ResumeOutcome> {
        self.resume_requests += 1;
        if self.state == ContextState::Running {
            return Ok(ResumeOutcome::Settled);
        }
        match self.behavior {
            ResumeBehavior::Activate => {
                self.state = ContextState::Running;
                Ok(ResumeOutcome::Settled)
            }
            ResumeBehavior::Refuse => Ok(ResumeOutcome::Settled),
            ResumeBehavior::Defer => {
                self.resume_pending = true;
                Ok(ResumeOutcome::Pending)
            }
        }
    }

    fn sample_rate(&self) -> f32 { self.destination.sample_rate() }

    fn current_time(&self) -> f64 { self.destination.time() }

    fn attach(&mut self, renderer: Box<GraphRenderer>) -> EngineResult {
        if self.destination.attach(renderer).is_some() {
            log::debug!(target: "context", "offline: replaced attached graph");
        } else {
            self.live.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    fn detach(&mut self) {
        if self.destination.detach().is_some() {
            self.live.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

impl Drop for OfflineContext {
    fn drop(&mut self) {
        self.detach();
    }
}
